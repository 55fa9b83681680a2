//! Provider configuration

use std::time::Duration;

/// Sampling options sent with every generation call
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            max_tokens: 4096,
        }
    }
}

/// Credentials and endpoints for every supported provider family
#[derive(Clone, Debug)]
pub struct ProviderConfig {
    /// OpenAI API key
    pub openai_api_key: Option<String>,

    /// OpenAI-compatible base URL, without the `/chat/completions` suffix
    pub openai_base_url: String,

    /// Anthropic API key
    pub anthropic_api_key: Option<String>,

    /// Anthropic base URL, without the `/v1/messages` suffix
    pub anthropic_base_url: String,

    pub options: GenerationOptions,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_base_url: "https://api.openai.com/v1".into(),
            anthropic_api_key: None,
            anthropic_base_url: "https://api.anthropic.com".into(),
            options: GenerationOptions::default(),
            timeout_secs: 120,
        }
    }
}

impl ProviderConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Unset or unparsable values
    /// fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            openai_api_key: non_empty("OPENAI_API_KEY"),
            openai_base_url: non_empty("OPENAI_BASE_URL")
                .map_or(defaults.openai_base_url, |url| trim_url(&url)),
            anthropic_api_key: non_empty("ANTHROPIC_API_KEY"),
            anthropic_base_url: non_empty("ANTHROPIC_BASE_URL")
                .map_or(defaults.anthropic_base_url, |url| trim_url(&url)),
            options: GenerationOptions {
                temperature: lookup("DOPPEL_TEMPERATURE")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.options.temperature),
                max_tokens: lookup("DOPPEL_MAX_TOKENS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.options.max_tokens),
            },
            timeout_secs: lookup("DOPPEL_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.timeout_secs),
        }
    }

    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn trim_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_config_defaults() {
        let config = ProviderConfig::from_lookup(lookup(&[]));
        assert!(config.openai_api_key.is_none());
        assert_eq!(config.openai_base_url, "https://api.openai.com/v1");
        assert_eq!(config.anthropic_base_url, "https://api.anthropic.com");
        assert_eq!(config.options, GenerationOptions::default());
        assert_eq!(config.timeout(), Duration::from_secs(120));
    }

    #[test]
    fn test_config_overrides() {
        let config = ProviderConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_BASE_URL", "http://localhost:8080/v1/"),
            ("ANTHROPIC_API_KEY", "  "),
            ("DOPPEL_TEMPERATURE", "0.7"),
            ("DOPPEL_MAX_TOKENS", "not a number"),
            ("DOPPEL_TIMEOUT_SECS", "5"),
        ]));

        assert_eq!(config.openai_api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.openai_base_url, "http://localhost:8080/v1");
        assert!(config.anthropic_api_key.is_none());
        assert!((config.options.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.options.max_tokens, 4096);
        assert_eq!(config.timeout_secs, 5);
    }
}
