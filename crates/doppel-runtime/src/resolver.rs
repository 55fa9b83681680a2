//! Model-name based provider resolution

use std::sync::Arc;

use doppel_core::{DecisionError, ModelProvider, ProviderResolver, Result};

use crate::anthropic::AnthropicProvider;
use crate::config::ProviderConfig;
use crate::openai::OpenAiProvider;

/// Provider family selected from a model identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderFamily {
    OpenAi,
    Anthropic,
}

impl ProviderFamily {
    /// Pick the family by model-name prefix
    pub fn for_model(model: &str) -> Option<Self> {
        if ["gpt", "o1", "o3", "o4"].iter().any(|p| model.starts_with(p)) {
            Some(Self::OpenAi)
        } else if model.starts_with("claude") {
            Some(Self::Anthropic)
        } else {
            None
        }
    }
}

/// Resolves `gpt*`/`o*` models to OpenAI and `claude*` models to Anthropic
pub struct PrefixResolver {
    config: ProviderConfig,
    client: reqwest::Client,
}

impl PrefixResolver {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| DecisionError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(ProviderConfig::from_env())
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }
}

fn missing_key(var: &str, model: &str) -> DecisionError {
    DecisionError::ProviderResolution(format!("{var} is not set, cannot use model {model}"))
}

impl ProviderResolver for PrefixResolver {
    fn resolve(&self, model: &str) -> Result<Arc<dyn ModelProvider>> {
        let provider: Arc<dyn ModelProvider> = match ProviderFamily::for_model(model) {
            Some(ProviderFamily::OpenAi) => {
                let key = self
                    .config
                    .openai_api_key
                    .as_deref()
                    .ok_or_else(|| missing_key("OPENAI_API_KEY", model))?;
                Arc::new(
                    OpenAiProvider::new(key, model)
                        .with_client(self.client.clone())
                        .with_base_url(&self.config.openai_base_url)
                        .with_options(self.config.options.clone()),
                )
            }
            Some(ProviderFamily::Anthropic) => {
                let key = self
                    .config
                    .anthropic_api_key
                    .as_deref()
                    .ok_or_else(|| missing_key("ANTHROPIC_API_KEY", model))?;
                Arc::new(
                    AnthropicProvider::new(key, model)
                        .with_client(self.client.clone())
                        .with_base_url(&self.config.anthropic_base_url)
                        .with_options(self.config.options.clone()),
                )
            }
            None => {
                return Err(DecisionError::ProviderResolution(format!(
                    "model not found: {model}"
                )));
            }
        };

        tracing::debug!(model, provider = provider.name(), "Resolved provider");
        Ok(provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> PrefixResolver {
        PrefixResolver::new(ProviderConfig {
            openai_api_key: Some("sk-test".into()),
            anthropic_api_key: Some("sk-ant-test".into()),
            ..ProviderConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn resolves_by_prefix() {
        let resolver = resolver();

        assert_eq!(resolver.resolve("gpt-4.1").unwrap().name(), "openai");
        assert_eq!(resolver.resolve("o3-mini").unwrap().name(), "openai");
        assert_eq!(
            resolver.resolve("claude-sonnet-4-20250514").unwrap().name(),
            "anthropic"
        );
    }

    #[test]
    fn unknown_model_is_rejected() {
        let err = resolver().resolve("gemini2.5-pro").err().unwrap();
        assert!(
            matches!(err, DecisionError::ProviderResolution(msg) if msg == "model not found: gemini2.5-pro")
        );
    }

    #[test]
    fn missing_credentials_fail_resolution() {
        let resolver = PrefixResolver::new(ProviderConfig::default()).unwrap();

        let err = resolver.resolve("claude-sonnet-4-20250514").err().unwrap();
        assert!(matches!(err, DecisionError::ProviderResolution(msg) if msg.contains("ANTHROPIC_API_KEY")));
    }

    #[test]
    fn family_matching_is_case_sensitive() {
        assert_eq!(ProviderFamily::for_model("GPT-4"), None);
        assert_eq!(ProviderFamily::for_model("claude-3-haiku"), Some(ProviderFamily::Anthropic));
    }
}
