//! Model Provider Strategy Pattern
//!
//! Defines the single capability the decision engine needs from a model
//! backend, plus the resolver that picks a backend for a model identifier.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use doppel_core::provider::{ModelProvider, StaticResolver};
//!
//! // Any provider works through the trait
//! let response = provider.generate(conversation.messages(), &catalog).await?;
//!
//! // Tests inject a fixed provider instead of resolving by name
//! let resolver = StaticResolver::new(Arc::new(provider));
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{DecisionError, Result};
use crate::message::{Message, ToolCallRequest};

/// Failure of a single generation call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Transport failure (connect, timeout, reset)
    #[error("network error: {0}")]
    Network(String),

    /// Credentials rejected
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Provider throttled the request
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Non-success status from the provider API
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    /// Response could not be understood
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Check if a caller could reasonably retry. The engine itself never does.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::RateLimited(_))
    }
}

/// Catalog entry describing one tool to the model
///
/// Serializes to the function-definition wire shape
/// `{"type": "function", "name", "description", "parameters"}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

impl ToolSpec {
    pub fn function(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            kind: "function".into(),
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// Reason for completion finishing
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ToolUse,
    ContentFilter,
    Error,
}

/// One candidate answer from the provider
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Choice {
    /// Generated text (may be empty when only tools are requested)
    #[serde(default)]
    pub content: String,

    /// Tool calls requested by the model, in order
    #[serde(default)]
    pub tool_calls: Vec<ToolCallRequest>,

    /// Finish reason
    #[serde(default)]
    pub finish_reason: Option<FinishReason>,
}

impl Choice {
    /// A plain-text choice
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: Vec::new(),
            finish_reason: Some(FinishReason::Stop),
        }
    }

    /// A choice requesting tool calls
    pub fn tool_calls(calls: Vec<ToolCallRequest>) -> Self {
        Self {
            content: String::new(),
            tool_calls: calls,
            finish_reason: Some(FinishReason::ToolUse),
        }
    }
}

/// Token usage statistics
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Response from a generation call
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Response {
    pub choices: Vec<Choice>,

    /// Token usage statistics (if available)
    #[serde(default)]
    pub usage: Option<TokenUsage>,
}

impl Response {
    /// Response with a single text choice
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            choices: vec![Choice::text(content)],
            usage: None,
        }
    }

    /// Response with a single choice requesting tool calls
    pub fn tool_calls(calls: Vec<ToolCallRequest>) -> Self {
        Self {
            choices: vec![Choice::tool_calls(calls)],
            usage: None,
        }
    }

    /// All tool calls across every choice, in provider order
    pub fn requested_tools(&self) -> impl Iterator<Item = &ToolCallRequest> {
        self.choices.iter().flat_map(|c| c.tool_calls.iter())
    }

    /// Whether any choice requests a tool
    pub fn has_tool_calls(&self) -> bool {
        self.choices.iter().any(|c| !c.tool_calls.is_empty())
    }
}

/// Strategy trait for model providers
///
/// Implement this trait to add support for new model backends.
/// The engine works exclusively through this interface.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Generate a response for the conversation so far, offering `tools`
    async fn generate(
        &self,
        history: &[Message],
        tools: &[ToolSpec],
    ) -> std::result::Result<Response, ProviderError>;

    /// Provider name, for logs
    fn name(&self) -> &str;
}

/// Maps a model identifier to a ready-to-use provider
///
/// Injected into the engine so tests can substitute providers without any
/// network or credential configuration. Implementations must fail with
/// [`DecisionError::ProviderResolution`] rather than return a partially
/// initialized provider.
pub trait ProviderResolver: Send + Sync {
    fn resolve(&self, model: &str) -> Result<Arc<dyn ModelProvider>>;
}

impl<F> ProviderResolver for F
where
    F: Fn(&str) -> Result<Arc<dyn ModelProvider>> + Send + Sync,
{
    fn resolve(&self, model: &str) -> Result<Arc<dyn ModelProvider>> {
        self(model)
    }
}

/// Resolver that hands out the same provider for every model id
pub struct StaticResolver {
    provider: Arc<dyn ModelProvider>,
}

impl StaticResolver {
    pub fn new(provider: Arc<dyn ModelProvider>) -> Self {
        Self { provider }
    }
}

impl ProviderResolver for StaticResolver {
    fn resolve(&self, _model: &str) -> Result<Arc<dyn ModelProvider>> {
        Ok(Arc::clone(&self.provider))
    }
}

/// Resolver that rejects every model id
pub struct NoProviders;

impl ProviderResolver for NoProviders {
    fn resolve(&self, model: &str) -> Result<Arc<dyn ModelProvider>> {
        Err(DecisionError::ProviderResolution(format!(
            "model not found: {model}"
        )))
    }
}
