//! Error Types

use thiserror::Error;

use crate::datasource::SourceError;
use crate::provider::ProviderError;
use crate::template::TemplateError;

/// Result type alias for decision operations
pub type Result<T> = std::result::Result<T, DecisionError>;

/// Decision engine error types
///
/// Every variant is terminal for the `decide` call that produced it.
#[derive(Error, Debug)]
pub enum DecisionError {
    /// Parameter schema of a tool definition is malformed
    #[error("Schema validation error: {0}")]
    SchemaValidation(String),

    /// No provider could be built for the requested model
    #[error("Provider resolution error: {0}")]
    ProviderResolution(String),

    /// The generation call failed
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The model requested a tool that is not registered
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Tool-call arguments could not be parsed or did not match the schema
    #[error("Invalid arguments for tool '{tool}': {reason}")]
    InvalidArguments { tool: String, reason: String },

    /// The tool's query template failed to parse or render
    #[error("Template error in tool '{tool}': {source}")]
    TemplateRender {
        tool: String,
        #[source]
        source: TemplateError,
    },

    /// The bound data source rejected the query
    #[error("Data source error in tool '{tool}': {source}")]
    DataSourceQuery {
        tool: String,
        #[source]
        source: SourceError,
    },

    /// Caller requested an abort
    #[error("Decision cancelled")]
    Cancelled,

    /// Configured iteration budget exhausted
    #[error("Loop budget exceeded after {0} model calls")]
    LoopBudgetExceeded(usize),

    /// Engine configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DecisionError {
    /// Stable machine-readable tag for the error kind
    pub const fn code(&self) -> &'static str {
        match self {
            Self::SchemaValidation(_) => "SCHEMA_VALIDATION",
            Self::ProviderResolution(_) => "PROVIDER_RESOLUTION",
            Self::Provider(_) => "PROVIDER",
            Self::UnknownTool(_) => "UNKNOWN_TOOL",
            Self::InvalidArguments { .. } => "INVALID_ARGUMENTS",
            Self::TemplateRender { .. } => "TEMPLATE_RENDER",
            Self::DataSourceQuery { .. } => "DATA_SOURCE_QUERY",
            Self::Cancelled => "CANCELLED",
            Self::LoopBudgetExceeded(_) => "LOOP_BUDGET_EXCEEDED",
            Self::Config(_) => "CONFIG",
        }
    }

    /// Whether the error comes from executing a tool rather than from the
    /// model or the caller.
    pub const fn is_tool_failure(&self) -> bool {
        matches!(
            self,
            Self::UnknownTool(_)
                | Self::InvalidArguments { .. }
                | Self::TemplateRender { .. }
                | Self::DataSourceQuery { .. }
        )
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::ProviderResolution(model) => format!("The model '{model}' is not supported."),
            Self::Provider(e) if e.is_retryable() => {
                "The AI service is currently unavailable. Please try again.".into()
            }
            Self::Provider(e) => format!("The AI service encountered an error: {e}"),
            Self::UnknownTool(name) => format!("The tool '{name}' is not available."),
            Self::InvalidArguments { tool, .. } => {
                format!("The model sent invalid input to the tool '{tool}'.")
            }
            Self::TemplateRender { tool, .. } => {
                format!("The query for tool '{tool}' could not be built.")
            }
            Self::DataSourceQuery { tool, .. } => format!("The tool '{tool}' failed to run."),
            Self::Cancelled => "The request was cancelled.".into(),
            Self::LoopBudgetExceeded(_) => {
                "The request took too long to process. Please try a simpler query.".into()
            }
            Self::SchemaValidation(_) | Self::Config(_) => "An unexpected error occurred.".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_failures_are_classified() {
        assert!(DecisionError::UnknownTool("x".into()).is_tool_failure());
        assert!(
            DecisionError::DataSourceQuery {
                tool: "x".into(),
                source: SourceError::UnsupportedMethod("drop".into()),
            }
            .is_tool_failure()
        );
        assert!(!DecisionError::Cancelled.is_tool_failure());
        assert!(!DecisionError::Provider(ProviderError::RateLimited("slow down".into())).is_tool_failure());
    }

    #[test]
    fn user_message_hides_retryable_details() {
        let err = DecisionError::Provider(ProviderError::Network("connection reset".into()));
        assert_eq!(
            err.user_message(),
            "The AI service is currently unavailable. Please try again."
        );
        assert_eq!(err.code(), "PROVIDER");
    }
}
