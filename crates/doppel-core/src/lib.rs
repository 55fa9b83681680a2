//! # doppel-core
//!
//! Tool-calling decision engine with a provider-agnostic model abstraction
//! and a runtime tool registry.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      DecisionEngine                           │
//! │  ┌─────────────┐  ┌──────────────┐  ┌──────────────────────┐  │
//! │  │  Decision   │  │ ToolRegistry │  │  ProviderResolver    │  │
//! │  │    Loop     │──│  + Query     │──│  -> ModelProvider    │  │
//! │  │             │  │   Templates  │  │     (Strategy)       │  │
//! │  └─────────────┘  └──────┬───────┘  └──────────────────────┘  │
//! │                          │                                    │
//! │                   DataSource (Strategy)                       │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Concrete providers and data sources live in `doppel-runtime`; this crate
//! only defines their contracts.

pub mod cancel;
pub mod datasource;
pub mod engine;
pub mod error;
pub mod message;
pub mod provider;
pub mod schema;
pub mod template;
pub mod tool;

#[cfg(test)]
mod testing;

pub use cancel::{CancelHandle, CancelSignal, cancel_pair};
pub use datasource::{DataSource, SourceError};
pub use engine::{DecisionEngine, DecisionEngineBuilder, EngineConfig, ToolFailurePolicy};
pub use error::{DecisionError, Result};
pub use message::{Conversation, Message, MessageContent, Role, ToolCallRequest, ToolResult};
pub use provider::{
    Choice, FinishReason, ModelProvider, NoProviders, ProviderError, ProviderResolver, Response,
    StaticResolver, TokenUsage, ToolSpec,
};
pub use template::{QueryTemplate, TemplateError};
pub use tool::{ToolDefinition, ToolRegistry};
