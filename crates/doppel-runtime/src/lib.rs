//! # doppel-runtime
//!
//! Concrete model providers, provider resolution and data sources for the
//! doppel decision engine.
//!
//! ## Providers
//!
//! - **OpenAI**: Chat Completions API (`gpt*`, `o1*`, `o3*`, `o4*` models)
//! - **Anthropic**: Messages API (`claude*` models)
//!
//! ## Data sources
//!
//! - **Memory**: in-process JSON document store
//! - **Directory**: object store over a local directory (`list`, `get`)
//! - **SQLite** (feature `sqlite`, default): relational queries via `rusqlite`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use doppel_runtime::{MemorySource, PrefixResolver};
//!
//! let engine = DecisionEngine::builder()
//!     .resolver(PrefixResolver::from_env()?)
//!     .tool(ToolDefinition::new("findOrder", "Look up an order", Arc::new(MemorySource::new())))
//!     .build()?;
//! let answer = engine.decide(system, prompt, "gpt-4.1").await?;
//! ```

pub mod anthropic;
pub mod config;
pub mod datasource;
mod http;
pub mod openai;
pub mod resolver;

pub use anthropic::AnthropicProvider;
pub use config::{GenerationOptions, ProviderConfig};
pub use datasource::{DirectorySource, MemorySource};
#[cfg(feature = "sqlite")]
pub use datasource::SqliteSource;
pub use openai::OpenAiProvider;
pub use resolver::{PrefixResolver, ProviderFamily};

// Re-export core types for convenience
pub use doppel_core::{
    DataSource, DecisionEngine, DecisionError, ModelProvider, ProviderResolver, Result,
    ToolDefinition, ToolRegistry,
};
