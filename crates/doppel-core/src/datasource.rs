//! Data Source Contract
//!
//! The uniform query capability every tool is bound to. Concrete backends
//! (document stores, object stores, relational stores) live outside the core.

use async_trait::async_trait;
use thiserror::Error;

/// Failure reported by a data source
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// `query` called before `connect` or after `close`
    #[error("data source is not connected")]
    NotConnected,

    /// The backend does not implement the requested method
    #[error("method not supported: {0}")]
    UnsupportedMethod(String),

    /// The rendered query is not valid for this backend
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// A single-record lookup matched nothing
    #[error("no documents matched the query")]
    NoDocuments,

    /// Any other backend failure
    #[error("backend error: {0}")]
    Backend(String),
}

/// Data source trait (Strategy pattern)
///
/// Semantics of `database`, `method` and `collection` are owned by each
/// backend. A document store might read `method = "find"`, a relational store
/// `method = "select"` with an empty collection.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Open the connection described by `target`
    async fn connect(&self, target: &str) -> Result<(), SourceError>;

    /// Release the connection
    async fn close(&self) -> Result<(), SourceError>;

    /// Run a rendered query and return the matching records
    async fn query(
        &self,
        database: &str,
        method: &str,
        collection: &str,
        query: &str,
    ) -> Result<Vec<String>, SourceError>;

    /// Backend family tag, informational only
    fn kind(&self) -> &str;
}
