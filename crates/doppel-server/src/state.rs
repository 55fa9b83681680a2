//! Application State

use std::sync::Arc;

use doppel_core::DecisionEngine;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Decision engine with the loaded tool registry
    pub engine: Arc<DecisionEngine>,

    /// Model used when a request does not name one
    pub default_model: Arc<str>,
}
