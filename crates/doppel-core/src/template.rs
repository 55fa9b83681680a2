//! Query Templates
//!
//! Turns model-supplied arguments into a backend-specific query string.
//! Templates use Jinja syntax (`{{ code }}`, `{{ filter|tojson }}`) and are
//! rendered in strict mode: referencing a key the model did not supply is an
//! error, never a silent blank.

use std::sync::OnceLock;

use minijinja::{Environment, UndefinedBehavior};
use serde_json::{Map, Value};
use thiserror::Error;

const TEMPLATE_NAME: &str = "query";

/// Template failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// The template source does not parse
    #[error("template syntax error: {0}")]
    Syntax(String),

    /// Rendering failed, usually because a referenced key is missing
    #[error("template render error: {0}")]
    Render(String),
}

/// A query template with a lazily compiled, shared renderer
///
/// The source is parsed on first use and the outcome (renderer or syntax
/// error) is kept for the lifetime of the template.
#[derive(Debug)]
pub struct QueryTemplate {
    source: String,
    compiled: OnceLock<Result<Environment<'static>, TemplateError>>,
}

impl QueryTemplate {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            compiled: OnceLock::new(),
        }
    }

    /// Raw template source
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Parse the template now instead of on first render
    pub fn check(&self) -> Result<(), TemplateError> {
        self.environment().map(|_| ())
    }

    /// Render the template against `params`
    pub fn render(&self, params: &Map<String, Value>) -> Result<String, TemplateError> {
        let env = self.environment()?;
        let template = env
            .get_template(TEMPLATE_NAME)
            .map_err(|e| TemplateError::Syntax(e.to_string()))?;

        template
            .render(params)
            .map_err(|e| TemplateError::Render(describe(&e)))
    }

    fn environment(&self) -> Result<&Environment<'static>, TemplateError> {
        self.compiled
            .get_or_init(|| compile(&self.source))
            .as_ref()
            .map_err(Clone::clone)
    }
}

impl Clone for QueryTemplate {
    fn clone(&self) -> Self {
        Self::new(self.source.clone())
    }
}

impl From<&str> for QueryTemplate {
    fn from(source: &str) -> Self {
        Self::new(source)
    }
}

impl From<String> for QueryTemplate {
    fn from(source: String) -> Self {
        Self::new(source)
    }
}

fn compile(source: &str) -> Result<Environment<'static>, TemplateError> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_keep_trailing_newline(true);
    env.add_template_owned(TEMPLATE_NAME, source.to_owned())
        .map_err(|e| TemplateError::Syntax(describe(&e)))?;
    Ok(env)
}

fn describe(err: &minijinja::Error) -> String {
    match err.detail() {
        Some(detail) => format!("{} ({detail})", err.kind()),
        None => err.kind().to_string(),
    }
}
