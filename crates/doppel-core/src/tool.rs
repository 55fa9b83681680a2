//! Tool System
//!
//! A tool is a named, schema-described query bound to one data source.
//! Tools are registered at runtime and resolved by name from the decision
//! loop.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::{Map, Value};

use crate::datasource::{DataSource, SourceError};
use crate::error::{DecisionError, Result};
use crate::provider::ToolSpec;
use crate::schema;
use crate::template::{QueryTemplate, TemplateError};

/// Tool definition: what the model sees plus how the call is routed
pub struct ToolDefinition {
    /// Unique tool identifier
    pub name: String,

    /// Human-readable description (shown to the model)
    pub description: String,

    /// JSON schema of the accepted arguments
    pub parameters: Value,

    /// Query rendered from the arguments
    pub query: QueryTemplate,

    /// Backend routing, interpreted by the bound source
    pub database: String,
    pub collection: String,
    pub method: String,

    /// Source the rendered query runs against
    pub source: Arc<dyn DataSource>,
}

impl ToolDefinition {
    /// New tool that takes no arguments and has an empty query
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        source: Arc<dyn DataSource>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: schema::no_parameters(),
            query: QueryTemplate::new(""),
            database: String::new(),
            collection: String::new(),
            method: String::new(),
            source,
        }
    }

    #[must_use]
    pub fn parameters(mut self, schema: Value) -> Self {
        self.parameters = schema;
        self
    }

    #[must_use]
    pub fn query(mut self, template: impl Into<String>) -> Self {
        self.query = QueryTemplate::new(template);
        self
    }

    #[must_use]
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    #[must_use]
    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    #[must_use]
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    /// Catalog projection shown to the model. Routing fields stay private.
    pub fn spec(&self) -> ToolSpec {
        ToolSpec::function(&self.name, &self.description, self.parameters.clone())
    }

    /// Render this tool's query for the given arguments
    pub fn render_query(&self, params: &Map<String, Value>) -> std::result::Result<String, TemplateError> {
        self.query.render(params)
    }

    /// Run an already rendered query against the bound source
    pub async fn run_query(&self, query: &str) -> std::result::Result<Vec<String>, SourceError> {
        self.source
            .query(&self.database, &self.method, &self.collection, query)
            .await
    }

    /// Render and run in one step
    pub async fn execute(&self, params: &Map<String, Value>) -> Result<Vec<String>> {
        let query = self
            .render_query(params)
            .map_err(|source| DecisionError::TemplateRender {
                tool: self.name.clone(),
                source,
            })?;

        self.run_query(&query)
            .await
            .map_err(|source| DecisionError::DataSourceQuery {
                tool: self.name.clone(),
                source,
            })
    }
}

impl std::fmt::Debug for ToolDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDefinition")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("parameters", &self.parameters)
            .field("query", &self.query.source())
            .field("database", &self.database)
            .field("collection", &self.collection)
            .field("method", &self.method)
            .field("source", &self.source.kind())
            .finish()
    }
}

/// Registry for available tools
///
/// Shared behind an `Arc` by every concurrent decision; registration and
/// lookup go through an internal lock, so callers never lock externally.
#[derive(Default)]
pub struct ToolRegistry {
    tools: RwLock<BTreeMap<String, Arc<ToolDefinition>>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any tool with the same name
    ///
    /// Fails with [`DecisionError::SchemaValidation`] when the parameter
    /// schema is malformed; nothing is stored in that case.
    pub fn register(&self, tool: ToolDefinition) -> Result<()> {
        schema::validate_schema(&tool.parameters).map_err(|e| {
            DecisionError::SchemaValidation(format!("tool '{}': {e}", tool.name))
        })?;

        let name = tool.name.clone();
        let previous = self
            .tools
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.clone(), Arc::new(tool));

        if previous.is_some() {
            tracing::debug!(tool = %name, "Replaced tool definition");
        } else {
            tracing::debug!(tool = %name, "Registered tool");
        }
        Ok(())
    }

    /// Get a tool by exact name. `None` means not registered.
    pub fn resolve(&self, name: &str) -> Option<Arc<ToolDefinition>> {
        self.tools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// All registered tools, ordered by name
    pub fn all(&self) -> Vec<Arc<ToolDefinition>> {
        self.tools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    /// Catalog sent to the model on every turn
    pub fn catalog(&self) -> Vec<ToolSpec> {
        self.all().iter().map(|t| t.spec()).collect()
    }

    /// Get tool names
    pub fn names(&self) -> Vec<String> {
        self.tools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
