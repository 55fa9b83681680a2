//! Server configuration and tool catalog loading

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use doppel_core::{
    DataSource, EngineConfig, SourceError, ToolDefinition, ToolFailurePolicy, schema,
};
use doppel_runtime::{DirectorySource, MemorySource, SqliteSource};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse tools file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to connect data source '{name}': {source}")]
    Connect {
        name: String,
        #[source]
        source: SourceError,
    },

    #[error("tool '{tool}' refers to unknown data source '{source_name}'")]
    UnknownSource { tool: String, source_name: String },
}

/// Process-level settings
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_addr: String,

    /// JSON file with data sources and tool definitions
    pub tools_file: Option<PathBuf>,

    /// Model used when a request does not name one
    pub default_model: String,

    pub max_iterations: Option<usize>,
    pub tool_failure: ToolFailurePolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".into(),
            tools_file: None,
            default_model: "gpt-4.1".into(),
            max_iterations: None,
            tool_failure: ToolFailurePolicy::Abort,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let max_iterations = match var("DOPPEL_MAX_ITERATIONS") {
            Some(raw) => Some(raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "DOPPEL_MAX_ITERATIONS",
                value: raw.clone(),
            })?),
            None => None,
        };

        let tool_failure = match var("DOPPEL_TOOL_FAILURE").as_deref().map(str::trim) {
            None | Some("abort") => ToolFailurePolicy::Abort,
            Some("report") => ToolFailurePolicy::ReportToModel,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    key: "DOPPEL_TOOL_FAILURE",
                    value: other.to_string(),
                });
            }
        };

        Ok(Self {
            bind_addr: var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            tools_file: var("DOPPEL_TOOLS_FILE").map(PathBuf::from),
            default_model: var("DOPPEL_DEFAULT_MODEL").unwrap_or(defaults.default_model),
            max_iterations,
            tool_failure,
        })
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            max_iterations: self.max_iterations,
            tool_failure: self.tool_failure,
            ..EngineConfig::default()
        }
    }
}

// ============================================================================
// Tools file
// ============================================================================

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Memory,
    Sqlite,
    Directory,
}

/// A named data source tools can bind to
#[derive(Debug, Deserialize)]
pub struct SourceEntry {
    pub name: String,
    pub kind: SourceKind,

    /// Connection target (a file path for SQLite, the root for a directory)
    #[serde(default)]
    pub connection: String,

    /// Initial documents for memory sources: database -> collection -> docs
    #[serde(default)]
    pub seed: BTreeMap<String, BTreeMap<String, Vec<Value>>>,
}

impl SourceEntry {
    async fn open(self) -> Result<(String, Arc<dyn DataSource>), ConfigError> {
        let source: Arc<dyn DataSource> = match self.kind {
            SourceKind::Memory => {
                let memory = MemorySource::new();
                for (database, collections) in self.seed {
                    for (collection, docs) in collections {
                        memory.insert_many(&database, &collection, docs);
                    }
                }
                Arc::new(memory)
            }
            SourceKind::Sqlite => {
                let sqlite = SqliteSource::new();
                sqlite
                    .connect(&self.connection)
                    .await
                    .map_err(|source| ConfigError::Connect {
                        name: self.name.clone(),
                        source,
                    })?;
                Arc::new(sqlite)
            }
            SourceKind::Directory => {
                let directory = DirectorySource::new();
                directory
                    .connect(&self.connection)
                    .await
                    .map_err(|source| ConfigError::Connect {
                        name: self.name.clone(),
                        source,
                    })?;
                Arc::new(directory)
            }
        };

        tracing::info!(name = %self.name, kind = source.kind(), "Opened data source");
        Ok((self.name, source))
    }
}

/// A tool as written in the tools file
#[derive(Debug, Deserialize)]
pub struct ToolEntry {
    pub name: String,
    pub description: String,
    #[serde(default = "schema::no_parameters")]
    pub parameters: Value,
    pub query: String,
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub collection: String,
    pub method: String,

    /// Name of the [`SourceEntry`] this tool queries
    pub source: String,
}

/// Opened sources and the tools bound to them
#[derive(Default)]
pub struct Catalog {
    pub sources: Vec<Arc<dyn DataSource>>,
    pub tools: Vec<ToolDefinition>,
}

impl Catalog {
    /// Close every source, logging failures
    pub async fn close(&self) {
        for source in &self.sources {
            if let Err(e) = source.close().await {
                tracing::warn!(kind = source.kind(), "Failed to close data source: {}", e);
            }
        }
    }
}

/// Contents of `DOPPEL_TOOLS_FILE`
#[derive(Debug, Default, Deserialize)]
pub struct ToolsFile {
    #[serde(default)]
    pub sources: Vec<SourceEntry>,
    #[serde(default)]
    pub tools: Vec<ToolEntry>,
}

impl ToolsFile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Open every source and bind each tool to its source
    pub async fn build(self) -> Result<Catalog, ConfigError> {
        let mut sources = HashMap::new();
        for entry in self.sources {
            let (name, source) = entry.open().await?;
            sources.insert(name, source);
        }

        let tools = self
            .tools
            .into_iter()
            .map(|entry| {
                let source = sources.get(&entry.source).cloned().ok_or_else(|| {
                    ConfigError::UnknownSource {
                        tool: entry.name.clone(),
                        source_name: entry.source.clone(),
                    }
                })?;

                Ok(ToolDefinition::new(entry.name, entry.description, source)
                    .parameters(entry.parameters)
                    .query(entry.query)
                    .database(entry.database)
                    .collection(entry.collection)
                    .method(entry.method))
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(Catalog {
            sources: sources.into_values().collect(),
            tools,
        })
    }
}
