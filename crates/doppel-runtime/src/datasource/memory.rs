//! In-memory document store
//!
//! Documents are JSON objects grouped by database and collection. Queries
//! are JSON filters matched by equality; dotted keys reach into nested
//! objects (`{"customer.city": "Lisbon"}`).

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use doppel_core::{DataSource, SourceError};
use serde_json::{Map, Value};

type Collections = BTreeMap<String, Vec<Value>>;

#[derive(Default)]
struct Store {
    connected: bool,
    databases: BTreeMap<String, Collections>,
}

/// Document store kept in process memory
///
/// Supported methods: `find`, `findOne`, `insert`, `count` and `list`.
/// A new source is already connected.
pub struct MemorySource {
    store: RwLock<Store>,
}

impl Default for MemorySource {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySource {
    pub fn new() -> Self {
        Self {
            store: RwLock::new(Store {
                connected: true,
                databases: BTreeMap::new(),
            }),
        }
    }

    /// Seed a collection. Non-object values are skipped.
    pub fn insert_many(
        &self,
        database: &str,
        collection: &str,
        documents: impl IntoIterator<Item = Value>,
    ) -> usize {
        let mut store = self.store.write().unwrap_or_else(PoisonError::into_inner);
        let docs = store
            .databases
            .entry(database.to_string())
            .or_default()
            .entry(collection.to_string())
            .or_default();

        let before = docs.len();
        docs.extend(documents.into_iter().filter(Value::is_object));
        docs.len() - before
    }

    fn find(store: &Store, database: &str, collection: &str, filter: &Map<String, Value>) -> Vec<String> {
        store
            .databases
            .get(database)
            .and_then(|c| c.get(collection))
            .map(|docs| {
                docs.iter()
                    .filter(|doc| matches(doc, filter))
                    .map(Value::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn parse_filter(query: &str) -> Result<Map<String, Value>, SourceError> {
    if query.trim().is_empty() {
        return Ok(Map::new());
    }
    match serde_json::from_str(query) {
        Ok(Value::Object(filter)) => Ok(filter),
        Ok(_) => Err(SourceError::InvalidQuery("filter must be a JSON object".into())),
        Err(e) => Err(SourceError::InvalidQuery(e.to_string())),
    }
}

fn matches(doc: &Value, filter: &Map<String, Value>) -> bool {
    filter
        .iter()
        .all(|(key, expected)| lookup(doc, key) == Some(expected))
}

fn lookup<'a>(doc: &'a Value, key: &str) -> Option<&'a Value> {
    key.split('.').try_fold(doc, |value, part| value.get(part))
}

#[async_trait]
impl DataSource for MemorySource {
    async fn connect(&self, target: &str) -> Result<(), SourceError> {
        tracing::debug!(uri = target, "Opening in-memory store");
        self.store
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .connected = true;
        Ok(())
    }

    async fn close(&self) -> Result<(), SourceError> {
        self.store
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .connected = false;
        Ok(())
    }

    async fn query(
        &self,
        database: &str,
        method: &str,
        collection: &str,
        query: &str,
    ) -> Result<Vec<String>, SourceError> {
        if !self
            .store
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .connected
        {
            return Err(SourceError::NotConnected);
        }

        match method {
            "find" => {
                let filter = parse_filter(query)?;
                let store = self.store.read().unwrap_or_else(PoisonError::into_inner);
                Ok(Self::find(&store, database, collection, &filter))
            }
            "findOne" => {
                let filter = parse_filter(query)?;
                let store = self.store.read().unwrap_or_else(PoisonError::into_inner);
                Self::find(&store, database, collection, &filter)
                    .into_iter()
                    .next()
                    .map(|doc| vec![doc])
                    .ok_or(SourceError::NoDocuments)
            }
            "count" => {
                let filter = parse_filter(query)?;
                let store = self.store.read().unwrap_or_else(PoisonError::into_inner);
                Ok(vec![Self::find(&store, database, collection, &filter).len().to_string()])
            }
            "insert" => {
                let documents = match serde_json::from_str(query) {
                    Ok(Value::Array(docs)) if docs.iter().all(Value::is_object) => docs,
                    Ok(doc @ Value::Object(_)) => vec![doc],
                    Ok(_) => {
                        return Err(SourceError::InvalidQuery(
                            "insert expects an object or an array of objects".into(),
                        ));
                    }
                    Err(e) => return Err(SourceError::InvalidQuery(e.to_string())),
                };
                Ok(vec![self.insert_many(database, collection, documents).to_string()])
            }
            "list" => {
                let store = self.store.read().unwrap_or_else(PoisonError::into_inner);
                Ok(store
                    .databases
                    .get(database)
                    .map(|c| c.keys().cloned().collect())
                    .unwrap_or_default())
            }
            other => Err(SourceError::UnsupportedMethod(other.to_string())),
        }
    }

    fn kind(&self) -> &str {
        "memory"
    }
}
