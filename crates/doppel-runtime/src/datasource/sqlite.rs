//! SQLite data source.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use doppel_core::{DataSource, SourceError};
use rusqlite::Connection;
use rusqlite::types::ValueRef;
use serde_json::{Map, Number, Value};

/// Relational source over a single SQLite connection.
///
/// Methods: `select` returns each row as a JSON object string, `execute`
/// returns the affected row count. `database` and `collection` are ignored.
#[derive(Default)]
pub struct SqliteSource {
    conn: Arc<Mutex<Option<Connection>>>,
}

impl SqliteSource {
    pub fn new() -> Self {
        Self::default()
    }

    async fn with_connection<T, F>(&self, f: F) -> Result<T, SourceError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, SourceError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().unwrap_or_else(PoisonError::into_inner);
            let conn = guard.as_ref().ok_or(SourceError::NotConnected)?;
            f(conn)
        })
        .await
        .map_err(|e| SourceError::Backend(format!("blocking task failed: {e}")))?
    }
}

fn invalid(err: &rusqlite::Error) -> SourceError {
    SourceError::InvalidQuery(err.to_string())
}

fn backend(err: &rusqlite::Error) -> SourceError {
    SourceError::Backend(err.to_string())
}

fn to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Value::String(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

fn select(conn: &Connection, sql: &str) -> Result<Vec<String>, SourceError> {
    let mut stmt = conn.prepare(sql).map_err(|e| invalid(&e))?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

    let mut rows = stmt.query([]).map_err(|e| backend(&e))?;
    let mut records = Vec::new();
    while let Some(row) = rows.next().map_err(|e| backend(&e))? {
        let mut object = Map::new();
        for (i, name) in columns.iter().enumerate() {
            let value = row.get_ref(i).map_err(|e| backend(&e))?;
            object.insert(name.clone(), to_json(value));
        }
        records.push(Value::Object(object).to_string());
    }
    Ok(records)
}

fn execute(conn: &Connection, sql: &str) -> Result<Vec<String>, SourceError> {
    let mut stmt = conn.prepare(sql).map_err(|e| invalid(&e))?;
    let affected = stmt.execute([]).map_err(|e| backend(&e))?;
    Ok(vec![affected.to_string()])
}

#[async_trait]
impl DataSource for SqliteSource {
    async fn connect(&self, target: &str) -> Result<(), SourceError> {
        let path = target.to_string();
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || -> Result<(), SourceError> {
            let opened = if path.is_empty() || path == ":memory:" {
                Connection::open_in_memory()
            } else {
                Connection::open(&path)
            }
            .map_err(|e| backend(&e))?;

            tracing::debug!(path = %path, "Opened SQLite database");
            *conn.lock().unwrap_or_else(PoisonError::into_inner) = Some(opened);
            Ok(())
        })
        .await
        .map_err(|e| SourceError::Backend(format!("blocking task failed: {e}")))?
    }

    async fn close(&self) -> Result<(), SourceError> {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            conn.lock().unwrap_or_else(PoisonError::into_inner).take();
        })
        .await
        .map_err(|e| SourceError::Backend(format!("blocking task failed: {e}")))
    }

    async fn query(
        &self,
        _database: &str,
        method: &str,
        _collection: &str,
        query: &str,
    ) -> Result<Vec<String>, SourceError> {
        let sql = query.to_string();
        match method {
            "select" => self.with_connection(move |conn| select(conn, &sql)).await,
            "execute" => self.with_connection(move |conn| execute(conn, &sql)).await,
            other => Err(SourceError::UnsupportedMethod(other.to_string())),
        }
    }

    fn kind(&self) -> &str {
        "sqlite"
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    async fn open() -> SqliteSource {
        let source = SqliteSource::new();
        source.connect(":memory:").await.unwrap();
        source
            .query(
                "",
                "execute",
                "",
                "CREATE TABLE products (id INTEGER PRIMARY KEY, name TEXT NOT NULL, price REAL)",
            )
            .await
            .unwrap();
        source
    }

    #[tokio::test]
    async fn execute_then_select() {
        let source = open().await;

        let inserted = source
            .query(
                "",
                "execute",
                "",
                "INSERT INTO products (name, price) VALUES ('lamp', 19.5), ('desk', NULL)",
            )
            .await
            .unwrap();
        assert_eq!(inserted, ["2"]);

        let rows = source
            .query("", "select", "", "SELECT id, name, price FROM products ORDER BY id")
            .await
            .unwrap();
        let rows: Vec<Value> = rows.iter().map(|r| serde_json::from_str(r).unwrap()).collect();
        assert_eq!(
            rows,
            [
                json!({"id": 1, "name": "lamp", "price": 19.5}),
                json!({"id": 2, "name": "desk", "price": null}),
            ]
        );
    }

    #[tokio::test]
    async fn errors_are_classified() {
        let source = open().await;

        assert!(matches!(
            source.query("", "select", "", "SELEC nonsense").await,
            Err(SourceError::InvalidQuery(_))
        ));
        assert_eq!(
            source.query("", "drop", "", "products").await,
            Err(SourceError::UnsupportedMethod("drop".into()))
        );
    }

    #[tokio::test]
    async fn requires_connection() {
        let source = SqliteSource::new();
        assert_eq!(
            source.query("", "select", "", "SELECT 1").await,
            Err(SourceError::NotConnected)
        );

        let source = open().await;
        source.close().await.unwrap();
        assert_eq!(
            source.query("", "select", "", "SELECT 1").await,
            Err(SourceError::NotConnected)
        );
    }
}
