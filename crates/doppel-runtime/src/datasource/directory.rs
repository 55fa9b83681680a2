//! Object store over a local directory
//!
//! The connection target is the root directory. Objects are the regular
//! files below it, named by their `/`-separated path relative to the root.

use std::path::{Component, Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use doppel_core::{DataSource, SourceError};

/// Object store backed by a directory tree
///
/// Methods: `list` returns every object name (the query, when not empty, is
/// a name prefix), `get` returns the body of the object named by the query.
/// `database` and `collection` are ignored.
#[derive(Default)]
pub struct DirectorySource {
    root: RwLock<Option<PathBuf>>,
}

impl DirectorySource {
    pub fn new() -> Self {
        Self::default()
    }

    fn root(&self) -> Result<PathBuf, SourceError> {
        self.root
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(SourceError::NotConnected)
    }

    async fn list(root: &Path, prefix: &str) -> Result<Vec<String>, SourceError> {
        let mut names = Vec::new();
        let mut pending = vec![root.to_path_buf()];

        while let Some(dir) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir).await.map_err(|e| io_error(&e))?;
            while let Some(entry) = entries.next_entry().await.map_err(|e| io_error(&e))? {
                let path = entry.path();
                let file_type = entry.file_type().await.map_err(|e| io_error(&e))?;
                if file_type.is_dir() {
                    pending.push(path);
                } else if file_type.is_file() {
                    names.extend(object_name(root, &path).filter(|n| n.starts_with(prefix)));
                }
            }
        }

        names.sort();
        Ok(names)
    }

    async fn get(root: &Path, name: &str) -> Result<Vec<String>, SourceError> {
        let path = root.join(checked_name(name)?);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(vec![String::from_utf8_lossy(&bytes).into_owned()]),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(SourceError::NoDocuments),
            Err(e) => Err(io_error(&e)),
        }
    }
}

fn io_error(err: &std::io::Error) -> SourceError {
    SourceError::Backend(err.to_string())
}

fn object_name(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Option<Vec<&str>> = relative.components().map(|c| c.as_os_str().to_str()).collect();
    Some(parts?.join("/"))
}

/// Object names must stay inside the root
fn checked_name(name: &str) -> Result<&Path, SourceError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(SourceError::InvalidQuery("object name is empty".into()));
    }

    let path = Path::new(name);
    if path
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
    {
        Ok(path)
    } else {
        Err(SourceError::InvalidQuery(format!(
            "object name escapes the store: {name}"
        )))
    }
}

#[async_trait]
impl DataSource for DirectorySource {
    async fn connect(&self, target: &str) -> Result<(), SourceError> {
        let root = PathBuf::from(target);
        let metadata = tokio::fs::metadata(&root).await.map_err(|e| io_error(&e))?;
        if !metadata.is_dir() {
            return Err(SourceError::Backend(format!("not a directory: {target}")));
        }

        tracing::debug!(root = %root.display(), "Opened directory store");
        *self.root.write().unwrap_or_else(PoisonError::into_inner) = Some(root);
        Ok(())
    }

    async fn close(&self) -> Result<(), SourceError> {
        self.root.write().unwrap_or_else(PoisonError::into_inner).take();
        Ok(())
    }

    async fn query(
        &self,
        _database: &str,
        method: &str,
        _collection: &str,
        query: &str,
    ) -> Result<Vec<String>, SourceError> {
        let root = self.root()?;
        match method {
            "list" => Self::list(&root, query.trim()).await,
            "get" => Self::get(&root, query).await,
            other => Err(SourceError::UnsupportedMethod(other.to_string())),
        }
    }

    fn kind(&self) -> &str {
        "directory"
    }
}
