//! Scripted providers and echo sources shared by the unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::datasource::{DataSource, SourceError};
use crate::message::Message;
use crate::provider::{ModelProvider, ProviderError, Response, ToolSpec};

/// Provider that replays a fixed list of responses and records every history
/// it was called with.
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<Result<Response, ProviderError>>>,
    seen: Mutex<Vec<Vec<Message>>>,
    catalogs: Mutex<Vec<Vec<ToolSpec>>>,
    delay: Option<Duration>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<Result<Response, ProviderError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            seen: Mutex::new(Vec::new()),
            catalogs: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Sleep before answering, to leave room for cancellation
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn histories(&self) -> Vec<Vec<Message>> {
        self.seen.lock().unwrap().clone()
    }

    pub fn catalogs(&self) -> Vec<Vec<ToolSpec>> {
        self.catalogs.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    async fn generate(
        &self,
        history: &[Message],
        tools: &[ToolSpec],
    ) -> Result<Response, ProviderError> {
        self.seen.lock().unwrap().push(history.to_vec());
        self.catalogs.lock().unwrap().push(tools.to_vec());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::InvalidResponse("script exhausted".into())))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Source that returns its query string as the only record
#[derive(Default)]
pub struct EchoSource {
    fail: bool,
    delay: Option<Duration>,
    queries: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl EchoSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl DataSource for EchoSource {
    async fn connect(&self, _target: &str) -> Result<(), SourceError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), SourceError> {
        Ok(())
    }

    async fn query(
        &self,
        _database: &str,
        _method: &str,
        _collection: &str,
        query: &str,
    ) -> Result<Vec<String>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(SourceError::Backend("Mock Error".into()));
        }
        Ok(vec![query.to_string()])
    }

    fn kind(&self) -> &str {
        "mock"
    }
}
