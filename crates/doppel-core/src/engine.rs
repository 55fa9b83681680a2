//! Decision Loop
//!
//! Drives the conversation between a model provider and the registered
//! tools: ask the model, run every tool it requests in order, feed the
//! results back, and stop once it answers without requesting a tool.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::cancel::CancelSignal;
use crate::error::{DecisionError, Result};
use crate::message::{Conversation, Message, ToolCallRequest};
use crate::provider::{ProviderError, ProviderResolver};
use crate::schema;
use crate::tool::{ToolDefinition, ToolRegistry};

/// What to do when a requested tool cannot be run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolFailurePolicy {
    /// Stop the decision and return the error to the caller
    #[default]
    Abort,
    /// Write the error into the tool result and let the model continue
    ReportToModel,
}

/// Engine configuration
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Maximum model calls per decision; `None` is unbounded
    pub max_iterations: Option<usize>,

    /// Check parsed arguments against the tool schema before rendering
    pub validate_arguments: bool,

    /// Handling of tool-side failures, fixed for every decision
    pub tool_failure: ToolFailurePolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_iterations: None,
            validate_arguments: true,
            tool_failure: ToolFailurePolicy::Abort,
        }
    }
}

/// The decision engine
pub struct DecisionEngine {
    resolver: Arc<dyn ProviderResolver>,
    tools: Arc<ToolRegistry>,
    config: EngineConfig,
}

impl DecisionEngine {
    /// Create a new engine
    pub fn new(
        resolver: Arc<dyn ProviderResolver>,
        tools: Arc<ToolRegistry>,
        config: EngineConfig,
    ) -> Self {
        Self {
            resolver,
            tools,
            config,
        }
    }

    /// Create with default configuration
    pub fn with_defaults(resolver: Arc<dyn ProviderResolver>, tools: Arc<ToolRegistry>) -> Self {
        Self::new(resolver, tools, EngineConfig::default())
    }

    pub fn builder() -> DecisionEngineBuilder {
        DecisionEngineBuilder::new()
    }

    /// Register a tool on the shared registry
    pub fn register_tool(&self, tool: ToolDefinition) -> Result<()> {
        self.tools.register(tool)
    }

    /// Answer `user` under `system` using `model`, calling tools as requested
    pub async fn decide(&self, system: &str, user: &str, model: &str) -> Result<String> {
        self.decide_with_cancel(system, user, model, &CancelSignal::never())
            .await
    }

    /// [`decide`](Self::decide), aborting with [`DecisionError::Cancelled`]
    /// once `cancel` fires
    #[tracing::instrument(skip(self, system, user, cancel), fields(model = %model))]
    pub async fn decide_with_cancel(
        &self,
        system: &str,
        user: &str,
        model: &str,
        cancel: &CancelSignal,
    ) -> Result<String> {
        let mut conversation = Conversation::with_instructions(system, user);
        self.run(&mut conversation, model, cancel).await
    }

    /// Run the loop over a caller-built conversation
    ///
    /// Every assistant tool-call and tool-result message is appended to
    /// `conversation`, in the order the provider requested the calls.
    pub async fn run(
        &self,
        conversation: &mut Conversation,
        model: &str,
        cancel: &CancelSignal,
    ) -> Result<String> {
        let provider = self.resolver.resolve(model)?;
        let catalog = self.tools.catalog();
        let mut iterations = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(DecisionError::Cancelled);
            }
            if let Some(max) = self.config.max_iterations {
                if iterations >= max {
                    return Err(DecisionError::LoopBudgetExceeded(max));
                }
            }
            iterations += 1;

            let response = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(DecisionError::Cancelled),
                result = provider.generate(conversation.messages(), &catalog) => result?,
            };

            if !response.has_tool_calls() {
                let choice = response.choices.into_iter().next().ok_or_else(|| {
                    ProviderError::InvalidResponse("response contained no choices".into())
                })?;
                tracing::info!(iterations, provider = provider.name(), "Decision reached");
                return Ok(choice.content);
            }

            for call in response.requested_tools() {
                // The model sees its own request on the next turn
                conversation.push(Message::tool_calls(vec![call.clone()]));

                let content = match self.call_tool(call, cancel).await {
                    Ok(records) => Value::from(records).to_string(),
                    Err(e)
                        if e.is_tool_failure()
                            && self.config.tool_failure == ToolFailurePolicy::ReportToModel =>
                    {
                        tracing::warn!(tool = %call.function_name, error = %e, "Tool failed, reporting to model");
                        format!("error: {e}")
                    }
                    Err(e) => return Err(e),
                };

                conversation.push(Message::tool_result(
                    &call.id,
                    &call.function_name,
                    content,
                ));
            }
        }
    }

    /// Resolve, parse, render and execute one tool call
    async fn call_tool(&self, call: &ToolCallRequest, cancel: &CancelSignal) -> Result<Vec<String>> {
        tracing::debug!(tool = %call.function_name, id = %call.id, "Executing tool");

        let tool = self
            .tools
            .resolve(&call.function_name)
            .ok_or_else(|| DecisionError::UnknownTool(call.function_name.clone()))?;

        let params = self.parse_arguments(&tool, &call.arguments)?;

        let query = tool
            .render_query(&params)
            .map_err(|source| DecisionError::TemplateRender {
                tool: tool.name.clone(),
                source,
            })?;

        let records = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(DecisionError::Cancelled),
            result = tool.run_query(&query) => result.map_err(|source| DecisionError::DataSourceQuery {
                tool: tool.name.clone(),
                source,
            })?,
        };

        tracing::debug!(tool = %tool.name, records = records.len(), "Tool returned");
        Ok(records)
    }

    /// Parse raw tool-call arguments into a parameter map
    ///
    /// A `null` payload means "no arguments". An empty payload does not parse.
    fn parse_arguments(&self, tool: &ToolDefinition, raw: &str) -> Result<Map<String, Value>> {
        let invalid = |reason: String| DecisionError::InvalidArguments {
            tool: tool.name.clone(),
            reason,
        };

        let value = serde_json::from_str::<Value>(raw).map_err(|e| invalid(e.to_string()))?;
        let value = match value {
            Value::Null => Value::Object(Map::new()),
            other => other,
        };

        if self.config.validate_arguments {
            schema::validate_arguments(&tool.parameters, &value)
                .map_err(|e| invalid(e.to_string()))?;
        }

        match value {
            Value::Object(map) => Ok(map),
            other => Err(invalid(format!("expected a JSON object, got {other}"))),
        }
    }

    /// Get the tool registry
    pub fn tools(&self) -> &Arc<ToolRegistry> {
        &self.tools
    }

    /// Get configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

/// Builder for [`DecisionEngine`]
pub struct DecisionEngineBuilder {
    resolver: Option<Arc<dyn ProviderResolver>>,
    tools: Option<Arc<ToolRegistry>>,
    pending: Vec<ToolDefinition>,
    config: EngineConfig,
}

impl Default for DecisionEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionEngineBuilder {
    pub fn new() -> Self {
        Self {
            resolver: None,
            tools: None,
            pending: Vec::new(),
            config: EngineConfig::default(),
        }
    }

    #[must_use]
    pub fn resolver<R: ProviderResolver + 'static>(mut self, resolver: R) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    #[must_use]
    pub fn shared_resolver(mut self, resolver: Arc<dyn ProviderResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Use an existing, possibly shared, registry
    #[must_use]
    pub fn registry(mut self, tools: Arc<ToolRegistry>) -> Self {
        self.tools = Some(tools);
        self
    }

    /// Register a tool when the engine is built
    #[must_use]
    pub fn tool(mut self, tool: ToolDefinition) -> Self {
        self.pending.push(tool);
        self
    }

    #[must_use]
    pub fn max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = Some(max);
        self
    }

    #[must_use]
    pub fn validate_arguments(mut self, enabled: bool) -> Self {
        self.config.validate_arguments = enabled;
        self
    }

    #[must_use]
    pub fn tool_failure(mut self, policy: ToolFailurePolicy) -> Self {
        self.config.tool_failure = policy;
        self
    }

    #[must_use]
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<DecisionEngine> {
        let resolver = self
            .resolver
            .ok_or_else(|| DecisionError::Config("Provider resolver is required".into()))?;
        let tools = self.tools.unwrap_or_default();
        for tool in self.pending {
            tools.register(tool)?;
        }

        Ok(DecisionEngine::new(resolver, tools, self.config))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::cancel::cancel_pair;
    use crate::datasource::DataSource;
    use crate::message::{MessageContent, Role};
    use crate::provider::{Choice, ModelProvider, Response, StaticResolver};
    use crate::template::TemplateError;
    use crate::testing::{EchoSource, ScriptedProvider};

    fn mock_tool(source: Arc<dyn DataSource>) -> ToolDefinition {
        ToolDefinition::new("mockFunction", "A function to interact with the Mock tool", source)
            .parameters(json!({
                "type": "object",
                "properties": {
                    "code": {"type": "string"}
                }
            }))
            .query("This is the sample code: {{ code }}")
            .method("get")
    }

    fn call(id: &str, name: &str, arguments: &str) -> Response {
        Response::tool_calls(vec![ToolCallRequest::new(id, name, arguments)])
    }

    fn engine_with(
        provider: Arc<ScriptedProvider>,
        tools: Vec<ToolDefinition>,
    ) -> DecisionEngineBuilder {
        let provider: Arc<dyn ModelProvider> = provider;
        tools
            .into_iter()
            .fold(DecisionEngine::builder().resolver(StaticResolver::new(provider)), |b, t| {
                b.tool(t)
            })
    }

    #[tokio::test]
    async fn plain_text_answer_without_tools() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(Response::text("LLMs response"))]));
        let engine = engine_with(provider.clone(), vec![]).build().unwrap();

        let answer = engine.decide("abc", "efg", "mock").await.unwrap();

        assert_eq!(answer, "LLMs response");
        assert_eq!(provider.calls(), 1);
        assert!(provider.catalogs()[0].is_empty());
    }

    #[tokio::test]
    async fn tool_call_round_trip() {
        let source = Arc::new(EchoSource::new());
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(call("123", "mockFunction", r#"{ "code": "abc" }"#)),
            Ok(Response::text("abc")),
        ]));
        let engine = engine_with(provider.clone(), vec![mock_tool(source.clone())])
            .build()
            .unwrap();

        let answer = engine.decide("abc", "efg", "mock").await.unwrap();

        assert_eq!(answer, "abc");
        assert_eq!(source.calls(), 1);
        assert_eq!(source.queries(), ["This is the sample code: abc"]);

        let histories = provider.histories();
        let second_turn = &histories[1];
        let roles: Vec<_> = second_turn.iter().map(|m| m.role).collect();
        assert_eq!(roles, [Role::System, Role::Human, Role::Assistant, Role::Tool]);
        assert_eq!(
            second_turn[3].content,
            MessageContent::ToolResult(crate::message::ToolResult {
                tool_call_id: "123".into(),
                name: "mockFunction".into(),
                content: r#"["This is the sample code: abc"]"#.into(),
            })
        );
        assert_eq!(provider.catalogs()[0][0].name, "mockFunction");
    }

    #[tokio::test]
    async fn unknown_tool_aborts_without_query() {
        let source = Arc::new(EchoSource::new());
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(call(
            "123",
            "functionMock",
            r#"{ "code": "abc" }"#,
        ))]));
        let engine = engine_with(provider, vec![mock_tool(source.clone())])
            .build()
            .unwrap();

        let err = engine.decide("abc", "efg", "mock").await.unwrap_err();

        assert!(matches!(err, DecisionError::UnknownTool(name) if name == "functionMock"));
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn provider_error_is_returned_immediately() {
        let source = Arc::new(EchoSource::new());
        let provider = Arc::new(ScriptedProvider::new(vec![Err(ProviderError::Network(
            "random error".into(),
        ))]));
        let engine = engine_with(provider.clone(), vec![mock_tool(source.clone())])
            .build()
            .unwrap();

        let err = engine.decide("abc", "efg", "mock").await.unwrap_err();

        assert!(matches!(err, DecisionError::Provider(ProviderError::Network(_))));
        assert_eq!(provider.calls(), 1);
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn unresolvable_model_fails_before_any_call() {
        let engine = DecisionEngine::builder()
            .resolver(crate::provider::NoProviders)
            .build()
            .unwrap();

        let err = engine.decide("abc", "efg", "gemini2.5-pro").await.unwrap_err();
        assert!(matches!(err, DecisionError::ProviderResolution(_)));
    }

    #[tokio::test]
    async fn malformed_arguments_are_rejected() {
        let source = Arc::new(EchoSource::new());
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(call(
            "123",
            "mockFunction",
            r#"{ "code": }"#,
        ))]));
        let engine = engine_with(provider, vec![mock_tool(source.clone())])
            .build()
            .unwrap();

        let err = engine.decide("abc", "efg", "mock").await.unwrap_err();

        assert!(matches!(err, DecisionError::InvalidArguments { .. }));
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn empty_arguments_do_not_parse() {
        let source = Arc::new(EchoSource::new());
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(call("1", "mockFunction", ""))]));
        let engine = engine_with(provider, vec![mock_tool(source.clone())])
            .build()
            .unwrap();

        let err = engine.decide("abc", "efg", "mock").await.unwrap_err();

        assert!(matches!(err, DecisionError::InvalidArguments { tool, .. } if tool == "mockFunction"));
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn null_arguments_mean_no_arguments() {
        let source = Arc::new(EchoSource::new());
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(call("1", "listAll", "null")),
            Ok(Response::text("done")),
        ]));
        let tool = ToolDefinition::new("listAll", "List everything", source.clone())
            .query("everything")
            .method("list");
        let engine = engine_with(provider, vec![tool]).build().unwrap();

        assert_eq!(engine.decide("abc", "efg", "mock").await.unwrap(), "done");
        assert_eq!(source.queries(), ["everything"]);
    }

    #[tokio::test]
    async fn arguments_are_checked_against_schema() {
        let strict_source = Arc::new(EchoSource::new());
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(call(
            "1",
            "mockFunction",
            r#"{"code": 42}"#,
        ))]));
        let strict = engine_with(provider, vec![mock_tool(strict_source.clone())])
            .build()
            .unwrap();
        let err = strict.decide("abc", "efg", "mock").await.unwrap_err();
        assert!(matches!(err, DecisionError::InvalidArguments { reason, .. } if reason.contains("/code")));
        assert_eq!(strict_source.calls(), 0);

        let lax_source = Arc::new(EchoSource::new());
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(call("1", "mockFunction", r#"{"code": 42}"#)),
            Ok(Response::text("done")),
        ]));
        let lax = engine_with(provider, vec![mock_tool(lax_source.clone())])
            .validate_arguments(false)
            .build()
            .unwrap();
        assert_eq!(lax.decide("abc", "efg", "mock").await.unwrap(), "done");
        assert_eq!(lax_source.queries(), ["This is the sample code: 42"]);
    }

    #[tokio::test]
    async fn template_failure_aborts() {
        let source = Arc::new(EchoSource::new());
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(call(
            "123",
            "mockFunction",
            r#"{ "code": "abc" }"#,
        ))]));
        let tool = mock_tool(source.clone()).query("{{ .co }");
        let engine = engine_with(provider, vec![tool]).build().unwrap();

        let err = engine.decide("abc", "efg", "mock").await.unwrap_err();

        assert!(matches!(
            err,
            DecisionError::TemplateRender { source: TemplateError::Syntax(_), .. }
        ));
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn data_source_failure_aborts() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(call(
            "123",
            "mockFunction",
            r#"{ "code": "abc" }"#,
        ))]));
        let engine = engine_with(provider.clone(), vec![mock_tool(Arc::new(EchoSource::failing()))])
            .build()
            .unwrap();

        let err = engine.decide("abc", "efg", "mock").await.unwrap_err();

        assert!(matches!(err, DecisionError::DataSourceQuery { .. }));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn report_policy_feeds_failures_back() {
        let source = Arc::new(EchoSource::failing());
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(call("1", "functionMock", "{}")),
            Ok(call("2", "mockFunction", r#"{"code": "abc"}"#)),
            Ok(Response::text("sorry, the lookup failed")),
        ]));
        let engine = engine_with(provider.clone(), vec![mock_tool(source.clone())])
            .tool_failure(ToolFailurePolicy::ReportToModel)
            .build()
            .unwrap();

        let answer = engine.decide("abc", "efg", "mock").await.unwrap();

        assert_eq!(answer, "sorry, the lookup failed");
        assert_eq!(source.calls(), 1);

        let last_turn = provider.histories().pop().unwrap();
        let results: Vec<_> = last_turn
            .iter()
            .filter_map(|m| match &m.content {
                MessageContent::ToolResult(r) => Some(r.content.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].starts_with("error: Unknown tool: functionMock"));
        assert!(results[1].starts_with("error: Data source error"));
    }

    #[tokio::test]
    async fn multiple_calls_run_in_response_order() {
        let source = Arc::new(EchoSource::new());
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(Response {
                choices: vec![
                    Choice::tool_calls(vec![
                        ToolCallRequest::new("a", "mockFunction", r#"{"code": "first"}"#),
                        ToolCallRequest::new("b", "mockFunction", r#"{"code": "second"}"#),
                    ]),
                    Choice::tool_calls(vec![ToolCallRequest::new(
                        "c",
                        "mockFunction",
                        r#"{"code": "third"}"#,
                    )]),
                ],
                usage: None,
            }),
            Ok(Response::text("done")),
        ]));
        let engine = engine_with(provider, vec![mock_tool(source.clone())])
            .build()
            .unwrap();

        let mut conversation = Conversation::with_instructions("abc", "efg");
        let answer = engine
            .run(&mut conversation, "mock", &CancelSignal::never())
            .await
            .unwrap();

        assert_eq!(answer, "done");
        assert_eq!(
            source.queries(),
            [
                "This is the sample code: first",
                "This is the sample code: second",
                "This is the sample code: third",
            ]
        );
        let ids: Vec<_> = conversation
            .messages()
            .iter()
            .filter_map(|m| match &m.content {
                MessageContent::ToolCalls { calls } => Some(format!("call:{}", calls[0].id)),
                MessageContent::ToolResult(r) => Some(format!("result:{}", r.tool_call_id)),
                MessageContent::Text { .. } => None,
            })
            .collect();
        assert_eq!(
            ids,
            ["call:a", "result:a", "call:b", "result:b", "call:c", "result:c"]
        );
    }

    #[tokio::test]
    async fn empty_response_is_a_provider_error() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(Response::default())]));
        let engine = engine_with(provider, vec![]).build().unwrap();

        let err = engine.decide("abc", "efg", "mock").await.unwrap_err();
        assert!(matches!(err, DecisionError::Provider(ProviderError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn loop_budget_is_enforced() {
        let source = Arc::new(EchoSource::new());
        let provider = Arc::new(ScriptedProvider::new(
            (0..5)
                .map(|i| Ok(call(&i.to_string(), "mockFunction", r#"{"code": "x"}"#)))
                .collect(),
        ));
        let engine = engine_with(provider.clone(), vec![mock_tool(source.clone())])
            .max_iterations(3)
            .build()
            .unwrap();

        let err = engine.decide("abc", "efg", "mock").await.unwrap_err();

        assert!(matches!(err, DecisionError::LoopBudgetExceeded(3)));
        assert_eq!(provider.calls(), 3);
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test]
    async fn cancelled_before_start() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(Response::text("never"))]));
        let engine = engine_with(provider.clone(), vec![]).build().unwrap();
        let (handle, signal) = cancel_pair();
        handle.cancel();

        let err = engine
            .decide_with_cancel("abc", "efg", "mock", &signal)
            .await
            .unwrap_err();

        assert!(matches!(err, DecisionError::Cancelled));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn cancel_interrupts_provider_wait() {
        let provider = Arc::new(
            ScriptedProvider::new(vec![Ok(Response::text("too late"))])
                .with_delay(Duration::from_secs(30)),
        );
        let engine = engine_with(provider, vec![]).build().unwrap();
        let (handle, signal) = cancel_pair();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            handle.cancel();
        });
        let result = tokio::time::timeout(
            Duration::from_secs(5),
            engine.decide_with_cancel("abc", "efg", "mock", &signal),
        )
        .await
        .expect("cancellation should be prompt");

        assert!(matches!(result, Err(DecisionError::Cancelled)));
    }

    #[tokio::test]
    async fn cancel_interrupts_data_source_query() {
        let source = Arc::new(EchoSource::new().with_delay(Duration::from_secs(30)));
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(call("1", "mockFunction", r#"{"code": "abc"}"#)),
            Ok(Response::text("too late")),
        ]));
        let engine = engine_with(provider.clone(), vec![mock_tool(source.clone())])
            .build()
            .unwrap();
        let (handle, signal) = cancel_pair();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            handle.cancel();
        });
        let result = tokio::time::timeout(
            Duration::from_secs(5),
            engine.decide_with_cancel("abc", "efg", "mock", &signal),
        )
        .await
        .expect("cancellation should be prompt");

        assert!(matches!(result, Err(DecisionError::Cancelled)));
        assert_eq!(source.calls(), 1);
        assert_eq!(provider.calls(), 1);
    }

    #[test]
    fn builder_requires_resolver() {
        let err = DecisionEngine::builder().build().err().unwrap();
        assert!(matches!(err, DecisionError::Config(_)));
    }

    #[test]
    fn builder_rejects_invalid_tools() {
        let provider: Arc<dyn ModelProvider> = Arc::new(ScriptedProvider::new(vec![]));
        let err = DecisionEngine::builder()
            .resolver(StaticResolver::new(provider))
            .tool(mock_tool(Arc::new(EchoSource::new())).parameters(json!({
                "type": "object",
                "properties": {"code": ""}
            })))
            .build()
            .err()
            .unwrap();

        assert!(matches!(err, DecisionError::SchemaValidation(_)));
    }
}
