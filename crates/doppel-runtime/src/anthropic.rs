//! Anthropic Messages API provider.

use std::borrow::Cow;

use async_trait::async_trait;
use doppel_core::{
    Choice, FinishReason, Message, MessageContent, ModelProvider, ProviderError, Response, Role,
    TokenUsage, ToolCallRequest, ToolSpec,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::GenerationOptions;
use crate::http;

const ANTHROPIC_VERSION: &str = "2023-06-01";

// ─────────────────────────────────────────────────────────────────────────────
// API Wire Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ApiTool<'a>>,
}

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: &'static str,
    content: Vec<ApiContentBlock>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
    },
}

#[derive(Debug, Serialize)]
struct ApiTool<'a> {
    name: &'a str,
    description: &'a str,
    input_schema: Cow<'a, Value>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    content: Vec<ApiResponseBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiResponseBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    input_tokens: u32,
    output_tokens: u32,
}

// ─────────────────────────────────────────────────────────────────────────────
// Provider
// ─────────────────────────────────────────────────────────────────────────────

/// Anthropic Messages API provider.
pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    options: GenerationOptions,
}

impl AnthropicProvider {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.anthropic.com".into(),
            model: model.into(),
            options: GenerationOptions::default(),
        }
    }

    #[must_use]
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Split the history into the top-level system prompt and the turns.
    ///
    /// Consecutive messages with the same wire role are merged, since tool
    /// results travel as user turns.
    fn convert_messages(messages: &[Message]) -> (Option<String>, Vec<ApiMessage>) {
        let mut system = Vec::new();
        let mut turns: Vec<ApiMessage> = Vec::new();

        for m in messages {
            let (role, blocks) = match (&m.role, &m.content) {
                (Role::System, MessageContent::Text { text }) => {
                    system.push(text.as_str());
                    continue;
                }
                (Role::Assistant, MessageContent::Text { text }) => {
                    ("assistant", vec![ApiContentBlock::Text { text: text.clone() }])
                }
                (_, MessageContent::Text { text }) => {
                    ("user", vec![ApiContentBlock::Text { text: text.clone() }])
                }
                (_, MessageContent::ToolCalls { calls }) => (
                    "assistant",
                    calls
                        .iter()
                        .map(|c| ApiContentBlock::ToolUse {
                            id: c.id.clone(),
                            name: c.function_name.clone(),
                            input: tool_input(&c.arguments),
                        })
                        .collect(),
                ),
                (_, MessageContent::ToolResult(result)) => (
                    "user",
                    vec![ApiContentBlock::ToolResult {
                        tool_use_id: result.tool_call_id.clone(),
                        content: result.content.clone(),
                    }],
                ),
            };

            match turns.last_mut() {
                Some(last) if last.role == role => last.content.extend(blocks),
                _ => turns.push(ApiMessage {
                    role,
                    content: blocks,
                }),
            }
        }

        let system = (!system.is_empty()).then(|| system.join("\n\n"));
        (system, turns)
    }

    fn convert_tools(tools: &[ToolSpec]) -> Vec<ApiTool<'_>> {
        tools
            .iter()
            .map(|t| ApiTool {
                name: &t.name,
                description: &t.description,
                input_schema: input_schema(&t.parameters),
            })
            .collect()
    }

    fn convert_response(response: ApiResponse) -> Response {
        let mut text = String::new();
        let mut tool_calls = Vec::new();

        for block in response.content {
            match block {
                ApiResponseBlock::Text { text: part } => text.push_str(&part),
                ApiResponseBlock::ToolUse { id, name, input } => {
                    tool_calls.push(ToolCallRequest::new(id, name, input.to_string()));
                }
                ApiResponseBlock::Unknown => {}
            }
        }

        let finish_reason = response.stop_reason.as_deref().map(|reason| match reason {
            "end_turn" | "stop_sequence" => FinishReason::Stop,
            "max_tokens" => FinishReason::Length,
            "tool_use" => FinishReason::ToolUse,
            _ => FinishReason::Error,
        });

        Response {
            choices: vec![Choice {
                content: text,
                tool_calls,
                finish_reason,
            }],
            usage: response.usage.map(|u| TokenUsage {
                prompt_tokens: u.input_tokens,
                completion_tokens: u.output_tokens,
                total_tokens: u.input_tokens + u.output_tokens,
            }),
        }
    }
}

/// Tool-use input must be a JSON object on the wire
/// The Messages API rejects tool schemas whose `type` is not `"object"`.
fn input_schema(parameters: &Value) -> Cow<'_, Value> {
    match parameters {
        Value::Object(schema) if schema.get("type").is_none() => {
            let mut schema = schema.clone();
            schema.insert("type".into(), Value::String("object".into()));
            schema
                .entry("properties")
                .or_insert_with(|| Value::Object(Map::new()));
            Cow::Owned(Value::Object(schema))
        }
        _ => Cow::Borrowed(parameters),
    }
}

fn tool_input(arguments: &str) -> Value {
    match serde_json::from_str(arguments) {
        Ok(Value::Object(map)) => Value::Object(map),
        Ok(Value::Null) => Value::Object(Map::new()),
        _ => {
            tracing::warn!(arguments = %arguments, "Replaying malformed tool arguments as an empty object");
            Value::Object(Map::new())
        }
    }
}

#[async_trait]
impl ModelProvider for AnthropicProvider {
    async fn generate(
        &self,
        history: &[Message],
        tools: &[ToolSpec],
    ) -> Result<Response, ProviderError> {
        let (system, messages) = Self::convert_messages(history);
        let request = ApiRequest {
            model: &self.model,
            max_tokens: self.options.max_tokens,
            temperature: self.options.temperature,
            messages,
            system,
            tools: Self::convert_tools(tools),
        };

        tracing::debug!(model = %self.model, messages = history.len(), "Calling Anthropic");

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| http::transport_error(&e))?;
        let response = http::check_status(response).await?;

        let body: ApiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        Ok(Self::convert_response(body))
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}
