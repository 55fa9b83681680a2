//! OpenAI Model Provider
//!
//! Implementation of `ModelProvider` for the Chat Completions API and any
//! server compatible with it.

use async_trait::async_trait;
use doppel_core::{
    Choice, FinishReason, Message, MessageContent, ModelProvider, ProviderError, Response, Role,
    TokenUsage, ToolCallRequest, ToolSpec,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::GenerationOptions;
use crate::http;

// ─────────────────────────────────────────────────────────────────────────────
// API Wire Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ApiTool<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<ApiToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolCall {
    id: String,
    #[serde(rename = "type", default)]
    kind: String,
    function: ApiFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Serialize)]
struct ApiTool<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: ApiFunction<'a>,
}

#[derive(Debug, Serialize)]
struct ApiFunction<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a Value,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

// ─────────────────────────────────────────────────────────────────────────────
// Provider
// ─────────────────────────────────────────────────────────────────────────────

/// OpenAI chat completions provider
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    options: GenerationOptions,
}

impl OpenAiProvider {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".into(),
            model: model.into(),
            options: GenerationOptions::default(),
        }
    }

    /// Reuse an existing HTTP client (and its timeout)
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

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Convert conversation messages to the wire format
    fn convert_messages(messages: &[Message]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| {
                let role = match m.role {
                    Role::System => "system",
                    Role::Human => "user",
                    Role::Assistant => "assistant",
                    Role::Tool => "tool",
                }
                .to_string();

                match &m.content {
                    MessageContent::Text { text } => ApiMessage {
                        role,
                        content: Some(text.clone()),
                        tool_calls: Vec::new(),
                        tool_call_id: None,
                    },
                    MessageContent::ToolCalls { calls } => ApiMessage {
                        role,
                        content: None,
                        tool_calls: calls
                            .iter()
                            .map(|c| ApiToolCall {
                                id: c.id.clone(),
                                kind: "function".into(),
                                function: ApiFunctionCall {
                                    name: c.function_name.clone(),
                                    arguments: c.arguments.clone(),
                                },
                            })
                            .collect(),
                        tool_call_id: None,
                    },
                    MessageContent::ToolResult(result) => ApiMessage {
                        role,
                        content: Some(result.content.clone()),
                        tool_calls: Vec::new(),
                        tool_call_id: Some(result.tool_call_id.clone()),
                    },
                }
            })
            .collect()
    }

    fn convert_tools(tools: &[ToolSpec]) -> Vec<ApiTool<'_>> {
        tools
            .iter()
            .map(|t| ApiTool {
                kind: "function",
                function: ApiFunction {
                    name: &t.name,
                    description: &t.description,
                    parameters: &t.parameters,
                },
            })
            .collect()
    }

    /// Convert a wire response into the engine's response
    fn convert_response(response: ApiResponse) -> Response {
        let choices = response
            .choices
            .into_iter()
            .map(|c| Choice {
                content: c.message.content.unwrap_or_default(),
                tool_calls: c
                    .message
                    .tool_calls
                    .into_iter()
                    .map(|call| {
                        ToolCallRequest::new(call.id, call.function.name, call.function.arguments)
                    })
                    .collect(),
                finish_reason: c.finish_reason.as_deref().map(|reason| match reason {
                    "stop" => FinishReason::Stop,
                    "length" => FinishReason::Length,
                    "tool_calls" | "function_call" => FinishReason::ToolUse,
                    "content_filter" => FinishReason::ContentFilter,
                    _ => FinishReason::Error,
                }),
            })
            .collect();

        Response {
            choices,
            usage: response.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
        }
    }
}

#[async_trait]
impl ModelProvider for OpenAiProvider {
    async fn generate(
        &self,
        history: &[Message],
        tools: &[ToolSpec],
    ) -> Result<Response, ProviderError> {
        let request = ApiRequest {
            model: &self.model,
            messages: Self::convert_messages(history),
            tools: Self::convert_tools(tools),
            temperature: self.options.temperature,
            max_tokens: self.options.max_tokens,
        };

        tracing::debug!(model = %self.model, messages = history.len(), "Calling OpenAI");

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
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
        "openai"
    }
}
