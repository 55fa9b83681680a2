//! HTTP Handlers

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use doppel_core::{DecisionError, ToolSpec};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

const DEFAULT_SYSTEM: &str = "You are a helpful assistant. Use the available tools to look up \
                              data before answering, and answer only from what they return.";

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub tools: usize,
}

#[derive(Debug, Deserialize)]
pub struct DecideRequest {
    #[serde(default)]
    pub system: Option<String>,
    pub prompt: String,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DecideResponse {
    pub answer: String,
    pub model: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

// ============================================================================
// Errors
// ============================================================================

/// Handler error, rendered as `{error, code}` JSON
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Decision(DecisionError),
}

impl From<DecisionError> for ApiError {
    fn from(err: DecisionError) -> Self {
        Self::Decision(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Decision(err) => match err {
                DecisionError::ProviderResolution(_) => StatusCode::BAD_REQUEST,
                DecisionError::Provider(_) => StatusCode::BAD_GATEWAY,
                DecisionError::UnknownTool(_)
                | DecisionError::InvalidArguments { .. }
                | DecisionError::TemplateRender { .. }
                | DecisionError::DataSourceQuery { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                DecisionError::LoopBudgetExceeded(_) => StatusCode::LOOP_DETECTED,
                DecisionError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
                DecisionError::SchemaValidation(_) | DecisionError::Config(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            Self::BadRequest(error) => ErrorResponse {
                error,
                code: "INVALID_REQUEST".into(),
            },
            Self::Decision(err) => ErrorResponse {
                error: err.user_message(),
                code: err.code().into(),
            },
        };
        (status, Json(body)).into_response()
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        tools: state.engine.tools().len(),
    })
}

/// Tool catalog, as offered to the model
pub async fn list_tools(State(state): State<AppState>) -> Json<Vec<ToolSpec>> {
    Json(state.engine.tools().catalog())
}

/// Run one decision. Dropping the request future (client disconnect)
/// abandons the decision.
pub async fn decide(
    State(state): State<AppState>,
    Json(payload): Json<DecideRequest>,
) -> Result<Json<DecideResponse>, ApiError> {
    if payload.prompt.trim().is_empty() {
        return Err(ApiError::BadRequest("prompt must not be empty".into()));
    }

    let model = payload
        .model
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| state.default_model.to_string());
    let system = payload.system.as_deref().unwrap_or(DEFAULT_SYSTEM);

    let answer = state
        .engine
        .decide(system, &payload.prompt, &model)
        .await
        .map_err(|e| {
            if e.is_tool_failure() {
                tracing::warn!(code = e.code(), "Decision failed in a tool: {}", e);
            } else {
                tracing::error!(code = e.code(), "Decision failed: {}", e);
            }
            ApiError::from(e)
        })?;

    Ok(Json(DecideResponse { answer, model }))
}
