//! HTTP routes: `POST /ask` and `GET /health`.
//!
//! Each request runs an isolated workflow against the shared
//! [`Orchestrator`] under the configured deadline.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};

use super::params::{AskRequest, AskResponse, ErrorBody};
use crate::agent::{AgentConfig, Orchestrator};
use crate::core::Query;
use crate::error::{AgentError, WorkflowError};

/// State shared by all handlers.
///
/// A server started without usable credentials keeps the configuration
/// error and answers every `/ask` with 401.
#[derive(Clone)]
pub struct AskServer {
    orchestrator: Result<Arc<Orchestrator>, AgentError>,
    deadline: Duration,
}

impl AskServer {
    /// Creates a server over a ready orchestrator.
    #[must_use]
    pub const fn new(orchestrator: Arc<Orchestrator>, deadline: Duration) -> Self {
        Self {
            orchestrator: Ok(orchestrator),
            deadline,
        }
    }

    /// Creates a server that rejects every query with `error`.
    #[must_use]
    pub const fn unconfigured(error: AgentError, deadline: Duration) -> Self {
        Self {
            orchestrator: Err(error),
            deadline,
        }
    }

    /// Creates a server from a configuration attempt.
    ///
    /// Credential problems are deferred to request time.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error`] for failures other than a missing API key,
    /// such as an unsupported provider.
    pub fn from_config(
        config: Result<AgentConfig, AgentError>,
        deadline: Duration,
    ) -> crate::Result<Self> {
        match config {
            Ok(config) => Ok(Self::new(
                Arc::new(Orchestrator::from_config(config)?),
                deadline,
            )),
            Err(e) if e.is_credential_error() => {
                tracing::warn!(error = %e, "no usable API key, /ask will answer 401");
                Ok(Self::unconfigured(e, deadline))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Builds the axum router.
    pub fn router(self) -> Router {
        Router::new()
            .route("/ask", post(ask))
            .route("/health", get(health))
            .with_state(self)
    }
}

impl std::fmt::Debug for AskServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AskServer")
            .field("configured", &self.orchestrator.is_ok())
            .field("deadline", &self.deadline)
            .finish()
    }
}

/// Error returned by a handler, rendered as `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

impl From<AgentError> for ApiError {
    fn from(e: AgentError) -> Self {
        let status = if e.is_credential_error() {
            StatusCode::UNAUTHORIZED
        } else {
            StatusCode::BAD_GATEWAY
        };
        Self::new(status, e.to_string())
    }
}

impl From<WorkflowError> for ApiError {
    fn from(e: WorkflowError) -> Self {
        match e {
            WorkflowError::InvalidQuery { message } => Self::new(StatusCode::BAD_REQUEST, message),
            WorkflowError::InvalidRetryBudget { .. } => {
                Self::new(StatusCode::BAD_REQUEST, e.to_string())
            }
            WorkflowError::Synthesis { source } if source.is_credential_error() => {
                Self::new(StatusCode::UNAUTHORIZED, source.to_string())
            }
            WorkflowError::Synthesis { .. } => Self::new(StatusCode::BAD_GATEWAY, e.to_string()),
            WorkflowError::TimedOut { .. } => {
                Self::new(StatusCode::GATEWAY_TIMEOUT, e.to_string())
            }
            WorkflowError::Cancelled => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        }
    }
}

/// Validates a request body into a [`Query`].
fn parse_request(request: AskRequest) -> Result<Query, WorkflowError> {
    let mut query = Query::new(request.query.unwrap_or_default())?;
    if let Some(max_retries) = request.max_retries {
        query = query.with_max_retries(max_retries)?;
    }
    if let Some(complex) = request.complex {
        query = query.with_complex(complex);
    }
    Ok(query)
}

async fn ask(
    State(server): State<AskServer>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AskResponse>, ApiError> {
    let Json(request) =
        payload.map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, e.body_text()))?;
    let query = parse_request(request)?;

    let orchestrator = server.orchestrator.clone().map_err(ApiError::from)?;

    tracing::info!(query = query.text(), "ask request");
    let outcome = orchestrator
        .answer_within(&query, server.deadline)
        .await
        .inspect_err(|e| tracing::warn!(error = %e, "ask request failed"))?;

    Ok(Json(outcome.answer))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_request() {
        let query = parse_request(AskRequest {
            query: Some("  weather in Paris  ".to_string()),
            max_retries: Some(0),
            complex: Some(true),
        })
        .unwrap_or_else(|_| unreachable!());
        assert_eq!(query.text(), "weather in Paris");
        assert_eq!(query.max_retries(), Some(0));
        assert_eq!(query.complex(), Some(true));
    }

    #[test]
    fn test_parse_request_rejects_bad_input() {
        assert!(matches!(
            parse_request(AskRequest::default()),
            Err(WorkflowError::InvalidQuery { .. })
        ));
        assert!(matches!(
            parse_request(AskRequest {
                query: Some("q".to_string()),
                max_retries: Some(-2),
                complex: None,
            }),
            Err(WorkflowError::InvalidRetryBudget { value: -2 })
        ));
    }

    #[test]
    fn test_workflow_error_status() {
        let status = |e: WorkflowError| ApiError::from(e).status;

        assert_eq!(
            status(WorkflowError::TimedOut {
                after: Duration::from_secs(1)
            }),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            status(WorkflowError::Synthesis {
                source: AgentError::Timeout {
                    message: "t".to_string()
                }
            }),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status(WorkflowError::Synthesis {
                source: AgentError::Authentication {
                    message: "bad key".to_string()
                }
            }),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status(WorkflowError::InvalidRetryBudget { value: -1 }),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_missing_key_is_unauthorized() {
        assert_eq!(
            ApiError::from(AgentError::ApiKeyMissing).status,
            StatusCode::UNAUTHORIZED
        );
    }
}
