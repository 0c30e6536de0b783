use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

/// Client-facing error taxonomy for every relay endpoint.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Not authenticated")]
    Unauthenticated,

    #[error("{0}")]
    Validation(String),

    /// Upstream rejected the stored credentials (401/403).
    #[error("Zendesk rejected the credentials")]
    UpstreamAuth { status: u16, detail: Value },

    /// Upstream rejected the request itself with some other 4xx.
    #[error("Zendesk rejected the request ({status})")]
    UpstreamRequest { status: u16, detail: Value },

    /// Upstream 5xx or a transport failure reaching it.
    #[error("Zendesk unavailable")]
    UpstreamUnavailable { status: Option<u16>, detail: Value },

    #[error("Zendesk request timed out")]
    UpstreamTimeout,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthenticated | Self::UpstreamAuth { .. } => StatusCode::UNAUTHORIZED,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::UpstreamRequest { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_REQUEST)
            }
            Self::UpstreamUnavailable { .. } => StatusCode::BAD_GATEWAY,
            Self::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            Self::Unauthenticated => json!({"error": "Not authenticated"}),
            Self::Validation(msg) => json!({"error": msg}),
            Self::UpstreamAuth { status, detail } => {
                json!({"error": self.to_string(), "upstream_status": status, "detail": detail})
            }
            Self::UpstreamRequest { status, detail } => {
                json!({"error": self.to_string(), "upstream_status": status, "detail": detail})
            }
            Self::UpstreamUnavailable {
                status: upstream,
                detail,
            } => {
                tracing::error!(upstream_status = ?upstream, %detail, "upstream unavailable");
                json!({"error": "Zendesk unavailable", "upstream_status": upstream, "detail": detail})
            }
            Self::UpstreamTimeout => {
                tracing::error!("upstream request timed out");
                json!({"error": "Zendesk request timed out"})
            }
            Self::Internal(msg) => {
                tracing::error!("internal error: {msg}");
                json!({"error": "Internal server error"})
            }
        };
        (status, Json(body)).into_response()
    }
}

/// Map a transport-level reqwest failure into the taxonomy.
pub fn transport_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::UpstreamTimeout
    } else {
        ApiError::UpstreamUnavailable {
            status: None,
            detail: json!(err.to_string()),
        }
    }
}

/// Map an upstream non-success status plus its decoded body into the taxonomy.
pub fn upstream_error(status: StatusCode, detail: Value) -> ApiError {
    let code = status.as_u16();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        ApiError::UpstreamAuth {
            status: code,
            detail,
        }
    } else if status.is_client_error() {
        ApiError::UpstreamRequest {
            status: code,
            detail,
        }
    } else {
        ApiError::UpstreamUnavailable {
            status: Some(code),
            detail,
        }
    }
}
