use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Failure returned by an HTTP handler.
///
/// Renders as `{"error": "<message>"}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] fluxflix::Error),

    /// Shutdown has begun; no new event streams are opened.
    #[error("Service is shutting down")]
    ShuttingDown,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Core(
                fluxflix::Error::InvalidConfiguration { .. } | fluxflix::Error::MissingTitle,
            ) => StatusCode::BAD_REQUEST,
            Self::Core(fluxflix::Error::ResourceExhausted { .. }) | Self::ShuttingDown => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::Core(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
