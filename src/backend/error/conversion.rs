use axum::{
    response::{IntoResponse, Response},
    Json,
};

use crate::backend::error::types::LookupError;
use crate::shared::GatewayError;

impl IntoResponse for LookupError {
    /// `{"error": <message>}` with the matching status code
    fn into_response(self) -> Response {
        if let LookupError::Internal(detail) = &self {
            tracing::error!("Repair status lookup failed: {}", detail);
        }
        let body = serde_json::json!({ "error": self.message() });
        (self.status_code(), Json(body)).into_response()
    }
}

impl From<GatewayError> for LookupError {
    fn from(err: GatewayError) -> Self {
        LookupError::internal(err.to_string())
    }
}
