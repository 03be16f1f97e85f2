//! # Error Boundary
//!
//! The single place failures become HTTP. Handlers catch nothing; every
//! [`ReconcileError`] bubbles here and is serialized as
//! `{ "error": string }` with the status its class carries.

use agora_reconcile::ReconcileError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{error, warn};

/// Response wrapper for reconciliation failures.
#[derive(Debug)]
pub struct ApiFailure(pub ReconcileError);

impl From<ReconcileError> for ApiFailure {
    fn from(err: ReconcileError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ReconcileError::Validation(_) => StatusCode::BAD_REQUEST,
            ReconcileError::LedgerMismatch(_) | ReconcileError::Authorization(_) => {
                StatusCode::FORBIDDEN
            }
            ReconcileError::NotFound(_) => StatusCode::NOT_FOUND,
            ReconcileError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Upstream failures are ours; the rest belong to the caller.
        match &self.0 {
            ReconcileError::Upstream(msg) => error!(%msg, "request failed upstream"),
            other => warn!(%other, "request rejected"),
        }

        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: ReconcileError) -> StatusCode {
        ApiFailure(err).into_response().status()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_of(ReconcileError::validation("x")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(ReconcileError::ledger_mismatch("x")),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(ReconcileError::authorization("x")),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(ReconcileError::not_found("x")),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(ReconcileError::upstream("x")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
