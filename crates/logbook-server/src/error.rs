// ABOUTME: Maps journal operation failures onto HTTP responses.
// ABOUTME: A lost ingest race is 409; every other storage failure is 500 with an error body.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use logbook_store::JournalError;

/// Error wrapper for converting journal errors to HTTP responses.
///
/// Error responses have the format `{ "error": "..." }`.
#[derive(Debug)]
pub struct ApiError(pub JournalError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        if self.0.is_conflict() {
            StatusCode::CONFLICT
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "journal request failed");
        } else {
            tracing::warn!(error = %self.0, "journal request rejected");
        }

        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, Json(body)).into_response()
    }
}

impl From<JournalError> for ApiError {
    fn from(err: JournalError) -> Self {
        ApiError(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logbook_store::StoreError;

    #[test]
    fn conflict_maps_to_409() {
        let err = ApiError(JournalError::WriteFailed(StoreError::Conflict("abc".to_string())));
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn other_failures_map_to_500() {
        let cases = [
            JournalError::ExistenceCheckFailed(StoreError::PoolClosed),
            JournalError::WriteFailed(StoreError::Task("panicked".to_string())),
            JournalError::QueryFailed(StoreError::PoolTimeout(std::time::Duration::from_secs(5))),
        ];
        for case in cases {
            assert_eq!(ApiError(case).status(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    #[tokio::test]
    async fn body_carries_the_message() {
        let resp = ApiError(JournalError::QueryFailed(StoreError::PoolClosed)).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            json["error"],
            "page query failed: connection pool is closed"
        );
    }
}
