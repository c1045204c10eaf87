//! Request table API
//!
//! `GET /api/requests` runs a fresh render cycle against the document store.
//! `GET /api/requests/latest` returns the last published table without
//! querying the store.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::error::Error;
use crate::fetch::PublishedTable;
use crate::AppState;

/// GET /api/requests
///
/// Returns the column specification, rows and generation of a new cycle.
pub async fn get_requests(
    State(state): State<AppState>,
) -> Result<Json<PublishedTable>, RequestsError> {
    let published = state.orchestrator.run_cycle(&state.cycles).await?;
    Ok(Json(PublishedTable::clone(&published)))
}

/// GET /api/requests/latest
pub async fn get_latest_requests(
    State(state): State<AppState>,
) -> Result<Json<PublishedTable>, RequestsError> {
    let published = state
        .cycles
        .latest()
        .await
        .ok_or(RequestsError::NotLoaded)?;
    Ok(Json(PublishedTable::clone(&published)))
}

/// Request table API errors
#[derive(Debug)]
pub enum RequestsError {
    /// Document store unreachable or returned an error
    Upstream(String),
    /// Store data violated the merge contract
    Internal(String),
    /// No cycle has been published yet
    NotLoaded,
}

impl From<Error> for RequestsError {
    fn from(err: Error) -> Self {
        match err {
            Error::Network(_) | Error::Api { .. } | Error::Parse(_) => {
                RequestsError::Upstream(err.to_string())
            }
            Error::MissingIdentifier { .. } | Error::InvalidRecord { .. } => {
                RequestsError::Internal(err.to_string())
            }
        }
    }
}

impl IntoResponse for RequestsError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            RequestsError::Upstream(msg) => {
                (StatusCode::BAD_GATEWAY, format!("Document store error: {}", msg))
            }
            RequestsError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Internal error: {}", msg))
            }
            RequestsError::NotLoaded => (
                StatusCode::NOT_FOUND,
                "No request table has been loaded yet".to_string(),
            ),
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (Error::Network("refused".into()), StatusCode::BAD_GATEWAY),
            (
                Error::Api {
                    status: 404,
                    body: "missing".into(),
                },
                StatusCode::BAD_GATEWAY,
            ),
            (Error::Parse("eof".into()), StatusCode::BAD_GATEWAY),
            (
                Error::MissingIdentifier {
                    batch: "primary",
                    index: 3,
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            let response = RequestsError::from(err).into_response();
            assert_eq!(response.status(), expected);
        }
        assert_eq!(
            RequestsError::NotLoaded.into_response().status(),
            StatusCode::NOT_FOUND
        );
    }
}
