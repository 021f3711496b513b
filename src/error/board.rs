use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error as ThisError;
use tracing::{error, warn};

use super::StoreError;

/// Error returned by request handlers.
///
/// `context` names what the handler was doing when the store failed and is only used for logs;
/// clients receive a generic message.
#[derive(Debug, ThisError)]
pub enum BoardError {
    #[error("invalid request: {0}")]
    BadRequest(String),

    #[error("{context}: {source}")]
    Store {
        context: &'static str,
        #[source]
        source: StoreError,
    },
}

impl BoardError {
    pub fn bad_request(reason: impl Into<String>) -> Self {
        BoardError::BadRequest(reason.into())
    }

    pub fn store(context: &'static str, source: StoreError) -> Self {
        BoardError::Store { context, source }
    }
}

impl IntoResponse for BoardError {
    fn into_response(self) -> Response {
        match self {
            BoardError::BadRequest(reason) => {
                warn!(reason = %reason, "rejected request");
                (StatusCode::BAD_REQUEST, reason).into_response()
            }
            BoardError::Store {
                source: StoreError::NotFound,
                ..
            } => (StatusCode::NOT_FOUND, "quote not found").into_response(),
            BoardError::Store { context, source } => {
                error!(context, kind = ?source.kind(), error = %source, "store failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred.",
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_kinds_to_status_codes() {
        let cases = [
            (BoardError::bad_request("nope"), StatusCode::BAD_REQUEST),
            (
                BoardError::store("fetching quote", StoreError::NotFound),
                StatusCode::NOT_FOUND,
            ),
            (
                BoardError::store("fetching quotes", StoreError::read("db gone")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                BoardError::store("adding quote", StoreError::write("disk full")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
