use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Errors raised while minting a session token.
#[derive(Error, Debug)]
pub enum SessionError {
    /// The codec has no signing secret configured.
    #[error("Session secret is not configured")]
    MissingSecret,

    /// A session record was built without a subject.
    #[error("Session profile id cannot be empty")]
    EmptyProfileId,

    /// The record could not be serialized.
    #[error("Session serialization failed: {0}")]
    Serialization(String),
}

/// Why a token failed verification.
///
/// Never surfaced to HTTP clients; `SessionCodec::decode` collapses every
/// variant into `None`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidToken {
    /// Not exactly two non-empty dot-separated segments.
    #[error("token is not two dot-separated segments")]
    Malformed,

    /// A segment is not valid unpadded base64url.
    #[error("token segment is not valid base64url")]
    Encoding,

    /// The tag does not authenticate the payload under any configured key.
    #[error("token signature mismatch")]
    SignatureMismatch,

    /// The payload is authentic but not a valid session record.
    #[error("token payload is not a session record")]
    Payload,

    /// The codec has no keys to verify with.
    #[error("no verification keys configured")]
    Unconfigured,
}

/// The application's error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// A database error.
    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    /// A connection pool error.
    #[error("Pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    /// The connection pool could not be built.
    #[error("Pool creation error: {0}")]
    CreatePool(#[from] deadpool_postgres::CreatePoolError),

    /// A column was missing or had an unexpected type.
    #[error("Missing data: {0}")]
    MissingData(String),

    /// A session minting error.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// An authentication error.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// No valid session accompanies the request.
    #[error("No active session")]
    Unauthenticated,

    /// A validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A PIN hashing error.
    #[error("Hashing error: {0}")]
    Hashing(String),
}

/// A `Result` type that uses `AppError` as the error type.
pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
            }

            AppError::Pool(ref e) => {
                tracing::error!("Pool error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
            }

            AppError::CreatePool(ref e) => {
                tracing::error!("Pool creation error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
            }

            AppError::MissingData(ref column) => {
                tracing::error!("Missing data in column: {}", column);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
            }

            AppError::Session(ref e) => {
                tracing::error!("Session error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }

            AppError::Authentication(ref msg) => {
                tracing::warn!("Authentication failed: {}", msg);
                (StatusCode::UNAUTHORIZED, msg.clone())
            }

            AppError::Unauthenticated => {
                tracing::debug!("No active session");
                (StatusCode::UNAUTHORIZED, "No active session".to_string())
            }

            AppError::Validation(ref msg) => {
                tracing::debug!("Validation error: {}", msg);
                (StatusCode::BAD_REQUEST, msg.clone())
            }

            AppError::Hashing(ref msg) => {
                tracing::error!("Hashing error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = sonic_rs::to_string(&sonic_rs::json!({
            "error": message
        }))
        .unwrap_or_else(|_| r#"{"error":"Internal server error"}"#.to_string());

        (status, [(http::header::CONTENT_TYPE, "application/json")], body).into_response()
    }
}
