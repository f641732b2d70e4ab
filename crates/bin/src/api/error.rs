//! Mapping of library errors onto HTTP responses.

use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Error returned by every API handler.
///
/// Rendered as `{ "error": message }` with a status derived from the error
/// class.
#[derive(Debug)]
pub enum ApiError {
    /// Missing or unusable bearer token.
    Unauthorized(String),
    /// Authenticated, but not allowed.
    Forbidden(String),
    BadRequest(String),
    NotFound(String),
    /// Failure already logged by the caller.
    Internal,
    Dossier(dossier::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Dossier(err) => {
                if err.is_not_found() {
                    StatusCode::NOT_FOUND
                } else if err.is_duplicate() || err.is_validation_error() {
                    StatusCode::BAD_REQUEST
                } else if err.is_authentication_error() {
                    StatusCode::UNAUTHORIZED
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            }
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::BadRequest(msg)
            | ApiError::NotFound(msg) => msg.clone(),
            ApiError::Internal => "Internal server error".to_string(),
            ApiError::Dossier(err) => err.to_string(),
        }
    }
}

impl From<dossier::Error> for ApiError {
    fn from(err: dossier::Error) -> Self {
        ApiError::Dossier(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            if let ApiError::Dossier(err) = &self {
                tracing::error!(module = err.module(), error = %err, "Request failed");
            }
            "Internal server error".to_string()
        } else {
            self.message()
        };
        let body = Json(json!({ "error": message }));
        if status == StatusCode::UNAUTHORIZED {
            (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response()
        } else {
            (status, body).into_response()
        }
    }
}
