use agent_stream_contract::ErrorBody;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::prompt::RequestValidationError;

pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Errors returned before a response stream starts.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] RequestValidationError),
    /// Detail is logged by the caller and never sent to the client.
    #[error("internal error")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error = match &self {
            Self::Validation(err) => err.to_string(),
            Self::Internal => INTERNAL_ERROR_MESSAGE.to_string(),
        };
        (self.status(), Json(ErrorBody { error })).into_response()
    }
}
