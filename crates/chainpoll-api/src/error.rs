use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use chainpoll_chain::ChainError;
use chainpoll_types::api::ErrorBody;

use crate::session::AuthError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("Username already registered")]
    Duplicate,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Could not validate credentials")]
    Unauthenticated,

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        ApiError::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Duplicate | ApiError::InvalidCredentials | ApiError::Chain(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Unauthenticated => ApiError::Unauthenticated,
            AuthError::InvalidCredentials => ApiError::InvalidCredentials,
            AuthError::Duplicate(_) => ApiError::Duplicate,
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation("body", rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match &self {
            ApiError::Validation { field, message } => ErrorBody {
                detail: message.clone(),
                field: Some(field.to_string()),
                kind: None,
            },
            ApiError::Chain(e) => {
                warn!("Chain call failed ({}): {}", e.kind(), e);
                ErrorBody {
                    detail: e.to_string(),
                    field: None,
                    kind: Some(e.kind().to_string()),
                }
            }
            ApiError::Internal(msg) => {
                error!("Internal error: {}", msg);
                ErrorBody {
                    detail: "Internal server error".into(),
                    field: None,
                    kind: None,
                }
            }
            other => ErrorBody {
                detail: other.to_string(),
                field: None,
                kind: None,
            },
        };

        let mut response = (status, Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}
