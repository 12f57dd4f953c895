use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use std::fmt;

pub const USER_EXISTS_MESSAGE: &str = "User already exists";
pub const USER_NOT_FOUND_MESSAGE: &str = "User not found";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// A field-level constraint failed; `field` names the first offending field.
    Validation { field: &'static str, message: String },
    Conflict(String),
    NotFound(String),
    Internal(String),
}

impl AppError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        AppError::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn conflict() -> Self {
        AppError::Conflict(USER_EXISTS_MESSAGE.to_string())
    }

    pub fn not_found() -> Self {
        AppError::NotFound(USER_NOT_FOUND_MESSAGE.to_string())
    }

    pub fn internal(err: impl fmt::Display) -> Self {
        AppError::Internal(err.to_string())
    }

    /// Message carried in the `message` field of the JSON error body.
    pub fn message(&self) -> &str {
        match self {
            AppError::Validation { message, .. } => message,
            AppError::Conflict(msg) | AppError::NotFound(msg) | AppError::Internal(msg) => msg,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation { field, message } => {
                write!(f, "Validation error on {}: {}", field, message)
            }
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        AppError::internal(err)
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(err: bcrypt::BcryptError) -> Self {
        AppError::Internal(format!("Failed to hash password: {}", err))
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::Validation { field, message } => serde_json::json!({
                "success": false,
                "message": message,
                "field": field
            }),
            _ => serde_json::json!({
                "success": false,
                "message": self.message()
            }),
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}
