use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    /// Missing or malformed request input (400)
    Validation(String),
    /// Missing or invalid session token / credentials (401)
    Auth(String),
    NotFound(String),
    /// Duplicate email or stale revision (409)
    Conflict(String),
    /// Classification API failure (network, status, body)
    Upstream(String),
    DatabaseError(String),
    Internal(String),
}

impl AppError {
    /// Only persistence failures are worth retrying; everything else is deterministic.
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::DatabaseError(_))
    }

    fn message(&self) -> &str {
        match self {
            AppError::Validation(msg)
            | AppError::Auth(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::Upstream(msg)
            | AppError::DatabaseError(msg)
            | AppError::Internal(msg) => msg,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(msg) => write!(f, "Invalid request: {}", msg),
            AppError::Auth(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::Upstream(msg) => write!(f, "Classifier error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<mongodb::error::Error> for AppError {
    fn from(e: mongodb::error::Error) -> Self {
        AppError::DatabaseError(e.to_string())
    }
}

impl From<mongodb::bson::ser::Error> for AppError {
    fn from(e: mongodb::bson::ser::Error) -> Self {
        AppError::Internal(format!("Failed to encode document: {}", e))
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            // Falha do classificador propagada vira 500 genérico
            AppError::Upstream(_) | AppError::DatabaseError(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        // 4xx carry a user-facing `message`, 5xx an `error`
        let body = if status.is_client_error() {
            serde_json::json!({ "success": false, "message": self.message() })
        } else {
            serde_json::json!({ "success": false, "error": self.to_string() })
        };
        HttpResponse::build(status).json(body)
    }
}
