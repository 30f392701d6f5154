use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;

/// Stable machine-readable error codes returned to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidLatitude,
    InvalidLongitude,
    InvalidRadius,
    InvalidSort,
    InvalidPage,
    InvalidSize,
    InvalidPriceRange,
    InvalidStoreType,
    InvalidCategoryIds,
    InvalidWeight,
    InvalidQuery,
    MemberNotFound,
    AddressNotFound,
    StoreNotFound,
    CategoryNotFound,
    FoodNotFound,
    FoodPreferenceNotFound,
    FoodPreferenceExists,
    Unauthorized,
    UpstreamDataError,
    InternalError,
}

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Validation error: {message}")]
    Validation { code: ErrorCode, message: String },

    #[error("Not found: {message}")]
    NotFound { code: ErrorCode, message: String },

    #[error("Conflict: {message}")]
    Conflict { code: ErrorCode, message: String },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(code: ErrorCode, message: impl Into<String>) -> Self {
        AppError::Validation {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(code: ErrorCode, message: impl Into<String>) -> Self {
        AppError::NotFound {
            code,
            message: message.into(),
        }
    }

    pub fn conflict(code: ErrorCode, message: impl Into<String>) -> Self {
        AppError::Conflict {
            code,
            message: message.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { code, .. }
            | AppError::NotFound { code, .. }
            | AppError::Conflict { code, .. } => *code,
            AppError::Unauthorized(_) => ErrorCode::Unauthorized,
            AppError::Database(_) => ErrorCode::UpstreamDataError,
            AppError::Internal(_) => ErrorCode::InternalError,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let message = match self {
            AppError::Validation { message, .. }
            | AppError::NotFound { message, .. }
            | AppError::Conflict { message, .. } => message,
            AppError::Unauthorized(msg) => msg,
            AppError::Database(ref e) => {
                tracing::error!(error = %e, "Data store request failed");
                "Failed to access preference or store data".to_string()
            }
            AppError::Internal(ref msg) => {
                tracing::error!(error = %msg, "Internal error");
                "Internal server error".to_string()
            }
        };

        let body = Json(json!({
            "code": code,
            "message": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let err = AppError::validation(ErrorCode::InvalidRadius, "radius");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), ErrorCode::InvalidRadius);

        let err = AppError::not_found(ErrorCode::StoreNotFound, "store 1");
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err = AppError::conflict(ErrorCode::FoodPreferenceExists, "dup");
        assert_eq!(err.status(), StatusCode::CONFLICT);

        let err = AppError::Database(sqlx::Error::RowNotFound);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), ErrorCode::UpstreamDataError);
    }

    #[test]
    fn test_error_code_serialization() {
        let json = serde_json::to_string(&ErrorCode::AddressNotFound).unwrap();
        assert_eq!(json, "\"ADDRESS_NOT_FOUND\"");
        let json = serde_json::to_string(&ErrorCode::CategoryNotFound).unwrap();
        assert_eq!(json, "\"CATEGORY_NOT_FOUND\"");
    }
}
