use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::storage::StorageError;
use sea_orm::DbErr;
use serde::Serialize;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `TOKEN_MISSING`,
    /// `TOKEN_INVALID`, `INVALID_CREDENTIALS`, `PERMISSION_DENIED`, `QUOTA_EXCEEDED`,
    /// `NOT_FOUND`, `CONFLICT`, `USERNAME_TAKEN`, `RATE_LIMITED`, `REMOTE_STORE_ERROR`,
    /// `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "No files provided")]
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    TokenMissing,
    TokenInvalid,
    InvalidCredentials,
    PermissionDenied,
    /// Upload would push deduplicated usage past the quota.
    QuotaExceeded {
        current_bytes: u64,
        limit_bytes: u64,
    },
    NotFound(String),
    Conflict(String),
    UsernameTaken,
    /// Rate limit exceeded. Contains seconds until retry is allowed.
    RateLimited {
        retry_after: u64,
    },
    RemoteStore(String),
    /// A multi-file upload failed after some files were already committed.
    BatchIncomplete {
        stored: usize,
        cause: Box<AppError>,
    },
    Internal(String),
}

fn as_mb(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "VALIDATION_ERROR",
                    message: msg,
                },
            ),
            AppError::TokenMissing => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "TOKEN_MISSING",
                    message: "Authentication required".into(),
                },
            ),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "TOKEN_INVALID",
                    message: "Invalid or expired token".into(),
                },
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "INVALID_CREDENTIALS",
                    message: "Invalid username or password".into(),
                },
            ),
            AppError::PermissionDenied => (
                StatusCode::FORBIDDEN,
                ErrorBody {
                    code: "PERMISSION_DENIED",
                    message: "Insufficient permissions".into(),
                },
            ),
            AppError::QuotaExceeded {
                current_bytes,
                limit_bytes,
            } => (
                StatusCode::FORBIDDEN,
                ErrorBody {
                    code: "QUOTA_EXCEEDED",
                    message: format!(
                        "Storage quota exceeded. Current: {:.2} MB, Limit: {:.2} MB",
                        as_mb(current_bytes),
                        as_mb(limit_bytes)
                    ),
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "NOT_FOUND",
                    message: msg,
                },
            ),
            AppError::Conflict(msg) => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "CONFLICT",
                    message: msg,
                },
            ),
            AppError::UsernameTaken => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "USERNAME_TAKEN",
                    message: "Username is already taken".into(),
                },
            ),
            AppError::RateLimited { retry_after } => (
                StatusCode::TOO_MANY_REQUESTS,
                ErrorBody {
                    code: "RATE_LIMITED",
                    message: format!("Rate limit exceeded. Try again in {} seconds", retry_after),
                },
            ),
            AppError::RemoteStore(detail) => {
                tracing::error!("Remote store error: {}", detail);
                (
                    StatusCode::BAD_GATEWAY,
                    ErrorBody {
                        code: "REMOTE_STORE_ERROR",
                        message: detail,
                    },
                )
            }
            AppError::BatchIncomplete { stored, cause } => {
                let (status, mut body) = cause.status_and_body();
                body.message = format!(
                    "{} ({} file(s) were stored before the failure)",
                    body.message, stored
                );
                (status, body)
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        message: "An unexpected error occurred".into(),
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let retry_after = if let AppError::RateLimited { retry_after } = &self {
            Some(*retry_after)
        } else {
            None
        };

        let (status, body) = self.status_and_body();

        if let Some(seconds) = retry_after {
            (status, [("Retry-After", seconds.to_string())], Json(body)).into_response()
        } else {
            (status, Json(body)).into_response()
        }
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Upload(_) | StorageError::Destroy(_) | StorageError::NotFound(_) => {
                AppError::RemoteStore(err.to_string())
            }
            other => AppError::Internal(other.to_string()),
        }
    }
}
