use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

use super::validation::ValidationErrors;

/// Column guarded by a uniqueness rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Username,
    Email,
}

impl UniqueField {
    /// Maps a database constraint name (e.g. `users_email_key`) to its column.
    pub fn from_constraint(name: &str) -> Option<Self> {
        if name.contains("username") {
            Some(Self::Username)
        } else if name.contains("email") {
            Some(Self::Email)
        } else {
            None
        }
    }
}

impl fmt::Display for UniqueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Username => f.write_str("username"),
            Self::Email => f.write_str("email"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("user not found")]
    NotFound,
    #[error("{0} already exists")]
    Duplicate(UniqueField),
    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        let field = match &err {
            sqlx::Error::RowNotFound => return Self::NotFound,
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                db.constraint().and_then(UniqueField::from_constraint)
            }
            _ => None,
        };
        match field {
            Some(field) => Self::Duplicate(field),
            None => Self::Database(err),
        }
    }
}

/// Failures surfaced by the user service.
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("username already exists")]
    DuplicateUsername,
    #[error("email already exists")]
    DuplicateEmail,
    #[error("user not found")]
    NotFound,
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for UserError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => Self::NotFound,
            StoreError::Duplicate(UniqueField::Username) => Self::DuplicateUsername,
            StoreError::Duplicate(UniqueField::Email) => Self::DuplicateEmail,
            other => Self::Store(other),
        }
    }
}

/// Everything a user handler can fail with.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Validation(ValidationErrors),
    User(UserError),
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        Self::User(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(msg) => {
                warn!(reason = %msg, "bad request");
                (StatusCode::BAD_REQUEST, json!({ "error": msg }))
            }
            ApiError::Validation(errors) => {
                warn!(errors = %errors, "validation failed");
                (StatusCode::BAD_REQUEST, json!({ "error": errors }))
            }
            ApiError::User(UserError::DuplicateUsername) => {
                warn!("username already exists");
                (StatusCode::CONFLICT, json!({ "error": "Username already exists" }))
            }
            ApiError::User(UserError::DuplicateEmail) => {
                warn!("email already exists");
                (StatusCode::CONFLICT, json!({ "error": "Email already exists" }))
            }
            ApiError::User(UserError::NotFound) => {
                warn!("user not found");
                (StatusCode::NOT_FOUND, json!({ "error": "User not found" }))
            }
            ApiError::User(UserError::Store(e)) => {
                error!(error = %e, "storage failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error" }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
