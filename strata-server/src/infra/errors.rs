use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use strata_core::RegistryError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "message": self.message,
                "status": self.status.as_u16(),
            }
        }));

        (self.status, body).into_response()
    }
}

impl From<RegistryError> for AppError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::InvalidParameter { .. } | RegistryError::Invalid(_) => {
                Self::bad_request(err.to_string())
            }
            RegistryError::NotFound(_) => Self::not_found(err.to_string()),
            RegistryError::Duplicate(_) => Self::conflict(err.to_string()),
            RegistryError::Forbidden(_) => Self::forbidden(err.to_string()),
            RegistryError::Storage(detail) => {
                tracing::error!(error = %detail, "image store operation failed");
                Self::internal("Image store operation failed")
            }
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_model::ImageId;

    #[test]
    fn maps_registry_errors_to_statuses() {
        let cases = [
            (
                RegistryError::invalid_parameter("limit", "bad"),
                StatusCode::BAD_REQUEST,
            ),
            (RegistryError::Invalid("mix".into()), StatusCode::BAD_REQUEST),
            (RegistryError::NotFound(ImageId(1)), StatusCode::NOT_FOUND),
            (RegistryError::Duplicate(ImageId(1)), StatusCode::CONFLICT),
            (RegistryError::Forbidden("no".into()), StatusCode::FORBIDDEN),
            (
                RegistryError::Storage("db down".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(AppError::from(err).status, status);
        }
    }

    #[test]
    fn storage_details_are_not_exposed() {
        let err = AppError::from(RegistryError::Storage(
            "password authentication failed".into(),
        ));
        assert!(!err.message.contains("password"));
    }
}
