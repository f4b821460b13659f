//! Error taxonomy for the registry core.

use strata_model::ImageId;
use thiserror::Error;

/// Errors surfaced by the listing engine, the catalog and the record stores.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A query parameter was malformed or referenced nothing visible.
    #[error("Invalid parameter '{param}': {reason}")]
    InvalidParameter { param: String, reason: String },

    /// Absent, soft-deleted and out-of-scope images all look the same.
    #[error("No image found with ID {0}")]
    NotFound(ImageId),

    /// Write payload failed validation.
    #[error("Invalid image: {0}")]
    Invalid(String),

    #[error("Image with identifier {0} already exists")]
    Duplicate(ImageId),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl RegistryError {
    pub fn invalid_parameter(
        param: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        RegistryError::InvalidParameter {
            param: param.into(),
            reason: reason.into(),
        }
    }

    /// Name of the offending query parameter, if this is a parameter error.
    pub fn parameter(&self) -> Option<&str> {
        match self {
            RegistryError::InvalidParameter { param, .. } => Some(param),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;
