use std::fmt::{self, Display};

/// Errors produced by model parsers and constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    InvalidId(String),
    InvalidStatus(String),
    InvalidDiskFormat(String),
    InvalidContainerFormat(String),
}

impl Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::InvalidId(raw) => {
                write!(f, "invalid image id '{raw}'")
            }
            ModelError::InvalidStatus(raw) => {
                write!(f, "invalid image status '{raw}'")
            }
            ModelError::InvalidDiskFormat(raw) => {
                write!(f, "invalid disk format '{raw}'")
            }
            ModelError::InvalidContainerFormat(raw) => {
                write!(f, "invalid container format '{raw}'")
            }
        }
    }
}

impl std::error::Error for ModelError {}

pub type Result<T> = std::result::Result<T, ModelError>;
