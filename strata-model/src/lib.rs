//! Core data model definitions shared across Strata crates.
//!
//! Everything here is plain data: image records as the registry stores
//! them, the projections rendered by the listing endpoints, and the write
//! payloads accepted by the registry. No I/O happens in this crate.
#![allow(missing_docs)]

pub mod error;
pub mod formats;
pub mod ids;
pub mod image;
pub mod status;
pub mod write;

// Intentionally curated re-exports for downstream consumers.
pub use error::{ModelError, Result as ModelResult};
pub use formats::{ContainerFormat, DiskFormat};
pub use ids::ImageId;
pub use image::{ImageProperties, ImageRecord, ImageSummary};
pub use status::ImageStatus;
pub use write::{ImageUpdate, NewImage};
