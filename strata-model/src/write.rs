//! Write payloads accepted by the registry.
//!
//! Protected attributes (`id`, `created_at`, `updated_at`, `deleted_at`) are
//! deliberately absent; the record store owns them.

use crate::{
    ContainerFormat, DiskFormat, ImageId, ImageProperties, ImageRecord,
    ImageStatus,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Attributes for a new image registration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewImage {
    pub name: Option<String>,
    pub size: Option<u64>,
    pub status: Option<ImageStatus>,
    pub is_public: Option<bool>,
    pub disk_format: Option<DiskFormat>,
    pub container_format: Option<ContainerFormat>,
    pub checksum: Option<String>,
    pub location: Option<String>,
    pub owner: Option<String>,
    pub properties: ImageProperties,
}

impl NewImage {
    /// Materialize the payload under a store-assigned id.
    pub fn into_record(self, id: ImageId, now: DateTime<Utc>) -> ImageRecord {
        ImageRecord {
            id,
            name: self.name,
            size: self.size.unwrap_or(0),
            status: self.status.unwrap_or_default(),
            is_public: self.is_public.unwrap_or(false),
            disk_format: self.disk_format,
            container_format: self.container_format,
            checksum: self.checksum,
            location: self.location,
            owner: self.owner,
            created_at: now,
            updated_at: now,
            deleted_at: None,
            properties: self.properties,
        }
    }
}

/// Partial update of an existing image. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageUpdate {
    pub name: Option<String>,
    pub size: Option<u64>,
    pub status: Option<ImageStatus>,
    pub is_public: Option<bool>,
    pub disk_format: Option<DiskFormat>,
    pub container_format: Option<ContainerFormat>,
    pub checksum: Option<String>,
    pub location: Option<String>,
    pub properties: Option<ImageProperties>,
}

impl ImageUpdate {
    /// Merge this update into `record`.
    ///
    /// Supplied properties are upserted. With `purge_props` every stored
    /// property that is not part of the update is dropped, so an update
    /// without properties clears them all.
    pub fn apply(
        &self,
        record: &mut ImageRecord,
        purge_props: bool,
        now: DateTime<Utc>,
    ) {
        if let Some(name) = &self.name {
            record.name = Some(name.clone());
        }
        if let Some(size) = self.size {
            record.size = size;
        }
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(is_public) = self.is_public {
            record.is_public = is_public;
        }
        if let Some(disk_format) = self.disk_format {
            record.disk_format = Some(disk_format);
        }
        if let Some(container_format) = self.container_format {
            record.container_format = Some(container_format);
        }
        if let Some(checksum) = &self.checksum {
            record.checksum = Some(checksum.clone());
        }
        if let Some(location) = &self.location {
            record.location = Some(location.clone());
        }

        let supplied = self.properties.clone().unwrap_or_default();
        if purge_props {
            record.properties.retain(|key, _| supplied.contains_key(key));
        }
        record.properties.extend(supplied);

        record.updated_at = now;
    }
}
