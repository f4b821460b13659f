use crate::{ContainerFormat, DiskFormat, ImageId, ImageStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Free-form key/value metadata attached to an image.
///
/// Ordered so that rendered documents are stable across requests.
pub type ImageProperties = BTreeMap<String, String>;

/// One stored disk image as the registry knows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: ImageId,
    pub name: Option<String>,
    pub size: u64,
    pub status: ImageStatus,
    pub is_public: bool,
    pub disk_format: Option<DiskFormat>,
    pub container_format: Option<ContainerFormat>,
    pub checksum: Option<String>,
    /// Backend URI of the image bits (file://, swift://, s3://, ...).
    pub location: Option<String>,
    /// Project that owns the image. Public images may have no owner.
    pub owner: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub properties: ImageProperties,
}

impl ImageRecord {
    /// A freshly queued, private, empty image.
    pub fn new(id: ImageId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: None,
            size: 0,
            status: ImageStatus::Queued,
            is_public: false,
            disk_format: None,
            container_format: None,
            checksum: None,
            location: None,
            owner: None,
            created_at,
            updated_at: created_at,
            deleted_at: None,
            properties: ImageProperties::new(),
        }
    }

    /// Soft-deleted records are tombstones: kept for id bookkeeping, never
    /// shown to anyone.
    pub fn is_deleted(&self) -> bool {
        self.status.is_tombstone() || self.deleted_at.is_some()
    }

    pub fn is_owned_by(&self, project_id: &str) -> bool {
        self.owner.as_deref() == Some(project_id)
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn summary(&self) -> ImageSummary {
        ImageSummary::from(self)
    }
}

/// The short form rendered by the index listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSummary {
    pub id: ImageId,
    pub name: Option<String>,
    pub size: u64,
    pub disk_format: Option<DiskFormat>,
    pub container_format: Option<ContainerFormat>,
    pub checksum: Option<String>,
}

impl From<&ImageRecord> for ImageSummary {
    fn from(record: &ImageRecord) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            size: record.size,
            disk_format: record.disk_format,
            container_format: record.container_format,
            checksum: record.checksum.clone(),
        }
    }
}

impl From<ImageRecord> for ImageSummary {
    fn from(record: ImageRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            size: record.size,
            disk_format: record.disk_format,
            container_format: record.container_format,
            checksum: record.checksum,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn new_records_are_queued_and_private() {
        let record = ImageRecord::new(ImageId(1), at(10));
        assert_eq!(record.status, ImageStatus::Queued);
        assert!(!record.is_public);
        assert_eq!(record.created_at, record.updated_at);
        assert!(!record.is_deleted());
    }

    #[test]
    fn deleted_at_alone_marks_a_tombstone() {
        let mut record = ImageRecord::new(ImageId(1), at(10));
        record.status = ImageStatus::Active;
        record.deleted_at = Some(at(20));
        assert!(record.is_deleted());
    }

    #[test]
    fn summary_keeps_index_fields_only() {
        let mut record = ImageRecord::new(ImageId(3), at(10));
        record.name = Some("ubuntu".into());
        record.size = 19;
        record.disk_format = Some(DiskFormat::Vhd);
        record.container_format = Some(ContainerFormat::Ovf);
        record.properties.insert("arch".into(), "x86_64".into());

        let json = serde_json::to_value(record.summary()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 3,
                "name": "ubuntu",
                "size": 19,
                "disk_format": "vhd",
                "container_format": "ovf",
                "checksum": null,
            })
        );
    }
}
