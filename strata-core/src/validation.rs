//! Write-path checks on image status and format combinations.
//!
//! Listing tolerates whatever is stored; only creates and updates are
//! held to these rules.

use strata_model::{ContainerFormat, DiskFormat, ImageRecord, ImageStatus};

use crate::error::{RegistryError, Result};

/// Validate the status and format pairing of an image about to be stored.
///
/// - tombstone statuses are reserved for the delete path
/// - `ami`, `ari` and `aki` must be used for both formats or neither
/// - `iso` disks only ship `bare` (or without a container format)
pub fn validate_image(
    status: ImageStatus,
    disk_format: Option<DiskFormat>,
    container_format: Option<ContainerFormat>,
) -> Result<()> {
    if status.is_tombstone() {
        return Err(RegistryError::Invalid(format!(
            "Invalid image status '{status}' for image"
        )));
    }

    let amazon = disk_format.is_some_and(|d| d.is_amazon())
        || container_format.is_some_and(|c| c.is_amazon());
    if amazon {
        let paired = matches!(
            (disk_format, container_format),
            (Some(disk), Some(container)) if disk.as_str() == container.as_str()
        );
        if !paired {
            return Err(RegistryError::Invalid(
                "Invalid mix of disk and container formats. When setting a \
                 disk or container format to one of 'ami', 'ari', or 'aki', \
                 the container and disk formats must match."
                    .into(),
            ));
        }
    }

    if disk_format == Some(DiskFormat::Iso)
        && !matches!(container_format, None | Some(ContainerFormat::Bare))
    {
        return Err(RegistryError::Invalid(
            "ISO images only support the 'bare' container format".into(),
        ));
    }

    Ok(())
}

pub fn validate_record(record: &ImageRecord) -> Result<()> {
    validate_image(record.status, record.disk_format, record.container_format)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_pairings() {
        assert!(validate_image(ImageStatus::Queued, None, None).is_ok());
        assert!(
            validate_image(
                ImageStatus::Active,
                Some(DiskFormat::Qcow2),
                Some(ContainerFormat::Bare),
            )
            .is_ok()
        );
        assert!(
            validate_image(
                ImageStatus::Active,
                Some(DiskFormat::Vhd),
                Some(ContainerFormat::Ovf),
            )
            .is_ok()
        );
        assert!(
            validate_image(
                ImageStatus::Saving,
                Some(DiskFormat::Aki),
                Some(ContainerFormat::Aki),
            )
            .is_ok()
        );
    }

    #[test]
    fn amazon_formats_must_match() {
        for (disk, container) in [
            (Some(DiskFormat::Ami), Some(ContainerFormat::Bare)),
            (Some(DiskFormat::Vhd), Some(ContainerFormat::Ari)),
            (Some(DiskFormat::Ari), Some(ContainerFormat::Aki)),
            (Some(DiskFormat::Aki), None),
            (None, Some(ContainerFormat::Ami)),
        ] {
            let err = validate_image(ImageStatus::Active, disk, container)
                .unwrap_err();
            assert!(matches!(err, RegistryError::Invalid(_)));
        }
    }

    #[test]
    fn iso_pairs_only_with_bare() {
        assert!(
            validate_image(ImageStatus::Active, Some(DiskFormat::Iso), None)
                .is_ok()
        );
        assert!(
            validate_image(
                ImageStatus::Active,
                Some(DiskFormat::Iso),
                Some(ContainerFormat::Bare),
            )
            .is_ok()
        );
        assert!(
            validate_image(
                ImageStatus::Active,
                Some(DiskFormat::Iso),
                Some(ContainerFormat::Ovf),
            )
            .is_err()
        );
    }

    #[test]
    fn tombstone_statuses_are_rejected() {
        assert!(validate_image(ImageStatus::Deleted, None, None).is_err());
        assert!(
            validate_image(ImageStatus::PendingDelete, None, None).is_err()
        );
    }
}
