//! Disk and container formats understood by the registry.
//!
//! The registry only checks that a stored combination is sensible on the
//! write path; readers must tolerate whatever pair is already stored.

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// On-disk layout of the image bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiskFormat {
    Ami,
    Ari,
    Aki,
    Vhd,
    Vmdk,
    Raw,
    Qcow2,
    Vdi,
    Iso,
}

impl DiskFormat {
    pub const ALL: [DiskFormat; 9] = [
        DiskFormat::Ami,
        DiskFormat::Ari,
        DiskFormat::Aki,
        DiskFormat::Vhd,
        DiskFormat::Vmdk,
        DiskFormat::Raw,
        DiskFormat::Qcow2,
        DiskFormat::Vdi,
        DiskFormat::Iso,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DiskFormat::Ami => "ami",
            DiskFormat::Ari => "ari",
            DiskFormat::Aki => "aki",
            DiskFormat::Vhd => "vhd",
            DiskFormat::Vmdk => "vmdk",
            DiskFormat::Raw => "raw",
            DiskFormat::Qcow2 => "qcow2",
            DiskFormat::Vdi => "vdi",
            DiskFormat::Iso => "iso",
        }
    }

    /// Amazon machine/kernel/ramdisk formats, which must match their
    /// container format exactly.
    pub fn is_amazon(&self) -> bool {
        matches!(self, DiskFormat::Ami | DiskFormat::Ari | DiskFormat::Aki)
    }
}

impl FromStr for DiskFormat {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DiskFormat::ALL
            .into_iter()
            .find(|format| format.as_str() == s)
            .ok_or_else(|| ModelError::InvalidDiskFormat(s.to_string()))
    }
}

impl fmt::Display for DiskFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Envelope the image bits are wrapped in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerFormat {
    Ami,
    Ari,
    Aki,
    Bare,
    Ovf,
}

impl ContainerFormat {
    pub const ALL: [ContainerFormat; 5] = [
        ContainerFormat::Ami,
        ContainerFormat::Ari,
        ContainerFormat::Aki,
        ContainerFormat::Bare,
        ContainerFormat::Ovf,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerFormat::Ami => "ami",
            ContainerFormat::Ari => "ari",
            ContainerFormat::Aki => "aki",
            ContainerFormat::Bare => "bare",
            ContainerFormat::Ovf => "ovf",
        }
    }

    pub fn is_amazon(&self) -> bool {
        matches!(
            self,
            ContainerFormat::Ami | ContainerFormat::Ari | ContainerFormat::Aki
        )
    }
}

impl FromStr for ContainerFormat {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContainerFormat::ALL
            .into_iter()
            .find(|format| format.as_str() == s)
            .ok_or_else(|| ModelError::InvalidContainerFormat(s.to_string()))
    }
}

impl fmt::Display for ContainerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
