use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Registry-assigned image identifier.
///
/// Ids are handed out by the record store in increasing order and are never
/// reused, not even after the record they named has been soft-deleted.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct ImageId(pub i64);

impl ImageId {
    pub fn new(value: i64) -> Self {
        ImageId(value)
    }

    pub fn get(&self) -> i64 {
        self.0
    }

    /// The id that follows this one in allocation order.
    pub fn next(&self) -> Self {
        ImageId(self.0.saturating_add(1))
    }
}

impl From<i64> for ImageId {
    fn from(value: i64) -> Self {
        ImageId(value)
    }
}

impl FromStr for ImageId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(ImageId)
            .map_err(|_| ModelError::InvalidId(s.to_string()))
    }
}

impl std::fmt::Display for ImageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
