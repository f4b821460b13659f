use std::collections::BTreeMap;

use strata_model::ImageId;

use crate::error::{RegistryError, Result};

/// Query-string prefix that marks a property filter, e.g. `property-arch`.
pub const PROPERTY_PREFIX: &str = "property-";

/// Inclusive bounds on image size. Both ends are optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SizeRange {
    pub min: Option<u64>,
    pub max: Option<u64>,
}

impl SizeRange {
    pub fn contains(&self, size: u64) -> bool {
        self.min.is_none_or(|min| size >= min)
            && self.max.is_none_or(|max| size <= max)
    }
}

/// Attribute, size and property constraints. Every supplied constraint must
/// hold for a record to match; an empty filter set matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageFilters {
    pub name: Option<String>,
    pub status: Option<String>,
    pub disk_format: Option<String>,
    pub container_format: Option<String>,
    pub size: SizeRange,
    pub properties: BTreeMap<String, String>,
}

/// A fully validated listing request.
///
/// Sort order is not part of the request: listings are always newest
/// first with the id as tie-break.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuerySpec {
    pub filters: ImageFilters,
    pub marker: Option<ImageId>,
    pub limit: Option<usize>,
}

impl QuerySpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse raw query-string pairs.
    ///
    /// Unknown keys are rejected rather than ignored. When a key repeats the
    /// last value wins.
    pub fn from_params<I, K, V>(params: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut spec = QuerySpec::default();

        for (key, value) in params {
            let key = key.as_ref();
            let value = value.as_ref();

            match key {
                "limit" => spec.limit = Some(parse_limit(value)?),
                "marker" => {
                    let marker = value.parse::<ImageId>().map_err(|_| {
                        RegistryError::invalid_parameter(
                            "marker",
                            "marker param must be an integer",
                        )
                    })?;
                    spec.marker = Some(marker);
                }
                "name" => spec.filters.name = Some(value.to_string()),
                "status" => spec.filters.status = Some(value.to_string()),
                "disk_format" => {
                    spec.filters.disk_format = Some(value.to_string())
                }
                "container_format" => {
                    spec.filters.container_format = Some(value.to_string())
                }
                "size_min" => {
                    spec.filters.size.min = Some(parse_size(key, value)?)
                }
                "size_max" => {
                    spec.filters.size.max = Some(parse_size(key, value)?)
                }
                other => match other.strip_prefix(PROPERTY_PREFIX) {
                    Some("") => {
                        return Err(RegistryError::invalid_parameter(
                            PROPERTY_PREFIX,
                            "property filter needs a key",
                        ));
                    }
                    Some(property) => {
                        spec.filters
                            .properties
                            .insert(property.to_string(), value.to_string());
                    }
                    None => {
                        return Err(RegistryError::invalid_parameter(
                            other,
                            "unsupported query parameter",
                        ));
                    }
                },
            }
        }

        Ok(spec)
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.filters.name = Some(name.into());
        self
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.filters.status = Some(status.into());
        self
    }

    pub fn disk_format(mut self, disk_format: impl Into<String>) -> Self {
        self.filters.disk_format = Some(disk_format.into());
        self
    }

    pub fn container_format(
        mut self,
        container_format: impl Into<String>,
    ) -> Self {
        self.filters.container_format = Some(container_format.into());
        self
    }

    pub fn size_min(mut self, min: u64) -> Self {
        self.filters.size.min = Some(min);
        self
    }

    pub fn size_max(mut self, max: u64) -> Self {
        self.filters.size.max = Some(max);
        self
    }

    pub fn property(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.filters.properties.insert(key.into(), value.into());
        self
    }

    pub fn marker(mut self, marker: ImageId) -> Self {
        self.marker = Some(marker);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Digit strings too long for an integer saturate; the page limits clamp
/// them down like any other oversized request.
fn parse_limit(value: &str) -> Result<usize> {
    let value = value.trim();
    let limit = match value.parse::<i64>() {
        Ok(limit) => limit,
        Err(_) if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) => {
            return Ok(usize::MAX);
        }
        Err(_) => {
            return Err(RegistryError::invalid_parameter(
                "limit",
                "limit param must be an integer",
            ));
        }
    };
    usize::try_from(limit).map_err(|_| {
        RegistryError::invalid_parameter("limit", "limit param must be positive")
    })
}

fn parse_size(param: &str, value: &str) -> Result<u64> {
    value.trim().parse::<u64>().map_err(|_| {
        RegistryError::invalid_parameter(
            param,
            format!("{param} param must be a non-negative integer"),
        )
    })
}
