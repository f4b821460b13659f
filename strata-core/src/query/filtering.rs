use strata_model::ImageRecord;

use super::spec::ImageFilters;

impl ImageFilters {
    /// Conjunction of every supplied constraint.
    ///
    /// Attribute filters compare against the stored spelling, so a value
    /// that names no known status or format simply matches nothing. A
    /// record without the attribute never matches a filter on it.
    pub fn matches(&self, record: &ImageRecord) -> bool {
        exact(&self.name, record.name.as_deref())
            && exact(&self.status, Some(record.status.as_str()))
            && exact(
                &self.disk_format,
                record.disk_format.as_ref().map(|f| f.as_str()),
            )
            && exact(
                &self.container_format,
                record.container_format.as_ref().map(|f| f.as_str()),
            )
            && self.size.contains(record.size)
            && self
                .properties
                .iter()
                .all(|(key, value)| record.property(key) == Some(value.as_str()))
    }
}

fn exact(expected: &Option<String>, actual: Option<&str>) -> bool {
    match expected {
        Some(expected) => actual == Some(expected.as_str()),
        None => true,
    }
}
