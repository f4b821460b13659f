use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use strata_model::{ImageId, ImageRecord};

/// Composite listing key. Natural order is oldest first; listings walk it
/// in reverse.
///
/// Ids are unique, so no two records ever share a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListingKey {
    pub created_at: DateTime<Utc>,
    pub id: ImageId,
}

impl ListingKey {
    pub fn of(record: &ImageRecord) -> Self {
        Self {
            created_at: record.created_at,
            id: record.id,
        }
    }

    /// Whether `self` lists strictly after `marker` in newest-first order.
    pub fn follows(&self, marker: &ListingKey) -> bool {
        self < marker
    }
}

/// Newest-first comparison: `created_at` descending, then `id` descending.
pub fn newest_first(a: &ImageRecord, b: &ImageRecord) -> Ordering {
    ListingKey::of(b).cmp(&ListingKey::of(a))
}

pub fn sort_newest_first(records: &mut [ImageRecord]) {
    records.sort_by(newest_first);
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn at(id: i64, created_at: DateTime<Utc>) -> ImageRecord {
        ImageRecord::new(ImageId(id), created_at)
    }

    #[test]
    fn orders_by_created_at_then_id_descending() {
        let t0 = Utc.with_ymd_and_hms(2011, 1, 1, 0, 0, 0).unwrap();
        let t1 = t0 + Duration::seconds(1);
        let mut records =
            vec![at(2, t0), at(3, t1), at(4, t1), at(5, t0)];

        sort_newest_first(&mut records);

        let ids: Vec<i64> = records.iter().map(|r| r.id.get()).collect();
        assert_eq!(ids, vec![4, 3, 5, 2]);
    }

    #[test]
    fn follows_matches_sorted_position() {
        let t0 = Utc.with_ymd_and_hms(2011, 1, 1, 0, 0, 0).unwrap();
        let t1 = t0 + Duration::seconds(1);
        let marker = ListingKey::of(&at(4, t1));
        assert!(ListingKey::of(&at(3, t1)).follows(&marker));
        assert!(ListingKey::of(&at(5, t0)).follows(&marker));
        assert!(!ListingKey::of(&at(4, t1)).follows(&marker));
        assert!(!ListingKey::of(&at(9, t1)).follows(&marker));
    }
}
