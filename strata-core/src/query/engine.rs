use strata_model::{ImageId, ImageRecord};
use tracing::debug;

use super::{
    scope::VisibilityScope,
    sorting::{ListingKey, sort_newest_first},
    spec::QuerySpec,
};
use crate::error::{RegistryError, Result};

/// Upper bound on the number of images returned in one page.
pub const MAX_ITEM_LIMIT: usize = 25;

/// Page sizing policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    /// Page size when the request carries no `limit`.
    pub default_limit: usize,
    /// Requested limits above this are clamped down to it.
    pub max_limit: usize,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_limit: MAX_ITEM_LIMIT,
            max_limit: MAX_ITEM_LIMIT,
        }
    }
}

impl PageLimits {
    /// Build limits, pulling the default down to the maximum when needed.
    pub fn new(default_limit: usize, max_limit: usize) -> Self {
        Self {
            default_limit: default_limit.min(max_limit),
            max_limit,
        }
    }

    /// Effective page size for a request.
    pub fn resolve(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.default_limit).min(self.max_limit)
    }
}

/// Where a page starts and how many records it may hold.
///
/// Stores use the window to bound the candidates they read: only records
/// that follow `after` in listing order are needed, and only the first
/// `limit` of those.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListingWindow {
    pub after: Option<ListingKey>,
    pub limit: usize,
}

/// Stateless listing pipeline over a snapshot of candidate records.
///
/// Candidates may come pre-filtered from a store that pushes predicates
/// into its query planner; the engine re-checks scope, tombstones and
/// filters anyway so in-process and SQL stores produce identical pages.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListingEngine {
    limits: PageLimits,
}

impl ListingEngine {
    pub fn new(limits: PageLimits) -> Self {
        Self { limits }
    }

    /// Window for a request whose marker resolved to `after`.
    pub fn window(
        &self,
        spec: &QuerySpec,
        after: Option<ListingKey>,
    ) -> ListingWindow {
        ListingWindow {
            after,
            limit: self.limits.resolve(spec.limit),
        }
    }

    /// Listing key of the marker record, provided the caller could have
    /// been shown it under the same scope and filters.
    pub fn marker_key(
        &self,
        marker: ImageId,
        record: Option<&ImageRecord>,
        spec: &QuerySpec,
        scope: &VisibilityScope,
    ) -> Result<ListingKey> {
        record
            .filter(|record| {
                record.id == marker
                    && scope.can_see(record)
                    && spec.filters.matches(record)
            })
            .map(ListingKey::of)
            .ok_or_else(|| {
                RegistryError::invalid_parameter(
                    "marker",
                    format!("marker {marker} does not name a visible image"),
                )
            })
    }

    /// Cut one page out of `candidates`, which must hold every visible
    /// match following `window.after`.
    pub fn page<I>(
        &self,
        candidates: I,
        spec: &QuerySpec,
        scope: &VisibilityScope,
        window: &ListingWindow,
    ) -> Vec<ImageRecord>
    where
        I: IntoIterator<Item = ImageRecord>,
    {
        let mut visible: Vec<ImageRecord> = candidates
            .into_iter()
            .filter(|record| scope.can_see(record) && spec.filters.matches(record))
            .filter(|record| {
                window
                    .after
                    .is_none_or(|after| ListingKey::of(record).follows(&after))
            })
            .collect();

        sort_newest_first(&mut visible);
        visible.dedup_by_key(|record| record.id);

        debug!(
            visible = visible.len(),
            limit = window.limit,
            "Applying image listing pipeline"
        );

        visible.truncate(window.limit);
        visible
    }
}
