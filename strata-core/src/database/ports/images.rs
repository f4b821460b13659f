use async_trait::async_trait;
use strata_model::{ImageId, ImageRecord, ImageUpdate, NewImage};

use crate::{
    Result,
    query::{ImageFilters, ListingWindow, VisibilityScope},
};

/// Repository port for image records.
///
/// `find` returns a read snapshot of candidates. It must include every
/// visible match that follows `window.after`, or at least the first
/// `window.limit` of them in listing order. Adapters may return more; the
/// listing engine re-checks and trims.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageRepository: Send + Sync {
    async fn find(
        &self,
        scope: &VisibilityScope,
        filters: &ImageFilters,
        window: &ListingWindow,
    ) -> Result<Vec<ImageRecord>>;

    /// Fetch by id, tombstones included.
    async fn get_by_id(&self, id: ImageId) -> Result<Option<ImageRecord>>;

    /// Store a new image under a freshly allocated id.
    async fn create(&self, image: NewImage) -> Result<ImageRecord>;

    /// Merge `update` into a live image. Tombstones are `NotFound`.
    ///
    /// The merged record is checked with
    /// [`validate_record`](crate::validation::validate_record) while the
    /// image is locked; an invalid merge leaves the stored image untouched.
    async fn update(
        &self,
        id: ImageId,
        update: ImageUpdate,
        purge_props: bool,
    ) -> Result<ImageRecord>;

    /// Mark a live image deleted. Its id is never handed out again.
    async fn soft_delete(&self, id: ImageId) -> Result<ImageRecord>;
}
