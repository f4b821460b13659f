//! Image catalog service: the seam between transports and record stores.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use strata_model::{ImageId, ImageRecord, ImageSummary, ImageUpdate, NewImage};
use tracing::{info, instrument};

use crate::{
    database::ImageRepository,
    error::{RegistryError, Result},
    query::{ListingEngine, PageLimits, QuerySpec, VisibilityScope},
    validation::{validate_image, validate_record},
};

/// Reads go through the listing engine; writes are validated and scoped
/// before they reach the store.
#[derive(Clone)]
pub struct ImageCatalog {
    repository: Arc<dyn ImageRepository>,
    engine: ListingEngine,
}

impl fmt::Debug for ImageCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageCatalog")
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

impl ImageCatalog {
    pub fn new(repository: Arc<dyn ImageRepository>, limits: PageLimits) -> Self {
        Self {
            repository,
            engine: ListingEngine::new(limits),
        }
    }

    /// Index view: one page of summaries.
    #[instrument(skip(self), level = "debug", err)]
    pub async fn list(
        &self,
        spec: &QuerySpec,
        scope: &VisibilityScope,
    ) -> Result<Vec<ImageSummary>> {
        let page = self.list_detail(spec, scope).await?;
        Ok(page.into_iter().map(ImageSummary::from).collect())
    }

    /// Detail view: one page of full records.
    #[instrument(skip(self), level = "debug", err)]
    pub async fn list_detail(
        &self,
        spec: &QuerySpec,
        scope: &VisibilityScope,
    ) -> Result<Vec<ImageRecord>> {
        let after = match spec.marker {
            Some(marker) => {
                let record = self.repository.get_by_id(marker).await?;
                Some(self.engine.marker_key(marker, record.as_ref(), spec, scope)?)
            }
            None => None,
        };

        let window = self.engine.window(spec, after);
        let candidates = self
            .repository
            .find(scope, &spec.filters, &window)
            .await?;
        Ok(self.engine.page(candidates, spec, scope, &window))
    }

    /// A single live image visible to the caller.
    ///
    /// Absent, deleted and out-of-scope ids are indistinguishable.
    #[instrument(skip(self), level = "debug", err)]
    pub async fn get_detail(
        &self,
        id: ImageId,
        scope: &VisibilityScope,
    ) -> Result<ImageRecord> {
        match self.repository.get_by_id(id).await? {
            Some(record) if scope.can_see(&record) => Ok(record),
            _ => Err(RegistryError::NotFound(id)),
        }
    }

    /// Register a new image. Project callers always own what they create;
    /// administrators may assign any owner.
    #[instrument(skip(self, image), level = "debug", err)]
    pub async fn create(
        &self,
        mut image: NewImage,
        scope: &VisibilityScope,
    ) -> Result<ImageRecord> {
        match scope {
            VisibilityScope::All => {}
            VisibilityScope::OwnedOrPublic { project_id } => {
                image.owner = Some(project_id.clone());
            }
            VisibilityScope::PublicOnly => {
                return Err(RegistryError::Forbidden(
                    "anonymous callers cannot register images".into(),
                ));
            }
        }

        validate_image(
            image.status.unwrap_or_default(),
            image.disk_format,
            image.container_format,
        )?;

        let record = self.repository.create(image).await?;
        info!(id = %record.id, owner = ?record.owner, "Registered image");
        Ok(record)
    }

    /// Merge `update` into an image the caller may modify.
    ///
    /// The merge is checked here against the current record so a bad
    /// request fails before touching the store, and again by the store
    /// under its lock, where concurrent writers are serialized.
    #[instrument(skip(self, update), level = "debug", err)]
    pub async fn update(
        &self,
        id: ImageId,
        update: ImageUpdate,
        purge_props: bool,
        scope: &VisibilityScope,
    ) -> Result<ImageRecord> {
        let current = self.writable(id, scope).await?;

        let mut merged = current;
        update.apply(&mut merged, purge_props, Utc::now());
        validate_record(&merged)?;

        let record = self.repository.update(id, update, purge_props).await?;
        info!(%id, purge_props, "Updated image");
        Ok(record)
    }

    /// Soft-delete an image the caller may modify.
    #[instrument(skip(self), level = "debug", err)]
    pub async fn delete(
        &self,
        id: ImageId,
        scope: &VisibilityScope,
    ) -> Result<ImageRecord> {
        self.writable(id, scope).await?;
        let record = self.repository.soft_delete(id).await?;
        info!(%id, "Deleted image");
        Ok(record)
    }

    async fn writable(
        &self,
        id: ImageId,
        scope: &VisibilityScope,
    ) -> Result<ImageRecord> {
        let record = self.get_detail(id, scope).await?;
        if !scope.can_modify(&record) {
            return Err(RegistryError::Forbidden(format!(
                "image {id} is not owned by the caller"
            )));
        }
        Ok(record)
    }
}
