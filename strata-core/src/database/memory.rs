use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use strata_model::{ImageId, ImageRecord, ImageStatus, ImageUpdate, NewImage};
use tokio::sync::RwLock;
use tracing::debug;

use crate::{
    database::ports::images::ImageRepository,
    error::{RegistryError, Result},
    query::{ImageFilters, ListingKey, ListingWindow, VisibilityScope},
    validation::validate_record,
};

/// Process-local record store.
///
/// Ids are allocated from a counter that only moves forward, so deleting
/// the newest image does not free its id.
#[derive(Debug, Default)]
pub struct InMemoryImageRepository {
    state: RwLock<MemoryState>,
}

#[derive(Debug)]
struct MemoryState {
    images: BTreeMap<ImageId, ImageRecord>,
    next_id: ImageId,
}

impl Default for MemoryState {
    fn default() -> Self {
        Self {
            images: BTreeMap::new(),
            next_id: ImageId(1),
        }
    }
}

impl InMemoryImageRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert fully formed records, keeping their ids and timestamps.
    pub async fn seed<I>(&self, records: I) -> Result<()>
    where
        I: IntoIterator<Item = ImageRecord>,
    {
        let mut state = self.state.write().await;
        for record in records {
            if state.images.contains_key(&record.id) {
                return Err(RegistryError::Duplicate(record.id));
            }
            if record.id >= state.next_id {
                state.next_id = record.id.next();
            }
            state.images.insert(record.id, record);
        }
        Ok(())
    }

    /// Number of stored records, tombstones included.
    pub async fn len(&self) -> usize {
        self.state.read().await.images.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ImageRepository for InMemoryImageRepository {
    async fn find(
        &self,
        scope: &VisibilityScope,
        filters: &ImageFilters,
        window: &ListingWindow,
    ) -> Result<Vec<ImageRecord>> {
        let state = self.state.read().await;
        Ok(state
            .images
            .values()
            .filter(|record| scope.can_see(record) && filters.matches(record))
            .filter(|record| {
                window
                    .after
                    .is_none_or(|after| ListingKey::of(record).follows(&after))
            })
            .cloned()
            .collect())
    }

    async fn get_by_id(&self, id: ImageId) -> Result<Option<ImageRecord>> {
        Ok(self.state.read().await.images.get(&id).cloned())
    }

    async fn create(&self, image: NewImage) -> Result<ImageRecord> {
        let mut state = self.state.write().await;
        let id = state.next_id;
        state.next_id = id.next();

        let record = image.into_record(id, Utc::now());
        state.images.insert(id, record.clone());
        debug!(%id, "Stored image");
        Ok(record)
    }

    async fn update(
        &self,
        id: ImageId,
        update: ImageUpdate,
        purge_props: bool,
    ) -> Result<ImageRecord> {
        let mut state = self.state.write().await;
        let record = state
            .images
            .get_mut(&id)
            .filter(|record| !record.is_deleted())
            .ok_or(RegistryError::NotFound(id))?;

        let mut merged = record.clone();
        update.apply(&mut merged, purge_props, Utc::now());
        validate_record(&merged)?;

        *record = merged;
        Ok(record.clone())
    }

    async fn soft_delete(&self, id: ImageId) -> Result<ImageRecord> {
        let mut state = self.state.write().await;
        let record = state
            .images
            .get_mut(&id)
            .filter(|record| !record.is_deleted())
            .ok_or(RegistryError::NotFound(id))?;

        let now = Utc::now();
        record.status = ImageStatus::Deleted;
        record.deleted_at = Some(now);
        record.updated_at = now;
        Ok(record.clone())
    }
}
