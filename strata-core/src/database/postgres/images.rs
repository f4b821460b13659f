use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    Executor, FromRow, PgPool, Postgres, QueryBuilder, Transaction,
    postgres::PgPoolOptions,
};
use strata_model::{
    ContainerFormat, DiskFormat, ImageId, ImageProperties, ImageRecord,
    ImageStatus, ImageUpdate, ModelError, NewImage,
};
use tracing::{debug, info};

use crate::{
    database::ports::images::ImageRepository,
    error::{RegistryError, Result},
    query::{ImageFilters, ListingWindow, VisibilityScope},
    validation::validate_record,
};

const IMAGE_COLUMNS: &str = "images.id, images.name, images.size, images.status, \
     images.is_public, images.disk_format, images.container_format, \
     images.checksum, images.location, images.owner, images.created_at, \
     images.updated_at, images.deleted_at";

const LIVE_IMAGE: &str = "images.deleted_at IS NULL \
     AND images.status NOT IN ('deleted', 'pending_delete')";

#[derive(Clone, Debug)]
pub struct PostgresImageRepository {
    pool: PgPool,
}

impl PostgresImageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool against `database_url`.
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
    ) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .test_before_acquire(true)
            .connect(database_url)
            .await
            .map_err(|e| {
                RegistryError::Storage(format!(
                    "Database connection failed: {}",
                    e
                ))
            })?;

        info!(max_connections, "Connected image registry to Postgres");
        Ok(Self::new(pool))
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn load_properties<'e, E>(
        executor: E,
        ids: Vec<i64>,
    ) -> Result<HashMap<i64, ImageProperties>>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, PropertyRow>(
            "SELECT image_id, name, value FROM image_properties \
             WHERE deleted = FALSE AND image_id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(executor)
        .await
        .map_err(|err| {
            RegistryError::Storage(format!(
                "Failed to load image properties: {}",
                err
            ))
        })?;

        let mut by_image: HashMap<i64, ImageProperties> = HashMap::new();
        for row in rows {
            by_image
                .entry(row.image_id)
                .or_default()
                .insert(row.name, row.value);
        }
        Ok(by_image)
    }

    async fn lock_live(
        tx: &mut Transaction<'_, Postgres>,
        id: ImageId,
    ) -> Result<ImageRow> {
        let sql = format!(
            "SELECT {IMAGE_COLUMNS} FROM images \
             WHERE images.id = $1 AND {LIVE_IMAGE} FOR UPDATE"
        );
        sqlx::query_as::<_, ImageRow>(&sql)
            .bind(id.get())
            .fetch_optional(&mut **tx)
            .await
            .map_err(|err| {
                RegistryError::Storage(format!(
                    "Failed to lock image {}: {}",
                    id, err
                ))
            })?
            .ok_or(RegistryError::NotFound(id))
    }
}

#[async_trait]
impl ImageRepository for PostgresImageRepository {
    async fn find(
        &self,
        scope: &VisibilityScope,
        filters: &ImageFilters,
        window: &ListingWindow,
    ) -> Result<Vec<ImageRecord>> {
        if window.limit == 0 {
            return Ok(Vec::new());
        }

        let mut qb = CandidateQueryBuilder::new(scope, filters, window).build();
        debug!(sql = qb.sql(), "Fetching image candidates");

        let rows = qb
            .build_query_as::<ImageRow>()
            .fetch_all(self.pool())
            .await
            .map_err(|err| {
                RegistryError::Storage(format!(
                    "Failed to fetch image candidates: {}",
                    err
                ))
            })?;

        let mut properties = Self::load_properties(
            self.pool(),
            rows.iter().map(|row| row.id).collect(),
        )
        .await?;

        rows.into_iter()
            .map(|row| {
                let props = properties.remove(&row.id).unwrap_or_default();
                row.into_record(props)
            })
            .collect()
    }

    async fn get_by_id(&self, id: ImageId) -> Result<Option<ImageRecord>> {
        let sql = format!("SELECT {IMAGE_COLUMNS} FROM images WHERE images.id = $1");
        let row = sqlx::query_as::<_, ImageRow>(&sql)
            .bind(id.get())
            .fetch_optional(self.pool())
            .await
            .map_err(|err| {
                RegistryError::Storage(format!(
                    "Failed to fetch image {}: {}",
                    id, err
                ))
            })?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut properties =
            Self::load_properties(self.pool(), vec![row.id]).await?;
        let props = properties.remove(&row.id).unwrap_or_default();
        row.into_record(props).map(Some)
    }

    async fn create(&self, image: NewImage) -> Result<ImageRecord> {
        let now = Utc::now();
        // Placeholder id; the real one comes back from the sequence.
        let draft = image.into_record(ImageId(0), now);

        let mut tx = self.pool().begin().await.map_err(|err| {
            RegistryError::Storage(format!("Failed to begin transaction: {}", err))
        })?;

        let sql = format!(
            "INSERT INTO images (name, size, status, is_public, disk_format, \
             container_format, checksum, location, owner, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10) \
             RETURNING {IMAGE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ImageRow>(&sql)
            .bind(draft.name.clone())
            .bind(size_to_db(draft.size))
            .bind(draft.status.as_str())
            .bind(draft.is_public)
            .bind(draft.disk_format.map(|f| f.as_str()))
            .bind(draft.container_format.map(|f| f.as_str()))
            .bind(draft.checksum.clone())
            .bind(draft.location.clone())
            .bind(draft.owner.clone())
            .bind(now)
            .fetch_one(&mut *tx)
            .await
            .map_err(|err| {
                RegistryError::Storage(format!("Failed to insert image: {}", err))
            })?;

        upsert_properties(&mut tx, row.id, &draft.properties, now).await?;

        tx.commit().await.map_err(|err| {
            RegistryError::Storage(format!("Failed to commit image insert: {}", err))
        })?;

        row.into_record(draft.properties)
    }

    async fn update(
        &self,
        id: ImageId,
        update: ImageUpdate,
        purge_props: bool,
    ) -> Result<ImageRecord> {
        let now = Utc::now();
        let mut tx = self.pool().begin().await.map_err(|err| {
            RegistryError::Storage(format!("Failed to begin transaction: {}", err))
        })?;

        let row = Self::lock_live(&mut tx, id).await?;
        let current = Self::load_properties(&mut *tx, vec![row.id]).await?;
        let mut record =
            row.into_record(current.into_values().next().unwrap_or_default())?;
        update.apply(&mut record, purge_props, now);
        // Checked under the row lock; dropping `tx` rolls back.
        validate_record(&record)?;

        sqlx::query(
            "UPDATE images SET name = $2, size = $3, status = $4, is_public = $5, \
             disk_format = $6, container_format = $7, checksum = $8, \
             location = $9, updated_at = $10 WHERE id = $1",
        )
        .bind(id.get())
        .bind(record.name.clone())
        .bind(size_to_db(record.size))
        .bind(record.status.as_str())
        .bind(record.is_public)
        .bind(record.disk_format.map(|f| f.as_str()))
        .bind(record.container_format.map(|f| f.as_str()))
        .bind(record.checksum.clone())
        .bind(record.location.clone())
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|err| {
            RegistryError::Storage(format!("Failed to update image {}: {}", id, err))
        })?;

        if purge_props {
            let keep: Vec<String> = record.properties.keys().cloned().collect();
            sqlx::query(
                "UPDATE image_properties SET deleted = TRUE, updated_at = $3 \
                 WHERE image_id = $1 AND deleted = FALSE AND NOT (name = ANY($2))",
            )
            .bind(id.get())
            .bind(keep)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(|err| {
                RegistryError::Storage(format!(
                    "Failed to purge properties of image {}: {}",
                    id, err
                ))
            })?;
        }

        if let Some(supplied) = &update.properties {
            upsert_properties(&mut tx, id.get(), supplied, now).await?;
        }

        tx.commit().await.map_err(|err| {
            RegistryError::Storage(format!("Failed to commit image update: {}", err))
        })?;

        Ok(record)
    }

    async fn soft_delete(&self, id: ImageId) -> Result<ImageRecord> {
        let now = Utc::now();
        let mut tx = self.pool().begin().await.map_err(|err| {
            RegistryError::Storage(format!("Failed to begin transaction: {}", err))
        })?;

        Self::lock_live(&mut tx, id).await?;

        let sql = format!(
            "UPDATE images SET status = $2, deleted_at = $3, updated_at = $3 \
             WHERE images.id = $1 RETURNING {IMAGE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ImageRow>(&sql)
            .bind(id.get())
            .bind(ImageStatus::Deleted.as_str())
            .bind(now)
            .fetch_one(&mut *tx)
            .await
            .map_err(|err| {
                RegistryError::Storage(format!("Failed to delete image {}: {}", id, err))
            })?;

        sqlx::query(
            "UPDATE image_properties SET deleted = TRUE, updated_at = $2 \
             WHERE image_id = $1 AND deleted = FALSE",
        )
        .bind(id.get())
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|err| {
            RegistryError::Storage(format!(
                "Failed to delete properties of image {}: {}",
                id, err
            ))
        })?;

        tx.commit().await.map_err(|err| {
            RegistryError::Storage(format!("Failed to commit image delete: {}", err))
        })?;

        row.into_record(ImageProperties::new())
    }
}

async fn upsert_properties(
    tx: &mut Transaction<'_, Postgres>,
    image_id: i64,
    properties: &ImageProperties,
    now: DateTime<Utc>,
) -> Result<()> {
    for (name, value) in properties {
        sqlx::query(
            "INSERT INTO image_properties \
             (image_id, name, value, deleted, created_at, updated_at) \
             VALUES ($1, $2, $3, FALSE, $4, $4) \
             ON CONFLICT (image_id, name) DO UPDATE \
             SET value = EXCLUDED.value, deleted = FALSE, updated_at = EXCLUDED.updated_at",
        )
        .bind(image_id)
        .bind(name)
        .bind(value)
        .bind(now)
        .execute(&mut **tx)
        .await
        .map_err(|err| {
            RegistryError::Storage(format!(
                "Failed to store property '{}' of image {}: {}",
                name, image_id, err
            ))
        })?;
    }
    Ok(())
}

fn size_to_db(size: u64) -> i64 {
    i64::try_from(size).unwrap_or(i64::MAX)
}

#[derive(Debug, FromRow)]
struct ImageRow {
    id: i64,
    name: Option<String>,
    size: i64,
    status: String,
    is_public: bool,
    disk_format: Option<String>,
    container_format: Option<String>,
    checksum: Option<String>,
    location: Option<String>,
    owner: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl ImageRow {
    fn into_record(self, properties: ImageProperties) -> Result<ImageRecord> {
        let corrupt = |err: ModelError| {
            RegistryError::Storage(format!("Corrupt image row {}: {}", self.id, err))
        };

        Ok(ImageRecord {
            id: ImageId(self.id),
            name: self.name.clone(),
            size: u64::try_from(self.size).unwrap_or(0),
            status: self.status.parse::<ImageStatus>().map_err(corrupt)?,
            is_public: self.is_public,
            disk_format: self
                .disk_format
                .as_deref()
                .map(str::parse::<DiskFormat>)
                .transpose()
                .map_err(corrupt)?,
            container_format: self
                .container_format
                .as_deref()
                .map(str::parse::<ContainerFormat>)
                .transpose()
                .map_err(corrupt)?,
            checksum: self.checksum.clone(),
            location: self.location.clone(),
            owner: self.owner.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
            properties,
        })
    }
}

#[derive(Debug, FromRow)]
struct PropertyRow {
    image_id: i64,
    name: String,
    value: String,
}

/// Translates a scope, filter set and page window into a candidate
/// `SELECT`.
///
/// The window becomes a keyset predicate on `(created_at, id)` plus a
/// `LIMIT`, so a page never reads more than `limit` image rows.
struct CandidateQueryBuilder<'a> {
    scope: &'a VisibilityScope,
    filters: &'a ImageFilters,
    window: &'a ListingWindow,
    qb: QueryBuilder<'a, Postgres>,
}

impl<'a> fmt::Debug for CandidateQueryBuilder<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CandidateQueryBuilder")
            .field("scope", &self.scope)
            .field("filters", &self.filters)
            .field("window", &self.window)
            .field("query_builder", &"<sqlx::QueryBuilder<Postgres>>")
            .finish()
    }
}

impl<'a> CandidateQueryBuilder<'a> {
    fn new(
        scope: &'a VisibilityScope,
        filters: &'a ImageFilters,
        window: &'a ListingWindow,
    ) -> Self {
        let qb = QueryBuilder::new(format!(
            "SELECT {IMAGE_COLUMNS} FROM images WHERE {LIVE_IMAGE}"
        ));
        Self {
            scope,
            filters,
            window,
            qb,
        }
    }

    fn build(mut self) -> QueryBuilder<'a, Postgres> {
        self.apply_scope();
        self.apply_filters();
        self.apply_window();
        self.qb
    }

    fn apply_window(&mut self) {
        if let Some(after) = self.window.after {
            self.qb.push(" AND (images.created_at < ");
            self.qb.push_bind(after.created_at);
            self.qb.push(" OR (images.created_at = ");
            self.qb.push_bind(after.created_at);
            self.qb.push(" AND images.id < ");
            self.qb.push_bind(after.id.get());
            self.qb.push("))");
        }

        self.qb
            .push(" ORDER BY images.created_at DESC, images.id DESC LIMIT ");
        self.qb
            .push_bind(i64::try_from(self.window.limit).unwrap_or(i64::MAX));
    }

    fn apply_scope(&mut self) {
        match self.scope {
            VisibilityScope::All => {}
            VisibilityScope::OwnedOrPublic { project_id } => {
                self.qb.push(" AND (images.is_public = TRUE OR images.owner = ");
                self.qb.push_bind(project_id.clone());
                self.qb.push(")");
            }
            VisibilityScope::PublicOnly => {
                self.qb.push(" AND images.is_public = TRUE");
            }
        }
    }

    fn apply_filters(&mut self) {
        let filters = self.filters;

        for (column, value) in [
            ("name", &filters.name),
            ("status", &filters.status),
            ("disk_format", &filters.disk_format),
            ("container_format", &filters.container_format),
        ] {
            if let Some(value) = value {
                self.qb.push(" AND images.");
                self.qb.push(column);
                self.qb.push(" = ");
                self.qb.push_bind(value.clone());
            }
        }

        if let Some(min) = filters.size.min {
            self.qb.push(" AND images.size >= ");
            self.qb.push_bind(size_to_db(min));
        }
        if let Some(max) = filters.size.max {
            self.qb.push(" AND images.size <= ");
            self.qb.push_bind(size_to_db(max));
        }

        for (key, value) in &filters.properties {
            self.qb.push(
                " AND EXISTS (SELECT 1 FROM image_properties p \
                 WHERE p.image_id = images.id AND p.deleted = FALSE AND p.name = ",
            );
            self.qb.push_bind(key.clone());
            self.qb.push(" AND p.value = ");
            self.qb.push_bind(value.clone());
            self.qb.push(")");
        }
    }
}
