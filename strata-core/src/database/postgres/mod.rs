//! SQLx-backed record store.
//!
//! Expected schema (migrations are owned by the deployment):
//!
//! ```sql
//! CREATE TABLE images (
//!     id               BIGSERIAL PRIMARY KEY,
//!     name             TEXT,
//!     size             BIGINT NOT NULL DEFAULT 0,
//!     status           TEXT NOT NULL,
//!     is_public        BOOLEAN NOT NULL DEFAULT FALSE,
//!     disk_format      TEXT,
//!     container_format TEXT,
//!     checksum         TEXT,
//!     location         TEXT,
//!     owner            TEXT,
//!     created_at       TIMESTAMPTZ NOT NULL,
//!     updated_at       TIMESTAMPTZ NOT NULL,
//!     deleted_at       TIMESTAMPTZ
//! );
//! CREATE INDEX images_listing_idx ON images (created_at DESC, id DESC);
//!
//! CREATE TABLE image_properties (
//!     image_id   BIGINT NOT NULL REFERENCES images (id),
//!     name       TEXT NOT NULL,
//!     value      TEXT NOT NULL,
//!     deleted    BOOLEAN NOT NULL DEFAULT FALSE,
//!     created_at TIMESTAMPTZ NOT NULL,
//!     updated_at TIMESTAMPTZ NOT NULL,
//!     PRIMARY KEY (image_id, name)
//! );
//! ```
//!
//! `BIGSERIAL` never reuses values, which keeps id allocation monotonic
//! across soft deletes.

pub mod images;

pub use images::PostgresImageRepository;
