//! # Strata Core
//!
//! Core library for the Strata image registry.
//!
//! The interesting part lives in [`query`]: given the images a caller may
//! see, apply attribute, size and property filters, order them newest
//! first and cut a page using an exclusive marker. Everything around it is
//! plumbing:
//!
//! - [`database`]: the record-store port plus in-memory and Postgres adapters
//! - [`catalog`]: the service that feeds store snapshots into the engine
//! - [`validation`]: write-path checks for status and format combinations
//! - [`error`]: the error taxonomy shared by every layer
//!
//! ## Feature Flags
//!
//! - `postgres` (default): enables the SQLx-backed record store
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod catalog;
pub mod database;
pub mod error;
pub mod query;
pub mod validation;

pub use catalog::ImageCatalog;
pub use error::{RegistryError, Result};
pub use query::{
    ImageFilters, ListingEngine, PageLimits, QuerySpec, SizeRange,
    VisibilityScope,
};

pub use strata_model as model;
