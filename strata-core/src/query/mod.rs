//! Image listing: scope, filters, ordering and marker pagination.
//!
//! A listing runs as a fixed pipeline over a snapshot of candidate records:
//! visibility scope, then attribute/size/property filters, then the
//! newest-first total order, then the exclusive marker and the page limit.
//! Parameter validation happens up front in [`QuerySpec::from_params`], so
//! a bad request never reaches the pipeline.

pub mod engine;
pub mod filtering;
pub mod scope;
pub mod sorting;
pub mod spec;

pub use engine::{ListingEngine, ListingWindow, MAX_ITEM_LIMIT, PageLimits};
pub use scope::VisibilityScope;
pub use sorting::{ListingKey, sort_newest_first};
pub use spec::{ImageFilters, PROPERTY_PREFIX, QuerySpec, SizeRange};
