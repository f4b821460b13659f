//! Record stores behind the [`ImageRepository`] port.
//!
//! The in-memory store backs tests and database-less deployments. The
//! Postgres store pushes scope and filter predicates into SQL.

pub mod memory;
pub mod ports;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use memory::InMemoryImageRepository;
pub use ports::images::ImageRepository;
#[cfg(feature = "postgres")]
pub use postgres::PostgresImageRepository;
