//! Repository ports (interfaces). Adapters live next to this module.

pub mod images;
