//! Commands exposed to the outer API layer.

pub mod sessions;
pub mod sites;
