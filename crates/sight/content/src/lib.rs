//! Data-driven sight content and loaders.
//!
//! This crate reads the files a sight session starts from:
//! - Map layouts with terrain, heights and light (RON)
//! - Scenarios placing observers and targets on a map (RON)
//! - Sight configuration (TOML)
//!
//! Every loader returns `sight-core` types directly, deserialized through serde.

#[cfg(feature = "loaders")]
pub mod loaders;

#[cfg(feature = "loaders")]
pub use loaders::{ConfigLoader, EntitySpec, LoadResult, MapLoader, ScenarioLoader};
