//! Traits and adapters describing the world the sight engine reads.
//!
//! [`GridSurface`] is the single contract for terrain lookups. [`TileGrid`]
//! is the in-memory implementation, [`OccupiedGrid`] overlays entity heights,
//! and [`RngOracle`] supplies deterministic rolls.
mod grid;
mod occupancy;
mod rng;
mod tile_grid;

pub use grid::{GridCell, GridSurface, MapDimensions, TerrainKind};
pub use occupancy::OccupiedGrid;
pub use rng::{PcgRng, RngOracle, compute_seed};
pub use tile_grid::TileGrid;
