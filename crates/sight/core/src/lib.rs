//! Deterministic line of sight, shadow casting and ambient occlusion for
//! tile grids.
//!
//! `sight-core` answers two questions each turn: which cells the primary
//! observer sees (with graded shadow depth behind walls), and which entities
//! every sighted entity detects. Terrain is read through [`GridSurface`],
//! entities through [`Sighted`], and every random draw goes through a seeded
//! [`RngOracle`] so replays are exact. All mutation flows through
//! [`SightManager::recompute`].
pub mod config;
pub mod env;
pub mod error;
pub mod sight;
pub mod state;

pub use config::{ConfigError, SightConfig};
pub use env::{
    GridCell, GridSurface, MapDimensions, OccupiedGrid, PcgRng, RngOracle, TerrainKind, TileGrid,
    compute_seed,
};
pub use error::{ClassifiedError, ErrorSeverity, SightError};
pub use sight::{
    CellVisibility, Detection, DetectionCache, Line, RecomputeOutcome, ShadowCaster, ShadowStats,
    SightManager, VisibilityMap, VisibilityQuery, WallCache, points_between,
};
pub use state::{CardinalDirection, EntityId, Obstructive, Position, SightEntity, Sighted, Turn};
