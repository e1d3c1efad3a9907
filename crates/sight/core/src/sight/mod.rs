//! Line of sight, shadow casting and the per-turn orchestrator.
//!
//! [`SightManager`] is the entry point. The other items are exposed for
//! callers that need a single piece, such as rasterizing a line or probing a
//! detection outside the turn loop.
mod cache;
mod fov;
mod line;
mod manager;
mod query;
mod shadow;
mod visibility_map;
mod walls;

pub use cache::DetectionCache;
pub use fov::{apply_mask, bearing_difference, in_field_of_view};
pub use line::{Line, interior, points_between};
pub use manager::{RecomputeOutcome, SightManager};
pub use query::{
    DETECTION_ROLL, Detection, OCCLUSION_MISS_ROLL, QueryContext, VisibilityQuery, base_chance,
    is_corner_peek, obstruction_factor,
};
pub use shadow::{
    ShadowCaster, ShadowStats, clear_nearby, decayed_level, has_clear_line, sees_cell,
};
pub use visibility_map::{CellFlags, CellVisibility, VisibilityMap};
pub use walls::WallCache;
