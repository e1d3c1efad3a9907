use tracing::debug;

use crate::env::{GridSurface, MapDimensions};
use crate::state::Position;

/// Lazily rebuilt list of sight-blocking cells.
///
/// Stale when explicitly invalidated, when the grid revision moves, or when
/// the grid dimensions change.
#[derive(Clone, Debug, Default)]
pub struct WallCache {
    walls: Vec<Position>,
    built_for: Option<(MapDimensions, u64)>,
    dirty: bool,
}

impl WallCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    pub fn is_stale<G: GridSurface + ?Sized>(&self, grid: &G) -> bool {
        self.dirty || self.built_for != Some((grid.dimensions(), grid.revision()))
    }

    /// Rescans the grid if stale. Returns `true` if a rebuild happened.
    pub fn refresh<G: GridSurface + ?Sized>(&mut self, grid: &G) -> bool {
        if !self.is_stale(grid) {
            return false;
        }
        let dimensions = grid.dimensions();
        self.walls.clear();
        self.walls
            .extend(dimensions.positions().filter(|position| grid.is_wall(*position)));
        self.built_for = Some((dimensions, grid.revision()));
        self.dirty = false;
        debug!(
            walls = self.walls.len(),
            revision = grid.revision(),
            "rebuilt wall cache"
        );
        true
    }

    pub fn walls(&self) -> &[Position] {
        &self.walls
    }

    /// Walls within Euclidean `radius` of `center`.
    pub fn within(&self, center: Position, radius: f32) -> impl Iterator<Item = Position> + '_ {
        self.walls
            .iter()
            .copied()
            .filter(move |wall| center.distance(*wall) <= radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{TerrainKind, TileGrid};

    #[test]
    fn rebuilds_only_when_stale() {
        let mut grid = TileGrid::from_rows(&["#...", "..+.", "...."]);
        let mut cache = WallCache::new();

        assert!(cache.refresh(&grid));
        assert_eq!(cache.walls(), &[Position::new(0, 0), Position::new(2, 1)]);
        assert!(!cache.refresh(&grid));

        grid.open_door(Position::new(2, 1));
        assert!(cache.is_stale(&grid));
        assert!(cache.refresh(&grid));
        assert_eq!(cache.walls(), &[Position::new(0, 0)]);

        cache.invalidate();
        assert!(cache.refresh(&grid));

        grid.set_terrain(Position::new(3, 2), TerrainKind::Wall);
        assert!(cache.refresh(&grid));
        assert_eq!(cache.within(Position::new(3, 1), 1.0).count(), 1);
    }
}
