//! Wall shadows and corner pockets around a single observer.
//!
//! Every wall near the observer projects a short segment away from it. Cells
//! on the segment receive an occlusion level that decays from the maximum
//! next to the wall down to zero at the far end. Corner probes spread a
//! shorter, weaker shadow sideways so corners leave partial pockets instead of
//! hard rectangular edges. A cell the observer can see directly is never
//! shaded.

use arrayvec::ArrayVec;
use tracing::debug;

use crate::config::SightConfig;
use crate::env::{GridSurface, MapDimensions};
use crate::state::Position;

use super::line::{Line, interior};
use super::query::is_corner_peek;
use super::visibility_map::VisibilityMap;

const NEIGHBOURS: [(i32, i32); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

/// No wall strictly between `from` and `to`.
pub fn has_clear_line<G: GridSurface + ?Sized>(grid: &G, from: Position, to: Position) -> bool {
    interior(from, to).all(|cell| !grid.is_wall(cell))
}

/// The only wall between `observer` and `cell` is a corner the observer peeks
/// around.
fn peeks_corner<G: GridSurface + ?Sized>(grid: &G, observer: Position, cell: Position) -> bool {
    let mut blockers = interior(observer, cell).filter(|c| grid.is_wall(*c));
    match (blockers.next(), blockers.next()) {
        (Some(corner), None) => is_corner_peek(observer, corner, cell),
        _ => false,
    }
}

/// `cell` is in direct view of `observer`, or around a peeked corner when
/// corner peeking is enabled.
pub fn sees_cell<G: GridSurface + ?Sized>(
    config: &SightConfig,
    grid: &G,
    observer: Position,
    cell: Position,
) -> bool {
    has_clear_line(grid, observer, cell)
        || (config.corner_peek_enabled && peeks_corner(grid, observer, cell))
}

/// Level for step `index` of `steps`, from `max` at the first step down to 0
/// at the last, rounded up.
pub fn decayed_level(max: u8, index: usize, steps: usize) -> u8 {
    if steps <= 1 {
        return max;
    }
    let span = steps - 1;
    let remaining = span.saturating_sub(index);
    (usize::from(max) * remaining).div_ceil(span) as u8
}

/// Counters from one casting pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ShadowStats {
    pub walls_considered: usize,
    pub walls_cast: usize,
    pub cells_shaded: usize,
}

/// Memoized line-of-sight checks from the observer, one slot per cell.
struct LosMemo {
    dimensions: MapDimensions,
    slots: Vec<Option<bool>>,
}

impl LosMemo {
    fn new(dimensions: MapDimensions) -> Self {
        Self {
            dimensions,
            slots: vec![None; dimensions.area()],
        }
    }

    fn clear_line<G: GridSurface + ?Sized>(
        &mut self,
        grid: &G,
        observer: Position,
        cell: Position,
    ) -> bool {
        let Some(index) = self.dimensions.index(cell) else {
            return false;
        };
        *self.slots[index].get_or_insert_with(|| has_clear_line(grid, observer, cell))
    }
}

/// Casts occlusion into a [`VisibilityMap`] for one observer.
pub struct ShadowCaster<'a, G: ?Sized> {
    config: &'a SightConfig,
    grid: &'a G,
    observer: Position,
    memo: LosMemo,
}

impl<'a, G: GridSurface + ?Sized> ShadowCaster<'a, G> {
    pub fn new(config: &'a SightConfig, grid: &'a G, observer: Position) -> Self {
        Self {
            config,
            grid,
            observer,
            memo: LosMemo::new(grid.dimensions()),
        }
    }

    /// Casts every wall within `shadow_cast_radius`.
    pub fn cast_all<I>(&mut self, walls: I, map: &mut VisibilityMap) -> ShadowStats
    where
        I: IntoIterator<Item = Position>,
    {
        let radius = self.config.shadow_cast_radius as f32;
        let mut stats = ShadowStats::default();
        for wall in walls {
            stats.walls_considered += 1;
            if wall == self.observer || self.observer.distance(wall) > radius {
                continue;
            }
            stats.walls_cast += 1;
            stats.cells_shaded += self.cast_wall(wall, map);
        }
        debug!(
            observer = %self.observer,
            walls = stats.walls_cast,
            shaded = stats.cells_shaded,
            "cast shadows"
        );
        stats
    }

    /// Casts one wall's segment and, when enabled, its corner probes.
    /// Returns the number of cells whose occlusion rose.
    pub fn cast_wall(&mut self, wall: Position, map: &mut VisibilityMap) -> usize {
        let max = self.config.max_occlusion();
        let mut shaded = 0;

        let segment: Vec<Position> = Line::new(wall, self.segment_end(wall)).skip(1).collect();
        let steps = segment.len();
        for (index, cell) in segment.into_iter().enumerate() {
            if self.shade(cell, decayed_level(max, index, steps), map) {
                shaded += 1;
            }
        }

        if self.config.corner_peek_enabled {
            let spread = self.config.corner_spread.max(0) as usize;
            for (dx, dy) in self.probe_directions(wall) {
                for step in 1..=spread {
                    let cell = wall.offset(dx * step as i32, dy * step as i32);
                    if !self.grid.contains(cell) || self.grid.is_wall(cell) {
                        break;
                    }
                    if self.shade(cell, decayed_level(max, step - 1, spread + 1), map) {
                        shaded += 1;
                    }
                }
            }
        }
        shaded
    }

    /// Far end of the shadow segment. Farther walls cast shorter shadows.
    fn segment_end(&self, wall: Position) -> Position {
        let dx = (wall.x - self.observer.x) as f32;
        let dy = (wall.y - self.observer.y) as f32;
        let distance = dx.hypot(dy);
        let length = (self.config.shadow_max_length - (distance / 2.0).floor() as i32)
            .max(self.config.shadow_min_length) as f32;
        wall.offset(
            (dx / distance * length).round() as i32,
            (dy / distance * length).round() as i32,
        )
    }

    /// All eight neighbour directions except the one pointing back at the
    /// observer.
    fn probe_directions(&self, wall: Position) -> ArrayVec<(i32, i32), 8> {
        let back = wall.step_toward(self.observer);
        NEIGHBOURS.into_iter().filter(|dir| *dir != back).collect()
    }

    fn shade(&mut self, cell: Position, level: u8, map: &mut VisibilityMap) -> bool {
        if level == 0 || cell == self.observer || !self.grid.contains(cell) {
            return false;
        }
        if self.memo.clear_line(self.grid, self.observer, cell) {
            return false;
        }
        map.set_occlusion(cell, level)
    }
}

/// Clears occlusion within `cleanup_radius` of the observer on every cell it
/// can see directly or around a peeked corner. Returns the number of cleared
/// cells.
pub fn clear_nearby<G: GridSurface + ?Sized>(
    config: &SightConfig,
    grid: &G,
    observer: Position,
    map: &mut VisibilityMap,
) -> usize {
    let radius = config.cleanup_radius.max(0);
    let mut cleared = 0;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let cell = observer.offset(dx, dy);
            if map.occlusion(cell) == 0 || observer.distance(cell) > radius as f32 {
                continue;
            }
            if sees_cell(config, grid, observer, cell) && map.clear_occlusion(cell) {
                cleared += 1;
            }
        }
    }
    cleared
}
