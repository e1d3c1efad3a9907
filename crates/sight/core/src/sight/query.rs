//! Probabilistic observer → target detection.
//!
//! A detection combines two independent factors:
//!
//! 1. a *base chance* from distance, facing, light, movement, perception and
//!    stealth, and
//! 2. an *obstruction factor* from the tallest cell on the Bresenham line
//!    between the two entities.
//!
//! Their product is resolved with one deterministic roll. Pairs beyond
//! `max_sight_range` or with a zero chance never consume a roll.

use tracing::trace;

use crate::config::SightConfig;
use crate::env::{GridSurface, RngOracle, compute_seed};
use crate::state::{Position, Sighted, Turn};

use super::cache::DetectionCache;
use super::fov::bearing_difference;
use super::line;

/// Roll context for the detection draw.
pub const DETECTION_ROLL: u32 = 0;
/// Roll context for the ambient-occlusion miss draw.
pub const OCCLUSION_MISS_ROLL: u32 = 1;

/// Full breakdown of one evaluation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Detection {
    pub distance: f32,
    pub base_chance: f32,
    pub obstruction: f32,
    /// `base_chance * obstruction`.
    pub chance: f32,
    pub detected: bool,
    /// Served from the memo table rather than evaluated.
    pub cached: bool,
}

impl Detection {
    fn out_of_range(distance: f32) -> Self {
        Self {
            distance,
            base_chance: 0.0,
            obstruction: 0.0,
            chance: 0.0,
            detected: false,
            cached: false,
        }
    }
}

/// Borrowed inputs shared by every evaluation in one turn.
pub struct QueryContext<'a, G: ?Sized, R: ?Sized> {
    pub config: &'a SightConfig,
    pub grid: &'a G,
    pub rng: &'a R,
    pub seed: u64,
    pub turn: Turn,
}

impl<G: ?Sized, R: ?Sized> Clone for QueryContext<'_, G, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<G: ?Sized, R: ?Sized> Copy for QueryContext<'_, G, R> {}

/// Detection chance before obstruction, clamped to `[0, 1]`.
pub fn base_chance<G, E>(config: &SightConfig, grid: &G, observer: &E, target: &E) -> f32
where
    G: GridSurface + ?Sized,
    E: Sighted + ?Sized,
{
    let from = observer.position();
    let to = target.position();
    let distance = from.distance(to);
    let mut chance = 1.0_f32;

    if distance > config.degradation_start {
        let span = config.max_sight_range - config.degradation_start;
        chance = if span > 0.0 {
            (1.0 - (distance - config.degradation_start) / span).max(0.0)
        } else {
            0.0
        };
    }

    if let Some(facing) = observer.facing() {
        if from != to && bearing_difference(from, facing, to) > config.peripheral_angle / 2.0 {
            chance *= config.peripheral_penalty;
        }
    }

    let light = grid.light(to);
    if light < config.darkness_threshold {
        chance *= light + config.darkness_penalty;
    }

    if target.is_moving() {
        chance = (chance + config.movement_bonus).min(1.0);
    }

    chance *= observer.perception();
    chance *= 1.0 - target.stealth().clamp(0.0, 1.0);

    chance.clamp(0.0, 1.0)
}

/// Observer diagonally adjacent to `blocker`, with `target` lying in the same
/// diagonal direction.
pub fn is_corner_peek(observer: Position, blocker: Position, target: Position) -> bool {
    let (wx, wy) = (blocker.x - observer.x, blocker.y - observer.y);
    wx.abs() == 1 && wy.abs() == 1 && (wx, wy) == observer.step_toward(target)
}

/// Attenuation of the line between `observer` and `target`, in `[0, 1]`.
///
/// Only the tallest intermediate cell counts (the first one on ties). If it
/// is shorter than the observer nothing is attenuated. At or above
/// `height_threshold` it blocks completely, except for a corner peek, which is
/// dampened instead as long as no other full-height cell lies on the line.
/// Between the two it is a partial blocker scaled by its cell obstruction (or
/// `partial_obstruction_factor` when the cell has none).
pub fn obstruction_factor<G, E>(config: &SightConfig, grid: &G, observer: &E, target: &E) -> f32
where
    G: GridSurface + ?Sized,
    E: Sighted + ?Sized,
{
    let from = observer.position();
    let to = target.position();

    let blocks = |height: f32| height >= config.height_threshold && height >= observer.height();
    let mut tallest: Option<(Position, f32)> = None;
    let mut full_blockers = 0usize;
    for cell in line::interior(from, to) {
        let combined = grid.height(cell).max(grid.objects_height(cell));
        if blocks(combined) {
            full_blockers += 1;
        }
        if tallest.is_none_or(|(_, height)| combined > height) {
            tallest = Some((cell, combined));
        }
    }

    let Some((cell, height)) = tallest else {
        return 1.0;
    };
    if height <= 0.0 || height < observer.height() {
        return 1.0;
    }

    if height >= config.height_threshold {
        // A peek only works around a lone corner.
        if config.corner_peek_enabled && full_blockers == 1 && is_corner_peek(from, cell, to) {
            return config.corner_peek_dampening;
        }
        return 0.0;
    }

    let obstruction = match grid.obstruction(cell) {
        value if value > 0.0 => value,
        _ => config.partial_obstruction_factor,
    };
    (1.0 - obstruction).clamp(0.0, 1.0)
}

/// Detection evaluator with a turn-stamped memo table.
#[derive(Clone, Debug, Default)]
pub struct VisibilityQuery {
    cache: DetectionCache,
}

impl VisibilityQuery {
    pub fn new(cache_lifetime: u64) -> Self {
        Self {
            cache: DetectionCache::new(cache_lifetime),
        }
    }

    pub fn cache(&self) -> &DetectionCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut DetectionCache {
        &mut self.cache
    }

    /// Decides whether `observer` detects `target` this turn.
    pub fn evaluate<G, R, E>(
        &mut self,
        ctx: QueryContext<'_, G, R>,
        observer: &E,
        target: &E,
    ) -> Detection
    where
        G: GridSurface + ?Sized,
        R: RngOracle + ?Sized,
        E: Sighted + ?Sized,
    {
        let from = observer.position();
        let to = target.position();
        let distance = from.distance(to);
        if distance > ctx.config.max_sight_range {
            return Detection::out_of_range(distance);
        }

        let pair = (observer.id(), target.id());
        if let Some(hit) = self.cache.lookup(pair, from, to, ctx.turn) {
            trace!(observer = %pair.0, target = %pair.1, "detection cache hit");
            return Detection { cached: true, ..hit };
        }

        let base = base_chance(ctx.config, ctx.grid, observer, target);
        let obstruction = obstruction_factor(ctx.config, ctx.grid, observer, target);
        let chance = base * obstruction;
        let detected = if chance <= 0.0 {
            false
        } else {
            let seed = compute_seed(ctx.seed, ctx.turn.0, pair.0.0, pair.1.0, DETECTION_ROLL);
            ctx.rng.roll_unit(seed) <= chance
        };

        let detection = Detection {
            distance,
            base_chance: base,
            obstruction,
            chance,
            detected,
            cached: false,
        };
        self.cache.insert(pair, from, to, ctx.turn, detection);
        detection
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::env::{GridCell, MapDimensions, TerrainKind, TileGrid};
    use crate::state::{CardinalDirection, EntityId, SightEntity};

    /// Returns a fixed roll and counts how many were drawn.
    struct CountingRng {
        roll: u32,
        draws: AtomicUsize,
    }

    impl CountingRng {
        fn new(unit: f32) -> Self {
            Self {
                roll: ((unit * (1u32 << 24) as f32) as u32) << 8,
                draws: AtomicUsize::new(0),
            }
        }

        fn draws(&self) -> usize {
            self.draws.load(Ordering::SeqCst)
        }
    }

    impl RngOracle for CountingRng {
        fn next_u32(&self, _seed: u64) -> u32 {
            self.draws.fetch_add(1, Ordering::SeqCst);
            self.roll
        }
    }

    fn entity(id: u32, x: i32, y: i32) -> SightEntity {
        SightEntity::new(EntityId(id), Position::new(x, y))
    }

    fn open_grid() -> TileGrid {
        TileGrid::new(MapDimensions::new(40, 40))
    }

    fn ctx<'a>(
        config: &'a SightConfig,
        grid: &'a TileGrid,
        rng: &'a CountingRng,
    ) -> QueryContext<'a, TileGrid, CountingRng> {
        QueryContext {
            config,
            grid,
            rng,
            seed: 0,
            turn: Turn(1),
        }
    }

    #[test]
    fn out_of_range_never_rolls() {
        let config = SightConfig::default();
        let grid = open_grid();
        let rng = CountingRng::new(0.0);
        let mut query = VisibilityQuery::new(0);

        let observer = entity(1, 0, 0);
        let target = entity(2, 16, 0);
        let detection = query.evaluate(ctx(&config, &grid, &rng), &observer, &target);

        assert!(!detection.detected);
        assert_eq!(rng.draws(), 0);
        assert!(query.cache().is_empty());
    }

    #[test]
    fn same_cell_is_certain() {
        let config = SightConfig::default();
        let grid = open_grid();
        let rng = CountingRng::new(0.999);
        let mut query = VisibilityQuery::new(0);

        let observer = entity(1, 4, 4).with_facing(CardinalDirection::North);
        let target = entity(2, 4, 4);
        let detection = query.evaluate(ctx(&config, &grid, &rng), &observer, &target);

        assert_eq!(detection.base_chance, 1.0);
        assert_eq!(detection.obstruction, 1.0);
        assert!(detection.detected);
    }

    #[test]
    fn distance_degrades_linearly() {
        let config = SightConfig::default().with_ranges(8.0, 16.0);
        let grid = open_grid();
        let observer = entity(1, 0, 0);

        assert_eq!(base_chance(&config, &grid, &observer, &entity(2, 8, 0)), 1.0);
        assert_eq!(base_chance(&config, &grid, &observer, &entity(2, 12, 0)), 0.5);
        assert_eq!(base_chance(&config, &grid, &observer, &entity(2, 16, 0)), 0.0);
    }

    #[test]
    fn modifiers_stack_in_order() {
        let config = SightConfig::default();
        let mut grid = open_grid();
        let observer = entity(1, 5, 5).with_facing(CardinalDirection::East);

        // Behind the observer: peripheral penalty.
        let behind = entity(2, 2, 5);
        assert_eq!(base_chance(&config, &grid, &observer, &behind), 0.5);

        // Dark cell: light 0.2 + 0.3 penalty = 0.5 multiplier.
        grid.set_light(Position::new(8, 5), 0.2);
        let in_dark = entity(3, 8, 5);
        assert_eq!(base_chance(&config, &grid, &observer, &in_dark), 0.5);

        // Moving adds the bonus before perception and stealth apply.
        let moving = entity(4, 8, 5).moving(true).with_stealth(0.5);
        let chance = base_chance(&config, &grid, &observer, &moving);
        assert!((chance - 0.35).abs() < 1e-6, "got {chance}");

        let sharp = entity(5, 5, 5)
            .with_facing(CardinalDirection::East)
            .with_perception(3.0);
        assert_eq!(base_chance(&config, &grid, &sharp, &behind), 1.0, "clamped");
    }

    #[test]
    fn tall_wall_blocks_without_rolling() {
        let config = SightConfig::default();
        let mut grid = TileGrid::new(MapDimensions::new(10, 10));
        grid.set_terrain(Position::new(5, 5), TerrainKind::Wall);
        let rng = CountingRng::new(0.0);
        let mut query = VisibilityQuery::new(0);

        let observer = entity(1, 5, 1).with_facing(CardinalDirection::South);
        let target = entity(2, 5, 9);
        let detection = query.evaluate(ctx(&config, &grid, &rng), &observer, &target);

        assert_eq!(detection.obstruction, 0.0);
        assert!(!detection.detected);
        assert_eq!(rng.draws(), 0);
    }

    #[test]
    fn low_obstacle_uses_cell_obstruction() {
        let config = SightConfig::default();
        let mut grid = TileGrid::new(MapDimensions::new(10, 10));
        grid.set_cell(
            Position::new(5, 5),
            GridCell::OPEN.with_height(1.2).with_obstruction(0.5),
        );
        let observer = entity(1, 5, 1);
        let target = entity(2, 5, 9);
        assert_eq!(obstruction_factor(&config, &grid, &observer, &target), 0.5);

        // Taller observers look over it.
        let giant = entity(3, 5, 1).with_height(2.0);
        assert_eq!(obstruction_factor(&config, &grid, &giant, &target), 1.0);
    }

    #[test]
    fn partial_blocker_without_obstruction_uses_default_factor() {
        let config = SightConfig::default();
        let mut grid = TileGrid::new(MapDimensions::new(10, 10));
        grid.set_cell(Position::new(3, 1), GridCell::OPEN.with_height(1.0));
        let observer = entity(1, 1, 1);
        let target = entity(2, 6, 1);
        assert_eq!(
            obstruction_factor(&config, &grid, &observer, &target),
            1.0 - config.partial_obstruction_factor
        );
    }

    #[test]
    fn tallest_obstruction_dominates() {
        let config = SightConfig::default();
        let mut grid = TileGrid::new(MapDimensions::new(10, 3));
        grid.set_cell(
            Position::new(2, 1),
            GridCell::OPEN.with_height(1.1).with_obstruction(0.9),
        );
        grid.set_cell(
            Position::new(5, 1),
            GridCell::OPEN.with_height(1.3).with_obstruction(0.25),
        );
        let observer = entity(1, 0, 1);
        let target = entity(2, 8, 1);
        assert_eq!(obstruction_factor(&config, &grid, &observer, &target), 0.75);
    }

    #[test]
    fn corner_peek_dampens_instead_of_blocking() {
        let config = SightConfig::default();
        let mut grid = TileGrid::new(MapDimensions::new(8, 8));
        grid.set_terrain(Position::new(3, 3), TerrainKind::Wall);
        let observer = entity(1, 2, 2);
        let target = entity(2, 4, 4);

        assert!(is_corner_peek(
            observer.position,
            Position::new(3, 3),
            target.position
        ));
        assert_eq!(obstruction_factor(&config, &grid, &observer, &target), 0.8);

        let disabled = SightConfig::default().with_corner_peek(false);
        assert_eq!(obstruction_factor(&disabled, &grid, &observer, &target), 0.0);

        // Not adjacent: a hard block.
        let far = entity(3, 1, 1);
        assert_eq!(obstruction_factor(&config, &grid, &far, &target), 0.0);
    }

    #[test]
    fn diagonal_wall_run_is_not_peeked_through() {
        let config = SightConfig::default();
        let mut grid = TileGrid::new(MapDimensions::new(10, 10));
        for step in 3..=6 {
            grid.set_terrain(Position::new(step, step), TerrainKind::Wall);
        }
        let observer = entity(1, 2, 2);
        let target = entity(2, 7, 7);
        assert_eq!(obstruction_factor(&config, &grid, &observer, &target), 0.0);

        // A second corner further along still seals the line.
        let mut pair = TileGrid::new(MapDimensions::new(10, 10));
        pair.set_terrain(Position::new(3, 3), TerrainKind::Wall);
        pair.set_terrain(Position::new(5, 5), TerrainKind::Wall);
        assert_eq!(obstruction_factor(&config, &pair, &observer, &target), 0.0);
    }

    #[test]
    fn results_are_cached_per_turn() {
        let config = SightConfig::default();
        let grid = open_grid();
        let rng = CountingRng::new(0.5);
        let mut query = VisibilityQuery::new(0);

        let observer = entity(1, 0, 0);
        let target = entity(2, 3, 0);
        let first = query.evaluate(ctx(&config, &grid, &rng), &observer, &target);
        let second = query.evaluate(ctx(&config, &grid, &rng), &observer, &target);

        assert!(first.detected && !first.cached);
        assert!(second.cached);
        assert_eq!(rng.draws(), 1);

        let next_turn = QueryContext {
            turn: Turn(2),
            ..ctx(&config, &grid, &rng)
        };
        let third = query.evaluate(next_turn, &observer, &target);
        assert!(!third.cached);
        assert_eq!(rng.draws(), 2);
    }

    #[test]
    fn roll_above_chance_misses() {
        let config = SightConfig::default().with_ranges(0.0, 10.0);
        let grid = open_grid();
        let rng = CountingRng::new(0.75);
        let mut query = VisibilityQuery::new(0);

        // Chance is exactly 0.5 at distance 5.
        let detection = query.evaluate(
            ctx(&config, &grid, &rng),
            &entity(1, 0, 0),
            &entity(2, 5, 0),
        );
        assert_eq!(detection.chance, 0.5);
        assert!(!detection.detected);
    }
}
