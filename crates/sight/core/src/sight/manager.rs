//! Per-turn orchestration of shadows, visibility flags and entity sightings.
use tracing::{debug, warn};

use crate::config::SightConfig;
use crate::env::{GridSurface, OccupiedGrid, PcgRng, RngOracle, compute_seed};
use crate::error::SightError;
use crate::state::{CardinalDirection, EntityId, Position, Sighted, Turn};

use super::fov::{apply_mask, in_field_of_view};
use super::query::{Detection, OCCLUSION_MISS_ROLL, QueryContext, VisibilityQuery, obstruction_factor};
use super::shadow::{ShadowCaster, clear_nearby, sees_cell};
use super::visibility_map::VisibilityMap;
use super::walls::WallCache;

/// What a successful [`SightManager::recompute`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecomputeOutcome {
    pub turn: Turn,
    /// Shadows and cell flags were rebuilt. `false` means the previous map was reused.
    pub shadows_recomputed: bool,
    pub walls_rebuilt: bool,
    /// Sighted entities whose lists were rebuilt.
    pub observers: usize,
    /// Total entries across every visible-entities list.
    pub sightings: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ObserverSnapshot {
    id: EntityId,
    position: Position,
    facing: Option<CardinalDirection>,
}

/// Owns the visibility map, wall cache and detection cache for one world.
///
/// Shadows are recast only when the primary observer moves, turns (with
/// directional vision), the terrain revision changes, or a full recompute was
/// requested. Visible-entity lists are rebuilt on every call.
#[derive(Debug)]
pub struct SightManager<R = PcgRng> {
    config: SightConfig,
    rng: R,
    seed: u64,
    map: Option<VisibilityMap>,
    walls: WallCache,
    query: VisibilityQuery,
    turn: Turn,
    last_observer: Option<ObserverSnapshot>,
    needs_full: bool,
}

impl SightManager<PcgRng> {
    /// # Errors
    ///
    /// Returns [`SightError::InvalidConfig`] if `config` fails validation.
    pub fn new(config: SightConfig) -> Result<Self, SightError> {
        Self::with_rng(config, PcgRng)
    }
}

impl<R: RngOracle> SightManager<R> {
    /// # Errors
    ///
    /// Returns [`SightError::InvalidConfig`] if `config` fails validation.
    pub fn with_rng(config: SightConfig, rng: R) -> Result<Self, SightError> {
        config.validate()?;
        let query = VisibilityQuery::new(config.cache_lifetime);
        Ok(Self {
            config,
            rng,
            seed: 0,
            map: None,
            walls: WallCache::new(),
            query,
            turn: Turn::ZERO,
            last_observer: None,
            needs_full: true,
        })
    }

    /// Session seed mixed into every roll.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn config(&self) -> &SightConfig {
        &self.config
    }

    /// Replaces the configuration and forces a full recompute.
    ///
    /// # Errors
    ///
    /// Returns [`SightError::InvalidConfig`] and keeps the old configuration
    /// if `config` fails validation.
    pub fn set_config(&mut self, config: SightConfig) -> Result<(), SightError> {
        config.validate()?;
        self.query.cache_mut().set_lifetime(config.cache_lifetime);
        self.query.cache_mut().clear();
        self.config = config;
        self.needs_full = true;
        Ok(())
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of successful recomputes so far.
    pub fn turn(&self) -> Turn {
        self.turn
    }

    /// `None` until the first successful recompute.
    pub fn visibility_map(&self) -> Option<&VisibilityMap> {
        self.map.as_ref()
    }

    pub fn occlusion_level(&self, position: Position) -> u8 {
        self.map.as_ref().map_or(0, |map| map.occlusion(position))
    }

    pub fn is_visible(&self, position: Position) -> bool {
        self.map.as_ref().is_some_and(|map| map.is_visible(position))
    }

    pub fn is_explored(&self, position: Position) -> bool {
        self.map.as_ref().is_some_and(|map| map.is_explored(position))
    }

    /// Forces a wall rescan on the next recompute.
    pub fn invalidate_walls(&mut self) {
        self.walls.invalidate();
    }

    /// Forces shadows to be recast on the next recompute.
    pub fn mark_dirty(&mut self) {
        self.needs_full = true;
    }

    pub fn clear_cache(&mut self) {
        self.query.cache_mut().clear();
    }

    /// Drops the fog-of-war memory. Visibility is rebuilt on the next recompute.
    pub fn forget_explored(&mut self) {
        if let Some(map) = self.map.as_mut() {
            map.forget_explored();
        }
        self.needs_full = true;
    }

    /// Advances one turn and refreshes visibility around the primary observer.
    ///
    /// # Errors
    ///
    /// Returns [`SightError::MissingObserver`] if no entity is flagged as the
    /// primary observer. Nothing is modified in that case, the turn included.
    pub fn recompute<G, E>(
        &mut self,
        grid: &G,
        entities: &mut [E],
    ) -> Result<RecomputeOutcome, SightError>
    where
        G: GridSurface + ?Sized,
        E: Sighted,
    {
        let Some(primary) = entities.iter().position(|entity| entity.is_primary_observer()) else {
            warn!(turn = %self.turn, "no primary observer, keeping previous visibility");
            return Err(SightError::MissingObserver);
        };

        self.turn = self.turn.next();
        let observer = &entities[primary];
        let snapshot = ObserverSnapshot {
            id: observer.id(),
            position: observer.position(),
            facing: observer.facing(),
        };

        let dimensions = grid.dimensions();
        if self.map.as_ref().is_none_or(|map| map.dimensions() != dimensions) {
            self.map = Some(VisibilityMap::new(dimensions));
            self.needs_full = true;
        }
        let walls_rebuilt = self.walls.refresh(grid);

        let directional = self.config.directional_vision_enabled;
        let dirty = self.needs_full
            || walls_rebuilt
            || self.last_observer.is_none_or(|last| {
                last.id != snapshot.id
                    || last.position != snapshot.position
                    || (directional && last.facing != snapshot.facing)
            });

        if dirty {
            if let Some(map) = self.map.as_mut() {
                recast(&self.config, &self.walls, grid, &snapshot, map);
            }
            self.last_observer = Some(snapshot);
            self.needs_full = false;
        } else {
            debug!(turn = %self.turn, observer = %snapshot.id, "observer unchanged, reusing shadows");
        }

        let lists = self.collect_sightings(grid, entities, primary);
        let mut outcome = RecomputeOutcome {
            turn: self.turn,
            shadows_recomputed: dirty,
            walls_rebuilt,
            observers: 0,
            sightings: 0,
        };
        for (index, list) in lists {
            if entities[index].has_sight() {
                outcome.observers += 1;
            }
            outcome.sightings += list.len();
            *entities[index].visible_entities_mut() = list;
        }
        debug!(
            turn = %outcome.turn,
            observers = outcome.observers,
            sightings = outcome.sightings,
            "recomputed sight"
        );
        Ok(outcome)
    }

    /// Builds every entity's visible list against the terrain plus occupants.
    fn collect_sightings<G, E>(
        &mut self,
        grid: &G,
        entities: &[E],
        primary: usize,
    ) -> Vec<(usize, Vec<EntityId>)>
    where
        G: GridSurface + ?Sized,
        E: Sighted,
    {
        let occupied = OccupiedGrid::new(grid, entities);
        let mut lists = Vec::with_capacity(entities.len());
        for (index, observer) in entities.iter().enumerate() {
            let mut seen = Vec::new();
            if observer.has_sight() {
                for target in entities {
                    if target.id() == observer.id() {
                        continue;
                    }
                    let visible = if index == primary {
                        self.primary_sees(&occupied, observer, target)
                    } else {
                        self.observer_detects(&occupied, observer, target)
                    };
                    if visible {
                        seen.push(target.id());
                    }
                }
            }
            lists.push((index, seen));
        }
        lists
    }

    /// Deterministic check for the primary observer, so the player never
    /// sees entities flicker.
    fn primary_sees<G, E>(&self, grid: &G, observer: &E, target: &E) -> bool
    where
        G: GridSurface + ?Sized,
        E: Sighted,
    {
        let from = observer.position();
        let to = target.position();
        if from.distance(to) > self.config.max_sight_range {
            return false;
        }
        if self.config.directional_vision_enabled {
            if let Some(facing) = observer.facing() {
                if !in_field_of_view(&self.config, from, facing, to) {
                    return false;
                }
            }
        }
        obstruction_factor(&self.config, grid, observer, target) > 0.0
    }

    fn observer_detects<G, E>(&mut self, grid: &G, observer: &E, target: &E) -> bool
    where
        G: GridSurface + ?Sized,
        E: Sighted,
    {
        let ctx = QueryContext {
            config: &self.config,
            grid,
            rng: &self.rng,
            seed: self.seed,
            turn: self.turn,
        };
        if !self.query.evaluate(ctx, observer, target).detected {
            return false;
        }

        let level = self.occlusion_level(target.position());
        let miss_chance = self.config.miss_chance(level);
        if miss_chance <= 0.0 {
            return true;
        }
        let seed = compute_seed(
            self.seed,
            self.turn.0,
            observer.id().0,
            target.id().0,
            OCCLUSION_MISS_ROLL,
        );
        self.rng.roll_unit(seed) >= miss_chance
    }

    /// Probabilistic detection breakdown for one pair at the current turn.
    ///
    /// # Errors
    ///
    /// Returns [`SightError::UnknownEntity`] if either id is missing.
    pub fn detection<G, E>(
        &mut self,
        grid: &G,
        entities: &[E],
        observer: EntityId,
        target: EntityId,
    ) -> Result<Detection, SightError>
    where
        G: GridSurface + ?Sized,
        E: Sighted,
    {
        let observer = find(entities, observer)?;
        let target = find(entities, target)?;
        let occupied = OccupiedGrid::new(grid, entities);
        let ctx = QueryContext {
            config: &self.config,
            grid: &occupied,
            rng: &self.rng,
            seed: self.seed,
            turn: self.turn,
        };
        Ok(self.query.evaluate(ctx, observer, target))
    }

    /// # Errors
    ///
    /// Returns [`SightError::UnknownEntity`] if either id is missing.
    pub fn can_see<G, E>(
        &mut self,
        grid: &G,
        entities: &[E],
        observer: EntityId,
        target: EntityId,
    ) -> Result<bool, SightError>
    where
        G: GridSurface + ?Sized,
        E: Sighted,
    {
        self.detection(grid, entities, observer, target)
            .map(|detection| detection.detected)
    }

    /// The list stored on `id` by the latest recompute.
    ///
    /// # Errors
    ///
    /// Returns [`SightError::UnknownEntity`] if `id` is missing.
    pub fn visible_entities_of<'e, E: Sighted>(
        &self,
        entities: &'e [E],
        id: EntityId,
    ) -> Result<&'e [EntityId], SightError> {
        find(entities, id).map(|entity| entity.visible_entities())
    }
}

/// Resets the map, casts shadows, applies the clean-up pass and the field of
/// view mask, then flags the cells the observer sees.
fn recast<G: GridSurface + ?Sized>(
    config: &SightConfig,
    walls: &WallCache,
    grid: &G,
    observer: &ObserverSnapshot,
    map: &mut VisibilityMap,
) {
    map.reset();
    let origin = observer.position;
    let nearby = walls.within(origin, config.shadow_cast_radius as f32);
    ShadowCaster::new(config, grid, origin).cast_all(nearby, map);
    clear_nearby(config, grid, origin, map);

    let facing = observer.facing.filter(|_| config.directional_vision_enabled);
    if let Some(facing) = facing {
        apply_mask(config, origin, facing, map);
    }

    let range = config.base_sight_range;
    let reach = range.ceil() as i32;
    for dy in -reach..=reach {
        for dx in -reach..=reach {
            let cell = origin.offset(dx, dy);
            if !grid.contains(cell) || origin.distance(cell) > range {
                continue;
            }
            let in_view = facing.is_none_or(|f| in_field_of_view(config, origin, f, cell));
            if in_view && sees_cell(config, grid, origin, cell) {
                map.mark_visible(cell);
            }
        }
    }
}

fn find<E: Sighted>(entities: &[E], id: EntityId) -> Result<&E, SightError> {
    entities
        .iter()
        .find(|entity| entity.id() == id)
        .ok_or(SightError::UnknownEntity(id))
}
