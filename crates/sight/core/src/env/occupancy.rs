use std::collections::HashMap;

use super::grid::{GridCell, GridSurface, MapDimensions};
use crate::state::{Obstructive, Position};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Occupant {
    height: f32,
    obstruction: f32,
}

/// Terrain grid overlaid with the entities standing on it.
///
/// Supplies [`GridSurface::objects_height`] from the entity snapshot taken at
/// construction. When an entity stands on a cell, the cell's obstruction is the
/// larger of terrain and entity obstruction.
pub struct OccupiedGrid<'a, G: ?Sized> {
    grid: &'a G,
    occupants: HashMap<Position, Occupant>,
}

impl<'a, G: GridSurface + ?Sized> OccupiedGrid<'a, G> {
    pub fn new<E: Obstructive>(grid: &'a G, entities: &[E]) -> Self {
        let mut occupants: HashMap<Position, Occupant> = HashMap::with_capacity(entities.len());
        for entity in entities {
            let slot = occupants.entry(entity.position()).or_default();
            slot.height = slot.height.max(entity.height());
            slot.obstruction = slot.obstruction.max(entity.obstruction().clamp(0.0, 1.0));
        }
        Self { grid, occupants }
    }
}

impl<G: GridSurface + ?Sized> GridSurface for OccupiedGrid<'_, G> {
    fn dimensions(&self) -> MapDimensions {
        self.grid.dimensions()
    }

    fn cell(&self, position: Position) -> Option<GridCell> {
        self.grid.cell(position)
    }

    fn contains(&self, position: Position) -> bool {
        self.grid.contains(position)
    }

    fn height(&self, position: Position) -> f32 {
        self.grid.height(position)
    }

    fn obstruction(&self, position: Position) -> f32 {
        let terrain = self.grid.obstruction(position);
        self.occupants
            .get(&position)
            .map_or(terrain, |occupant| terrain.max(occupant.obstruction))
    }

    fn light(&self, position: Position) -> f32 {
        self.grid.light(position)
    }

    fn objects_height(&self, position: Position) -> f32 {
        let own = self.grid.objects_height(position);
        self.occupants
            .get(&position)
            .map_or(own, |occupant| own.max(occupant.height))
    }

    fn is_wall(&self, position: Position) -> bool {
        self.grid.is_wall(position)
    }

    fn revision(&self) -> u64 {
        self.grid.revision()
    }
}
