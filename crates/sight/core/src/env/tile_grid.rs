//! Dense in-memory grid served through [`GridSurface`].
use super::grid::{GridCell, GridSurface, MapDimensions, TerrainKind};
use crate::state::Position;

/// Row-major grid of [`GridCell`]s.
///
/// Every mutation that can change sight-blocking terrain bumps the revision,
/// which lets the wall cache and the shadow map notice doors opening without
/// explicit invalidation by the caller.
#[derive(Clone, Debug, PartialEq)]
pub struct TileGrid {
    dimensions: MapDimensions,
    cells: Vec<GridCell>,
    revision: u64,
}

impl TileGrid {
    /// Creates an all-floor grid.
    pub fn new(dimensions: MapDimensions) -> Self {
        Self::filled(dimensions, TerrainKind::Floor)
    }

    pub fn filled(dimensions: MapDimensions, terrain: TerrainKind) -> Self {
        Self {
            dimensions,
            cells: vec![GridCell::from_terrain(terrain); dimensions.area()],
            revision: 0,
        }
    }

    /// Builds a grid from ASCII rows.
    ///
    /// `#` wall, `+` closed door, `/` open door, `~` water, space void, and
    /// anything else floor. Short rows are padded with floor.
    pub fn from_rows(rows: &[&str]) -> Self {
        let width = rows.iter().map(|row| row.chars().count()).max().unwrap_or(0);
        let mut grid = Self::new(MapDimensions::new(width as u32, rows.len() as u32));
        for (y, row) in rows.iter().enumerate() {
            for (x, glyph) in row.chars().enumerate() {
                let terrain = match glyph {
                    '#' => TerrainKind::Wall,
                    '+' => TerrainKind::Door { open: false },
                    '/' => TerrainKind::Door { open: true },
                    '~' => TerrainKind::Water,
                    ' ' => TerrainKind::Void,
                    _ => continue,
                };
                grid.set_terrain(Position::new(x as i32, y as i32), terrain);
            }
        }
        grid.into_fresh()
    }

    /// Resets the revision counter of a freshly built grid.
    #[must_use]
    pub fn into_fresh(mut self) -> Self {
        self.revision = 0;
        self
    }

    /// Replaces a cell. Returns `false` if the position is outside the grid.
    pub fn set_cell(&mut self, position: Position, cell: GridCell) -> bool {
        let Some(index) = self.dimensions.index(position) else {
            return false;
        };
        self.cells[index] = cell;
        self.revision += 1;
        true
    }

    /// Changes terrain, resetting height and obstruction to the terrain
    /// defaults while keeping the cell's light level.
    pub fn set_terrain(&mut self, position: Position, terrain: TerrainKind) -> bool {
        let Some(current) = self.cell(position) else {
            return false;
        };
        self.set_cell(
            position,
            GridCell::from_terrain(terrain).with_light(current.light),
        )
    }

    /// Opens a closed door. Returns `false` if there is no closed door there.
    pub fn open_door(&mut self, position: Position) -> bool {
        self.toggle_door(position, true)
    }

    /// Closes an open door. Returns `false` if there is no open door there.
    pub fn close_door(&mut self, position: Position) -> bool {
        self.toggle_door(position, false)
    }

    fn toggle_door(&mut self, position: Position, open: bool) -> bool {
        match self.cell(position).map(|cell| cell.terrain) {
            Some(TerrainKind::Door { open: current }) if current != open => {
                self.set_terrain(position, TerrainKind::Door { open })
            }
            _ => false,
        }
    }

    /// Sets the light level of a single cell.
    ///
    /// Light never blocks sight, so the revision is left alone.
    pub fn set_light(&mut self, position: Position, light: f32) -> bool {
        let Some(index) = self.dimensions.index(position) else {
            return false;
        };
        self.cells[index].light = light.clamp(0.0, 1.0);
        true
    }

    /// Sets every cell to the same light level.
    pub fn fill_light(&mut self, light: f32) {
        let light = light.clamp(0.0, 1.0);
        for cell in &mut self.cells {
            cell.light = light;
        }
    }

    /// Positions whose terrain blocks sight.
    pub fn walls(&self) -> impl Iterator<Item = Position> + '_ {
        self.dimensions
            .positions()
            .filter(|position| self.is_wall(*position))
    }
}

impl GridSurface for TileGrid {
    fn dimensions(&self) -> MapDimensions {
        self.dimensions
    }

    fn cell(&self, position: Position) -> Option<GridCell> {
        self.dimensions
            .index(position)
            .map(|index| self.cells[index])
    }

    fn revision(&self) -> u64 {
        self.revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_bounds_reads_as_open_sky() {
        let grid = TileGrid::filled(MapDimensions::new(3, 3), TerrainKind::Wall);
        for position in [
            Position::new(-1, 0),
            Position::new(0, -1),
            Position::new(3, 1),
            Position::new(1, 3),
            Position::new(i32::MAX, i32::MIN),
        ] {
            assert!(!grid.contains(position));
            assert_eq!(grid.height(position), 0.0);
            assert_eq!(grid.obstruction(position), 0.0);
            assert_eq!(grid.light(position), 1.0);
            assert!(!grid.is_wall(position));
        }
    }

    #[test]
    fn parses_ascii_rows() {
        let grid = TileGrid::from_rows(&["#.+", "/~", "# #"]);
        assert_eq!(grid.dimensions(), MapDimensions::new(3, 3));
        assert!(grid.is_wall(Position::new(0, 0)));
        assert!(grid.is_wall(Position::new(2, 0)));
        assert!(!grid.is_wall(Position::new(0, 1)));
        assert_eq!(
            grid.cell(Position::new(1, 1)).map(|c| c.terrain),
            Some(TerrainKind::Water)
        );
        // Padded row.
        assert_eq!(
            grid.cell(Position::new(2, 1)).map(|c| c.terrain),
            Some(TerrainKind::Floor)
        );
        assert_eq!(
            grid.cell(Position::new(1, 2)).map(|c| c.terrain),
            Some(TerrainKind::Void)
        );
        assert_eq!(grid.walls().count(), 4);
        assert_eq!(grid.revision(), 0);
    }

    #[test]
    fn door_changes_bump_revision_but_light_does_not() {
        let mut grid = TileGrid::from_rows(&["..+.."]);
        let door = Position::new(2, 0);
        grid.set_light(door, 0.25);
        assert_eq!(grid.revision(), 0);

        assert!(grid.open_door(door));
        assert_eq!(grid.revision(), 1);
        assert!(!grid.is_wall(door));
        assert_eq!(grid.light(door), 0.25);

        assert!(!grid.open_door(door), "already open");
        assert!(!grid.open_door(Position::new(0, 0)), "not a door");
        assert!(grid.close_door(door));
        assert!(grid.is_wall(door));
        assert_eq!(grid.height(door), TerrainKind::WALL_HEIGHT);
    }
}
