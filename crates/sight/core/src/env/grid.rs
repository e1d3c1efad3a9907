use crate::state::Position;

/// Read-only view of the tile grid consumed by every sight component.
///
/// Only [`dimensions`](GridSurface::dimensions) and [`cell`](GridSurface::cell)
/// are required. The remaining lookups derive from them and resolve any
/// position outside the grid to open sky: height 0, obstruction 0, light 1.
/// Raycasts that leave the map therefore never error and never meet phantom
/// obstructions.
pub trait GridSurface {
    fn dimensions(&self) -> MapDimensions;

    /// Cell data for in-bounds positions, `None` otherwise.
    fn cell(&self, position: Position) -> Option<GridCell>;

    fn contains(&self, position: Position) -> bool {
        self.dimensions().contains(position)
    }

    fn height(&self, position: Position) -> f32 {
        self.cell(position).map_or(GridCell::OPEN.height, |cell| cell.height)
    }

    fn obstruction(&self, position: Position) -> f32 {
        self.cell(position)
            .map_or(GridCell::OPEN.obstruction, |cell| cell.obstruction.clamp(0.0, 1.0))
    }

    fn light(&self, position: Position) -> f32 {
        self.cell(position)
            .map_or(GridCell::OPEN.light, |cell| cell.light.clamp(0.0, 1.0))
    }

    /// Maximum height of any entity standing on the cell.
    ///
    /// Plain terrain grids know nothing about entities and report 0; the
    /// [`OccupiedGrid`](super::OccupiedGrid) overlay supplies real values.
    fn objects_height(&self, _position: Position) -> f32 {
        0.0
    }

    /// Whether the cell's terrain is an opaque obstruction (wall, closed door).
    fn is_wall(&self, position: Position) -> bool {
        self.cell(position)
            .is_some_and(|cell| cell.terrain.blocks_sight())
    }

    /// Counter that changes whenever sight-blocking terrain changes.
    ///
    /// Grids that never mutate may keep the default.
    fn revision(&self) -> u64 {
        0
    }
}

impl<G: GridSurface + ?Sized> GridSurface for &G {
    fn dimensions(&self) -> MapDimensions {
        (**self).dimensions()
    }

    fn cell(&self, position: Position) -> Option<GridCell> {
        (**self).cell(position)
    }

    fn contains(&self, position: Position) -> bool {
        (**self).contains(position)
    }

    fn height(&self, position: Position) -> f32 {
        (**self).height(position)
    }

    fn obstruction(&self, position: Position) -> f32 {
        (**self).obstruction(position)
    }

    fn light(&self, position: Position) -> f32 {
        (**self).light(position)
    }

    fn objects_height(&self, position: Position) -> f32 {
        (**self).objects_height(position)
    }

    fn is_wall(&self, position: Position) -> bool {
        (**self).is_wall(position)
    }

    fn revision(&self) -> u64 {
        (**self).revision()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MapDimensions {
    pub width: u32,
    pub height: u32,
}

impl MapDimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn contains(&self, position: Position) -> bool {
        position.x >= 0
            && position.y >= 0
            && position.x < self.width as i32
            && position.y < self.height as i32
    }

    /// Number of cells.
    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Row-major index of an in-bounds position.
    pub fn index(&self, position: Position) -> Option<usize> {
        self.contains(position)
            .then(|| position.y as usize * self.width as usize + position.x as usize)
    }

    /// All positions in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Position> + use<> {
        let (width, height) = (self.width as i32, self.height as i32);
        (0..height).flat_map(move |y| (0..width).map(move |x| Position::new(x, y)))
    }
}

/// Canonical terrain classes for grid cells.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TerrainKind {
    #[default]
    Floor,
    Wall,
    Door {
        open: bool,
    },
    Water,
    Void,
}

impl TerrainKind {
    /// Height of walls and closed doors.
    pub const WALL_HEIGHT: f32 = 2.5;

    pub fn blocks_sight(self) -> bool {
        matches!(self, TerrainKind::Wall | TerrainKind::Door { open: false })
    }
}

/// Sight attributes of one cell.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridCell {
    pub terrain: TerrainKind,
    /// Obstruction height of the terrain.
    pub height: f32,
    /// Partial-transparency factor in `[0, 1]`; 0 is fully transparent.
    pub obstruction: f32,
    /// Light level in `[0, 1]`; 1 is fully lit.
    pub light: f32,
}

impl GridCell {
    /// Open floor under full light, also the out-of-bounds default.
    pub const OPEN: Self = Self {
        terrain: TerrainKind::Floor,
        height: 0.0,
        obstruction: 0.0,
        light: 1.0,
    };

    /// Default attributes for a terrain kind under full light.
    pub fn from_terrain(terrain: TerrainKind) -> Self {
        let (height, obstruction) = if terrain.blocks_sight() {
            (TerrainKind::WALL_HEIGHT, 1.0)
        } else {
            (0.0, 0.0)
        };
        Self {
            terrain,
            height,
            obstruction,
            light: 1.0,
        }
    }

    #[must_use]
    pub fn with_height(mut self, height: f32) -> Self {
        self.height = height;
        self
    }

    #[must_use]
    pub fn with_obstruction(mut self, obstruction: f32) -> Self {
        self.obstruction = obstruction.clamp(0.0, 1.0);
        self
    }

    #[must_use]
    pub fn with_light(mut self, light: f32) -> Self {
        self.light = light.clamp(0.0, 1.0);
        self
    }
}

impl Default for GridCell {
    fn default() -> Self {
        Self::OPEN
    }
}
