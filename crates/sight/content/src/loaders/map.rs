//! Map data loader.
//!
//! Loads terrain, per-cell heights and light from map RON files. Entity
//! placement is handled separately via scenario files.

use std::path::Path;

use serde::{Deserialize, Serialize};
use sight_core::{GridSurface, MapDimensions, Position, TerrainKind, TileGrid};

use crate::loaders::{LoadResult, read_file};

/// Per-cell attribute override. Unset fields keep the terrain defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CellOverrideRon {
    x: i32,
    y: i32,
    #[serde(default)]
    height: Option<f32>,
    #[serde(default)]
    obstruction: Option<f32>,
    #[serde(default)]
    light: Option<f32>,
}

/// Map data structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct MapDataRon {
    dimensions: (u32, u32),
    #[serde(default)]
    tiles: Vec<(i32, i32, TerrainKind)>, // (x, y, terrain)
    #[serde(default)]
    cells: Vec<CellOverrideRon>,
    /// Light level applied to every cell before the overrides.
    #[serde(default)]
    ambient_light: Option<f32>,
}

/// Loader for map data from RON files.
pub struct MapLoader;

impl MapLoader {
    /// Load a [`TileGrid`] from a RON file.
    ///
    /// Unlisted cells are floor. Tiles are applied first, then cell
    /// overrides, so an override can raise a wall or dim a door. The returned
    /// grid starts at revision 0.
    pub fn load(path: &Path) -> LoadResult<TileGrid> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    /// Parse map RON text.
    pub fn parse(content: &str) -> LoadResult<TileGrid> {
        let data: MapDataRon = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse map RON: {}", e))?;

        let (width, height) = data.dimensions;
        if width == 0 || height == 0 {
            anyhow::bail!("Map dimensions must be non-zero, got {}x{}", width, height);
        }
        let mut grid = TileGrid::new(MapDimensions::new(width, height));

        if let Some(light) = data.ambient_light {
            grid.fill_light(light);
        }

        for (x, y, terrain) in data.tiles {
            let position = Position::new(x, y);
            if !grid.set_terrain(position, terrain) {
                anyhow::bail!("Tile {} lies outside the {}x{} map", position, width, height);
            }
        }

        for cell in data.cells {
            let position = Position::new(cell.x, cell.y);
            let Some(mut current) = grid.cell(position) else {
                anyhow::bail!("Cell override {} lies outside the {}x{} map", position, width, height);
            };
            if let Some(height) = cell.height {
                current = current.with_height(height);
            }
            if let Some(obstruction) = cell.obstruction {
                current = current.with_obstruction(obstruction);
            }
            if let Some(light) = cell.light {
                current = current.with_light(light);
            }
            grid.set_cell(position, current);
        }

        Ok(grid.into_fresh())
    }
}
