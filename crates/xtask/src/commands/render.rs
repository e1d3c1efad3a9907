//! Recompute a scenario once and print the resulting visibility.
//!
//! ASCII legend: `@` primary observer, `e` other entities, `#`/`+` blocking
//! terrain, `/` open door, digits for shadow depth, `.` visible, `,`
//! explored, blank for unknown.

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use serde::Serialize;

use sight_core::{
    EntityId, GridSurface, Position, RecomputeOutcome, SightEntity, Sighted, TerrainKind,
    TileGrid, VisibilityMap,
};

use crate::world::WorldArgs;

/// Recompute a scenario and print the visibility map
#[derive(Parser)]
pub struct Render {
    #[command(flatten)]
    world: WorldArgs,

    /// Number of recomputes to run before printing
    #[arg(short, long, default_value_t = 1)]
    turns: u32,

    /// Output format
    #[arg(short, long, value_enum, default_value = "ascii")]
    format: OutputFormat,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    /// Colored character grid plus visible lists
    Ascii,
    /// Full JSON report
    Json,
}

#[derive(Serialize)]
struct RenderReport {
    turn: u64,
    shadows_recomputed: bool,
    width: u32,
    height: u32,
    /// Row-major occlusion levels.
    occlusion: Vec<Vec<u8>>,
    visible: Vec<Position>,
    explored: usize,
    entities: Vec<EntityReport>,
}

#[derive(Serialize)]
struct EntityReport {
    id: EntityId,
    position: Position,
    primary: bool,
    sees: Vec<EntityId>,
}

impl Render {
    pub fn execute(self) -> Result<()> {
        let mut world = self.world.load()?;
        let turns = self.turns.max(1);

        let mut outcome = None;
        for _ in 0..turns {
            outcome = Some(
                world
                    .manager
                    .recompute(&world.grid, &mut world.entities)
                    .context("Recompute failed")?,
            );
        }
        let outcome = outcome.context("No recompute ran")?;
        let map = world
            .manager
            .visibility_map()
            .context("Visibility map missing after recompute")?;

        match self.format {
            OutputFormat::Ascii => print_ascii(&world.grid, &world.entities, map, &outcome),
            OutputFormat::Json => print_json(&world.entities, map, &outcome)?,
        }
        Ok(())
    }
}

fn glyph(grid: &TileGrid, entities: &[SightEntity], map: &VisibilityMap, cell: Position) -> String {
    if let Some(entity) = entities.iter().find(|entity| entity.position == cell) {
        let mark = if entity.is_primary_observer() { "@" } else { "e" };
        return style(mark).bold().yellow().to_string();
    }
    match grid.cell(cell).map(|c| c.terrain) {
        Some(TerrainKind::Wall) => return style("#").white().to_string(),
        Some(TerrainKind::Door { open: false }) => return style("+").white().to_string(),
        Some(TerrainKind::Door { open: true }) => return style("/").white().to_string(),
        _ => {}
    }
    let Some(state) = map.get(cell) else {
        return " ".to_string();
    };
    if state.ambient_occlusion > 0 {
        style(state.ambient_occlusion.to_string()).dim().to_string()
    } else if state.visible {
        style(".").green().to_string()
    } else if state.explored {
        style(",").blue().to_string()
    } else {
        " ".to_string()
    }
}

fn print_ascii(
    grid: &TileGrid,
    entities: &[SightEntity],
    map: &VisibilityMap,
    outcome: &RecomputeOutcome,
) {
    println!(
        "{} {}  {} {}  {} {}",
        style("Turn:").bold().cyan(),
        outcome.turn,
        style("Shadows recast:").bold().cyan(),
        outcome.shadows_recomputed,
        style("Visible cells:").bold().cyan(),
        map.visible_count()
    );
    println!();

    let dimensions = map.dimensions();
    for y in 0..dimensions.height as i32 {
        let row: String = (0..dimensions.width as i32)
            .map(|x| glyph(grid, entities, map, Position::new(x, y)))
            .collect();
        println!("{}", row);
    }
    println!();

    println!("{}", style("Sightings:").bold().yellow());
    for entity in entities {
        let sees: Vec<String> = entity
            .visible_entities()
            .iter()
            .map(ToString::to_string)
            .collect();
        println!(
            "  {} at {}{} sees [{}]",
            entity.id,
            entity.position,
            if entity.is_primary_observer() { " (primary)" } else { "" },
            sees.join(", ")
        );
    }
}

fn print_json(
    entities: &[SightEntity],
    map: &VisibilityMap,
    outcome: &RecomputeOutcome,
) -> Result<()> {
    let dimensions = map.dimensions();
    let occlusion = (0..dimensions.height as i32)
        .map(|y| {
            (0..dimensions.width as i32)
                .map(|x| map.occlusion(Position::new(x, y)))
                .collect()
        })
        .collect();
    let report = RenderReport {
        turn: outcome.turn.0,
        shadows_recomputed: outcome.shadows_recomputed,
        width: dimensions.width,
        height: dimensions.height,
        occlusion,
        visible: map
            .iter()
            .filter(|(_, cell)| cell.visible)
            .map(|(position, _)| position)
            .collect(),
        explored: map.iter().filter(|(_, cell)| cell.explored).count(),
        entities: entities
            .iter()
            .map(|entity| EntityReport {
                id: entity.id,
                position: entity.position,
                primary: entity.is_primary_observer(),
                sees: entity.visible_entities().to_vec(),
            })
            .collect(),
    };

    let json =
        serde_json::to_string_pretty(&report).context("Failed to serialize render report")?;
    println!("{}", json);
    Ok(())
}
