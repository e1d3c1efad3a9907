//! Measure detection odds between two entities.
//!
//! Runs the scenario for a number of turns and compares how often the
//! observer's visible list contained the target with the chance computed by
//! the detection query on the first turn.

use anyhow::{Context, Result};
use clap::Parser;
use console::style;

use sight_core::{EntityId, Sighted};

use crate::world::WorldArgs;

/// Measure how often one entity detects another
#[derive(Parser)]
pub struct Probe {
    #[command(flatten)]
    world: WorldArgs,

    /// Observer entity id
    #[arg(short, long)]
    observer: u32,

    /// Target entity id
    #[arg(short, long)]
    target: u32,

    /// Number of turns to sample
    #[arg(long, default_value_t = 100)]
    turns: u32,
}

impl Probe {
    pub fn execute(self) -> Result<()> {
        let mut world = self.world.load()?;
        let observer = EntityId(self.observer);
        let target = EntityId(self.target);
        let turns = self.turns.max(1);

        let index = world
            .entities
            .iter()
            .position(|entity| entity.id == observer)
            .with_context(|| format!("Observer {} not in scenario", observer))?;
        let is_primary = world.entities[index].is_primary_observer();

        let mut hits = 0u32;
        let mut first = None;
        for _ in 0..turns {
            world
                .manager
                .recompute(&world.grid, &mut world.entities)
                .context("Recompute failed")?;
            if first.is_none() {
                first = Some(
                    world
                        .manager
                        .detection(&world.grid, &world.entities, observer, target)
                        .context("Detection query failed")?,
                );
            }
            if world.entities[index].visible_entities().contains(&target) {
                hits += 1;
            }
        }
        let detection = first.context("No turn was sampled")?;

        println!(
            "{} {} -> {}{}",
            style("Pair:").bold().cyan(),
            observer,
            target,
            if is_primary { " (primary, deterministic)" } else { "" }
        );
        println!("{} {:.2}", style("Distance:").bold().cyan(), detection.distance);
        println!();
        println!("{}", style("Query breakdown:").bold().yellow());
        println!("  Base chance:        {:.3}", detection.base_chance);
        println!("  Obstruction factor: {:.3}", detection.obstruction);
        println!("  Final chance:       {:.3}", detection.chance);
        println!();
        println!("{}", style("Sampled:").bold().yellow());
        println!(
            "  Seen on {} of {} turns ({:.1}%)",
            hits,
            turns,
            f64::from(hits) * 100.0 / f64::from(turns)
        );
        Ok(())
    }
}
