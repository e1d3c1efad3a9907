//! Loading a map, scenario and configuration into a ready manager.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use sight_content::{ConfigLoader, MapLoader, ScenarioLoader};
use sight_core::{SightConfig, SightEntity, SightManager, TileGrid};

/// Input files shared by every command.
#[derive(Args)]
pub struct WorldArgs {
    /// Map RON file
    #[arg(short, long, value_name = "FILE")]
    pub map: PathBuf,

    /// Scenario RON file with entity placement
    #[arg(short, long, value_name = "FILE")]
    pub scenario: PathBuf,

    /// Sight configuration TOML (defaults when omitted)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Session seed for detection rolls
    #[arg(long, default_value_t = 0)]
    pub seed: u64,
}

/// Everything a command needs to run recomputes.
pub struct World {
    pub grid: TileGrid,
    pub entities: Vec<SightEntity>,
    pub manager: SightManager,
}

impl WorldArgs {
    pub fn load(&self) -> Result<World> {
        let grid = MapLoader::load(&self.map)
            .with_context(|| format!("Failed to load map: {}", self.map.display()))?;
        let entities = ScenarioLoader::load(&self.scenario)
            .with_context(|| format!("Failed to load scenario: {}", self.scenario.display()))?;
        let config = match &self.config {
            Some(path) => ConfigLoader::load(path)
                .with_context(|| format!("Failed to load config: {}", path.display()))?,
            None => SightConfig::default(),
        };
        let manager = SightManager::new(config)
            .context("Failed to build sight manager")?
            .with_seed(self.seed);

        tracing::info!(
            map = %self.map.display(),
            entities = entities.len(),
            seed = self.seed,
            "loaded world"
        );
        Ok(World {
            grid,
            entities,
            manager,
        })
    }
}
