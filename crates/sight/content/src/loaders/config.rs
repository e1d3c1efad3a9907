//! Sight configuration loader.

use std::path::Path;

use sight_core::SightConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for sight configuration from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and validate a [`SightConfig`] from a TOML file.
    ///
    /// Missing keys keep their defaults, so a file only needs the values it
    /// overrides.
    pub fn load(path: &Path) -> LoadResult<SightConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    /// Parse and validate TOML text.
    pub fn parse(content: &str) -> LoadResult<SightConfig> {
        let config: SightConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse sight config TOML: {}", e))?;
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid sight config: {}", e))?;
        Ok(config)
    }
}
