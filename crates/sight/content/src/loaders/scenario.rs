//! Scenario loader.
//!
//! A scenario places observers and targets on a map: ids, positions, facing
//! and the sight attributes of each entity.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sight_core::{CardinalDirection, EntityId, Position, SightEntity};

use crate::loaders::{LoadResult, read_file};

/// One entity entry in a scenario file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySpec {
    pub id: u32,
    pub position: Position,
    /// Marks the entity whose view drives shadows and fog of war.
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub facing: Option<CardinalDirection>,
    #[serde(default)]
    pub height: Option<f32>,
    #[serde(default)]
    pub obstruction: f32,
    #[serde(default)]
    pub perception: Option<f32>,
    #[serde(default)]
    pub stealth: f32,
    #[serde(default)]
    pub moving: bool,
    /// Entities without sight are only ever targets.
    #[serde(default)]
    pub blind: bool,
}

impl EntitySpec {
    pub fn build(&self) -> SightEntity {
        let mut entity = SightEntity::new(EntityId(self.id), self.position)
            .with_obstruction(self.obstruction)
            .with_stealth(self.stealth)
            .moving(self.moving);
        if self.primary {
            entity = entity.as_primary();
        }
        if let Some(facing) = self.facing {
            entity = entity.with_facing(facing);
        }
        if let Some(height) = self.height {
            entity = entity.with_height(height);
        }
        if let Some(perception) = self.perception {
            entity = entity.with_perception(perception);
        }
        if self.blind {
            entity = entity.without_sight();
        }
        entity
    }
}

/// Loader for entity placement from RON files.
pub struct ScenarioLoader;

impl ScenarioLoader {
    /// Load the entities of a scenario.
    ///
    /// RON format: `Vec<EntitySpec>`. Ids must be unique and at most one
    /// entity may be primary. A scenario without a primary observer loads
    /// fine; recomputing it reports the missing observer instead.
    pub fn load(path: &Path) -> LoadResult<Vec<SightEntity>> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    /// Parse scenario RON text.
    pub fn parse(content: &str) -> LoadResult<Vec<SightEntity>> {
        let specs: Vec<EntitySpec> = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse scenario RON: {}", e))?;

        let mut ids = HashSet::with_capacity(specs.len());
        for spec in &specs {
            if !ids.insert(spec.id) {
                anyhow::bail!("Duplicate entity id {} in scenario", spec.id);
            }
        }
        let primaries = specs.iter().filter(|spec| spec.primary).count();
        if primaries > 1 {
            anyhow::bail!("Scenario declares {} primary observers, expected at most one", primaries);
        }

        Ok(specs.iter().map(EntitySpec::build).collect())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use sight_core::Sighted;
    use tempfile::NamedTempFile;

    use super::*;

    const PATROL: &str = r#"[
        (id: 0, position: (x: 1, y: 1), primary: true, facing: Some(South)),
        (id: 4, position: (x: 6, y: 3), stealth: 0.3, moving: true, perception: Some(1.5)),
        (id: 7, position: (x: 2, y: 5), height: Some(0.5), blind: true),
    ]"#;

    #[test]
    fn builds_entities_from_specs() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(PATROL.as_bytes()).unwrap();

        let entities = ScenarioLoader::load(file.path()).unwrap();
        assert_eq!(entities.len(), 3);

        let player = &entities[0];
        assert!(player.is_primary_observer());
        assert_eq!(player.facing(), Some(CardinalDirection::South));

        let guard = &entities[1];
        assert_eq!(guard.id, EntityId(4));
        assert_eq!(guard.stealth(), 0.3);
        assert!(guard.is_moving());
        assert_eq!(guard.perception(), 1.5);
        assert_eq!(guard.facing(), None);

        let crate_ = &entities[2];
        assert_eq!(crate_.height, 0.5);
        assert!(!crate_.has_sight());
    }

    #[test]
    fn rejects_duplicate_ids() {
        let err = ScenarioLoader::parse(
            "[(id: 1, position: (x: 0, y: 0)), (id: 1, position: (x: 1, y: 0))]",
        )
        .unwrap_err();
        assert!(err.to_string().contains("Duplicate entity id 1"), "{err}");
    }

    #[test]
    fn rejects_two_primaries() {
        let err = ScenarioLoader::parse(
            "[(id: 0, position: (x: 0, y: 0), primary: true), (id: 1, position: (x: 1, y: 0), primary: true)]",
        )
        .unwrap_err();
        assert!(err.to_string().contains("primary"), "{err}");
    }

    #[test]
    fn scenario_without_primary_still_loads() {
        let entities = ScenarioLoader::parse("[(id: 3, position: (x: 2, y: 2))]").unwrap();
        assert!(!entities[0].is_primary_observer());
    }
}
