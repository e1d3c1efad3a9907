use std::path::PathBuf;

use sight_content::{ConfigLoader, MapLoader, ScenarioLoader};
use sight_core::{EntityId, GridSurface, Position, SightManager, Sighted};

fn data(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("data")
        .join(relative)
}

#[test]
fn sample_files_load_and_recompute() {
    let grid = MapLoader::load(&data("maps/courtyard.ron")).unwrap();
    let mut entities = ScenarioLoader::load(&data("scenarios/patrol.ron")).unwrap();
    let config = ConfigLoader::load(&data("sight.toml")).unwrap();

    assert!(grid.is_wall(Position::new(6, 4)), "shed door starts closed");
    assert_eq!(entities.len(), 4);

    let mut manager = SightManager::new(config).unwrap().with_seed(11);
    let outcome = manager.recompute(&grid, &mut entities).unwrap();
    assert!(outcome.shadows_recomputed);
    assert_eq!(outcome.observers, 3);

    // The thief is sealed inside the shed.
    assert!(!entities[0].visible_entities().contains(&EntityId(2)));
    assert!(manager.is_visible(Position::new(2, 4)));
}
