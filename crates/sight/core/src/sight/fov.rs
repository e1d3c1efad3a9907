//! Directional field-of-view math.
use crate::config::SightConfig;
use crate::state::{CardinalDirection, Position};

use super::visibility_map::VisibilityMap;

/// Angle in degrees (`[0, 180]`) between `facing` and the bearing from
/// `origin` to `target`. Zero when the two positions coincide.
pub fn bearing_difference(origin: Position, facing: CardinalDirection, target: Position) -> f32 {
    if origin == target {
        return 0.0;
    }
    let dx = (target.x - origin.x) as f32;
    let dy = (target.y - origin.y) as f32;
    let bearing = dy.atan2(dx).to_degrees();
    let diff = (bearing - facing.angle_degrees()).rem_euclid(360.0);
    if diff > 180.0 { 360.0 - diff } else { diff }
}

/// Whether `cell` lies in the field of view of an observer at `origin`.
///
/// A 180° field of view is the half-plane in front of the observer, side
/// cells included. Any other width is a cone tested against the bearing.
pub fn in_field_of_view(
    config: &SightConfig,
    origin: Position,
    facing: CardinalDirection,
    cell: Position,
) -> bool {
    if cell == origin {
        return true;
    }
    let angle = config.field_of_view_angle;
    if angle >= 360.0 {
        return true;
    }
    if angle == 180.0 {
        let (dx, dy) = (cell.x - origin.x, cell.y - origin.y);
        return match facing {
            CardinalDirection::East => dx >= 0,
            CardinalDirection::West => dx <= 0,
            CardinalDirection::South => dy >= 0,
            CardinalDirection::North => dy <= 0,
        };
    }
    bearing_difference(origin, facing, cell) <= angle / 2.0
}

/// Forces every cell outside the field of view to maximum occlusion and
/// marks it not visible. Returns the number of masked cells.
pub fn apply_mask(
    config: &SightConfig,
    origin: Position,
    facing: CardinalDirection,
    map: &mut VisibilityMap,
) -> usize {
    let max = config.max_occlusion();
    let mut masked = 0;
    for cell in map.dimensions().positions() {
        if !in_field_of_view(config, origin, facing, cell) {
            map.force_occlusion(cell, max);
            map.hide(cell);
            masked += 1;
        }
    }
    masked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MapDimensions;

    fn approx(actual: f32, expected: f32) -> bool {
        (actual - expected).abs() < 1e-3
    }

    #[test]
    fn bearing_difference_is_symmetric_and_bounded() {
        let origin = Position::new(5, 5);
        let east = CardinalDirection::East;
        assert!(approx(bearing_difference(origin, east, Position::new(9, 5)), 0.0));
        assert!(approx(bearing_difference(origin, east, Position::new(5, 9)), 90.0));
        assert!(approx(bearing_difference(origin, east, Position::new(5, 1)), 90.0));
        assert!(approx(bearing_difference(origin, east, Position::new(1, 5)), 180.0));
        let diagonal = bearing_difference(origin, CardinalDirection::North, Position::new(8, 2));
        assert!(approx(diagonal, 45.0));
        assert_eq!(bearing_difference(origin, east, origin), 0.0);
    }

    #[test]
    fn half_plane_includes_the_side_row() {
        let config = SightConfig::default();
        let origin = Position::new(3, 3);
        let south = CardinalDirection::South;
        assert!(in_field_of_view(&config, origin, south, Position::new(0, 3)));
        assert!(in_field_of_view(&config, origin, south, Position::new(3, 9)));
        assert!(!in_field_of_view(&config, origin, south, Position::new(3, 2)));
        assert!(in_field_of_view(&config, origin, south, origin));
    }

    #[test]
    fn narrow_cone_uses_bearing() {
        let config = SightConfig::default().with_field_of_view(90.0);
        let origin = Position::new(0, 0);
        let east = CardinalDirection::East;
        assert!(in_field_of_view(&config, origin, east, Position::new(4, 3)));
        assert!(!in_field_of_view(&config, origin, east, Position::new(3, 4)));
        assert!(!in_field_of_view(&config, origin, east, Position::new(0, 4)));
    }

    #[test]
    fn mask_forces_maximum_occlusion_behind_the_observer() {
        let config = SightConfig::default();
        let mut map = VisibilityMap::new(MapDimensions::new(5, 5));
        let origin = Position::new(2, 2);
        for cell in map.dimensions().positions() {
            map.mark_visible(cell);
        }

        let masked = apply_mask(&config, origin, CardinalDirection::East, &mut map);
        assert_eq!(masked, 10);
        assert_eq!(map.occlusion(Position::new(0, 2)), config.max_occlusion());
        assert!(!map.is_visible(Position::new(1, 4)));
        assert_eq!(map.occlusion(Position::new(2, 0)), 0);
        assert!(map.is_visible(Position::new(4, 4)));
    }
}
