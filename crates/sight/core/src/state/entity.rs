//! Sight-relevant view of game entities.
//!
//! The sight subsystem never owns entities. It reads them through
//! [`Obstructive`] and [`Sighted`] and writes back only the visible-entity
//! list. [`SightEntity`] is the ready-made implementation used by tools and
//! tests; games typically implement the traits on their own actor types.

use super::common::{CardinalDirection, EntityId, Position};

/// Anything that occupies a cell and can block a line of sight.
pub trait Obstructive {
    fn id(&self) -> EntityId;

    fn position(&self) -> Position;

    /// Own obstruction height in the same units as terrain height.
    fn height(&self) -> f32;

    /// Partial-transparency factor in `[0, 1]` applied when this entity is the
    /// dominant obstruction on a line. Defaults to fully transparent.
    fn obstruction(&self) -> f32 {
        0.0
    }
}

/// An entity that can observe and be observed.
pub trait Sighted: Obstructive {
    /// `None` means omnidirectional.
    fn facing(&self) -> Option<CardinalDirection>;

    fn perception(&self) -> f32 {
        1.0
    }

    fn stealth(&self) -> f32 {
        0.0
    }

    fn is_moving(&self) -> bool {
        false
    }

    fn has_sight(&self) -> bool {
        true
    }

    /// The single observer the shadow map is centred on.
    fn is_primary_observer(&self) -> bool {
        false
    }

    fn visible_entities(&self) -> &[EntityId];

    fn visible_entities_mut(&mut self) -> &mut Vec<EntityId>;
}

/// Plain entity record implementing the sight traits.
#[derive(Clone, Debug, PartialEq)]
pub struct SightEntity {
    pub id: EntityId,
    pub position: Position,
    pub height: f32,
    pub obstruction: f32,
    pub facing: Option<CardinalDirection>,
    pub perception: f32,
    pub stealth: f32,
    pub is_moving: bool,
    pub has_sight: bool,
    pub is_primary: bool,
    visible: Vec<EntityId>,
}

impl SightEntity {
    pub const DEFAULT_HEIGHT: f32 = 1.0;

    pub fn new(id: EntityId, position: Position) -> Self {
        Self {
            id,
            position,
            height: Self::DEFAULT_HEIGHT,
            obstruction: 0.0,
            facing: None,
            perception: 1.0,
            stealth: 0.0,
            is_moving: false,
            has_sight: true,
            is_primary: false,
            visible: Vec::new(),
        }
    }

    /// Player entity flagged as the primary observer.
    pub fn player(position: Position) -> Self {
        Self::new(EntityId::PLAYER, position).as_primary()
    }

    #[must_use]
    pub fn as_primary(mut self) -> Self {
        self.is_primary = true;
        self
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
    pub fn with_facing(mut self, facing: CardinalDirection) -> Self {
        self.facing = Some(facing);
        self
    }

    #[must_use]
    pub fn with_perception(mut self, perception: f32) -> Self {
        self.perception = perception;
        self
    }

    #[must_use]
    pub fn with_stealth(mut self, stealth: f32) -> Self {
        self.stealth = stealth.clamp(0.0, 1.0);
        self
    }

    #[must_use]
    pub fn moving(mut self, is_moving: bool) -> Self {
        self.is_moving = is_moving;
        self
    }

    #[must_use]
    pub fn without_sight(mut self) -> Self {
        self.has_sight = false;
        self
    }

    /// Moves the entity and turns it toward the step it took, if cardinal.
    pub fn step_to(&mut self, position: Position) {
        let (dx, dy) = self.position.step_toward(position);
        self.facing = CardinalDirection::ALL
            .into_iter()
            .find(|dir| dir.delta() == (dx, dy))
            .or(self.facing);
        self.position = position;
    }

    pub fn turn_to(&mut self, facing: Option<CardinalDirection>) {
        self.facing = facing;
    }
}

impl Obstructive for SightEntity {
    fn id(&self) -> EntityId {
        self.id
    }

    fn position(&self) -> Position {
        self.position
    }

    fn height(&self) -> f32 {
        self.height
    }

    fn obstruction(&self) -> f32 {
        self.obstruction
    }
}

impl Sighted for SightEntity {
    fn facing(&self) -> Option<CardinalDirection> {
        self.facing
    }

    fn perception(&self) -> f32 {
        self.perception
    }

    fn stealth(&self) -> f32 {
        self.stealth
    }

    fn is_moving(&self) -> bool {
        self.is_moving
    }

    fn has_sight(&self) -> bool {
        self.has_sight
    }

    fn is_primary_observer(&self) -> bool {
        self.is_primary
    }

    fn visible_entities(&self) -> &[EntityId] {
        &self.visible
    }

    fn visible_entities_mut(&mut self) -> &mut Vec<EntityId> {
        &mut self.visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_to_turns_toward_cardinal_moves_only() {
        let mut entity = SightEntity::new(EntityId(3), Position::new(2, 2));
        entity.step_to(Position::new(2, 3));
        assert_eq!(entity.facing, Some(CardinalDirection::South));

        // Diagonal steps keep the previous facing.
        entity.step_to(Position::new(3, 4));
        assert_eq!(entity.facing, Some(CardinalDirection::South));
        assert_eq!(entity.position, Position::new(3, 4));
    }

    #[test]
    fn builder_clamps_unit_values() {
        let entity = SightEntity::new(EntityId(1), Position::ORIGIN)
            .with_stealth(1.7)
            .with_obstruction(-0.2);
        assert_eq!(entity.stealth, 1.0);
        assert_eq!(entity.obstruction, 0.0);
        assert!(SightEntity::player(Position::ORIGIN).is_primary_observer());
    }
}
