//! Entity-facing types: identifiers, positions, turns and the sight traits.
mod common;
mod entity;

pub use common::{CardinalDirection, EntityId, Position, Turn};
pub use entity::{Obstructive, SightEntity, Sighted};
