use std::collections::HashMap;

use crate::state::{EntityId, Position, Turn};

use super::query::Detection;

#[derive(Clone, Copy, Debug)]
struct CachedDetection {
    turn: Turn,
    observer_at: Position,
    target_at: Position,
    detection: Detection,
}

/// Memoized detections keyed by ordered `(observer, target)` pairs.
///
/// An entry is fresh while no more than `lifetime` turns have passed since it
/// was stored and both entities still stand where they stood then. Stale
/// entries are ignored on lookup and overwritten on the next insert.
#[derive(Clone, Debug, Default)]
pub struct DetectionCache {
    lifetime: u64,
    entries: HashMap<(EntityId, EntityId), CachedDetection>,
}

impl DetectionCache {
    pub fn new(lifetime: u64) -> Self {
        Self {
            lifetime,
            entries: HashMap::new(),
        }
    }

    pub fn lifetime(&self) -> u64 {
        self.lifetime
    }

    pub fn set_lifetime(&mut self, lifetime: u64) {
        self.lifetime = lifetime;
    }

    pub fn lookup(
        &self,
        pair: (EntityId, EntityId),
        observer_at: Position,
        target_at: Position,
        turn: Turn,
    ) -> Option<Detection> {
        let entry = self.entries.get(&pair)?;
        let fresh = entry.turn <= turn
            && turn.since(entry.turn) <= self.lifetime
            && entry.observer_at == observer_at
            && entry.target_at == target_at;
        fresh.then_some(entry.detection)
    }

    pub fn insert(
        &mut self,
        pair: (EntityId, EntityId),
        observer_at: Position,
        target_at: Position,
        turn: Turn,
        detection: Detection,
    ) {
        self.entries.insert(
            pair,
            CachedDetection {
                turn,
                observer_at,
                target_at,
                detection,
            },
        );
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
