use bitflags::bitflags;

use crate::env::MapDimensions;
use crate::state::Position;

bitflags! {
    /// Per-cell visibility flags.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct CellFlags: u8 {
        /// Seen from the primary observer in the latest recompute.
        const VISIBLE  = 1 << 0;
        /// Seen at least once; survives [`VisibilityMap::reset`].
        const EXPLORED = 1 << 1;
    }
}

/// Snapshot of one cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct CellVisibility {
    pub ambient_occlusion: u8,
    pub visible: bool,
    pub explored: bool,
}

/// Dense per-cell ambient occlusion and visibility flags.
///
/// Within one shadow pass occlusion only rises ([`set_occlusion`] keeps the
/// maximum). Only the field-of-view mask and the clean-up pass may overwrite
/// it, through the explicit [`force_occlusion`] and [`clear_occlusion`].
///
/// [`set_occlusion`]: VisibilityMap::set_occlusion
/// [`force_occlusion`]: VisibilityMap::force_occlusion
/// [`clear_occlusion`]: VisibilityMap::clear_occlusion
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VisibilityMap {
    dimensions: MapDimensions,
    occlusion: Vec<u8>,
    flags: Vec<CellFlags>,
}

impl VisibilityMap {
    pub fn new(dimensions: MapDimensions) -> Self {
        Self {
            dimensions,
            occlusion: vec![0; dimensions.area()],
            flags: vec![CellFlags::empty(); dimensions.area()],
        }
    }

    pub fn dimensions(&self) -> MapDimensions {
        self.dimensions
    }

    pub fn get(&self, position: Position) -> Option<CellVisibility> {
        self.dimensions
            .index(position)
            .map(|index| CellVisibility {
                ambient_occlusion: self.occlusion[index],
                visible: self.flags[index].contains(CellFlags::VISIBLE),
                explored: self.flags[index].contains(CellFlags::EXPLORED),
            })
    }

    /// Occlusion level, 0 outside the map.
    pub fn occlusion(&self, position: Position) -> u8 {
        self.dimensions
            .index(position)
            .map_or(0, |index| self.occlusion[index])
    }

    pub fn is_visible(&self, position: Position) -> bool {
        self.has_flag(position, CellFlags::VISIBLE)
    }

    pub fn is_explored(&self, position: Position) -> bool {
        self.has_flag(position, CellFlags::EXPLORED)
    }

    fn has_flag(&self, position: Position, flag: CellFlags) -> bool {
        self.dimensions
            .index(position)
            .is_some_and(|index| self.flags[index].contains(flag))
    }

    /// Zeroes occlusion and clears visibility; explored memory is kept.
    pub fn reset(&mut self) {
        self.occlusion.fill(0);
        for flags in &mut self.flags {
            flags.remove(CellFlags::VISIBLE);
        }
    }

    /// Clears the explored memory as well.
    pub fn forget_explored(&mut self) {
        self.reset();
        self.flags.fill(CellFlags::empty());
    }

    /// Raises occlusion to `level` if it is higher than the stored value.
    ///
    /// Returns `true` if the stored value changed.
    pub fn set_occlusion(&mut self, position: Position, level: u8) -> bool {
        match self.dimensions.index(position) {
            Some(index) if level > self.occlusion[index] => {
                self.occlusion[index] = level;
                true
            }
            _ => false,
        }
    }

    /// Overwrites occlusion regardless of the stored value.
    pub fn force_occlusion(&mut self, position: Position, level: u8) {
        if let Some(index) = self.dimensions.index(position) {
            self.occlusion[index] = level;
        }
    }

    /// Returns `true` if the cell was occluded.
    pub fn clear_occlusion(&mut self, position: Position) -> bool {
        match self.dimensions.index(position) {
            Some(index) if self.occlusion[index] > 0 => {
                self.occlusion[index] = 0;
                true
            }
            _ => false,
        }
    }

    /// Flags the cell visible and explored.
    pub fn mark_visible(&mut self, position: Position) {
        if let Some(index) = self.dimensions.index(position) {
            self.flags[index].insert(CellFlags::VISIBLE | CellFlags::EXPLORED);
        }
    }

    pub fn hide(&mut self, position: Position) {
        if let Some(index) = self.dimensions.index(position) {
            self.flags[index].remove(CellFlags::VISIBLE);
        }
    }

    /// All cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (Position, CellVisibility)> + '_ {
        self.dimensions.positions().filter_map(|position| {
            self.get(position).map(|cell| (position, cell))
        })
    }

    pub fn visible_count(&self) -> usize {
        self.flags
            .iter()
            .filter(|flags| flags.contains(CellFlags::VISIBLE))
            .count()
    }
}
