//! Position mapping through applied steps.
//!
//! # Invariants
//! - A step map describes exactly one replaced range.
//! - `Mapping` composes step maps in application order.

/// Which side of an edit a position sticks to when the edit touches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Assoc {
    /// Stay before content inserted at the position.
    Before,
    /// Move past content inserted at the position.
    #[default]
    After,
}

/// Effect of one step: `old_len` units at `from` became `new_len` units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepMap {
    from: usize,
    old_len: usize,
    new_len: usize,
}

impl StepMap {
    pub fn new(from: usize, old_len: usize, new_len: usize) -> Self {
        Self {
            from,
            old_len,
            new_len,
        }
    }

    /// Map of a step that changes no positions (attribute or mark edits).
    pub fn identity() -> Self {
        Self::new(0, 0, 0)
    }

    pub fn is_identity(&self) -> bool {
        self.old_len == 0 && self.new_len == 0
    }

    pub fn map(&self, pos: usize, assoc: Assoc) -> usize {
        if self.is_identity() || pos < self.from {
            return pos;
        }
        let end = self.from + self.old_len;

        if self.old_len == 0 {
            // Pure insert.
            return if pos == self.from && assoc == Assoc::Before {
                pos
            } else {
                pos + self.new_len
            };
        }

        if pos == self.from {
            return self.from;
        }
        if pos < end {
            // Inside the replaced range.
            return match assoc {
                Assoc::Before => self.from,
                Assoc::After => self.from + self.new_len,
            };
        }
        pos - self.old_len + self.new_len
    }
}

/// Ordered step maps of one transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mapping {
    maps: Vec<StepMap>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, map: StepMap) {
        self.maps.push(map);
    }

    pub fn maps(&self) -> &[StepMap] {
        &self.maps
    }

    pub fn is_empty(&self) -> bool {
        self.maps.iter().all(StepMap::is_identity)
    }

    /// Maps through every step map, associating after inserted content.
    pub fn map(&self, pos: usize) -> usize {
        self.map_assoc(pos, Assoc::After)
    }

    pub fn map_assoc(&self, pos: usize, assoc: Assoc) -> usize {
        self.maps
            .iter()
            .fold(pos, |pos, map| map.map(pos, assoc))
    }
}

#[cfg(test)]
mod tests {
    use super::{Assoc, Mapping, StepMap};

    #[test]
    fn delete_shifts_positions_after_range() {
        let map = StepMap::new(5, 5, 0);
        assert_eq!(map.map(3, Assoc::After), 3);
        assert_eq!(map.map(5, Assoc::After), 5);
        assert_eq!(map.map(7, Assoc::After), 5);
        assert_eq!(map.map(10, Assoc::After), 5);
        assert_eq!(map.map(12, Assoc::After), 7);
    }

    #[test]
    fn insert_shifts_positions_at_or_after_offset() {
        let map = StepMap::new(4, 0, 3);
        assert_eq!(map.map(3, Assoc::After), 3);
        assert_eq!(map.map(4, Assoc::After), 7);
        assert_eq!(map.map(4, Assoc::Before), 4);
        assert_eq!(map.map(9, Assoc::Before), 12);
    }

    #[test]
    fn replace_maps_inside_by_association() {
        let map = StepMap::new(2, 4, 1);
        assert_eq!(map.map(4, Assoc::Before), 2);
        assert_eq!(map.map(4, Assoc::After), 3);
        assert_eq!(map.map(6, Assoc::Before), 3);
    }

    #[test]
    fn mapping_composes_in_order() {
        let mut mapping = Mapping::new();
        mapping.push(StepMap::new(5, 5, 0));
        mapping.push(StepMap::new(5, 0, 1));
        assert_eq!(mapping.map(12), 8);
        assert_eq!(mapping.map(2), 2);
    }
}
