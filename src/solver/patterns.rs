//! Working set of patterns admitted into the optimization

use rand::Rng;
use std::collections::HashMap;

/// A training example admitted to the working set, with its true label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pattern {
    pub x_id: usize,
    pub y: i32,
}

impl Pattern {
    pub fn new(x_id: usize, y: i32) -> Self {
        Self { x_id, y }
    }
}

/// Arena of pattern slots with a free list
///
/// Removed slots are reused by later insertions. At most one slot holds a
/// given example id.
#[derive(Debug, Default)]
pub struct PatternStore {
    slots: Vec<Option<Pattern>>,
    free: Vec<usize>,
    by_id: HashMap<usize, usize>,
}

impl PatternStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pattern(&self, x_id: usize) -> bool {
        self.by_id.contains_key(&x_id)
    }

    pub fn get_pattern(&self, x_id: usize) -> Option<Pattern> {
        self.by_id.get(&x_id).and_then(|&slot| self.slots[slot])
    }

    /// Insert a pattern, returning its slot; known ids keep their slot
    pub fn insert(&mut self, pattern: Pattern) -> usize {
        if let Some(&slot) = self.by_id.get(&pattern.x_id) {
            return slot;
        }
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(pattern);
                slot
            }
            None => {
                self.slots.push(Some(pattern));
                self.slots.len() - 1
            }
        };
        self.by_id.insert(pattern.x_id, slot);
        slot
    }

    /// Free a slot; removing an empty slot does nothing
    pub fn remove(&mut self, slot: usize) -> Option<Pattern> {
        let pattern = self.slots.get_mut(slot)?.take()?;
        self.by_id.remove(&pattern.x_id);
        self.free.push(slot);
        Some(pattern)
    }

    /// Uniformly drawn occupied slot, `None` when the store is empty
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Pattern> {
        if self.is_empty() {
            return None;
        }
        loop {
            let slot = rng.gen_range(0..self.slots.len());
            if let Some(pattern) = self.slots[slot] {
                return Some(pattern);
            }
        }
    }

    /// Pattern in `slot`, if occupied
    pub fn get(&self, slot: usize) -> Option<Pattern> {
        self.slots.get(slot).copied().flatten()
    }

    /// One past the highest slot ever used
    pub fn maxcount(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Occupied slots in slot order
    pub fn iter(&self) -> impl Iterator<Item = (usize, Pattern)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, pattern)| pattern.map(|p| (slot, p)))
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.by_id.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_insert_and_lookup() {
        let mut store = PatternStore::new();
        assert!(store.is_empty());

        let slot = store.insert(Pattern::new(7, 2));
        assert_eq!(slot, 0);
        assert!(store.is_pattern(7));
        assert_eq!(store.get_pattern(7), Some(Pattern::new(7, 2)));
        assert_eq!(store.get_pattern(8), None);

        // duplicate ids keep their slot
        assert_eq!(store.insert(Pattern::new(7, 2)), 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_remove_reuses_slot() {
        let mut store = PatternStore::new();
        store.insert(Pattern::new(1, 0));
        store.insert(Pattern::new(2, 0));
        store.insert(Pattern::new(3, 1));

        assert_eq!(store.remove(1), Some(Pattern::new(2, 0)));
        assert_eq!(store.remove(1), None);
        assert!(!store.is_pattern(2));
        assert_eq!(store.len(), 2);
        assert_eq!(store.maxcount(), 3);

        assert_eq!(store.insert(Pattern::new(9, 1)), 1);
        assert_eq!(store.maxcount(), 3);
        assert_eq!(store.get(1), Some(Pattern::new(9, 1)));
        let ids: Vec<usize> = store.iter().map(|(_, p)| p.x_id).collect();
        assert_eq!(ids, vec![1, 9, 3]);
    }

    #[test]
    fn test_sample_only_returns_occupied() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut store = PatternStore::new();
        assert_eq!(store.sample(&mut rng), None);

        for x in 0..10 {
            store.insert(Pattern::new(x, (x % 2) as i32));
        }
        for slot in [0, 2, 4, 6, 8] {
            store.remove(slot);
        }

        let mut seen = [0usize; 10];
        for _ in 0..1000 {
            let pattern = store.sample(&mut rng).unwrap();
            assert_eq!(pattern.x_id % 2, 1);
            seen[pattern.x_id] += 1;
        }
        // every remaining pattern gets drawn
        assert!([1, 3, 5, 7, 9].iter().all(|&x| seen[x] > 100));
    }
}
