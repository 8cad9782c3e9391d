// AppiumCrab - GPL-3.0-or-later
// This file is part of AppiumCrab.
//
// Copyright (C) 2026 Daniel Freiermuth
//
// AppiumCrab is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// AppiumCrab is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with AppiumCrab.  If not, see <https://www.gnu.org/licenses/>.

//! A fixed-capacity map that forgets its oldest key first.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

/// A fixed-capacity map with insertion-ordered eviction.
///
/// A key's age is the time of its first insertion. Updating an existing key
/// changes its value but keeps its position in the eviction order. Inserting
/// a new key into a full map evicts the oldest key first.
///
/// # Example
///
/// ```ignore
/// let mut recent = RecencyMap::with_capacity(2);
/// recent.insert("a", 0);
/// recent.insert("b", 1);
/// recent.insert("a", 2); // update, "a" is still the oldest
/// recent.insert("c", 3); // evicts "a"
///
/// assert_eq!(recent.get(&"a"), None);
/// assert_eq!(recent.get(&"b"), Some(&1));
/// ```
#[derive(Debug)]
pub struct RecencyMap<K, V> {
    /// Map for O(1) lookups and updates
    map: HashMap<K, V>,
    /// Keys in insertion order, oldest at the front
    queue: VecDeque<K>,
    capacity: usize,
}

impl<K: Hash + Eq + Clone, V> RecencyMap<K, V> {
    /// Create an empty map holding at most `capacity` keys.
    /// A capacity of zero never stores anything.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            map: HashMap::with_capacity(capacity),
            queue: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Insert or update a value. Returns the evicted key, if any.
    pub fn insert(&mut self, key: K, value: V) -> Option<K> {
        if let Some(slot) = self.map.get_mut(&key) {
            *slot = value;
            return None;
        }
        if self.capacity == 0 {
            return None;
        }

        let evicted = if self.queue.len() >= self.capacity {
            let oldest = self.queue.pop_front()?;
            self.map.remove(&oldest);
            Some(oldest)
        } else {
            None
        };
        self.queue.push_back(key.clone());
        self.map.insert(key, value);
        evicted
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.map.get(key)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evicts_oldest() {
        let mut recent = RecencyMap::with_capacity(2);
        assert_eq!(recent.insert("a", 0), None);
        assert_eq!(recent.insert("b", 1), None);
        assert_eq!(recent.insert("c", 2), Some("a"));

        assert_eq!(recent.get(&"a"), None);
        assert_eq!(recent.get(&"b"), Some(&1));
        assert_eq!(recent.get(&"c"), Some(&2));
        assert_eq!(recent.len(), 2);
    }

    #[test]
    fn test_update_keeps_position() {
        let mut recent = RecencyMap::with_capacity(2);
        recent.insert("a", 0);
        recent.insert("b", 1);
        assert_eq!(recent.insert("a", 5), None); // Not new

        // "a" is still the oldest key
        assert_eq!(recent.insert("c", 2), Some("a"));
        assert_eq!(recent.get(&"b"), Some(&1));
    }

    #[test]
    fn test_zero_capacity() {
        let mut recent = RecencyMap::with_capacity(0);
        assert_eq!(recent.insert("a", 0), None);
        assert!(recent.is_empty());
        assert_eq!(recent.get(&"a"), None);
    }
}
