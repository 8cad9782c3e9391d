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

//! Detection of periodically repeating runs, such as polling loops.
//!
//! A run is found when an item's identity was seen within the last `window`
//! distinct identities. The distance to that earlier occurrence becomes the
//! period, and the run grows for as long as each new item repeats the item
//! one period earlier.

use crate::core::recency_map::RecencyMap;
use serde::Serialize;
use std::hash::Hash;

/// A periodic run over an item sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateGroup {
    /// Index of the first item of the first period
    pub start_index: usize,
    /// Number of items in one period
    pub period_size: usize,
    /// How many times the period occurs in a row
    pub repeat_count: usize,
}

impl DuplicateGroup {
    /// Index of the last item covered so far.
    #[must_use]
    pub const fn end_index(&self) -> usize {
        self.start_index + self.period_size * self.repeat_count - 1
    }

    /// Items covered by the first period.
    #[must_use]
    pub const fn first_period(&self) -> std::ops::Range<usize> {
        self.start_index..self.start_index + self.period_size
    }

    /// Items covered by periods 2..=`repeat_count`.
    #[must_use]
    pub const fn repeats(&self) -> std::ops::Range<usize> {
        self.start_index + self.period_size..self.end_index() + 1
    }
}

/// Per-item annotation derived from the groups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateMarker {
    /// Index into the returned groups, set on items of a first period
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_index: Option<usize>,
    /// First item of a group
    pub is_first: bool,
    /// Item repeats an earlier period and can be dropped
    pub duplicated: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DuplicateGrouping {
    /// Non-overlapping groups with `repeat_count > 1`, by increasing `start_index`
    pub groups: Vec<DuplicateGroup>,
    /// One marker per input item
    pub markers: Vec<DuplicateMarker>,
}

/// Find periodic runs in `items`.
///
/// `identify` maps an item to the key compared for equality. `window` bounds
/// how many distinct recent keys are remembered; a run whose period exceeds
/// what the window can hold is not detected.
pub fn group_dups<T, K, F>(items: &[T], identify: F, window: usize) -> DuplicateGrouping
where
    F: Fn(&T) -> K,
    K: Hash + Eq + Clone,
{
    profiling::scope!("group_dups");

    let keys: Vec<K> = items.iter().map(identify).collect();
    let mut groups: Vec<DuplicateGroup> = Vec::new();
    let mut recent: RecencyMap<K, usize> = RecencyMap::with_capacity(window);
    // The last group in `groups` is still growing
    let mut growing = false;
    let mut offset = 0;

    for (index, key) in keys.iter().enumerate() {
        if growing {
            if let Some(group) = groups.last() {
                if keys[group.start_index + offset] != *key {
                    growing = false;
                    offset = 0;
                }
            }
        }

        if !growing {
            if let Some(&previous) = recent.get(key) {
                let clear_of_last = groups.last().is_none_or(|g| g.end_index() < previous);
                if clear_of_last {
                    groups.push(DuplicateGroup {
                        start_index: previous,
                        period_size: index - previous,
                        repeat_count: 1,
                    });
                    growing = true;
                    offset = 0;
                }
            }
        }

        if growing {
            if let Some(group) = groups.last_mut() {
                if index == group.end_index() + group.period_size {
                    group.repeat_count += 1;
                }
            }
            offset += 1;
        }

        recent.insert(key.clone(), index);
    }

    groups.retain(|g| g.repeat_count > 1);

    let mut markers = vec![DuplicateMarker::default(); items.len()];
    for (group_index, group) in groups.iter().enumerate() {
        markers[group.start_index].is_first = true;
        for idx in group.first_period() {
            markers[idx].group_index = Some(group_index);
        }
        for idx in group.repeats() {
            markers[idx].duplicated = true;
        }
    }

    DuplicateGrouping { groups, markers }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first(group_index: usize) -> DuplicateMarker {
        DuplicateMarker {
            group_index: Some(group_index),
            is_first: true,
            duplicated: false,
        }
    }

    fn member(group_index: usize) -> DuplicateMarker {
        DuplicateMarker {
            group_index: Some(group_index),
            is_first: false,
            duplicated: false,
        }
    }

    fn dup() -> DuplicateMarker {
        DuplicateMarker {
            duplicated: true,
            ..DuplicateMarker::default()
        }
    }

    fn plain() -> DuplicateMarker {
        DuplicateMarker::default()
    }

    #[test]
    fn test_empty_input() {
        let result = group_dups(&[] as &[u32], |_| 1, 1);
        assert!(result.groups.is_empty());
        assert!(result.markers.is_empty());
    }

    #[test]
    fn test_no_repeats() {
        let items = [1, 2, 3, 4, 5, 6];
        let result = group_dups(&items, |n| *n, 10);
        assert!(result.groups.is_empty());
        assert!(result.markers.iter().all(|m| *m == plain()));
    }

    #[test]
    fn test_single_periodic_run() {
        let items = [1, 2, 3, 4, 2, 3, 4, 2, 3, 4, 2, 3, 1];
        let result = group_dups(&items, |n| n.to_string(), 5);

        assert_eq!(
            result.groups,
            vec![DuplicateGroup {
                start_index: 1,
                period_size: 3,
                repeat_count: 3,
            }]
        );
        assert_eq!(
            result.markers,
            vec![
                plain(),
                first(0),
                member(0),
                member(0),
                dup(),
                dup(),
                dup(),
                dup(),
                dup(),
                dup(),
                plain(),
                plain(),
                plain(),
            ]
        );
    }

    #[test]
    fn test_window_smaller_than_period_finds_nothing() {
        let items = [1, 2, 3, 4, 2, 3, 4, 2, 3, 4, 2, 3, 1];
        assert!(group_dups(&items, |n| *n, 2).groups.is_empty());
        assert!(group_dups(&items, |n| *n, 0).groups.is_empty());
        // The period fits in a window of three keys
        assert_eq!(group_dups(&items, |n| *n, 3).groups.len(), 1);
    }

    #[test]
    fn test_multiple_adjacent_runs() {
        let items = [1, 1, 1, 2, 2, 2, 2, 3, 2, 3, 2, 3, 2];
        let result = group_dups(&items, |n| *n, 3);

        assert_eq!(
            result.groups,
            vec![
                DuplicateGroup {
                    start_index: 0,
                    period_size: 1,
                    repeat_count: 3,
                },
                DuplicateGroup {
                    start_index: 3,
                    period_size: 1,
                    repeat_count: 4,
                },
                DuplicateGroup {
                    start_index: 7,
                    period_size: 2,
                    repeat_count: 3,
                },
            ]
        );
        assert_eq!(
            result.markers,
            vec![
                first(0),
                dup(),
                dup(),
                first(1),
                dup(),
                dup(),
                dup(),
                first(2),
                member(2),
                dup(),
                dup(),
                dup(),
                dup(),
            ]
        );
    }

    #[test]
    fn test_single_repeat_is_not_a_group() {
        // "a b a" never completes a second period
        let items = ["a", "b", "a", "c"];
        let result = group_dups(&items, |s| *s, 10);
        assert!(result.groups.is_empty());
    }

    #[test]
    fn test_groups_do_not_overlap() {
        let items = [1, 2, 1, 2, 1, 2, 3, 1, 2, 1, 2, 5, 5, 5, 7, 7];
        let result = group_dups(&items, |n| *n, 8);
        for pair in result.groups.windows(2) {
            assert!(pair[0].end_index() < pair[1].start_index);
        }
        assert!(result.groups.iter().all(|g| g.repeat_count > 1));
    }
}
