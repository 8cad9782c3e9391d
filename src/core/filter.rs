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

//! Search with surrounding context, and the predicates callers search with.

use crate::core::log_model::{LogEntry, LogModel};
use fancy_regex::Regex;

/// Indices kept when every match pulls in `context` neighbours on each side.
///
/// Negative radii are treated as zero. The result is sorted and free of duplicates.
pub fn context_indices<T, P>(items: &[T], predicate: P, context: isize) -> Vec<usize>
where
    P: Fn(&T) -> bool,
{
    profiling::scope!("context_indices");

    let radius = context.max(0).unsigned_abs();
    let mut keep = vec![false; items.len()];

    for (idx, item) in items.iter().enumerate() {
        if !predicate(item) {
            continue;
        }
        let lo = idx.saturating_sub(radius);
        let hi = idx.saturating_add(radius).min(items.len() - 1);
        for flag in &mut keep[lo..=hi] {
            *flag = true;
        }
    }

    keep.iter()
        .enumerate()
        .filter_map(|(idx, &kept)| kept.then_some(idx))
        .collect()
}

/// Order-preserving subsequence of `items`: every match plus `context` items
/// before and after it.
pub fn filter_with_context<'a, T, P>(items: &'a [T], predicate: P, context: isize) -> Vec<&'a T>
where
    P: Fn(&T) -> bool,
{
    context_indices(items, predicate, context)
        .into_iter()
        .map(|idx| &items[idx])
        .collect()
}

/// Plain substring search over category and body.
pub fn contains_text(query: &str, case_sensitive: bool) -> impl Fn(&LogEntry) -> bool {
    let needle = if case_sensitive {
        query.to_string()
    } else {
        query.to_lowercase()
    };
    move |entry| {
        if case_sensitive {
            entry.body.contains(&needle) || entry.category.contains(&needle)
        } else {
            entry.body.to_lowercase().contains(&needle)
                || entry.category.to_lowercase().contains(&needle)
        }
    }
}

/// Regex search over category and body. Regex runtime errors count as no match.
pub fn matches_regex(regex: Regex) -> impl Fn(&LogEntry) -> bool {
    move |entry| {
        regex.is_match(&entry.body).unwrap_or(false)
            || regex.is_match(&entry.category).unwrap_or(false)
    }
}

/// Build a search regex the way the filter bar does: `(?i)` unless case-sensitive.
pub fn build_regex(pattern: &str, case_sensitive: bool) -> Result<Regex, Box<fancy_regex::Error>> {
    let pattern = if case_sensitive {
        pattern.to_string()
    } else {
        format!("(?i){pattern}")
    };
    Regex::new(&pattern).map_err(Box::new)
}

pub fn category_is(category: &str) -> impl Fn(&LogEntry) -> bool + '_ {
    move |entry| entry.category == category
}

/// Entries linked to an exchange whose response took longer than `threshold_ms`.
/// Unfinished exchanges never match.
pub fn slower_than(model: &LogModel, threshold_ms: i64) -> impl Fn(&LogEntry) -> bool + '_ {
    move |entry| {
        model
            .exchange_for(entry)
            .and_then(|ex| ex.response.as_ref())
            .is_some_and(|resp| resp.elapsed_ms > threshold_ms)
    }
}
