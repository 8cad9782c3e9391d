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

//! The reconstructed log: entries, exchanges, and the pipeline producing them.
//!
//! `parse_log` runs the line parser, the request correlator and the duplicate
//! grouper in that order. All working state is local to one call.

use crate::core::correlator::correlate;
use crate::core::diagnostics::Diagnostic;
use crate::core::dup_group::{group_dups, DuplicateGroup};
use crate::core::exchange::{ExchangeMap, HttpExchange};
use crate::core::filter::context_indices;
use crate::parser::line::Timestamp;
use crate::parser::parse_raw_records;
use serde::Serialize;
use std::time::Instant;

/// How many distinct recent lines the duplicate grouper remembers.
pub const DEFAULT_DUPLICATE_WINDOW: usize = 10;

/// Link from an entry to the exchange it starts or finishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpLink {
    pub request_id: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_starting: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_finishing: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub timestamp: Timestamp,
    pub category: String,
    pub body: String,
    /// 1-based line in the source text
    pub line: usize,
    #[serde(rename = "httpLink", skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpLink>,
    /// Period size of the collapsed run starting here
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate_count: Option<usize>,
    /// How many times that run repeated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate_repeats: Option<usize>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub in_duplicate_group: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    pub duplicate_window: usize,
    pub collapse_duplicates: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            duplicate_window: DEFAULT_DUPLICATE_WINDOW,
            collapse_duplicates: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogModel {
    pub entries: Vec<LogEntry>,
    pub exchanges: ExchangeMap,
    /// Collapsed runs; indices refer to the sequence before collapsing
    pub duplicate_groups: Vec<DuplicateGroup>,
    pub diagnostics: Vec<Diagnostic>,
}

impl LogModel {
    pub fn exchange_for(&self, entry: &LogEntry) -> Option<&HttpExchange> {
        entry
            .http
            .as_ref()
            .and_then(|link| self.exchanges.get(&link.request_id))
    }

    /// Exchanges that never saw a finish line.
    pub fn open_exchanges(&self) -> impl Iterator<Item = &HttpExchange> {
        self.exchanges.values().filter(|ex| ex.is_open())
    }

    /// Entries matching `predicate` with `context` neighbours on each side.
    pub fn entries_matching<P>(&self, predicate: P, context: isize) -> Vec<&LogEntry>
    where
        P: Fn(&LogEntry) -> bool,
    {
        context_indices(&self.entries, predicate, context)
            .into_iter()
            .map(|idx| &self.entries[idx])
            .collect()
    }
}

/// Reconstruct a whole log text into a [`LogModel`]. Never fails.
#[must_use]
pub fn parse_log(content: &str, options: &PipelineOptions) -> LogModel {
    profiling::scope!("parse_log");
    let start_time = Instant::now();

    let records = parse_raw_records(content);
    let record_count = records.len();
    let correlated = correlate(records);

    let (entries, duplicate_groups) = if options.collapse_duplicates {
        collapse_duplicates(correlated.entries, options.duplicate_window)
    } else {
        (correlated.entries, Vec::new())
    };

    tracing::info!(
        "Reconstructed {record_count} records into {} entries, {} exchanges, {} duplicate groups in {:?}",
        entries.len(),
        correlated.exchanges.len(),
        duplicate_groups.len(),
        start_time.elapsed()
    );
    if !correlated.diagnostics.is_empty() {
        tracing::info!("{} diagnostics recorded", correlated.diagnostics.len());
    }

    LogModel {
        entries,
        exchanges: correlated.exchanges,
        duplicate_groups,
        diagnostics: correlated.diagnostics,
    }
}

/// Annotate the first period of every run and drop the repeats.
fn collapse_duplicates(
    mut entries: Vec<LogEntry>,
    window: usize,
) -> (Vec<LogEntry>, Vec<DuplicateGroup>) {
    // Two entries repeat each other when category and body are equal
    let grouping = group_dups(
        &entries,
        |entry| (entry.category.clone(), entry.body.clone()),
        window,
    );

    for group in &grouping.groups {
        let head = &mut entries[group.start_index];
        head.duplicate_count = Some(group.period_size);
        head.duplicate_repeats = Some(group.repeat_count);
        for entry in &mut entries[group.first_period()] {
            entry.in_duplicate_group = true;
        }
    }

    let removed = grouping.markers.iter().filter(|m| m.duplicated).count();
    if removed > 0 {
        tracing::debug!("Collapsing {removed} repeated entries");
    }

    let kept = entries
        .into_iter()
        .zip(&grouping.markers)
        .filter_map(|(entry, marker)| (!marker.duplicated).then_some(entry))
        .collect();
    (kept, grouping.groups)
}
