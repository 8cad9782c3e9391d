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

//! Pairs `--> METHOD PATH` and `<-- METHOD PATH STATUS N ms` lines into
//! exchanges in one forward pass over the raw records.

use crate::core::diagnostics::Diagnostic;
use crate::core::exchange::{exchange_id, ExchangeMap, ExchangeStore, HttpExchange, HttpResponse};
use crate::core::log_model::{HttpLink, LogEntry};
use crate::parser::http::{
    parse_request_finish, parse_request_start, short_path, MarkerKind, RequestFinish,
};
use crate::parser::line::{RawRecord, Timestamp};
use chrono::{DateTime, Utc};

/// Output of the correlation pass.
#[derive(Debug, Default)]
pub struct Correlated {
    pub entries: Vec<LogEntry>,
    pub exchanges: ExchangeMap,
    pub diagnostics: Vec<Diagnostic>,
}

/// Forward-pass state. Lives for exactly one call to [`correlate`].
struct Correlator {
    store: ExchangeStore,
    /// Exchange whose request body is expected on the very next record
    pending_body: Option<usize>,
    entries: Vec<LogEntry>,
    diagnostics: Vec<Diagnostic>,
    origin: DateTime<Utc>,
}

/// Enrich raw records into log entries and collect the exchange table.
#[must_use]
pub fn correlate(records: Vec<RawRecord>) -> Correlated {
    profiling::scope!("correlate");

    let Some(origin) = records.first().map(|r| r.timestamp) else {
        return Correlated::default();
    };

    let mut correlator = Correlator {
        store: ExchangeStore::new(),
        pending_body: None,
        entries: Vec::with_capacity(records.len()),
        diagnostics: Vec::new(),
        origin,
    };
    for record in records {
        correlator.feed(record);
    }

    let open = correlator.store.open_count();
    if open > 0 {
        tracing::debug!("{open} requests were still open at the end of the log");
    }

    Correlated {
        entries: correlator.entries,
        exchanges: correlator.store.into_map(),
        diagnostics: correlator.diagnostics,
    }
}

impl Correlator {
    fn feed(&mut self, record: RawRecord) {
        // The body slot only ever applies to the record right after a start
        let pending = self.pending_body.take();

        match MarkerKind::of(&record) {
            MarkerKind::Start => self.on_start(record),
            MarkerKind::Finish => self.on_finish(record),
            MarkerKind::None => match pending {
                Some(index) => self.on_body(index, record),
                None => self.push_entry(record, None),
            },
        }
    }

    fn on_start(&mut self, record: RawRecord) {
        let Some(start) = parse_request_start(&record.body) else {
            self.malformed(record);
            return;
        };

        let exchange = HttpExchange {
            id: exchange_id(record.timestamp, &start.method, &start.path),
            short_path: short_path(&start.path),
            method: start.method,
            path: start.path,
            started_at: record.timestamp,
            start_line: record.line_number,
            request_body: String::new(),
            response: None,
            finished_at: None,
            finish_line: None,
        };
        let index = self.store.open(exchange);
        let request_id = self.exchange_id_at(index);

        self.pending_body = Some(index);
        self.push_entry(
            record,
            Some(HttpLink {
                request_id,
                is_starting: true,
                is_finishing: false,
            }),
        );
    }

    fn on_finish(&mut self, record: RawRecord) {
        let Some(finish) = parse_request_finish(&record.body) else {
            self.malformed(record);
            return;
        };

        let Some(index) = self.resolve(&finish, record.timestamp, record.line_number) else {
            tracing::debug!(
                "Line {}: {} {} finished without a matching start, skipping",
                record.line_number,
                finish.method,
                finish.path
            );
            self.diagnostics.push(Diagnostic::OrphanFinish {
                line: record.line_number,
                method: finish.method,
                path: finish.path,
            });
            return;
        };

        self.store.close(index);
        if let Some(exchange) = self.store.get_mut(index) {
            exchange.response = Some(HttpResponse {
                status: finish.status,
                elapsed_ms: finish.elapsed_ms,
                content_length: finish.content_length,
            });
            exchange.finished_at = Some(record.timestamp);
            exchange.finish_line = Some(record.line_number);
        }

        let request_id = self.exchange_id_at(index);
        self.push_entry(
            record,
            Some(HttpLink {
                request_id,
                is_starting: false,
                is_finishing: true,
            }),
        );
    }

    fn on_body(&mut self, index: usize, record: RawRecord) {
        if let Some(exchange) = self.store.get_mut(index) {
            exchange.request_body = record.body;
        }
    }

    /// Pick the open exchange a finish line belongs to.
    ///
    /// With several candidates, the one whose start is closest to
    /// `finished_at - elapsed` wins. Equal distances go to the earliest opened.
    fn resolve(
        &mut self,
        finish: &RequestFinish,
        finished_at: DateTime<Utc>,
        line: usize,
    ) -> Option<usize> {
        let candidates = self.store.open_candidates(&finish.method, &finish.path);
        match candidates.as_slice() {
            [] => None,
            [only] => Some(*only),
            _ => {
                // Integer millis saturate instead of overflowing on absurd elapsed values
                let implied_start = finished_at
                    .timestamp_millis()
                    .saturating_sub(finish.elapsed_ms);
                let mut best: Option<(usize, u64)> = None;
                for &idx in &candidates {
                    let Some(exchange) = self.store.get(idx) else {
                        continue;
                    };
                    let distance = exchange.started_at.timestamp_millis().abs_diff(implied_start);
                    if best.is_none_or(|(_, d)| distance < d) {
                        best = Some((idx, distance));
                    }
                }
                let (chosen, _) = best?;

                let chosen_id = self.exchange_id_at(chosen);
                tracing::debug!(
                    "Line {line}: {} concurrent {} {} requests, matched '{chosen_id}'",
                    candidates.len(),
                    finish.method,
                    finish.path
                );
                self.diagnostics.push(Diagnostic::AmbiguousFinish {
                    line,
                    method: finish.method.clone(),
                    path: finish.path.clone(),
                    candidates: candidates.len(),
                    chosen: chosen_id,
                });
                Some(chosen)
            }
        }
    }

    fn malformed(&mut self, record: RawRecord) {
        tracing::debug!(
            "Line {}: malformed HTTP marker '{}', keeping as plain line",
            record.line_number,
            record.body
        );
        self.diagnostics.push(Diagnostic::MalformedMarker {
            line: record.line_number,
            body: record.body.clone(),
        });
        self.push_entry(record, None);
    }

    fn exchange_id_at(&self, index: usize) -> String {
        self.store
            .get(index)
            .map(|ex| ex.id.clone())
            .unwrap_or_default()
    }

    fn push_entry(&mut self, record: RawRecord, http: Option<HttpLink>) {
        self.entries.push(LogEntry {
            timestamp: Timestamp::relative_to(record.timestamp, self.origin),
            category: record.category,
            body: record.body,
            line: record.line_number,
            http,
            duplicate_count: None,
            duplicate_repeats: None,
            in_duplicate_group: false,
        });
    }
}
