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

//! HTTP exchanges and the store that tracks which of them are in flight.

use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use serde::Serialize;

/// Exchange table keyed by id, in start order.
pub type ExchangeMap = IndexMap<String, HttpExchange>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpResponse {
    pub status: u64,
    pub elapsed_ms: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_length: Option<u64>,
}

/// A correlated request/response pair. No `response` means the request never
/// finished within the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpExchange {
    pub id: String,
    pub method: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_path: Option<String>,
    pub started_at: DateTime<Utc>,
    pub start_line: usize,
    pub request_body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<HttpResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_line: Option<usize>,
}

impl HttpExchange {
    /// Path to show by default: the short form if there is one.
    #[must_use]
    pub fn display_path(&self) -> &str {
        self.short_path.as_deref().unwrap_or(&self.path)
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.response.is_none()
    }
}

/// Build the id of an exchange: `<start instant> <METHOD> <PATH>`.
#[must_use]
pub fn exchange_id(started_at: DateTime<Utc>, method: &str, path: &str) -> String {
    format!(
        "{} {method} {path}",
        started_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    )
}

/// Every exchange ever started, plus the ordered positions of the open ones.
///
/// Closing an exchange only filters its position out of `open`; the exchange
/// itself stays in `all`.
#[derive(Debug, Default)]
pub struct ExchangeStore {
    all: ExchangeMap,
    open: Vec<usize>,
}

impl ExchangeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new exchange and mark it open. Returns its position.
    ///
    /// An id collision (same instant, method and path) gets a ` #n` suffix.
    pub fn open(&mut self, mut exchange: HttpExchange) -> usize {
        if self.all.contains_key(&exchange.id) {
            let base = exchange.id.clone();
            let mut n = 2;
            while self.all.contains_key(&format!("{base} #{n}")) {
                n += 1;
            }
            exchange.id = format!("{base} #{n}");
            tracing::debug!("Duplicate exchange id '{base}', using '{}'", exchange.id);
        }
        let (index, _) = self.all.insert_full(exchange.id.clone(), exchange);
        self.open.push(index);
        index
    }

    /// Positions of the open exchanges matching method and path, oldest first.
    pub fn open_candidates(&self, method: &str, path: &str) -> Vec<usize> {
        self.open
            .iter()
            .copied()
            .filter(|&idx| {
                self.all
                    .get_index(idx)
                    .is_some_and(|(_, ex)| ex.method == method && ex.path == path)
            })
            .collect()
    }

    /// Remove the exchange at `index` from the open set.
    pub fn close(&mut self, index: usize) {
        self.open.retain(|&idx| idx != index);
    }

    pub fn get(&self, index: usize) -> Option<&HttpExchange> {
        self.all.get_index(index).map(|(_, ex)| ex)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut HttpExchange> {
        self.all.get_index_mut(index).map(|(_, ex)| ex)
    }

    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    pub fn into_map(self) -> ExchangeMap {
        self.all
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn exchange(started_at: DateTime<Utc>, method: &str, path: &str) -> HttpExchange {
        HttpExchange {
            id: exchange_id(started_at, method, path),
            method: method.to_string(),
            path: path.to_string(),
            short_path: None,
            started_at,
            start_line: 1,
            request_body: String::new(),
            response: None,
            finished_at: None,
            finish_line: None,
        }
    }

    fn instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 12, 21, 4, 30, 54)
            .single()
            .expect("valid date")
            + chrono::Duration::milliseconds(845)
    }

    #[test]
    fn test_exchange_id_format() {
        assert_eq!(
            exchange_id(instant(), "GET", "/wd/hub/session/xxx/screenshot"),
            "2021-12-21T04:30:54.845Z GET /wd/hub/session/xxx/screenshot"
        );
    }

    #[test]
    fn test_colliding_ids_are_suffixed() {
        let mut store = ExchangeStore::new();
        let a = store.open(exchange(instant(), "GET", "/status"));
        let b = store.open(exchange(instant(), "GET", "/status"));
        let c = store.open(exchange(instant(), "GET", "/status"));

        let id_a = &store.get(a).expect("exists").id;
        let id_b = &store.get(b).expect("exists").id;
        let id_c = &store.get(c).expect("exists").id;
        assert_eq!(id_b, &format!("{id_a} #2"));
        assert_eq!(id_c, &format!("{id_a} #3"));
        assert_eq!(store.into_map().len(), 3);
    }

    #[test]
    fn test_close_keeps_exchange() {
        let mut store = ExchangeStore::new();
        let a = store.open(exchange(instant(), "GET", "/status"));
        let b = store.open(exchange(instant(), "POST", "/session"));

        assert_eq!(store.open_candidates("GET", "/status"), vec![a]);
        store.close(a);
        assert!(store.open_candidates("GET", "/status").is_empty());
        assert_eq!(store.open_count(), 1);
        assert!(store.get(a).is_some());
        assert_eq!(store.open_candidates("POST", "/session"), vec![b]);
    }
}
