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

//! Writers for a reconstructed log: a plain text timeline and JSON.

use crate::core::diagnostics::Diagnostic;
use crate::core::exchange::HttpExchange;
use crate::core::log_model::{LogEntry, LogModel};
use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::Serialize;
use std::io::Write;

/// A subset of a model's entries together with the exchanges they reference.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct View<'a> {
    pub entries: Vec<&'a LogEntry>,
    pub exchanges: IndexMap<&'a str, &'a HttpExchange>,
    pub diagnostics: &'a [Diagnostic],
}

impl<'a> View<'a> {
    /// Collect the entries at `indices`; exchanges keep the model's order.
    pub fn new(model: &'a LogModel, indices: &[usize]) -> Self {
        let entries: Vec<&LogEntry> = indices.iter().map(|&idx| &model.entries[idx]).collect();
        let mut exchanges: IndexMap<&str, &HttpExchange> = entries
            .iter()
            .filter_map(|entry| model.exchange_for(entry))
            .map(|ex| (ex.id.as_str(), ex))
            .collect();
        exchanges.sort_by_cached_key(|id, _| model.exchanges.get_index_of(*id));
        Self {
            entries,
            exchanges,
            diagnostics: &model.diagnostics,
        }
    }

    /// Every entry of the model.
    pub fn all(model: &'a LogModel) -> Self {
        let indices: Vec<usize> = (0..model.entries.len()).collect();
        Self::new(model, &indices)
    }
}

pub fn write_json<W: Write>(out: &mut W, view: &View<'_>) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, view).context("Failed to serialize log")?;
    writeln!(out)?;
    Ok(())
}

/// One line per entry: relative seconds, category, body.
///
/// HTTP markers show the short path and, on finish, status and elapsed time.
/// The head of a collapsed run notes how often it repeated.
pub fn write_text<W: Write>(out: &mut W, view: &View<'_>) -> Result<()> {
    let category_width = view
        .entries
        .iter()
        .map(|e| e.category.len() + 2)
        .max()
        .unwrap_or(0);

    for entry in &view.entries {
        let exchange = entry
            .http
            .as_ref()
            .and_then(|link| view.exchanges.get(link.request_id.as_str()).copied());
        let category = format!("[{}]", entry.category);
        let marker = if entry.in_duplicate_group { "|" } else { " " };
        write!(
            out,
            "{:>10.3} {marker} {category:<category_width$}  {}",
            entry.timestamp.relative_seconds,
            render_body(entry, exchange)
        )?;
        if let (Some(period), Some(repeats)) = (entry.duplicate_count, entry.duplicate_repeats) {
            let noun = if period == 1 { "line" } else { "lines" };
            write!(out, "  (x{repeats}, {period} {noun})")?;
        }
        writeln!(out)?;

        if let Some(ex) = exchange.filter(|_| entry.http.as_ref().is_some_and(|l| l.is_starting)) {
            if !ex.request_body.is_empty() {
                writeln!(out, "{:>13}{:category_width$}  {}", "", "", ex.request_body)?;
            }
        }
    }
    Ok(())
}

pub fn write_diagnostics<W: Write>(out: &mut W, diagnostics: &[Diagnostic]) -> Result<()> {
    for diagnostic in diagnostics {
        writeln!(out, "warning: {diagnostic}")?;
    }
    Ok(())
}

fn render_body(entry: &LogEntry, exchange: Option<&HttpExchange>) -> String {
    let (Some(link), Some(ex)) = (&entry.http, exchange) else {
        return entry.body.clone();
    };
    if link.is_starting {
        format!("--> {} {}", ex.method, ex.display_path())
    } else {
        match &ex.response {
            Some(resp) => format!(
                "<-- {} {} {} ({} ms)",
                ex.method,
                ex.display_path(),
                resp.status,
                resp.elapsed_ms
            ),
            None => format!("<-- {} {}", ex.method, ex.display_path()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::filter::{category_is, context_indices};
    use crate::core::log_model::{parse_log, PipelineOptions};

    const LOG: &str = "\
2021-12-21 04:30:54:845 [HTTP] --> POST /wd/hub/session/xxx/element
2021-12-21 04:30:54:846 [HTTP] {\"using\":\"id\",\"value\":\"login\"}
2021-12-21 04:30:54:858 [XCUITest] Executing command 'findElement'
2021-12-21 04:30:54:900 [WD Proxy] Waiting
2021-12-21 04:30:55:000 [WD Proxy] Waiting
2021-12-21 04:30:55:100 [WD Proxy] Waiting
2021-12-21 04:30:55:123 [HTTP] <-- POST /wd/hub/session/xxx/element 200 278 ms - 120
2021-12-21 04:30:56:000 [HTTP] --> GET /wd/hub/status
";

    fn render(view: &View<'_>) -> String {
        let mut buf = Vec::new();
        write_text(&mut buf, view).expect("write to vec");
        String::from_utf8(buf).expect("utf-8 output")
    }

    #[test]
    fn test_text_timeline() {
        let model = parse_log(LOG, &PipelineOptions::default());
        let text = render(&View::all(&model));
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 6);
        assert!(lines[0].contains("--> POST /element"));
        assert!(lines[1].trim_start().starts_with("{\"using\""));
        assert!(lines[3].contains("Waiting  (x3, 1 line)"));
        assert!(lines[4].contains("<-- POST /element 200 (278 ms)"));
        assert!(lines[5].contains("--> GET /wd/hub/status"));
        assert!(lines[4].trim_start().starts_with("0.278"));
    }

    #[test]
    fn test_view_keeps_only_referenced_exchanges() {
        let model = parse_log(LOG, &PipelineOptions::default());
        let indices = context_indices(&model.entries, category_is("XCUITest"), 1);
        let view = View::new(&model, &indices);

        assert_eq!(view.entries.len(), 3);
        assert_eq!(view.exchanges.len(), 1);
        assert!(view
            .exchanges
            .keys()
            .all(|id| id.ends_with("POST /wd/hub/session/xxx/element")));
    }

    #[test]
    fn test_json_export() {
        let model = parse_log(LOG, &PipelineOptions::default());
        let mut buf = Vec::new();
        write_json(&mut buf, &View::all(&model)).expect("write json");

        let json: serde_json::Value = serde_json::from_slice(&buf).expect("valid json");
        assert_eq!(json["entries"].as_array().map(Vec::len), Some(5));
        assert_eq!(json["exchanges"].as_object().map(serde_json::Map::len), Some(2));
        assert_eq!(json["entries"][2]["duplicateCount"], 1);
        assert_eq!(json["entries"][2]["duplicateRepeats"], 3);
    }

    #[test]
    fn test_diagnostics_output() {
        let model = parse_log(
            "2021-12-21 04:30:55:123 [HTTP] <-- GET /status 200 3 ms\n",
            &PipelineOptions::default(),
        );
        let mut buf = Vec::new();
        write_diagnostics(&mut buf, &model.diagnostics).expect("write diagnostics");
        assert_eq!(
            String::from_utf8(buf).expect("utf-8 output"),
            "warning: line 1: GET /status finished without a matching start\n"
        );
    }
}
