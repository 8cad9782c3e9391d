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

//! Grammar of the `[HTTP]` marker lines written by the Appium server.
//!
//! ```text
//! --> GET /wd/hub/session/xxx/screenshot
//! <-- GET /wd/hub/session/xxx/screenshot 200 248 ms - 134348
//! ```

use super::line::RawRecord;
use fancy_regex::Regex;
use std::sync::LazyLock;

pub const HTTP_CATEGORY: &str = "HTTP";
pub const REQUEST_START_PREFIX: &str = "--> ";
pub const REQUEST_FINISH_PREFIX: &str = "<-- ";

static REQUEST_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^--> ([A-Za-z]+) (\S+)").expect("valid regex literal")
});

// Trailing ` - <bytes>` is optional, older servers omit it
static REQUEST_FINISH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^<-- ([A-Za-z]+) (\S+) (\d+) (\d+) ms(?: - (\d+))?").expect("valid regex literal")
});

// "/wd/hub/session/:id/element" -> "/element"
static SHORT_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"session/[^/]+(/.+)").expect("valid regex literal"));

/// Classification of a raw record with respect to the HTTP markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Start,
    Finish,
    None,
}

impl MarkerKind {
    /// Classify by category and prefix only; the full grammar is checked on parse.
    #[must_use]
    pub fn of(record: &RawRecord) -> Self {
        if record.category != HTTP_CATEGORY {
            return Self::None;
        }
        if record.body.starts_with(REQUEST_START_PREFIX) {
            Self::Start
        } else if record.body.starts_with(REQUEST_FINISH_PREFIX) {
            Self::Finish
        } else {
            Self::None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestStart {
    pub method: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFinish {
    pub method: String,
    pub path: String,
    pub status: u64,
    pub elapsed_ms: i64,
    pub content_length: Option<u64>,
}

/// Parse a `--> METHOD PATH` body. Returns `None` if the body does not fit.
#[must_use]
pub fn parse_request_start(body: &str) -> Option<RequestStart> {
    let caps = REQUEST_START.captures(body).ok()??;
    Some(RequestStart {
        method: caps[1].to_string(),
        path: caps[2].to_string(),
    })
}

/// Parse a `<-- METHOD PATH STATUS ELAPSED ms [- BYTES]` body.
#[must_use]
pub fn parse_request_finish(body: &str) -> Option<RequestFinish> {
    let caps = REQUEST_FINISH.captures(body).ok()??;
    Some(RequestFinish {
        method: caps[1].to_string(),
        path: caps[2].to_string(),
        status: caps[3].parse().ok()?,
        elapsed_ms: caps[4].parse().ok()?,
        content_length: caps.get(5).and_then(|m| m.as_str().parse().ok()),
    })
}

/// Strip everything up to and including the `session/<id>` segment.
#[must_use]
pub fn short_path(path: &str) -> Option<String> {
    let caps = SHORT_PATH.captures(path).ok()??;
    caps.get(1).map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(category: &str, body: &str) -> RawRecord {
        RawRecord::new(Utc::now(), category.to_string(), body.to_string(), 1)
    }

    #[test]
    fn test_marker_kind() {
        assert_eq!(
            MarkerKind::of(&record("HTTP", "--> GET /wd/hub/session/xxx/screenshot")),
            MarkerKind::Start
        );
        assert_eq!(
            MarkerKind::of(&record("HTTP", "<-- GET /wd/hub/session/xxx/screenshot")),
            MarkerKind::Finish
        );
        assert_eq!(MarkerKind::of(&record("HTTP", "{}")), MarkerKind::None);
        // Only the HTTP category carries markers
        assert_eq!(
            MarkerKind::of(&record("WD Proxy", "--> GET /status")),
            MarkerKind::None
        );
    }

    #[test]
    fn test_parse_request_start() {
        let start = parse_request_start("--> GET /wd/hub/session/xxx/screenshot")
            .expect("should parse start marker");
        assert_eq!(start.method, "GET");
        assert_eq!(start.path, "/wd/hub/session/xxx/screenshot");
    }

    #[test]
    fn test_parse_request_start_rejects_garbage() {
        assert_eq!(parse_request_start("--> "), None);
        assert_eq!(parse_request_start("--> 123 /path"), None);
    }

    #[test]
    fn test_parse_request_finish() {
        let finish = parse_request_finish(
            "<-- GET /wd/hub/session/xxx/screenshot 200 228 ms - 238976",
        )
        .expect("should parse finish marker");
        assert_eq!(finish.method, "GET");
        assert_eq!(finish.path, "/wd/hub/session/xxx/screenshot");
        assert_eq!(finish.status, 200);
        assert_eq!(finish.elapsed_ms, 228);
        assert_eq!(finish.content_length, Some(238_976));
    }

    #[test]
    fn test_parse_request_finish_without_size() {
        let finish = parse_request_finish("<-- DELETE /wd/hub/session/abc 404 3 ms")
            .expect("should parse finish marker");
        assert_eq!(finish.status, 404);
        assert_eq!(finish.elapsed_ms, 3);
        assert_eq!(finish.content_length, None);
    }

    #[test]
    fn test_parse_request_finish_accepts_nonstandard_status() {
        let finish = parse_request_finish("<-- GET /a 70000 5 ms").expect("should parse finish marker");
        assert_eq!(finish.status, 70_000);
        assert_eq!(finish.elapsed_ms, 5);
    }

    #[test]
    fn test_parse_request_finish_rejects_missing_elapsed() {
        assert_eq!(parse_request_finish("<-- GET /status 200"), None);
    }

    #[test]
    fn test_short_path() {
        assert_eq!(
            short_path("/wd/hub/session/xxx/screenshot").as_deref(),
            Some("/screenshot")
        );
        assert_eq!(
            short_path("/wd/hub/session/xxx/execute/sync").as_deref(),
            Some("/execute/sync")
        );
        assert_eq!(short_path("/wd/hub/session/xxx"), None);
        assert_eq!(short_path("/wd/hub/status"), None);
    }
}
