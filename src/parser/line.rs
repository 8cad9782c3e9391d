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

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One successfully parsed log line, before any semantic enrichment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// Instant of the line, always UTC
    pub timestamp: DateTime<Utc>,
    /// Text between the square brackets, e.g. `HTTP` or `W3C (aaaa)`
    pub category: String,
    /// Everything after `] `
    pub body: String,
    /// 1-based line number in the source text
    pub line_number: usize,
}

impl RawRecord {
    pub const fn new(
        timestamp: DateTime<Utc>,
        category: String,
        body: String,
        line_number: usize,
    ) -> Self {
        Self {
            timestamp,
            category,
            body,
            line_number,
        }
    }
}

/// Absolute instant plus the offset from the first record of the log.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timestamp {
    pub absolute: DateTime<Utc>,
    pub relative_seconds: f64,
}

impl Timestamp {
    /// Build a timestamp relative to `origin`, with millisecond resolution.
    #[must_use]
    pub fn relative_to(absolute: DateTime<Utc>, origin: DateTime<Utc>) -> Self {
        let millis = (absolute - origin).num_milliseconds();
        Self {
            absolute,
            relative_seconds: millis as f64 / 1000.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_relative_seconds() {
        let origin = Utc
            .with_ymd_and_hms(2021, 12, 21, 4, 30, 54)
            .single()
            .expect("valid date");
        let later = origin + chrono::Duration::milliseconds(2599);

        let ts = Timestamp::relative_to(later, origin);
        assert!((ts.relative_seconds - 2.599).abs() < 1e-9);
        assert_eq!(ts.absolute, later);
    }

    #[test]
    fn test_relative_seconds_before_origin() {
        let origin = Utc
            .with_ymd_and_hms(2021, 12, 21, 4, 30, 54)
            .single()
            .expect("valid date");
        let earlier = origin - chrono::Duration::milliseconds(500);

        let ts = Timestamp::relative_to(earlier, origin);
        assert!((ts.relative_seconds + 0.5).abs() < 1e-9);
    }
}
