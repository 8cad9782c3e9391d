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

pub mod http;
pub mod line;

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use fancy_regex::Regex;
use line::RawRecord;
use std::sync::LazyLock;

// yyyy-MM-dd HH:mm:ss:SSS [Category] body
// Milliseconds are captured separately, they follow a colon rather than a dot.
// Not anchored: container and multiplexer tags may precede the timestamp.
static LOG_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?<!\d)(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}):(\d{3}) \[(.+?)\] (.+)$")
        .expect("valid regex literal")
});

/// Parse the whole log text into raw records, in source order.
///
/// Lines that do not fit `<date> <time> [<category>] <body>` are skipped.
/// They are noise (blank lines, stack traces, banners), not errors.
#[must_use]
pub fn parse_raw_records(content: &str) -> Vec<RawRecord> {
    profiling::scope!("parse_raw_records");

    let mut dropped = 0usize;
    let records: Vec<RawRecord> = content
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| {
            let record = parse_line(line, idx + 1);
            if record.is_none() {
                dropped += 1;
            }
            record
        })
        .collect();

    tracing::debug!(
        "Parsed {} raw records, dropped {dropped} non-conforming lines",
        records.len()
    );
    records
}

/// Parse a single line. The timestamp is read as UTC regardless of the local zone.
#[must_use]
pub fn parse_line(line: &str, line_number: usize) -> Option<RawRecord> {
    let caps = LOG_LINE.captures(line).ok()??;
    let timestamp = parse_timestamp(&caps[1], &caps[2])?;
    Some(RawRecord::new(
        timestamp,
        caps[3].to_string(),
        caps[4].to_string(),
        line_number,
    ))
}

fn parse_timestamp(date_time: &str, millis: &str) -> Option<DateTime<Utc>> {
    let Ok(naive) = NaiveDateTime::parse_from_str(date_time, "%Y-%m-%d %H:%M:%S") else {
        tracing::debug!("Invalid calendar timestamp '{date_time}', dropping line");
        return None;
    };
    let millis: i64 = millis.parse().ok()?;
    Some(naive.and_utc() + Duration::milliseconds(millis))
}
