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

//! Recoverable anomalies found while reconstructing a log.
//!
//! Nothing here aborts the pipeline. Each anomaly is recorded in the model
//! and mirrored to `tracing` at the point it is found.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Diagnostic {
    /// A finish marker with no open exchange for the same method and path.
    /// The line is left out of the entries.
    #[serde(rename_all = "camelCase")]
    OrphanFinish {
        line: usize,
        method: String,
        path: String,
    },
    /// Several open exchanges shared method and path; `chosen` won the
    /// closest-start match.
    #[serde(rename_all = "camelCase")]
    AmbiguousFinish {
        line: usize,
        method: String,
        path: String,
        candidates: usize,
        chosen: String,
    },
    /// An HTTP line carrying a marker prefix that does not fit the marker grammar.
    /// The line is kept as a plain entry.
    #[serde(rename_all = "camelCase")]
    MalformedMarker { line: usize, body: String },
}

impl Diagnostic {
    #[must_use]
    pub const fn line(&self) -> usize {
        match self {
            Self::OrphanFinish { line, .. }
            | Self::AmbiguousFinish { line, .. }
            | Self::MalformedMarker { line, .. } => *line,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: ", self.line())?;
        match self {
            Self::OrphanFinish { method, path, .. } => {
                write!(f, "{method} {path} finished without a matching start")
            }
            Self::AmbiguousFinish {
                method,
                path,
                candidates,
                chosen,
                ..
            } => write!(
                f,
                "{candidates} concurrent {method} {path} requests, matched '{chosen}'"
            ),
            Self::MalformedMarker { body, .. } => write!(f, "malformed HTTP marker '{body}'"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_orphan() {
        let d = Diagnostic::OrphanFinish {
            line: 12,
            method: "GET".to_string(),
            path: "/status".to_string(),
        };
        assert_eq!(d.line(), 12);
        assert_eq!(
            d.to_string(),
            "line 12: GET /status finished without a matching start"
        );
    }

    #[test]
    fn test_serialize_tagged() {
        let d = Diagnostic::MalformedMarker {
            line: 3,
            body: "--> ".to_string(),
        };
        let json = serde_json::to_value(&d).expect("serializable");
        assert_eq!(json["kind"], "malformedMarker");
        assert_eq!(json["line"], 3);
    }
}
