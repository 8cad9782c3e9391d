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

//! `AppiumCrab` turns an Appium server log into a queryable timeline.
//!
//! The pipeline parses `YYYY-MM-DD HH:mm:ss:SSS [Category] body` lines, pairs
//! `[HTTP]` request and response markers into exchanges, and collapses
//! periodic runs such as polling loops. [`core::filter`] then answers
//! "matches plus N surrounding lines" queries over the result.

pub mod config;
pub mod core;
pub mod export;
pub mod parser;

pub use crate::core::{parse_log, Diagnostic, HttpExchange, LogEntry, LogModel, PipelineOptions};
