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

use crate::core::log_model::{PipelineOptions, DEFAULT_DUPLICATE_WINDOW};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Global user configuration stored in config directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Distinct recent lines remembered when looking for repeated runs
    #[serde(default = "default_duplicate_window")]
    pub duplicate_window: usize,

    /// Collapse repeated runs into their first period
    #[serde(default = "default_true")]
    pub collapse_duplicates: bool,

    /// Lines shown around each search match
    #[serde(default)]
    pub context_lines: usize,

    #[serde(default)]
    pub case_sensitive: bool,
}

const fn default_duplicate_window() -> usize {
    DEFAULT_DUPLICATE_WINDOW
}

const fn default_true() -> bool {
    true
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            duplicate_window: DEFAULT_DUPLICATE_WINDOW,
            collapse_duplicates: true,
            context_lines: 0,
            case_sensitive: false,
        }
    }
}

impl GlobalConfig {
    /// Get the path to the global config file
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("appiumcrab").join("config.json"))
    }

    /// Load global config from disk, returning defaults if not found
    pub fn load() -> Self {
        Self::config_path().map_or_else(Self::default, |path| Self::load_from(&path))
    }

    /// Load config from `path`. Missing or unreadable files yield defaults.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            tracing::info!("No config found at {path:?}, using defaults");
            return Self::default();
        }

        tracing::info!("Loading config from {path:?}");
        let parsed = std::fs::read_to_string(path)
            .context("read failed")
            .and_then(|contents| serde_json::from_str::<Self>(&contents).context("invalid JSON"));
        match parsed {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring unreadable config {path:?}: {e}");
                Self::default()
            }
        }
    }

    /// Save global config to disk
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_path().context("Could not determine config directory")?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {parent:?}"))?;
        }

        let json = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config file {path:?}"))?;

        tracing::info!("Saved config to {path:?}");
        Ok(())
    }

    #[must_use]
    pub const fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            duplicate_window: self.duplicate_window,
            collapse_duplicates: self.collapse_duplicates,
        }
    }
}
