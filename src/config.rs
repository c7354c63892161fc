// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! On-disk simulator configuration, parsed with `serde` + `toml`.
//!
//! The core library itself needs no configuration file (spec §6:
//! "Environment variables: none required by the core"); this module exists
//! for the illustrative CLI and any other embedding that wants its
//! recursion cap and enabled device kinds externalized rather than
//! hardcoded.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::core::manager::DEFAULT_RECURSION_CAP;

/// Failure modes when loading a [`SimConfig`] from disk.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// The file's contents were not valid TOML for this schema.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

fn default_recursion_limit() -> u32 {
    DEFAULT_RECURSION_CAP
}

fn default_enabled_kinds() -> Vec<String> {
    vec!["flash".into(), "temp_sensor".into(), "fpga".into()]
}

/// Top-level simulator configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SimConfig {
    /// Overrides [`crate::core::manager::DEFAULT_RECURSION_CAP`] when present.
    #[serde(default = "default_recursion_limit")]
    pub recursion_limit: u32,

    /// Device kinds to register at startup, by lowercase short name
    /// (`"flash"`, `"temp_sensor"`, `"fpga"`).
    #[serde(default = "default_enabled_kinds")]
    pub enabled_kinds: Vec<String>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            recursion_limit: default_recursion_limit(),
            enabled_kinds: default_enabled_kinds(),
        }
    }
}

impl SimConfig {
    /// Parse configuration from a TOML file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Ok(toml::from_str(&text)?)
    }
}
