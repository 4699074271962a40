// SPDX-License-Identifier: MIT OR Apache-2.0
//! The JSON level-definition file.
//!
//! ```json
//! {"debug_spec": [{"prog_name": "success_rate_graph", "levels": "0.5",
//!   "printing": 1, "logging": 0, "log_file": "", "eval": "le",
//!   "indent_space": 2, "date_fmt": "YMD"}]}
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::Path;

use crate::DebugError;
use crate::levels::CompareMode;

/// Timestamp layout for emitted lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DateFormat {
    /// `MM/DD/YYYY HH:MM`
    #[default]
    #[serde(rename = "MDY")]
    Mdy,
    /// `YYYY-MM-DD HH:MM`
    #[serde(rename = "YMD")]
    Ymd,
}

impl DateFormat {
    /// `chrono` format string for this layout.
    #[must_use]
    pub fn pattern(self) -> &'static str {
        match self {
            Self::Mdy => "%m/%d/%Y %H:%M",
            Self::Ymd => "%Y-%m-%d %H:%M",
        }
    }
}

impl fmt::Display for DateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Mdy => "MDY",
            Self::Ymd => "YMD",
        })
    }
}

/// Top-level shape of the definition file.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct DebugDefinitions {
    /// One entry per program.
    #[serde(default)]
    pub debug_spec: Vec<DebugSpecEntry>,
}

/// Debug settings for one program.
///
/// Every present field overrides the caller's default. Integer fields accept
/// either JSON numbers or numeric strings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct DebugSpecEntry {
    /// Program the entry applies to.
    pub prog_name: String,
    /// Raw level spec, same grammar as the environment variable.
    pub levels: String,
    /// `1` prints to stdout.
    #[serde(default, deserialize_with = "int_like", skip_serializing_if = "Option::is_none")]
    pub printing: Option<i64>,
    /// `1` appends to `log_file`.
    #[serde(default, deserialize_with = "int_like", skip_serializing_if = "Option::is_none")]
    pub logging: Option<i64>,
    /// Log destination; empty means none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<String>,
    /// Threshold comparison mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eval: Option<CompareMode>,
    /// Spaces of indentation per minor level.
    #[serde(default, deserialize_with = "int_like", skip_serializing_if = "Option::is_none")]
    pub indent_space: Option<i64>,
    /// Timestamp layout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_fmt: Option<DateFormat>,
}

impl DebugDefinitions {
    /// Read and parse a definition file.
    pub fn load(path: &Path) -> Result<Self, DebugError> {
        let content = std::fs::read_to_string(path).map_err(|source| DebugError::DefinitionFile {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| DebugError::DefinitionParse {
            path: path.display().to_string(),
            source,
        })
    }

    /// The entry for `program`. Later entries shadow earlier ones.
    #[must_use]
    pub fn entry_for(&self, program: &str) -> Option<&DebugSpecEntry> {
        self.debug_spec.iter().rev().find(|e| e.prog_name == program)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IntOrString {
    Int(i64),
    Str(String),
}

fn int_like<'de, D: Deserializer<'de>>(de: D) -> Result<Option<i64>, D::Error> {
    match Option::<IntOrString>::deserialize(de)? {
        None => Ok(None),
        Some(IntOrString::Int(n)) => Ok(Some(n)),
        Some(IntOrString::Str(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("expected an integer, got {s:?}"))),
    }
}
