// In: src/config.rs

//! The single source of truth for all needlework configuration.
//!
//! `NeedleworkConfig` is created once at the application boundary (from a JSON
//! document, the Python keyword arguments, or `Default`) and passed down by
//! reference. Palettes and needle limits that older upload handlers kept as
//! module-level globals live here instead.

use serde::{Deserialize, Serialize};

use crate::error::NeedleworkError;
use crate::types::ThreadSpec;

//==================================================================================
// I. Remapper Configuration
//==================================================================================

/// Settings for a needle remap pass.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct RemapConfig {
    /// When true, the design start is treated as a color-change boundary and
    /// consumes the first needle before any `ColorChange` command.
    #[serde(default)]
    pub needle_at_start: bool,

    /// Highest needle the target machine has. `None` disables the check.
    #[serde(default)]
    pub max_needle: Option<u32>,

    /// Needle-to-thread table: needle `n` uses `palette[n - 1]`. When present,
    /// the remapper rebuilds the pattern's thread list from it.
    #[serde(default)]
    pub palette: Option<Vec<ThreadSpec>>,
}

//==================================================================================
// II. Writer Configuration
//==================================================================================

/// Settings for the round-trip writer.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct WriterConfig {
    /// If true, header extras and `TC` thread lines are written after the
    /// standard fields.
    #[serde(default = "default_true")]
    pub extended_header: bool,

    /// If true, needle annotations are stored in an `ND` header line. Files with
    /// no annotations never get one.
    #[serde(default = "default_true")]
    pub needle_table: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            extended_header: true,
            needle_table: true,
        }
    }
}

//==================================================================================
// III. The Unified NeedleworkConfig
//==================================================================================

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct NeedleworkConfig {
    #[serde(default)]
    pub remap: RemapConfig,

    #[serde(default)]
    pub writer: WriterConfig,
}

impl NeedleworkConfig {
    /// Parses a JSON document; every field is optional.
    pub fn from_json_str(json: &str) -> Result<Self, NeedleworkError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Helper for `serde` to default a boolean field to true.
fn default_true() -> bool {
    true
}
