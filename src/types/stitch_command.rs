//! This module defines the canonical, type-safe representation of a single
//! decoded stitch record.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One command of a decoded stitch stream.
///
/// Each variant corresponds to exactly one 3-byte record on disk. Motion deltas
/// are per-record values in file units (0.1 mm) with +Y pointing up.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum StitchCommand {
    /// Needle-down motion.
    Stitch { dx: i32, dy: i32 },
    /// Needle-up traverse.
    Jump { dx: i32, dy: i32 },
    /// Thread change. `needle` is `None` until a remap pass resolves it.
    ColorChange {
        dx: i32,
        dy: i32,
        needle: Option<u32>,
    },
    /// Terminal marker. Must be the last command of a pattern.
    End,
}

/// The command kind without its payload, as selected by the control byte.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    Stitch,
    Jump,
    ColorChange,
    End,
}

impl StitchCommand {
    pub fn stitch(dx: i32, dy: i32) -> Self {
        Self::Stitch { dx, dy }
    }

    pub fn jump(dx: i32, dy: i32) -> Self {
        Self::Jump { dx, dy }
    }

    /// A color change with no motion and no needle assigned yet.
    pub fn color_change() -> Self {
        Self::ColorChange {
            dx: 0,
            dy: 0,
            needle: None,
        }
    }

    pub fn kind(&self) -> CommandKind {
        match self {
            Self::Stitch { .. } => CommandKind::Stitch,
            Self::Jump { .. } => CommandKind::Jump,
            Self::ColorChange { .. } => CommandKind::ColorChange,
            Self::End => CommandKind::End,
        }
    }

    /// Returns the `(dx, dy)` motion of this record. `End` never moves.
    pub fn delta(&self) -> (i32, i32) {
        match *self {
            Self::Stitch { dx, dy } | Self::Jump { dx, dy } | Self::ColorChange { dx, dy, .. } => {
                (dx, dy)
            }
            Self::End => (0, 0),
        }
    }

    /// Returns the resolved needle of a color change, `None` for everything else.
    pub fn needle(&self) -> Option<u32> {
        match *self {
            Self::ColorChange { needle, .. } => needle,
            _ => None,
        }
    }

    pub fn is_color_change(&self) -> bool {
        matches!(self, Self::ColorChange { .. })
    }

    pub fn is_end(&self) -> bool {
        matches!(self, Self::End)
    }
}

impl fmt::Display for StitchCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stitch { dx, dy } => write!(f, "STITCH({}, {})", dx, dy),
            Self::Jump { dx, dy } => write!(f, "JUMP({}, {})", dx, dy),
            Self::ColorChange {
                dx,
                dy,
                needle: Some(n),
            } => write!(f, "COLOR_CHANGE({}, {}) -> needle {}", dx, dy, n),
            Self::ColorChange {
                dx,
                dy,
                needle: None,
            } => write!(f, "COLOR_CHANGE({}, {})", dx, dy),
            Self::End => write!(f, "END"),
        }
    }
}
