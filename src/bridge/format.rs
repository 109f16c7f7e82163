// In: src/bridge/format.rs

//! Defines all on-disk constants for the Tajima DST format.
//! This is the single source of truth for the header block layout and the
//! stitch-record control bytes. Changing anything here breaks interoperability
//! with embroidery machines, so every value is pinned by a golden test.

use serde::{Deserialize, Serialize};

//==================================================================================
// I. Header Block
//==================================================================================

/// Size of the fixed ASCII header that precedes the stitch stream.
pub const HEADER_SIZE: usize = 512;
/// Terminates every `KEY:value` field.
pub const FIELD_TERMINATOR: u8 = b'\r';
/// Marks the end of the header text; everything after it is padding.
pub const HEADER_TEXT_END: u8 = 0x1A;
/// Fills the header block after the end-of-text byte.
pub const HEADER_PAD: u8 = b' ';
/// Separates a field key from its value.
pub const KEY_SEPARATOR: u8 = b':';
/// Value of the `PD` field when there is no previous file in a multi-volume design.
pub const NO_PREVIOUS_FILE: &str = "******";

/// Fixed widths of the standard numeric and text fields.
pub const LABEL_WIDTH: usize = 16;
pub const STITCH_COUNT_WIDTH: usize = 7;
pub const COLOR_COUNT_WIDTH: usize = 3;
pub const EXTENT_WIDTH: usize = 5;
pub const PREVIOUS_FILE_WIDTH: usize = 6;

/// Keys owned by the header codec. Anything else is carried as an extra.
pub const KEY_LABEL: &str = "LA";
pub const KEY_STITCH_COUNT: &str = "ST";
pub const KEY_COLOR_COUNT: &str = "CO";
pub const KEY_MAX_X: &str = "+X";
pub const KEY_MIN_X: &str = "-X";
pub const KEY_MAX_Y: &str = "+Y";
pub const KEY_MIN_Y: &str = "-Y";
pub const KEY_END_X: &str = "AX";
pub const KEY_END_Y: &str = "AY";
pub const KEY_PREV_END_X: &str = "MX";
pub const KEY_PREV_END_Y: &str = "MY";
pub const KEY_PREVIOUS_FILE: &str = "PD";
pub const KEY_THREAD: &str = "TC";
pub const KEY_NEEDLES: &str = "ND";

/// Field name reported when the whole header text outgrows the block.
pub const HEADER_CAPACITY_FIELD: &str = "header";
/// Upper bound on an expanded needle table: one block per record the `ST`
/// field can count.
pub const MAX_NEEDLE_TABLE_ENTRIES: usize = 9_999_999;

pub const RESERVED_KEYS: [&str; 14] = [
    KEY_LABEL,
    KEY_STITCH_COUNT,
    KEY_COLOR_COUNT,
    KEY_MAX_X,
    KEY_MIN_X,
    KEY_MAX_Y,
    KEY_MIN_Y,
    KEY_END_X,
    KEY_END_Y,
    KEY_PREV_END_X,
    KEY_PREV_END_Y,
    KEY_PREVIOUS_FILE,
    KEY_THREAD,
    KEY_NEEDLES,
];

//==================================================================================
// II. Stitch Records
//==================================================================================

/// Every stitch record is exactly three bytes.
pub const RECORD_SIZE: usize = 3;
/// Largest per-axis magnitude one record can carry (81 + 27 + 9 + 3 + 1).
pub const MAX_RECORD_DELTA: i32 = 121;

/// Control-byte patterns (third byte of a record). Bits 0 and 1 are always set.
pub const CONTROL_STITCH: u8 = 0x03;
pub const CONTROL_JUMP: u8 = 0x83;
pub const CONTROL_COLOR_CHANGE: u8 = 0xC3;
pub const CONTROL_END: u8 = 0xF3;

/// Masks used to classify a control byte. The motion bits for +/-81 share the
/// third byte, so classification only inspects the bits each kind reserves.
pub const MASK_KIND: u8 = 0b1100_0011;
pub const MASK_END: u8 = 0b1111_0011;

/// The canonical end-of-design record.
pub const END_RECORD: [u8; RECORD_SIZE] = [0x00, 0x00, CONTROL_END];

//==================================================================================
// III. Derived Header Values
//==================================================================================

/// Extents of the stitch path, stored as non-negative magnitudes the way the
/// `+X`/`-X`/`+Y`/`-Y` fields expect them.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Extents {
    pub max_x: i32,
    pub min_x: i32,
    pub max_y: i32,
    pub min_y: i32,
}

impl Extents {
    /// Width of the design in file units.
    pub fn width(&self) -> i32 {
        self.max_x + self.min_x
    }

    /// Height of the design in file units.
    pub fn height(&self) -> i32 {
        self.max_y + self.min_y
    }
}
