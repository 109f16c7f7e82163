// In: src/error.rs

//! This module defines the error taxonomy for the needlework library.
//! Each stage (header, record, remap, write) has its own `thiserror` enum so a
//! caller can map every failure to a distinct, stable diagnostic. The crate-wide
//! `NeedleworkError` wraps them all for the facade and FFI layers.

use thiserror::Error;

// =============================================================================
// === Header Codec Errors
// =============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HeaderError {
    #[error("Malformed header: {0}")]
    Malformed(String),

    #[error("Header field '{field}' overflows its fixed width of {width}: '{value}'")]
    FieldOverflow {
        field: String,
        width: usize,
        value: String,
    },

    #[error("Header field '{field}' contains a character that cannot be stored: {reason}")]
    InvalidText { field: String, reason: String },

    #[error("Header extra key '{0}' is reserved or not a two-character key")]
    ReservedKey(String),
}

// =============================================================================
// === Stitch Record Codec Errors
// =============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Unknown control byte 0x{0:02X}")]
    UnknownControlByte(u8),

    #[error("Motion ({dx}, {dy}) exceeds the per-record limit of +/-{limit}")]
    MotionOutOfRange { dx: i32, dy: i32, limit: i32 },

    #[error("Truncated stitch record at byte offset {offset}")]
    TruncatedRecord { offset: usize },

    #[error("Stitch stream ended without an END record")]
    MissingEnd,

    #[error("Needle table has {found} entries but the design has {expected} color blocks")]
    NeedleTableMismatch { expected: usize, found: usize },

    #[error("Header decoding failed: {0}")]
    Header(#[from] HeaderError),
}

// =============================================================================
// === Remapper Errors
// =============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemapError {
    #[error("Needle list has {supplied} entries but {required} are required")]
    InsufficientNeedles { required: usize, supplied: usize },

    #[error("Needle list entry {position} is {value}; needles must be positive")]
    InvalidNeedle { position: usize, value: u32 },

    #[error("Needle {needle} exceeds the configured maximum of {max}")]
    NeedleOutOfRange { needle: u32, max: u32 },

    #[error("Needle {needle} has no entry in a palette of {palette_len} threads")]
    NeedleNotInPalette { needle: u32, palette_len: usize },
}

// =============================================================================
// === Round-Trip Writer Errors
// =============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WriteError {
    #[error("Pattern does not end with an END command")]
    MissingEnd,

    #[error("END command at index {index} is not the final command")]
    MisplacedEnd { index: usize },

    #[error("Header encoding failed: {0}")]
    Header(#[from] HeaderError),

    #[error("Record {index} could not be encoded: {source}")]
    Record {
        index: usize,
        #[source]
        source: CodecError,
    },
}

// =============================================================================
// === Logging Setup Errors
// =============================================================================

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Logging is already enabled; cannot redirect it to '{path}'")]
    AlreadyEnabled { path: String },

    #[error("Could not open log file '{path}' in append mode: {source}")]
    LogFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(feature = "python")]
impl From<LoggingError> for pyo3::PyErr {
    fn from(err: LoggingError) -> pyo3::PyErr {
        match err {
            LoggingError::AlreadyEnabled { .. } => {
                pyo3::exceptions::PyRuntimeError::new_err(err.to_string())
            }
            LoggingError::LogFile { .. } => pyo3::exceptions::PyIOError::new_err(err.to_string()),
        }
    }
}

// =============================================================================
// === Crate-Wide Error (facade & FFI)
// =============================================================================

#[derive(Error, Debug)]
pub enum NeedleworkError {
    #[error("Decode failed: {0}")]
    Codec(#[from] CodecError),

    #[error("Remap failed: {0}")]
    Remap(#[from] RemapError),

    #[error("Write failed: {0}")]
    Write(#[from] WriteError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl From<HeaderError> for NeedleworkError {
    fn from(err: HeaderError) -> Self {
        NeedleworkError::Codec(CodecError::Header(err))
    }
}

#[cfg(feature = "python")]
impl From<NeedleworkError> for pyo3::PyErr {
    fn from(err: NeedleworkError) -> pyo3::PyErr {
        pyo3::exceptions::PyValueError::new_err(err.to_string())
    }
}
