//! This file is the root of the `needlework` Rust crate.
//!
//! Its responsibilities are strictly limited to:
//! 1.  Declaring all the top-level modules of our library (`kernels`, `remap`, etc.)
//!     so the Rust compiler knows they exist.
//! 2.  Re-exporting the stable collaborator API: decode, encode, remap and the
//!     read-only accessors on `Pattern`.
//! 3.  Defining the `#[pymodule]` entry point when built with the `python` feature.

//==================================================================================
// 0. Constants
//==================================================================================
/// The crate version, automatically set from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
//==================================================================================
// 1. Module Declarations
//==================================================================================
#[macro_use]
mod observability; // Make macros available throughout the crate

pub mod bridge;
pub mod config;
pub mod error;
pub mod kernels;
pub mod pattern;
pub mod remap;
pub mod types;

#[cfg(feature = "python")]
mod ffi;

pub use bridge::{decode, encode, encode_with_config, inspect, process, ProcessOutcome};
pub use config::{NeedleworkConfig, RemapConfig, WriterConfig};
pub use error::{CodecError, HeaderError, LoggingError, NeedleworkError, RemapError, WriteError};
pub use observability::enable_logging;
pub use pattern::{Pattern, PatternInfo};
pub use remap::{remap, remap_with_config, RemapPolicy, RemapReport};
pub use types::{StitchCommand, ThreadSpec};

//==================================================================================
// 2. Python Module Definition
//==================================================================================
#[cfg(feature = "python")]
use pyo3::prelude::*;

/// The `needlework` Python module, containing all exposed Rust functions.
#[cfg(feature = "python")]
#[pymodule]
fn needlework(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(ffi::dst_info_py, m)?)?;
    m.add_function(wrap_pyfunction!(ffi::set_needles_py, m)?)?;

    // --- Turn on logging for decode/remap/write diagnostics ---
    m.add_function(wrap_pyfunction!(ffi::enable_verbose_logging_py, m)?)?;

    // --- Expose version string as a module attribute ---
    m.add("__version__", VERSION)?;

    Ok(())
}
