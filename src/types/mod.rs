//! This module defines the core, strongly-typed data representations used
//! throughout the needlework pipeline.
//!
//! It includes the closed `StitchCommand` enum, which replaces loosely-typed
//! `(x, y, flags)` tuples, and the `ThreadSpec` entries of a pattern's thread table.

pub mod stitch_command;
pub mod thread_spec;

// Re-export the main type(s) for easier access.
pub use stitch_command::{CommandKind, StitchCommand};
pub use thread_spec::ThreadSpec;
