// In: src/remap/mod.rs

// ====================================================================================
// ARCHITECTURAL OVERVIEW: The Needle Remapper
// ====================================================================================
//
// Every color change in a stitch stream is a boundary where a multi-needle machine
// switches spools. The remapper walks the Pattern and writes a needle number into
// each `ColorChange` command:
//
//   1. [resolve]  RemapPolicy + RemapConfig -> one validated needle per boundary
//   2. [stage]    clone the command stream, write needles into the copy
//   3. [commit]   swap the copy in (and the palette threads, if configured)
//
// Steps 1 and 2 never touch the caller's Pattern, so a failed pass is invisible.
// ====================================================================================
pub mod engine;
pub mod report;

pub use engine::{remap, remap_with_config, RemapPolicy};
pub use report::{Boundary, NeedleAssignment, RemapReport};
