// In: src/bridge/mod.rs

// ====================================================================================
// ARCHITECTURAL OVERVIEW: The Bridge Layer
// ====================================================================================
//
// The `bridge` is the public-facing API of the needlework library. It connects raw
// DST bytes to the pure kernels and the Pattern model, and is the boundary that
// upload handlers, renderers and the Python FFI talk to.
//
// Data Flow (Decode):
//
//   1. [Stateless API (decode)]      -> Receives `&[u8]`
//         |
//         `-> [reader] kernels::header  -> HeaderFields (label, threads, needle table)
//         `-> [reader] kernels::record  -> one StitchCommand per 3-byte record
//
//   2. [Pattern]                     -> Returned to the caller, remapped in place
//
// Data Flow (Encode):
//
//   1. [Stateless API (encode)]      -> Receives `&Pattern`
//         |
//         `-> [writer] recomputes counts/extents -> kernels::header
//         `-> [writer] every command            -> kernels::record
//
//   2. [Vec<u8>]                     -> A byte-exact DST file
//
// ====================================================================================
pub mod format;
pub(crate) mod reader;
pub mod stateless_api;
pub(crate) mod writer;

// --- Low-Level Stateless API (for FFI and collaborators) ---
pub use stateless_api::{decode, encode, encode_with_config, inspect, process, ProcessOutcome};

#[cfg(test)]
mod tests;
