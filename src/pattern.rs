// In: src/pattern.rs

//! The in-memory Pattern model: an ordered command stream plus a thread table.
//!
//! A `Pattern` owns no I/O. It is built either by the reader (decoding bytes) or
//! explicitly through the builder methods below, mutated only by the remapper,
//! and consumed by the writer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::bridge::format::{Extents, MAX_RECORD_DELTA};
use crate::error::WriteError;
use crate::types::{StitchCommand, ThreadSpec};

//==================================================================================
// 1. Core Model
//==================================================================================

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Pattern {
    /// One entry per 3-byte record, in file order.
    pub stitches: Vec<StitchCommand>,
    /// Thread per color block, in block order.
    pub threads: Vec<ThreadSpec>,
    /// Header keys the codec carries through without interpreting.
    #[serde(default)]
    pub header_extras: BTreeMap<String, String>,
    #[serde(default)]
    pub label: String,
    /// Needle of the first color block, only set when a remap pass was asked
    /// to assign one at the design start.
    #[serde(default)]
    pub initial_needle: Option<u32>,
}

/// RGB triple as reported to collaborators.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Read-only summary consumed by upload handlers and renderers.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PatternInfo {
    pub label: String,
    /// Total command count, `End` included.
    pub stitches: usize,
    /// Needle-down stitches only.
    pub needle_stitches: usize,
    pub jumps: usize,
    pub color_changes: usize,
    pub thread_count: usize,
    pub thread_colors: Vec<ThreadColor>,
    pub extents: Extents,
}

impl Pattern {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_label(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    //==============================================================================
    // 2. Builders
    //==============================================================================

    /// Appends a raw command exactly as given. No chaining is applied.
    pub fn push(&mut self, command: StitchCommand) -> &mut Self {
        self.stitches.push(command);
        self
    }

    /// Appends a needle-down move, chained across several records if needed.
    pub fn stitch(&mut self, dx: i32, dy: i32) -> &mut Self {
        self.chain(dx, dy, StitchCommand::stitch)
    }

    /// Appends a needle-up move, chained across several records if needed.
    pub fn jump(&mut self, dx: i32, dy: i32) -> &mut Self {
        self.chain(dx, dy, StitchCommand::jump)
    }

    pub fn color_change(&mut self) -> &mut Self {
        self.push(StitchCommand::color_change())
    }

    pub fn end(&mut self) -> &mut Self {
        self.push(StitchCommand::End)
    }

    pub fn add_thread(&mut self, thread: ThreadSpec) -> &mut Self {
        self.threads.push(thread);
        self
    }

    /// Splits `(dx, dy)` into the fewest records of one kind that fit the
    /// per-record limit. The record deltas sum exactly to the requested move.
    fn chain(&mut self, dx: i32, dy: i32, make: fn(i32, i32) -> StitchCommand) -> &mut Self {
        let limit = i64::from(MAX_RECORD_DELTA);
        let (tx, ty) = (i64::from(dx), i64::from(dy));
        let steps = ceil_div(tx.abs(), limit).max(ceil_div(ty.abs(), limit)).max(1);

        let (mut px, mut py) = (0i64, 0i64);
        for i in 1..=steps {
            let nx = tx * i / steps;
            let ny = ty * i / steps;
            // Each step is at most ceil(|d| / steps) <= limit, so the casts cannot truncate.
            self.stitches.push(make((nx - px) as i32, (ny - py) as i32));
            px = nx;
            py = ny;
        }
        if steps > 1 {
            log::debug!("Chained move ({}, {}) into {} records", dx, dy, steps);
        }
        self
    }

    //==============================================================================
    // 3. Read-Only Accessors
    //==============================================================================

    pub fn command_count(&self) -> usize {
        self.stitches.len()
    }

    pub fn stitch_count(&self) -> usize {
        self.stitches
            .iter()
            .filter(|c| matches!(c, StitchCommand::Stitch { .. }))
            .count()
    }

    pub fn jump_count(&self) -> usize {
        self.stitches
            .iter()
            .filter(|c| matches!(c, StitchCommand::Jump { .. }))
            .count()
    }

    pub fn color_change_count(&self) -> usize {
        self.stitches.iter().filter(|c| c.is_color_change()).count()
    }

    /// Indices into `stitches` of every color change, in order.
    pub fn color_change_positions(&self) -> Vec<usize> {
        self.stitches
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.is_color_change().then_some(i))
            .collect()
    }

    /// Color blocks are the runs separated by color changes.
    pub fn color_blocks(&self) -> usize {
        self.color_change_count() + 1
    }

    /// The needle annotation of every color change, in order.
    pub fn needles(&self) -> Vec<Option<u32>> {
        self.stitches
            .iter()
            .filter(|c| c.is_color_change())
            .map(|c| c.needle())
            .collect()
    }

    /// Needle per color block: the design-start needle followed by one entry per
    /// color change.
    pub fn block_needles(&self) -> Vec<Option<u32>> {
        std::iter::once(self.initial_needle)
            .chain(self.needles())
            .collect()
    }

    pub fn has_needle_annotations(&self) -> bool {
        self.block_needles().iter().any(Option::is_some)
    }

    pub fn threads(&self) -> &[ThreadSpec] {
        &self.threads
    }

    /// Bounds of the absolute path traced by every record's delta, origin
    /// included, as magnitudes.
    pub fn bounds(&self) -> Extents {
        let (mut x, mut y) = (0i64, 0i64);
        let (mut min_x, mut max_x, mut min_y, mut max_y) = (0i64, 0i64, 0i64, 0i64);
        for command in &self.stitches {
            let (dx, dy) = command.delta();
            x += i64::from(dx);
            y += i64::from(dy);
            min_x = min_x.min(x);
            max_x = max_x.max(x);
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }
        Extents {
            max_x: saturate(max_x),
            min_x: saturate(-min_x),
            max_y: saturate(max_y),
            min_y: saturate(-min_y),
        }
    }

    /// Final needle position relative to the start.
    pub fn end_point(&self) -> (i32, i32) {
        let (x, y) = self.stitches.iter().fold((0i64, 0i64), |(x, y), c| {
            let (dx, dy) = c.delta();
            (x + i64::from(dx), y + i64::from(dy))
        });
        (saturate(x), saturate(y))
    }

    /// Checks the terminal invariant: exactly one `End`, in last position.
    pub fn validate(&self) -> Result<(), WriteError> {
        if let Some(index) = self.stitches.iter().position(|c| c.is_end()) {
            if index + 1 != self.stitches.len() {
                return Err(WriteError::MisplacedEnd { index });
            }
            return Ok(());
        }
        Err(WriteError::MissingEnd)
    }

    pub fn info(&self) -> PatternInfo {
        PatternInfo {
            label: self.label.clone(),
            stitches: self.command_count(),
            needle_stitches: self.stitch_count(),
            jumps: self.jump_count(),
            color_changes: self.color_change_count(),
            thread_count: self.threads.len(),
            thread_colors: self
                .threads
                .iter()
                .map(|t| ThreadColor {
                    r: t.red,
                    g: t.green,
                    b: t.blue,
                })
                .collect(),
            extents: self.bounds(),
        }
    }
}

fn ceil_div(value: i64, divisor: i64) -> i64 {
    (value + divisor - 1) / divisor
}

fn saturate(value: i64) -> i32 {
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}
