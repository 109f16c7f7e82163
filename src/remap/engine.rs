// In: src/remap/engine.rs

//! The needle remap pass.
//!
//! The pass is all-or-nothing: every needle is resolved and validated first,
//! the new command stream is built on a copy, and the pattern is only touched
//! once nothing can fail any more.

use serde::{Deserialize, Serialize};

use crate::config::RemapConfig;
use crate::error::RemapError;
use crate::pattern::Pattern;
use crate::remap::report::{Boundary, NeedleAssignment, RemapReport};
use crate::types::{StitchCommand, ThreadSpec};

/// Where the needle numbers come from.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "policy", content = "needles", rename_all = "snake_case")]
pub enum RemapPolicy {
    /// Count up from 1, one needle per boundary.
    Sequential,
    /// Use these needles, one per boundary, in stitch order.
    Explicit(Vec<u32>),
}

/// Remaps with the default configuration (no design-start boundary, no limits).
pub fn remap(pattern: &mut Pattern, policy: &RemapPolicy) -> Result<RemapReport, RemapError> {
    remap_with_config(pattern, policy, &RemapConfig::default())
}

/// Assigns a needle to every color change (and to the design start when
/// `config.needle_at_start` is set). Motion deltas are never altered.
///
/// On error the pattern is left exactly as it was.
pub fn remap_with_config(
    pattern: &mut Pattern,
    policy: &RemapPolicy,
    config: &RemapConfig,
) -> Result<RemapReport, RemapError> {
    let positions = pattern.color_change_positions();
    let required = positions.len() + usize::from(config.needle_at_start);

    // --- Stage 1: resolve and validate every needle up front ---
    let needles = resolve_needles(policy, required)?;
    if let Some(max) = config.max_needle {
        if let Some(&needle) = needles.iter().find(|&&n| n > max) {
            return Err(RemapError::NeedleOutOfRange { needle, max });
        }
    }

    let (start_needle, change_needles) = if config.needle_at_start {
        match needles.split_first() {
            Some((&first, rest)) => (Some(first), rest),
            None => (None, &needles[..]),
        }
    } else {
        (None, &needles[..])
    };

    let threads = match &config.palette {
        Some(palette) => Some(threads_from_palette(
            palette,
            &pattern.threads,
            start_needle,
            change_needles,
        )?),
        None => None,
    };

    // --- Stage 2: build the new command stream on a copy ---
    let mut staged = pattern.stitches.clone();
    let mut assignments = Vec::with_capacity(required);

    if let Some(needle) = start_needle {
        assignments.push(NeedleAssignment {
            boundary: Boundary::DesignStart,
            stitch_index: None,
            previous_needle: pattern.initial_needle,
            new_needle: needle,
        });
    }

    for (&index, &new_needle) in positions.iter().zip(change_needles) {
        if let StitchCommand::ColorChange { needle, .. } = &mut staged[index] {
            assignments.push(NeedleAssignment {
                boundary: Boundary::ColorChange,
                stitch_index: Some(index),
                previous_needle: *needle,
                new_needle,
            });
            *needle = Some(new_needle);
        }
    }

    // --- Stage 3: commit ---
    pattern.stitches = staged;
    pattern.initial_needle = start_needle;
    if let Some(threads) = threads {
        pattern.threads = threads;
    }

    let report = RemapReport { assignments };
    log::info!(
        "Remapped {} boundaries ({} changed) using {} policy; needles in use: {:?}",
        report.assignments.len(),
        report.changed(),
        policy_name(policy),
        report.used_needles()
    );
    log_metric!(
        "event" = "remap",
        "boundaries" = report.assignments.len(),
        "needle_at_start" = config.needle_at_start
    );
    Ok(report)
}

fn policy_name(policy: &RemapPolicy) -> &'static str {
    match policy {
        RemapPolicy::Sequential => "sequential",
        RemapPolicy::Explicit(_) => "explicit",
    }
}

/// Produces exactly `required` positive needles.
fn resolve_needles(policy: &RemapPolicy, required: usize) -> Result<Vec<u32>, RemapError> {
    match policy {
        RemapPolicy::Sequential => Ok((1..).take(required).collect()),
        RemapPolicy::Explicit(list) => {
            if list.len() < required {
                return Err(RemapError::InsufficientNeedles {
                    required,
                    supplied: list.len(),
                });
            }
            if list.len() > required {
                log::warn!(
                    "Needle list has {} entries, only the first {} are used",
                    list.len(),
                    required
                );
            }
            let used = &list[..required];
            if let Some(position) = used.iter().position(|&n| n == 0) {
                return Err(RemapError::InvalidNeedle { position, value: 0 });
            }
            Ok(used.to_vec())
        }
    }
}

/// One thread per color block: assigned blocks take their needle's palette
/// entry, an unassigned start block keeps its current thread.
fn threads_from_palette(
    palette: &[ThreadSpec],
    current: &[ThreadSpec],
    start_needle: Option<u32>,
    change_needles: &[u32],
) -> Result<Vec<ThreadSpec>, RemapError> {
    let lookup = |needle: u32| {
        palette
            .get(needle as usize - 1)
            .cloned()
            .ok_or(RemapError::NeedleNotInPalette {
                needle,
                palette_len: palette.len(),
            })
    };

    let mut threads = Vec::with_capacity(change_needles.len() + 1);
    match start_needle {
        Some(needle) => threads.push(lookup(needle)?),
        None => {
            if let Some(first) = current.first().or_else(|| palette.first()) {
                threads.push(first.clone());
            }
        }
    }
    for &needle in change_needles {
        threads.push(lookup(needle)?);
    }
    Ok(threads)
}
