// In: src/bridge/writer.rs

//! The round-trip writer: serializes a `Pattern` back into DST bytes.
//!
//! Every derived header value (record count, color count, extents, end point)
//! is recomputed from the command stream. Nothing is trusted from a previously
//! decoded header.

use std::collections::BTreeMap;

use crate::bridge::format::{HEADER_CAPACITY_FIELD, HEADER_SIZE, NO_PREVIOUS_FILE, RECORD_SIZE};
use crate::config::WriterConfig;
use crate::error::{HeaderError, WriteError};
use crate::kernels::{encode_header, encode_record, HeaderFields};
use crate::pattern::Pattern;

/// Writes with the default configuration (extended header and needle table on).
pub fn write(pattern: &Pattern) -> Result<Vec<u8>, WriteError> {
    write_with_config(pattern, &WriterConfig::default())
}

/// Fails with `MissingEnd` unless the last command is `End`; the writer never
/// appends one on the caller's behalf.
pub fn write_with_config(pattern: &Pattern, config: &WriterConfig) -> Result<Vec<u8>, WriteError> {
    pattern.validate()?;

    let block = encode_fitting_header(header_fields(pattern, config))?;

    let mut out = Vec::with_capacity(HEADER_SIZE + pattern.command_count() * RECORD_SIZE);
    out.extend_from_slice(&block);
    for (index, command) in pattern.stitches.iter().enumerate() {
        let record = encode_record(command).map_err(|source| WriteError::Record { index, source })?;
        out.extend_from_slice(&record);
    }

    log::debug!(
        "Wrote '{}': {} records, {} bytes",
        pattern.label,
        pattern.command_count(),
        out.len()
    );
    log_metric!(
        "event" = "write",
        "records" = pattern.command_count(),
        "bytes" = out.len()
    );
    Ok(out)
}

/// Builds the header for `pattern`. Counts too large for `u32` saturate and are
/// then rejected by the header codec's width check.
pub fn header_fields(pattern: &Pattern, config: &WriterConfig) -> HeaderFields {
    let to_u32 = |n: usize| u32::try_from(n).unwrap_or(u32::MAX);

    let (threads, extras) = if config.extended_header {
        (pattern.threads.clone(), pattern.header_extras.clone())
    } else {
        (Vec::new(), BTreeMap::new())
    };
    let needles = (config.needle_table && pattern.has_needle_annotations())
        .then(|| pattern.block_needles());

    HeaderFields {
        label: pattern.label.clone(),
        stitch_count: to_u32(pattern.command_count()),
        color_count: to_u32(pattern.color_change_count()),
        extents: pattern.bounds(),
        end_point: pattern.end_point(),
        previous_end_point: (0, 0),
        previous_file: NO_PREVIOUS_FILE.to_string(),
        threads,
        needles,
        extras,
    }
}

/// Encodes `header`, shedding extended lines while the text outgrows the block:
/// thread lines first, then vendor extras, then the needle table. The standard
/// fields alone always fit, so only fixed-width overflows remain errors.
fn encode_fitting_header(mut header: HeaderFields) -> Result<[u8; HEADER_SIZE], HeaderError> {
    loop {
        let err = match encode_header(&header) {
            Ok(block) => return Ok(block),
            Err(err) => err,
        };
        let is_capacity = matches!(
            &err,
            HeaderError::FieldOverflow { field, .. } if field == HEADER_CAPACITY_FIELD
        );
        if !is_capacity {
            return Err(err);
        }

        if !header.threads.is_empty() {
            log::warn!(
                "Header full: dropping {} thread lines ({})",
                header.threads.len(),
                err
            );
            header.threads.clear();
        } else if !header.extras.is_empty() {
            log::warn!(
                "Header full: dropping {} extra fields ({})",
                header.extras.len(),
                err
            );
            header.extras.clear();
        } else if header.needles.take().is_some() {
            log::warn!("Header full: dropping the needle table ({})", err);
        } else {
            return Err(err);
        }
    }
}
