// In: src/bridge/reader.rs

//! Decodes a complete DST byte buffer into a `Pattern`.

use crate::bridge::format::{HEADER_SIZE, RECORD_SIZE};
use crate::error::CodecError;
use crate::kernels::{decode_header, decode_record};
use crate::pattern::Pattern;
use crate::types::StitchCommand;

/// Reads the header block, then 3-byte records up to and including the first
/// `End`. Bytes after `End` are ignored.
pub fn read(bytes: &[u8]) -> Result<Pattern, CodecError> {
    let header = decode_header(bytes)?;
    let body = &bytes[HEADER_SIZE..];

    let mut stitches = Vec::with_capacity(body.len() / RECORD_SIZE);
    let mut offset = HEADER_SIZE;
    let mut records = body.chunks(RECORD_SIZE);
    loop {
        let chunk = records.next().ok_or(CodecError::MissingEnd)?;
        let record: [u8; RECORD_SIZE] = chunk
            .try_into()
            .map_err(|_| CodecError::TruncatedRecord { offset })?;
        let command = decode_record(record).map_err(|e| {
            log::warn!("Record at byte offset {} rejected: {}", offset, e);
            e
        })?;
        stitches.push(command);
        offset += RECORD_SIZE;
        if command.is_end() {
            break;
        }
    }

    let trailing = bytes.len() - offset;
    if trailing > 0 {
        log::debug!("Ignoring {} trailing bytes after END", trailing);
    }

    let mut pattern = Pattern {
        stitches,
        threads: header.threads,
        header_extras: header.extras,
        label: header.label,
        initial_needle: None,
    };

    if let Some(needles) = header.needles {
        apply_needle_table(&mut pattern, &needles)?;
    }

    if header.stitch_count as usize != pattern.command_count() {
        log::warn!(
            "Header declares {} records, stream has {}; using the stream",
            header.stitch_count,
            pattern.command_count()
        );
    }
    if header.color_count as usize != pattern.color_change_count() {
        log::warn!(
            "Header declares {} color changes, stream has {}; using the stream",
            header.color_count,
            pattern.color_change_count()
        );
    }

    log::debug!(
        "Decoded '{}': {} records, {} color changes, {} threads",
        pattern.label,
        pattern.command_count(),
        pattern.color_change_count(),
        pattern.threads.len()
    );
    log_metric!(
        "event" = "decode",
        "records" = pattern.command_count(),
        "color_changes" = pattern.color_change_count()
    );
    Ok(pattern)
}

/// Writes the header's per-block needle table back into the command stream.
fn apply_needle_table(pattern: &mut Pattern, needles: &[Option<u32>]) -> Result<(), CodecError> {
    let expected = pattern.color_blocks();
    let Some((&initial, per_change)) = needles.split_first() else {
        return Err(CodecError::NeedleTableMismatch { expected, found: 0 });
    };
    if needles.len() != expected {
        return Err(CodecError::NeedleTableMismatch {
            expected,
            found: needles.len(),
        });
    }

    pattern.initial_needle = initial;
    let mut table = per_change.iter();
    for command in pattern.stitches.iter_mut() {
        if let StitchCommand::ColorChange { needle, .. } = command {
            *needle = table.next().copied().flatten();
        }
    }
    Ok(())
}
