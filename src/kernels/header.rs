//! This module contains the kernels for the fixed 512-byte DST header block.
//!
//! The header is a sequence of `KEY:value` fields, each terminated by CR,
//! followed by an end-of-text byte (0x1A) and space padding. The standard
//! fields have fixed widths; the extended fields (`TC` thread lines, the `ND`
//! needle table and any vendor extras) are variable length but must still fit
//! inside the block.
//!
//! Header text is treated as Latin-1: every byte maps to the `char` of the same
//! value and back, so labels written by other tools survive a round trip.

use std::collections::BTreeMap;

use crate::bridge::format::{
    Extents, COLOR_COUNT_WIDTH, EXTENT_WIDTH, FIELD_TERMINATOR, HEADER_CAPACITY_FIELD, HEADER_PAD,
    HEADER_SIZE, HEADER_TEXT_END, KEY_COLOR_COUNT, KEY_END_X, KEY_END_Y, KEY_LABEL, KEY_MAX_X,
    KEY_MAX_Y, KEY_MIN_X, KEY_MIN_Y, KEY_NEEDLES, KEY_PREVIOUS_FILE, KEY_PREV_END_X,
    KEY_PREV_END_Y, KEY_SEPARATOR, KEY_STITCH_COUNT, KEY_THREAD, LABEL_WIDTH,
    MAX_NEEDLE_TABLE_ENTRIES, NO_PREVIOUS_FILE, PREVIOUS_FILE_WIDTH, RESERVED_KEYS,
    STITCH_COUNT_WIDTH,
};
use crate::error::HeaderError;
use crate::types::ThreadSpec;

//==================================================================================
// 1. Header Model
//==================================================================================

/// All values carried by a DST header block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderFields {
    pub label: String,
    /// Number of stitch records, `End` included.
    pub stitch_count: u32,
    /// Number of color-change records.
    pub color_count: u32,
    pub extents: Extents,
    /// Final needle position relative to the start.
    pub end_point: (i32, i32),
    /// End point of the previous file of a multi-volume design.
    pub previous_end_point: (i32, i32),
    pub previous_file: String,
    pub threads: Vec<ThreadSpec>,
    /// One entry per color block (color changes + 1); `None` = unassigned.
    /// `None` as a whole means the header had no needle table.
    pub needles: Option<Vec<Option<u32>>>,
    /// Two-letter keys the codec does not interpret, in key order.
    pub extras: BTreeMap<String, String>,
}

impl Default for HeaderFields {
    fn default() -> Self {
        Self {
            label: String::new(),
            stitch_count: 0,
            color_count: 0,
            extents: Extents::default(),
            end_point: (0, 0),
            previous_end_point: (0, 0),
            previous_file: NO_PREVIOUS_FILE.to_string(),
            threads: Vec::new(),
            needles: None,
            extras: BTreeMap::new(),
        }
    }
}

//==================================================================================
// 2. Decoding
//==================================================================================

/// Parses the header block at the start of `bytes`.
///
/// Only the first `HEADER_SIZE` bytes are inspected. Missing keys keep their
/// defaults; unknown keys land in `extras`. Anything `encode_header` could not
/// write back (over-long labels, malformed extra keys) is dropped with a warning.
pub fn decode_header(bytes: &[u8]) -> Result<HeaderFields, HeaderError> {
    if bytes.len() < HEADER_SIZE {
        return Err(HeaderError::Malformed(format!(
            "header block is {} bytes, expected at least {}",
            bytes.len(),
            HEADER_SIZE
        )));
    }

    let block = &bytes[..HEADER_SIZE];
    let text_len = block
        .iter()
        .position(|&b| b == HEADER_TEXT_END)
        .unwrap_or(HEADER_SIZE);
    let text = &block[..text_len];

    let mut segments: Vec<&[u8]> = text.split(|&b| b == FIELD_TERMINATOR).collect();
    // Whatever follows the final CR must be padding, not the start of a field.
    if let Some(tail) = segments.pop() {
        if !is_blank(tail) {
            return Err(HeaderError::Malformed(format!(
                "unterminated field '{}'",
                latin1(tail).trim_end()
            )));
        }
    }

    let mut fields = HeaderFields::default();
    for raw in segments {
        let segment = raw.strip_prefix(b"\n").unwrap_or(raw);
        if is_blank(segment) {
            continue;
        }
        if segment.len() < 3 || segment[2] != KEY_SEPARATOR {
            log::warn!("Skipping header segment without a key: '{}'", latin1(segment));
            continue;
        }
        let key = latin1(&segment[..2]);
        let value = latin1(&segment[3..]);
        apply_field(&mut fields, &key, &value)?;
    }

    Ok(fields)
}

fn apply_field(fields: &mut HeaderFields, key: &str, value: &str) -> Result<(), HeaderError> {
    match key {
        KEY_LABEL => fields.label = parse_label(value),
        KEY_STITCH_COUNT => fields.stitch_count = parse_unsigned(key, value)?,
        KEY_COLOR_COUNT => fields.color_count = parse_unsigned(key, value)?,
        KEY_MAX_X => fields.extents.max_x = parse_signed(key, value)?,
        KEY_MIN_X => fields.extents.min_x = parse_signed(key, value)?,
        KEY_MAX_Y => fields.extents.max_y = parse_signed(key, value)?,
        KEY_MIN_Y => fields.extents.min_y = parse_signed(key, value)?,
        KEY_END_X => fields.end_point.0 = parse_signed(key, value)?,
        KEY_END_Y => fields.end_point.1 = parse_signed(key, value)?,
        KEY_PREV_END_X => fields.previous_end_point.0 = parse_signed(key, value)?,
        KEY_PREV_END_Y => fields.previous_end_point.1 = parse_signed(key, value)?,
        KEY_PREVIOUS_FILE => fields.previous_file = parse_previous_file(value),
        KEY_THREAD => fields.threads.push(parse_thread(value)?),
        KEY_NEEDLES => fields.needles = Some(parse_needles(value)?),
        _ if !is_valid_extra_key(key) => {
            log::warn!("Skipping header field with unusable key '{}'", key);
        }
        _ => {
            fields.extras.insert(key.to_string(), value.to_string());
        }
    }
    Ok(())
}

/// Maps each byte to the `char` with the same value.
fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

fn is_blank(segment: &[u8]) -> bool {
    segment
        .iter()
        .all(|&b| b == HEADER_PAD || b == b'\n' || b == 0)
}

/// Strips the space/NUL padding and keeps at most `LABEL_WIDTH` characters.
fn parse_label(value: &str) -> String {
    let label = value.trim_end_matches([' ', '\0']);
    if label.chars().count() > LABEL_WIDTH {
        log::warn!(
            "Label '{}' is longer than {} characters; truncating",
            label,
            LABEL_WIDTH
        );
        return label.chars().take(LABEL_WIDTH).collect();
    }
    label.to_string()
}

fn parse_previous_file(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.chars().count() > PREVIOUS_FILE_WIDTH {
        log::warn!("Ignoring over-long previous file name '{}'", trimmed);
        return NO_PREVIOUS_FILE.to_string();
    }
    trimmed.to_string()
}

/// Parses values like `"   12"`, `"+  340"` or `"-   7"`.
fn parse_signed(key: &str, value: &str) -> Result<i32, HeaderError> {
    let trimmed = value.trim();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'+') => (false, trimmed[1..].trim_start()),
        Some(b'-') => (true, trimmed[1..].trim_start()),
        _ => (false, trimmed),
    };
    if digits.is_empty() {
        return Ok(0);
    }
    let magnitude: i32 = digits.parse().map_err(|_| {
        HeaderError::Malformed(format!("invalid number '{}' in field {}", value, key))
    })?;
    Ok(if negative { -magnitude } else { magnitude })
}

fn parse_unsigned(key: &str, value: &str) -> Result<u32, HeaderError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    trimmed.parse().map_err(|_| {
        HeaderError::Malformed(format!("invalid number '{}' in field {}", value, key))
    })
}

/// `#RRGGBB,description,catalog` with both trailing parts optional.
fn parse_thread(value: &str) -> Result<ThreadSpec, HeaderError> {
    let mut parts = value.splitn(3, ',');
    let color = parts.next().unwrap_or_default();
    let mut thread = ThreadSpec::from_hex(color)?;
    if let Some(description) = parts.next() {
        thread = thread.with_description(description.trim());
    }
    if let Some(catalog) = parts.next() {
        thread = thread.with_catalog_number(catalog.trim());
    }
    Ok(thread)
}

/// Expands the needle table. Comma-separated tokens, one or more blocks each:
///
/// - empty: one unassigned block
/// - `*K`: `K` unassigned blocks
/// - `N`: needle `N`
/// - `N*K`: needle `N` for `K` blocks
/// - `A-B`: needles `A, A+1, ..., B`
fn parse_needles(value: &str) -> Result<Vec<Option<u32>>, HeaderError> {
    let mut needles = Vec::new();
    for token in value.split(',') {
        let token = token.trim();
        let (run, count) = if token.is_empty() {
            (NeedleRun::Repeat(None), 1)
        } else if let Some(count) = token.strip_prefix('*') {
            (NeedleRun::Repeat(None), parse_run_length(token, count)?)
        } else if let Some((needle, count)) = token.split_once('*') {
            let needle = parse_needle(token, needle)?;
            (NeedleRun::Repeat(Some(needle)), parse_run_length(token, count)?)
        } else if let Some((first, last)) = token.split_once('-') {
            let first = parse_needle(token, first)?;
            let last = parse_needle(token, last)?;
            if last < first {
                return Err(malformed_needle(token));
            }
            (NeedleRun::Ascending(first), (last - first) as usize + 1)
        } else {
            (NeedleRun::Repeat(Some(parse_needle(token, token)?)), 1)
        };

        if count > MAX_NEEDLE_TABLE_ENTRIES - needles.len() {
            return Err(HeaderError::Malformed(format!(
                "needle table expands past {} entries",
                MAX_NEEDLE_TABLE_ENTRIES
            )));
        }
        match run {
            NeedleRun::Repeat(needle) => needles.extend(std::iter::repeat(needle).take(count)),
            NeedleRun::Ascending(first) => needles.extend((0..count as u32).map(|i| Some(first + i))),
        }
    }
    Ok(needles)
}

enum NeedleRun {
    Repeat(Option<u32>),
    Ascending(u32),
}

fn parse_needle(token: &str, text: &str) -> Result<u32, HeaderError> {
    match text.trim().parse::<u32>() {
        Ok(0) | Err(_) => Err(malformed_needle(token)),
        Ok(n) => Ok(n),
    }
}

fn parse_run_length(token: &str, text: &str) -> Result<usize, HeaderError> {
    match text.trim().parse::<usize>() {
        Ok(0) | Err(_) => Err(malformed_needle(token)),
        Ok(n) => Ok(n),
    }
}

fn malformed_needle(token: &str) -> HeaderError {
    HeaderError::Malformed(format!("invalid needle '{}' in field {}", token, KEY_NEEDLES))
}

//==================================================================================
// 3. Encoding
//==================================================================================

/// Serializes `fields` into a full header block.
///
/// Values that do not fit their fixed width are an error rather than being cut.
pub fn encode_header(fields: &HeaderFields) -> Result<[u8; HEADER_SIZE], HeaderError> {
    let mut text: Vec<u8> = Vec::with_capacity(HEADER_SIZE);

    check_text(KEY_LABEL, &fields.label)?;
    if fields.label.chars().count() > LABEL_WIDTH {
        return Err(overflow(KEY_LABEL, LABEL_WIDTH, &fields.label));
    }
    push_field(&mut text, KEY_LABEL, &format!("{:<width$}", fields.label, width = LABEL_WIDTH));
    push_field(
        &mut text,
        KEY_STITCH_COUNT,
        &fixed_unsigned(KEY_STITCH_COUNT, fields.stitch_count, STITCH_COUNT_WIDTH)?,
    );
    push_field(
        &mut text,
        KEY_COLOR_COUNT,
        &fixed_unsigned(KEY_COLOR_COUNT, fields.color_count, COLOR_COUNT_WIDTH)?,
    );

    let extents = [
        (KEY_MAX_X, fields.extents.max_x),
        (KEY_MIN_X, fields.extents.min_x),
        (KEY_MAX_Y, fields.extents.max_y),
        (KEY_MIN_Y, fields.extents.min_y),
    ];
    for (key, value) in extents {
        let magnitude = value.unsigned_abs();
        push_field(&mut text, key, &fixed_unsigned(key, magnitude, EXTENT_WIDTH)?);
    }

    let points = [
        (KEY_END_X, fields.end_point.0),
        (KEY_END_Y, fields.end_point.1),
        (KEY_PREV_END_X, fields.previous_end_point.0),
        (KEY_PREV_END_Y, fields.previous_end_point.1),
    ];
    for (key, value) in points {
        push_field(&mut text, key, &fixed_signed(key, value, EXTENT_WIDTH)?);
    }

    check_text(KEY_PREVIOUS_FILE, &fields.previous_file)?;
    if fields.previous_file.chars().count() > PREVIOUS_FILE_WIDTH {
        return Err(overflow(
            KEY_PREVIOUS_FILE,
            PREVIOUS_FILE_WIDTH,
            &fields.previous_file,
        ));
    }
    push_field(
        &mut text,
        KEY_PREVIOUS_FILE,
        &format!("{:>width$}", fields.previous_file, width = PREVIOUS_FILE_WIDTH),
    );

    // --- Extended header ---
    for (key, value) in &fields.extras {
        if !is_valid_extra_key(key) {
            return Err(HeaderError::ReservedKey(key.clone()));
        }
        check_text(key, value)?;
        push_field(&mut text, key, value);
    }

    for thread in &fields.threads {
        push_field(&mut text, KEY_THREAD, &format_thread(thread)?);
    }

    if let Some(needles) = &fields.needles {
        push_field(&mut text, KEY_NEEDLES, &format_needles(needles));
    }

    // Text plus the end-of-text byte must fit in the block.
    if text.len() + 1 > HEADER_SIZE {
        return Err(HeaderError::FieldOverflow {
            field: HEADER_CAPACITY_FIELD.to_string(),
            width: HEADER_SIZE - 1,
            value: format!("{} bytes of header text", text.len()),
        });
    }

    let mut block = [HEADER_PAD; HEADER_SIZE];
    block[..text.len()].copy_from_slice(&text);
    block[text.len()] = HEADER_TEXT_END;
    Ok(block)
}

/// Appends `KEY:value\r`. Values have already passed `check_text`, so every
/// char is a single Latin-1 byte.
fn push_field(text: &mut Vec<u8>, key: &str, value: &str) {
    text.extend_from_slice(key.as_bytes());
    text.push(KEY_SEPARATOR);
    text.extend(value.chars().filter_map(|c| u8::try_from(c).ok()));
    text.push(FIELD_TERMINATOR);
}

fn overflow(key: &str, width: usize, value: &str) -> HeaderError {
    HeaderError::FieldOverflow {
        field: key.to_string(),
        width,
        value: value.to_string(),
    }
}

fn fixed_unsigned(key: &str, value: u32, width: usize) -> Result<String, HeaderError> {
    let rendered = format!("{:>width$}", value, width = width);
    if rendered.len() > width {
        return Err(overflow(key, width, &rendered));
    }
    Ok(rendered)
}

/// Sign character followed by a right-aligned magnitude, e.g. `+  340`.
fn fixed_signed(key: &str, value: i32, width: usize) -> Result<String, HeaderError> {
    let sign = if value < 0 { '-' } else { '+' };
    let magnitude = fixed_unsigned(key, value.unsigned_abs(), width)?;
    Ok(format!("{}{}", sign, magnitude))
}

/// The catalog number is the last part of the line, so only the description
/// has to stay comma-free.
fn format_thread(thread: &ThreadSpec) -> Result<String, HeaderError> {
    let description = thread.description.as_deref().unwrap_or_default();
    let catalog = thread.catalog_number.as_deref().unwrap_or_default();
    check_text(KEY_THREAD, description)?;
    check_text(KEY_THREAD, catalog)?;
    if description.contains(',') {
        return Err(HeaderError::InvalidText {
            field: KEY_THREAD.to_string(),
            reason: format!("'{}' contains a comma", description),
        });
    }
    Ok(format!("{},{},{}", thread.hex(), description, catalog))
}

/// Inverse of `parse_needles`, folding repeats and ascending runs so that
/// sequential assignments stay a single short token.
fn format_needles(needles: &[Option<u32>]) -> String {
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < needles.len() {
        let current = needles[i];
        let repeat = needles[i..].iter().take_while(|&&n| n == current).count();
        match current {
            None if repeat > 1 => tokens.push(format!("*{}", repeat)),
            None => tokens.push(String::new()),
            Some(n) if repeat > 1 => tokens.push(format!("{}*{}", n, repeat)),
            Some(n) => {
                let ascending = ascending_run(&needles[i..], n);
                if ascending > 2 {
                    tokens.push(format!("{}-{}", n, n + (ascending as u32 - 1)));
                    i += ascending;
                    continue;
                }
                tokens.push(n.to_string());
            }
        }
        i += repeat;
    }
    tokens.join(",")
}

/// Length of the `first, first+1, ...` run at the start of `needles`.
fn ascending_run(needles: &[Option<u32>], first: u32) -> usize {
    let mut expected = Some(first);
    needles
        .iter()
        .take_while(|&&n| {
            let hit = n.is_some() && n == expected;
            expected = expected.and_then(|e| e.checked_add(1));
            hit
        })
        .count()
}

/// Rejects anything that would break field framing or cannot be stored as a
/// single Latin-1 byte.
fn check_text(key: &str, value: &str) -> Result<(), HeaderError> {
    if let Some(c) = value.chars().find(|&c| {
        c == char::from(FIELD_TERMINATOR)
            || c == char::from(HEADER_TEXT_END)
            || u8::try_from(c).is_err()
    }) {
        return Err(HeaderError::InvalidText {
            field: key.to_string(),
            reason: format!("character {:?} cannot be stored in a header field", c),
        });
    }
    Ok(())
}

fn is_valid_extra_key(key: &str) -> bool {
    key.len() == 2
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'-')
        && !RESERVED_KEYS.contains(&key)
}
