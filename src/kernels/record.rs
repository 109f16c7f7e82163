//! This module contains the pure, stateless kernels for encoding and decoding
//! single 3-byte DST stitch records.
//!
//! Each axis is stored as a balanced-ternary sum: five weights (1, 3, 9, 27, 81),
//! each with a "plus" bit and a "minus" bit scattered across the three bytes.
//! The third byte also carries the control pattern that selects the command kind.
//! The bit tables below are the published Tajima layout and must not change.

use crate::bridge::format::{
    CONTROL_COLOR_CHANGE, CONTROL_END, CONTROL_JUMP, CONTROL_STITCH, END_RECORD, MASK_END,
    MASK_KIND, MAX_RECORD_DELTA, RECORD_SIZE,
};
use crate::error::CodecError;
use crate::types::{CommandKind, StitchCommand};

//==================================================================================
// 1. Canonical Bit Tables
//==================================================================================

/// One weighted motion bit pair: `(weight, (byte, bit) for +weight, (byte, bit) for -weight)`.
type WeightBits = (i32, (usize, u8), (usize, u8));

/// X-axis layout, largest weight first (the order the encoder consumes it).
const X_BITS: [WeightBits; 5] = [
    (81, (2, 2), (2, 3)),
    (27, (1, 2), (1, 3)),
    (9, (0, 2), (0, 3)),
    (3, (1, 0), (1, 1)),
    (1, (0, 0), (0, 1)),
];

/// Y-axis layout, largest weight first.
const Y_BITS: [WeightBits; 5] = [
    (81, (2, 5), (2, 4)),
    (27, (1, 5), (1, 4)),
    (9, (0, 5), (0, 4)),
    (3, (1, 7), (1, 6)),
    (1, (0, 7), (0, 6)),
];

#[inline]
fn bit_set(record: &[u8; RECORD_SIZE], (byte, bit): (usize, u8)) -> bool {
    record[byte] & (1 << bit) != 0
}

#[inline]
fn set_bit(record: &mut [u8; RECORD_SIZE], (byte, bit): (usize, u8)) {
    record[byte] |= 1 << bit;
}

fn decode_axis(record: &[u8; RECORD_SIZE], table: &[WeightBits; 5]) -> i32 {
    table.iter().fold(0, |acc, &(weight, plus, minus)| {
        let mut value = acc;
        if bit_set(record, plus) {
            value += weight;
        }
        if bit_set(record, minus) {
            value -= weight;
        }
        value
    })
}

/// Greedy balanced-ternary cascade. A value in `[-121, 121]` always reduces to 0.
fn encode_axis(mut value: i32, record: &mut [u8; RECORD_SIZE], table: &[WeightBits; 5]) {
    for &(weight, plus, minus) in table {
        // Half the remaining range below this weight: 40, 13, 4, 1, 0.
        let threshold = weight / 2;
        if value > threshold {
            set_bit(record, plus);
            value -= weight;
        } else if value < -threshold {
            set_bit(record, minus);
            value += weight;
        }
    }
    debug_assert_eq!(value, 0);
}

//==================================================================================
// 2. Control Byte Classification
//==================================================================================

/// Classifies the third byte of a record into a command kind.
pub fn classify_control(b2: u8) -> Result<CommandKind, CodecError> {
    if b2 & MASK_END == CONTROL_END {
        return Ok(CommandKind::End);
    }
    match b2 & MASK_KIND {
        CONTROL_COLOR_CHANGE => Ok(CommandKind::ColorChange),
        CONTROL_JUMP => Ok(CommandKind::Jump),
        CONTROL_STITCH => Ok(CommandKind::Stitch),
        // Low bits not `11`, or the sequin-mode pattern (bit 6 without bit 7).
        _ => Err(CodecError::UnknownControlByte(b2)),
    }
}

/// The control byte an encoder writes for a given kind, before motion bits.
pub fn control_byte(kind: CommandKind) -> u8 {
    match kind {
        CommandKind::Stitch => CONTROL_STITCH,
        CommandKind::Jump => CONTROL_JUMP,
        CommandKind::ColorChange => CONTROL_COLOR_CHANGE,
        CommandKind::End => CONTROL_END,
    }
}

//==================================================================================
// 3. Public API for Single-Record Operations
//==================================================================================

/// Decodes one 3-byte record into a typed command.
///
/// A decoded `ColorChange` never carries a needle: needle annotations live in
/// the header's needle table, not in the record bits.
pub fn decode_record(record: [u8; RECORD_SIZE]) -> Result<StitchCommand, CodecError> {
    let kind = classify_control(record[2])?;
    if kind == CommandKind::End {
        return Ok(StitchCommand::End);
    }

    let dx = decode_axis(&record, &X_BITS);
    let dy = decode_axis(&record, &Y_BITS);

    Ok(match kind {
        CommandKind::Stitch => StitchCommand::Stitch { dx, dy },
        CommandKind::Jump => StitchCommand::Jump { dx, dy },
        CommandKind::ColorChange => StitchCommand::ColorChange {
            dx,
            dy,
            needle: None,
        },
        CommandKind::End => StitchCommand::End,
    })
}

/// Encodes one command into its 3-byte record.
///
/// Fails with `MotionOutOfRange` if either delta exceeds what a single record
/// can hold; long moves must be chained by the caller (see `Pattern::stitch`).
pub fn encode_record(command: &StitchCommand) -> Result<[u8; RECORD_SIZE], CodecError> {
    if command.is_end() {
        return Ok(END_RECORD);
    }

    let (dx, dy) = command.delta();
    if !fits_in_record(dx, dy) {
        return Err(CodecError::MotionOutOfRange {
            dx,
            dy,
            limit: MAX_RECORD_DELTA,
        });
    }

    let mut record = [0u8, 0u8, control_byte(command.kind())];
    encode_axis(dx, &mut record, &X_BITS);
    encode_axis(dy, &mut record, &Y_BITS);
    Ok(record)
}

/// Returns `true` if `(dx, dy)` can be stored in one record.
#[inline]
pub fn fits_in_record(dx: i32, dy: i32) -> bool {
    dx.abs() <= MAX_RECORD_DELTA && dy.abs() <= MAX_RECORD_DELTA
}

//==================================================================================
// 4. Public API for Stream Operations
//==================================================================================

/// Encodes a whole command slice, appending records to `output_buf`.
pub fn encode(commands: &[StitchCommand], output_buf: &mut Vec<u8>) -> Result<(), CodecError> {
    output_buf.reserve(commands.len() * RECORD_SIZE);
    for command in commands {
        output_buf.extend_from_slice(&encode_record(command)?);
    }
    Ok(())
}

//==================================================================================
// 5. Unit Tests
//==================================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_golden_stitch_plus_one_x() {
        assert_eq!(
            decode_record([0x01, 0x00, 0x03]).unwrap(),
            StitchCommand::stitch(1, 0)
        );
        assert_eq!(
            encode_record(&StitchCommand::stitch(1, 0)).unwrap(),
            [0x01, 0x00, 0x03]
        );
    }

    #[test]
    fn test_golden_end_record() {
        assert_eq!(decode_record([0x00, 0x00, 0xF3]).unwrap(), StitchCommand::End);
        assert_eq!(encode_record(&StitchCommand::End).unwrap(), [0x00, 0x00, 0xF3]);
    }

    #[test]
    fn test_golden_kinds_with_zero_motion() {
        assert_eq!(
            decode_record([0x00, 0x00, 0x83]).unwrap(),
            StitchCommand::jump(0, 0)
        );
        assert_eq!(
            decode_record([0x00, 0x00, 0xC3]).unwrap(),
            StitchCommand::color_change()
        );
        assert_eq!(
            decode_record([0x00, 0x00, 0x03]).unwrap(),
            StitchCommand::stitch(0, 0)
        );
    }

    #[test]
    fn test_golden_single_weights() {
        // +1 Y is bit 7 of b0; -1 Y is bit 6 of b0.
        assert_eq!(decode_record([0x80, 0x00, 0x03]).unwrap(), StitchCommand::stitch(0, 1));
        assert_eq!(decode_record([0x40, 0x00, 0x03]).unwrap(), StitchCommand::stitch(0, -1));
        // +81 X is bit 2 of b2; -81 Y is bit 4 of b2.
        assert_eq!(decode_record([0x00, 0x00, 0x07]).unwrap(), StitchCommand::stitch(81, 0));
        assert_eq!(decode_record([0x00, 0x00, 0x13]).unwrap(), StitchCommand::stitch(0, -81));
        // +3 X is bit 0 of b1, +27 Y is bit 5 of b1.
        assert_eq!(decode_record([0x00, 0x21, 0x03]).unwrap(), StitchCommand::stitch(3, 27));
    }

    #[test]
    fn test_extreme_values() {
        let max = encode_record(&StitchCommand::jump(121, -121)).unwrap();
        // x: 81+27+9+3+1 -> b2.2, b1.2, b0.2, b1.0, b0.0
        // y: -(81+27+9+3+1) -> b2.4, b1.4, b0.4, b1.6, b0.6
        assert_eq!(max, [0b0101_0101, 0b0101_0101, 0b1001_0111]);
        assert_eq!(decode_record(max).unwrap(), StitchCommand::jump(121, -121));
    }

    #[test]
    fn test_every_in_range_delta_roundtrips() {
        for dx in -MAX_RECORD_DELTA..=MAX_RECORD_DELTA {
            let cmd = StitchCommand::stitch(dx, -dx / 2);
            let bytes = encode_record(&cmd).unwrap();
            assert_eq!(decode_record(bytes).unwrap(), cmd, "dx = {}", dx);
        }
    }

    #[test]
    fn test_color_change_with_motion_is_not_end() {
        // +81 Y sets bit 5 of b2; combined with 0xC3 it must stay a color change.
        let cmd = StitchCommand::ColorChange {
            dx: 0,
            dy: 81,
            needle: None,
        };
        let bytes = encode_record(&cmd).unwrap();
        assert_eq!(bytes[2], 0xE3);
        assert_eq!(decode_record(bytes).unwrap(), cmd);
    }

    #[test]
    fn test_needle_is_not_encoded_in_record() {
        let annotated = StitchCommand::ColorChange {
            dx: 2,
            dy: 0,
            needle: Some(9),
        };
        let bytes = encode_record(&annotated).unwrap();
        assert_eq!(
            decode_record(bytes).unwrap(),
            StitchCommand::ColorChange {
                dx: 2,
                dy: 0,
                needle: None
            }
        );
    }

    #[test]
    fn test_unknown_control_bytes() {
        // Low bits not set.
        assert_eq!(
            decode_record([0x00, 0x00, 0x00]),
            Err(CodecError::UnknownControlByte(0x00))
        );
        assert_eq!(
            decode_record([0x00, 0x00, 0x82]),
            Err(CodecError::UnknownControlByte(0x82))
        );
        // Sequin mode is not a supported kind.
        assert_eq!(
            decode_record([0x00, 0x00, 0x43]),
            Err(CodecError::UnknownControlByte(0x43))
        );
    }

    #[test]
    fn test_out_of_range_motion() {
        let result = encode_record(&StitchCommand::stitch(122, 0));
        assert_eq!(
            result,
            Err(CodecError::MotionOutOfRange {
                dx: 122,
                dy: 0,
                limit: 121
            })
        );
    }

    #[test]
    fn test_stream_encode() {
        let mut buf = vec![0xAA];
        encode(
            &[StitchCommand::stitch(1, 0), StitchCommand::End],
            &mut buf,
        )
        .unwrap();
        assert_eq!(buf, vec![0xAA, 0x01, 0x00, 0x03, 0x00, 0x00, 0xF3]);
    }
}
