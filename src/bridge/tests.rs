use super::*;
use crate::bridge::format::{END_RECORD, HEADER_SIZE, HEADER_TEXT_END, RECORD_SIZE};
use crate::config::{RemapConfig, WriterConfig};
use crate::error::{CodecError, WriteError};
use crate::pattern::Pattern;
use crate::remap::{remap, remap_with_config, RemapPolicy};
use crate::types::{StitchCommand, ThreadSpec};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A small three-color design with a long jump and vendor extras.
fn create_three_color_pattern() -> Pattern {
    let mut pattern = Pattern::with_label("tulip");
    pattern
        .add_thread(
            ThreadSpec::rgb(220, 20, 60)
                .with_description("Crimson")
                .with_catalog_number("1147"),
        )
        .add_thread(ThreadSpec::rgb(34, 139, 34).with_description("Forest"))
        .add_thread(ThreadSpec::rgb(255, 215, 0));
    pattern
        .header_extras
        .insert("AU".to_string(), "Studio".to_string());
    pattern
        .stitch(10, 10)
        .stitch(-3, 7)
        .color_change()
        .jump(350, -40)
        .stitch(5, 5)
        .color_change()
        .stitch(-121, 121)
        .end();
    pattern
}

/// Builds a random but valid pattern: per-record deltas in range, a few
/// color changes, exactly one trailing END.
fn create_random_pattern(rng: &mut StdRng, len: usize) -> Pattern {
    let mut pattern = Pattern::with_label("random");
    for _ in 0..len {
        let dx = rng.random_range(-121..=121);
        let dy = rng.random_range(-121..=121);
        let roll = rng.random_range(0..20);
        let command = match roll {
            0 => StitchCommand::ColorChange {
                dx,
                dy,
                needle: None,
            },
            1..=3 => StitchCommand::jump(dx, dy),
            _ => StitchCommand::stitch(dx / 4, dy / 4),
        };
        pattern.push(command);
    }
    pattern.end();
    pattern
}

#[test]
fn test_roundtrip_preserves_commands_and_threads() {
    init_logger();
    let pattern = create_three_color_pattern();

    let bytes = encode(&pattern).unwrap();
    let decoded = decode(&bytes).unwrap();

    assert_eq!(decoded.stitches, pattern.stitches);
    assert_eq!(decoded.threads, pattern.threads);
    assert_eq!(decoded.header_extras, pattern.header_extras);
    assert_eq!(decoded.label, pattern.label);
    assert_eq!(decoded, pattern);
}

#[test]
fn test_roundtrip_preserves_needle_annotations() {
    init_logger();
    let mut pattern = create_three_color_pattern();
    let config = RemapConfig {
        needle_at_start: true,
        ..RemapConfig::default()
    };
    remap_with_config(&mut pattern, &RemapPolicy::Explicit(vec![4, 9, 2]), &config).unwrap();

    let decoded = decode(&encode(&pattern).unwrap()).unwrap();

    assert_eq!(decoded.stitches, pattern.stitches);
    assert_eq!(decoded.needles(), vec![Some(9), Some(2)]);
    assert_eq!(decoded.initial_needle, Some(4));
}

#[test]
fn test_randomized_roundtrip() {
    init_logger();
    let mut rng = StdRng::seed_from_u64(0x5EED);
    for len in [0usize, 1, 7, 40, 120, 2_000] {
        let mut pattern = create_random_pattern(&mut rng, len);
        remap(&mut pattern, &RemapPolicy::Sequential).unwrap();
        let decoded = decode(&encode(&pattern).unwrap()).unwrap();
        assert_eq!(decoded.stitches, pattern.stitches, "len = {}", len);
    }
}

#[test]
fn test_reencoding_is_byte_identical() {
    let bytes = encode(&create_three_color_pattern()).unwrap();
    let again = encode(&decode(&bytes).unwrap()).unwrap();
    assert_eq!(bytes, again);
}

#[test]
fn test_file_layout() {
    let bytes = encode(&create_three_color_pattern()).unwrap();

    assert_eq!((bytes.len() - HEADER_SIZE) % RECORD_SIZE, 0);
    assert!(bytes[..HEADER_SIZE].starts_with(b"LA:tulip           \rST:     10\rCO:  2\r"));
    assert!(bytes[..HEADER_SIZE].contains(&HEADER_TEXT_END));
    assert_eq!(&bytes[bytes.len() - RECORD_SIZE..], &END_RECORD);
    // First record: stitch (10, 10).
    let first = &bytes[HEADER_SIZE..HEADER_SIZE + RECORD_SIZE];
    assert_eq!(
        crate::kernels::decode_record([first[0], first[1], first[2]]).unwrap(),
        StitchCommand::stitch(10, 10)
    );
}

#[test]
fn test_unannotated_file_has_no_needle_table() {
    let bytes = encode(&create_three_color_pattern()).unwrap();
    let header = String::from_utf8_lossy(&bytes[..HEADER_SIZE]).into_owned();
    assert!(!header.contains("ND:"));
    assert!(header.contains("TC:#DC143C,Crimson,1147\r"));
    assert!(header.contains("AU:Studio\r"));
}

#[test]
fn test_plain_header_drops_extended_fields() {
    let pattern = create_three_color_pattern();
    let config = WriterConfig {
        extended_header: false,
        ..WriterConfig::default()
    };
    let decoded = decode(&encode_with_config(&pattern, &config).unwrap()).unwrap();
    assert_eq!(decoded.stitches, pattern.stitches);
    assert!(decoded.threads.is_empty());
    assert!(decoded.header_extras.is_empty());
}

#[test]
fn test_terminal_invariant_through_facade() {
    let mut pattern = create_three_color_pattern();
    pattern.stitches.pop();
    assert_eq!(encode(&pattern), Err(WriteError::MissingEnd));
    pattern.end();
    assert!(encode(&pattern).is_ok());
}

#[test]
fn test_corrupt_control_byte_in_file() {
    let mut bytes = encode(&create_three_color_pattern()).unwrap();
    bytes[HEADER_SIZE + 2] = 0x00;
    assert_eq!(decode(&bytes), Err(CodecError::UnknownControlByte(0x00)));
}

#[test]
fn test_truncated_file_is_missing_end() {
    let bytes = encode(&create_three_color_pattern()).unwrap();
    let cut = &bytes[..bytes.len() - RECORD_SIZE];
    assert_eq!(decode(cut), Err(CodecError::MissingEnd));
}

#[test]
fn test_sequential_remap_of_many_color_changes_roundtrips() {
    init_logger();
    let mut pattern = create_three_color_pattern();
    pattern.stitches.pop();
    for _ in 0..250 {
        pattern.stitch(1, 0).color_change();
    }
    pattern.end();
    assert!(encode(&pattern).is_ok());

    remap(&mut pattern, &RemapPolicy::Sequential).unwrap();
    let decoded = decode(&encode(&pattern).unwrap()).unwrap();

    assert_eq!(decoded.stitches, pattern.stitches);
    assert_eq!(decoded.needles(), (1..=252u32).map(Some).collect::<Vec<_>>());
    assert_eq!(decoded.threads, pattern.threads);
}

#[test]
fn test_latin1_label_from_another_tool_reencodes() {
    let mut bytes = encode(&create_three_color_pattern()).unwrap();
    // "LA:tulip" -> "LA:\xE9ulip"
    bytes[3] = 0xE9;

    let decoded = decode(&bytes).unwrap();
    assert_eq!(decoded.label, "\u{e9}ulip");

    let again = encode(&decoded).unwrap();
    assert_eq!(again, bytes);
}
