// In: src/bridge/stateless_api.rs

use crate::bridge::{reader, writer};
use crate::config::{NeedleworkConfig, WriterConfig};
use crate::error::{CodecError, NeedleworkError, WriteError};
use crate::pattern::{Pattern, PatternInfo};
use crate::remap::{remap_with_config, RemapPolicy, RemapReport};

/// Decodes DST bytes into a `Pattern`.
pub fn decode(bytes: &[u8]) -> Result<Pattern, CodecError> {
    reader::read(bytes)
}

/// Encodes a `Pattern` into DST bytes with the default writer settings.
pub fn encode(pattern: &Pattern) -> Result<Vec<u8>, WriteError> {
    writer::write(pattern)
}

/// Encodes a `Pattern` into DST bytes with explicit writer settings.
pub fn encode_with_config(pattern: &Pattern, config: &WriterConfig) -> Result<Vec<u8>, WriteError> {
    writer::write_with_config(pattern, config)
}

/// Summarizes a DST file without keeping the decoded pattern around.
pub fn inspect(bytes: &[u8]) -> Result<PatternInfo, CodecError> {
    Ok(reader::read(bytes)?.info())
}

/// Everything an upload handler needs after a decode + remap + write cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutcome {
    /// Summary of the file as uploaded.
    pub info: PatternInfo,
    pub report: RemapReport,
    /// The rewritten file.
    pub bytes: Vec<u8>,
}

/// Decodes `bytes`, assigns needles under `policy`, and writes the result.
pub fn process(
    bytes: &[u8],
    policy: &RemapPolicy,
    config: &NeedleworkConfig,
) -> Result<ProcessOutcome, NeedleworkError> {
    // 1. Decode and summarize the original upload.
    let mut pattern = decode(bytes)?;
    let info = pattern.info();

    // 2. Assign needles. A failure here leaves nothing half-written.
    let report = remap_with_config(&mut pattern, policy, &config.remap)?;

    // 3. Re-emit the file.
    let bytes = encode_with_config(&pattern, &config.writer)?;

    Ok(ProcessOutcome {
        info,
        report,
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RemapError;

    fn sample_file() -> Vec<u8> {
        let mut pattern = Pattern::with_label("upload");
        pattern
            .stitch(12, 3)
            .color_change()
            .stitch(-4, 9)
            .color_change()
            .jump(200, 0)
            .stitch(1, 1)
            .end();
        encode(&pattern).unwrap()
    }

    #[test]
    fn test_process_sequential() {
        let outcome = process(
            &sample_file(),
            &RemapPolicy::Sequential,
            &NeedleworkConfig::default(),
        )
        .unwrap();

        assert_eq!(outcome.info.color_changes, 2);
        assert_eq!(outcome.report.used_needles(), vec![1, 2]);

        let rewritten = decode(&outcome.bytes).unwrap();
        assert_eq!(rewritten.needles(), vec![Some(1), Some(2)]);
        assert_eq!(rewritten.label, "upload");
    }

    #[test]
    fn test_process_surfaces_remap_error() {
        let result = process(
            &sample_file(),
            &RemapPolicy::Explicit(vec![3]),
            &NeedleworkConfig::default(),
        );
        assert!(matches!(
            result,
            Err(NeedleworkError::Remap(RemapError::InsufficientNeedles { .. }))
        ));
    }

    #[test]
    fn test_process_surfaces_decode_error() {
        let result = process(&[0u8; 10], &RemapPolicy::Sequential, &NeedleworkConfig::default());
        assert!(matches!(result, Err(NeedleworkError::Codec(CodecError::Header(_)))));
    }

    #[test]
    fn test_inspect_counts_records() {
        let info = inspect(&sample_file()).unwrap();
        // The 200-unit jump is chained into two records.
        assert_eq!(info.stitches, 8);
        assert_eq!(info.needle_stitches, 3);
        assert_eq!(info.jumps, 2);
        assert_eq!(info.label, "upload");
    }
}
