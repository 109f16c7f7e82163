// In: src/ffi/python.rs

use pyo3::prelude::*;
use pyo3::types::PyBytes;

use crate::bridge::stateless_api;
use crate::config::NeedleworkConfig;
use crate::error::NeedleworkError;
use crate::observability::enable_logging;
use crate::remap::RemapPolicy;

//==================================================================================
// I. Stateless DST API
//==================================================================================

/// Summarizes a DST file as a JSON string:
/// `{"stitches", "thread_count", "thread_colors", ...}`.
#[pyfunction]
#[pyo3(name = "dst_info")]
pub fn dst_info_py(py: Python, data: &[u8]) -> PyResult<String> {
    let info = py
        .allow_threads(move || stateless_api::inspect(data))
        .map_err(NeedleworkError::from)?;
    Ok(serde_json::to_string(&info).map_err(NeedleworkError::from)?)
}

/// Assigns needles to every color change and returns `(summary_json, new_file_bytes)`.
///
/// With `needles=None` the needles are numbered sequentially from 1; otherwise
/// the list is consumed in stitch order and must cover every color change.
/// `config_json` accepts the same document as `NeedleworkConfig::from_json_str`.
#[pyfunction]
#[pyo3(
    name = "set_needles",
    signature = (data, needles = None, needle_at_start = false, config_json = None)
)]
pub fn set_needles_py(
    py: Python,
    data: &[u8],
    needles: Option<Vec<u32>>,
    needle_at_start: bool,
    config_json: Option<String>,
) -> PyResult<(String, Py<PyBytes>)> {
    // 1. Build the configuration and the policy from the keyword arguments.
    let mut config = match config_json {
        Some(json) => NeedleworkConfig::from_json_str(&json)?,
        None => NeedleworkConfig::default(),
    };
    config.remap.needle_at_start |= needle_at_start;

    let policy = match needles {
        Some(list) => RemapPolicy::Explicit(list),
        None => RemapPolicy::Sequential,
    };

    // 2. Run the pure pipeline without holding the GIL.
    let outcome = py.allow_threads(move || stateless_api::process(data, &policy, &config))?;

    // 3. Shape the response the way the upload endpoint reports it.
    let summary = serde_json::json!({
        "dst_info": outcome.info,
        "used_needles": outcome.report.used_needles(),
        "assignments": outcome.report.assignments,
    });
    Ok((
        summary.to_string(),
        PyBytes::new_bound(py, &outcome.bytes).unbind(),
    ))
}

//==================================================================================
// II. Logging
//==================================================================================

/// Routes the crate's `log` output to stderr, or appends it to `log_file`.
///
/// The logger can only be installed once per process; asking for a log file
/// after that raises instead of creating a file nothing will write to.
#[pyfunction]
#[pyo3(name = "enable_verbose_logging", signature = (log_file = None, debug = false))]
pub fn enable_verbose_logging_py(log_file: Option<String>, debug: bool) -> PyResult<()> {
    Ok(enable_logging(log_file.as_deref(), debug)?)
}
