//! Foreign-function surfaces. Compiled only with the `python` feature.

pub mod python;

pub use python::{dst_info_py, enable_verbose_logging_py, set_needles_py};
