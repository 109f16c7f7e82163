//! Pure, stateless kernels for the two binary layers of a DST file: the fixed
//! ASCII header block and the 3-byte stitch records that follow it.
//!
//! Nothing in here performs I/O or holds state; the lookup tables are `const`
//! data shared freely across threads.

pub mod header;
pub mod record;

pub use header::{decode_header, encode_header, HeaderFields};
pub use record::{decode_record, encode_record};
