pub mod error;
pub mod sink;
pub mod zipcodes;

pub use error::SinkError;
pub use sink::{read_records, ResultSink};
pub use zipcodes::{load_locations, write_zip_list};

/// UTF-8 byte-order mark written at the start of every result file.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Returns `bytes` without a leading UTF-8 byte-order mark.
#[must_use]
pub fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
}
