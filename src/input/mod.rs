//! Turning raw input sources into named tables of text fields

pub mod encoding;
pub mod format;
pub mod reader;

use encoding_rs::{Encoding, UTF_8};

pub use encoding::resolve_encoding;
pub use format::{parse_table, InputFormat, ParsedTable};
pub use reader::{read_lines, read_source};

/// How every source of one run is decoded and split.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Treat the first row as data and name columns `f1..fN`.
    pub no_header: bool,
    pub format: InputFormat,
    pub encoding: &'static Encoding,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            no_header: false,
            format: InputFormat::Aligned,
            encoding: UTF_8,
        }
    }
}
