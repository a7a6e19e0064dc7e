//! Output formatting module

pub mod csv;
pub mod formatter;
pub mod json;
pub mod raw;

pub use formatter::{format_output, OutputFormat, OutputOptions};
