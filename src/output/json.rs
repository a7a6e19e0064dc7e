//! JSON output formatting

use crate::error::Result;
use crate::store::Value;

/// One compact array of row arrays, newline terminated.
pub fn format_json(rows: &[Vec<Value>]) -> Result<String> {
    let mut out = serde_json::to_string(rows)?;
    out.push('\n');
    Ok(out)
}
