//! CSV output

use csv::{Terminator, WriterBuilder};

use crate::error::{QqError, Result};
use crate::store::Value;

pub fn format_csv(rows: &[Vec<Value>]) -> Result<String> {
    let mut writer = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .flexible(true)
        .from_writer(Vec::new());

    for row in rows {
        writer.write_record(row.iter().map(Value::to_string))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| QqError::IoError(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| QqError::ExecutionError(e.to_string()))
}
