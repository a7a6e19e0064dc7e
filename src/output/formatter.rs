//! Output formatting

use crate::engine::ResultSet;
use crate::error::Result;
use crate::output::csv::format_csv;
use crate::output::json::format_json;
use crate::output::raw::format_raw;
use crate::store::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
    Raw,
}

/// How query results are written.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    pub format: OutputFormat,
    /// Emit the column names as the first row.
    pub out_header: bool,
}

pub fn format_output(result: &ResultSet, options: &OutputOptions) -> Result<String> {
    let rows = records(result, options.out_header);
    match options.format {
        OutputFormat::Csv => format_csv(&rows),
        OutputFormat::Json => format_json(&rows),
        OutputFormat::Raw => Ok(format_raw(&rows)),
    }
}

/// Result rows, preceded by the column names when `out_header` is set.
fn records(result: &ResultSet, out_header: bool) -> Vec<Vec<Value>> {
    let header = out_header.then(|| {
        result
            .columns
            .iter()
            .map(|name| Value::Text(name.clone()))
            .collect()
    });
    header.into_iter().chain(result.rows.iter().cloned()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result() -> ResultSet {
        ResultSet {
            columns: vec!["PID".to_string(), "CMD".to_string()],
            rows: vec![
                vec![Value::Integer(1), Value::Text("init, sbin".to_string())],
                vec![Value::Real(2.0), Value::Null],
            ],
        }
    }

    fn render(format: OutputFormat, out_header: bool) -> String {
        format_output(&result(), &OutputOptions { format, out_header }).unwrap()
    }

    #[test]
    fn test_csv() {
        assert_eq!(render(OutputFormat::Csv, false), "1,\"init, sbin\"\n2.0,\n");
    }

    #[test]
    fn test_csv_with_header() {
        assert_eq!(
            render(OutputFormat::Csv, true),
            "PID,CMD\n1,\"init, sbin\"\n2.0,\n"
        );
    }

    #[test]
    fn test_json() {
        assert_eq!(
            render(OutputFormat::Json, true),
            "[[\"PID\",\"CMD\"],[\"1\",\"init, sbin\"],[\"2.0\",null]]\n"
        );
    }

    #[test]
    fn test_raw() {
        assert_eq!(render(OutputFormat::Raw, false), "1\tinit, sbin\n2.0\t\n");
    }

    #[test]
    fn test_empty_result() {
        let empty = ResultSet {
            columns: vec!["a".to_string()],
            rows: Vec::new(),
        };
        let csv = OutputOptions::default();
        assert_eq!(format_output(&empty, &csv).unwrap(), "");
        let json = OutputOptions {
            format: OutputFormat::Json,
            out_header: false,
        };
        assert_eq!(format_output(&empty, &json).unwrap(), "[]\n");
    }
}
