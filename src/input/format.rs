//! Input formats and the row matrices they produce

use std::collections::HashMap;

use regex::Regex;
use tracing::debug;

use crate::align::{align, AlignOptions};
use crate::error::Result;
use crate::input::reader::read_lines;

/// How the text of one source is split into fields.
#[derive(Debug, Clone, Default)]
pub enum InputFormat {
    /// Whitespace-aligned columns, as printed by `ps` or `df`.
    #[default]
    Aligned,
    Csv,
    Tsv,
    /// Labeled tab-separated values (`label:value<TAB>label:value`).
    Ltsv,
    /// Fields separated by every match of a regular expression.
    Pattern(Regex),
}

impl InputFormat {
    pub fn name(&self) -> &'static str {
        match self {
            InputFormat::Aligned => "aligned",
            InputFormat::Csv => "csv",
            InputFormat::Tsv => "tsv",
            InputFormat::Ltsv => "ltsv",
            InputFormat::Pattern(_) => "pattern",
        }
    }
}

/// Column labels plus data rows, every row as wide as `columns`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ParsedTable {
    /// Build a table from a raw matrix. Row 0 supplies the labels unless
    /// `no_header` is set, in which case columns are named `f1..fN`.
    ///
    /// Data rows shorter than the header are padded with empty fields and
    /// longer ones are cut to the header's width.
    pub fn from_matrix(mut matrix: Vec<Vec<String>>, no_header: bool) -> Option<Self> {
        if matrix.is_empty() {
            return None;
        }

        let columns = if no_header {
            (1..=matrix[0].len()).map(|i| format!("f{}", i)).collect()
        } else {
            matrix.remove(0)
        };

        let width = columns.len();
        for row in &mut matrix {
            row.resize(width, String::new());
        }

        Some(Self {
            columns,
            rows: matrix,
        })
    }
}

/// Parse decoded text into a table. Returns `None` for input without any
/// non-blank line.
pub fn parse_table(text: &str, format: &InputFormat, no_header: bool) -> Result<Option<ParsedTable>> {
    let table = match format {
        InputFormat::Aligned => {
            let lines = read_lines(text);
            let rows = align(
                &lines,
                &AlignOptions {
                    header_is_data_row: no_header,
                },
            );
            ParsedTable::from_matrix(rows, no_header)
        }
        InputFormat::Csv => ParsedTable::from_matrix(read_delimited(text, b',')?, no_header),
        InputFormat::Tsv => ParsedTable::from_matrix(read_delimited(text, b'\t')?, no_header),
        InputFormat::Pattern(re) => ParsedTable::from_matrix(split_lines(text, re), no_header),
        InputFormat::Ltsv => read_ltsv(text),
    };

    if let Some(ref t) = table {
        debug!(
            format = format.name(),
            columns = t.columns.len(),
            rows = t.rows.len(),
            "parsed input"
        );
    }

    Ok(table)
}

fn read_delimited(text: &str, delimiter: u8) -> Result<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(rows)
}

fn split_lines(text: &str, re: &Regex) -> Vec<Vec<String>> {
    read_lines(text)
        .iter()
        .map(|line| re.split(line).map(str::to_string).collect())
        .collect()
}

fn read_ltsv(text: &str) -> Option<ParsedTable> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut columns: Vec<String> = Vec::new();
    let mut rows: Vec<Vec<String>> = Vec::new();

    for line in read_lines(text) {
        let mut row = vec![String::new(); columns.len()];

        for item in line.split('\t').filter(|item| !item.is_empty()) {
            let (label, value) = item.split_once(':').unwrap_or((item, ""));
            let column = match index.get(label) {
                Some(&column) => column,
                None => {
                    columns.push(label.to_string());
                    index.insert(label.to_string(), columns.len() - 1);
                    columns.len() - 1
                }
            };
            if column >= row.len() {
                row.resize(column + 1, String::new());
            }
            row[column] = value.to_string();
        }

        rows.push(row);
    }

    if rows.is_empty() {
        return None;
    }

    for row in &mut rows {
        row.resize(columns.len(), String::new());
    }

    Some(ParsedTable { columns, rows })
}
