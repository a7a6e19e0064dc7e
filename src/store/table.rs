//! Typed tables built from imported text

use std::collections::HashSet;
use std::fmt;

use tracing::trace;

use crate::error::{QqError, Result};
use crate::input::ParsedTable;
use crate::store::value::{is_numeric_literal, parse_number, Value};

/// Storage class shared by every value of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Integer => write!(f, "INTEGER"),
            ColumnType::Real => write!(f, "REAL"),
            ColumnType::Text => write!(f, "TEXT"),
        }
    }
}

impl ColumnType {
    /// Infer the storage class of a column from its raw fields.
    pub fn infer<'a, I>(fields: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut seen = false;
        let mut integer = true;

        for field in fields.into_iter().filter(|f| !f.is_empty()) {
            seen = true;
            if !is_numeric_literal(field) {
                return ColumnType::Text;
            }
            if integer && field.parse::<i64>().is_err() {
                integer = false;
            }
        }

        match (seen, integer) {
            (false, _) => ColumnType::Text,
            (true, true) => ColumnType::Integer,
            (true, false) => ColumnType::Real,
        }
    }

    fn convert(self, field: String) -> Value {
        match self {
            ColumnType::Text => Value::Text(field),
            _ if field.is_empty() => Value::Null,
            ColumnType::Integer => field.parse().map_or(Value::Null, Value::Integer),
            ColumnType::Real => match parse_number(&field) {
                Some(Value::Integer(i)) => Value::Real(i as f64),
                Some(v) => v,
                None => Value::Null,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
}

#[derive(Debug, Clone)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    /// Type the fields of a parsed table column by column.
    pub fn from_parsed(name: &str, parsed: ParsedTable) -> Result<Self> {
        let mut seen = HashSet::new();
        for label in &parsed.columns {
            if !seen.insert(label.to_lowercase()) {
                return Err(QqError::DuplicateColumn(label.clone()));
            }
        }

        let types: Vec<ColumnType> = (0..parsed.columns.len())
            .map(|i| ColumnType::infer(parsed.rows.iter().map(|row| row[i].as_str())))
            .collect();

        let columns: Vec<Column> = parsed
            .columns
            .into_iter()
            .zip(&types)
            .map(|(name, &column_type)| Column { name, column_type })
            .collect();

        for column in &columns {
            trace!(table = name, column = %column.name, column_type = %column.column_type, "inferred column type");
        }

        let rows = parsed
            .rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .zip(&types)
                    .map(|(field, column_type)| column_type.convert(field))
                    .collect()
            })
            .collect();

        Ok(Self {
            name: name.to_string(),
            columns,
            rows,
        })
    }

    /// Position of a column, matched case-insensitively.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }
}
