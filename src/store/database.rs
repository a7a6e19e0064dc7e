//! The in-memory database every source is imported into

use std::io::Read;

use tracing::{debug, warn};

use crate::engine::{execute, ResultSet};
use crate::error::{QqError, Result};
use crate::input::{parse_table, read_source, ImportOptions};
use crate::parser::parse_query;
use crate::store::table::Table;

/// Table name given to standard input.
pub const STDIN_TABLE: &str = "stdin";

#[derive(Debug, Default)]
pub struct Database {
    tables: Vec<Table>,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read, split and type one source as table `name`.
    ///
    /// Returns `false` when the source holds no rows at all; no table is
    /// created in that case.
    pub fn import<R: Read>(&mut self, reader: R, name: &str, options: &ImportOptions) -> Result<bool> {
        if self.find(name).is_some() {
            return Err(QqError::DuplicateTable(name.to_string()));
        }

        let text = read_source(reader, options.encoding)?;
        let Some(parsed) = parse_table(&text, &options.format, options.no_header)? else {
            warn!(table = name, "input is empty, no table created");
            return Ok(false);
        };

        let table = Table::from_parsed(name, parsed)?;
        debug!(
            table = name,
            columns = table.columns.len(),
            rows = table.rows.len(),
            "imported table"
        );
        self.tables.push(table);
        Ok(true)
    }

    /// Add an already typed table.
    pub fn insert(&mut self, table: Table) -> Result<()> {
        if self.find(&table.name).is_some() {
            return Err(QqError::DuplicateTable(table.name));
        }
        self.tables.push(table);
        Ok(())
    }

    /// Look a table up by name, ignoring case.
    pub fn table(&self, name: &str) -> Result<&Table> {
        self.find(name)
            .ok_or_else(|| QqError::NoSuchTable(name.to_string()))
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    /// Parse and run one query against the imported tables.
    pub fn query(&self, sql: &str) -> Result<ResultSet> {
        let query = parse_query(sql)?;
        execute(&query, self)
    }

    fn find(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{InputFormat, ParsedTable};
    use crate::store::Value;

    const PS: &str = "  PID TTY          TIME CMD\n 4021 pts/0    00:00:00 bash\n12377 pts/0    00:00:01 ps\n";

    #[test]
    fn test_import_aligned_text() {
        let mut db = Database::new();
        assert!(db.import(PS.as_bytes(), STDIN_TABLE, &ImportOptions::default()).unwrap());

        let table = db.table("STDIN").unwrap();
        let names: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["PID", "TTY", "TIME", "CMD"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1][0], Value::Integer(12377));
    }

    #[test]
    fn test_import_empty_source_creates_no_table() {
        let mut db = Database::new();
        assert!(!db.import("\n\n".as_bytes(), STDIN_TABLE, &ImportOptions::default()).unwrap());
        assert!(db.tables().is_empty());
        assert!(matches!(db.table(STDIN_TABLE), Err(QqError::NoSuchTable(_))));
    }

    #[test]
    fn test_duplicate_table_name() {
        let mut db = Database::new();
        db.import("a\n1\n".as_bytes(), "data.txt", &ImportOptions::default())
            .unwrap();
        let err = db
            .import("b\n2\n".as_bytes(), "DATA.txt", &ImportOptions::default())
            .unwrap_err();
        assert!(matches!(err, QqError::DuplicateTable(_)));
    }

    #[test]
    fn test_insert_typed_table() {
        let parsed = ParsedTable {
            columns: vec!["name".to_string(), "size".to_string()],
            rows: vec![vec!["a.txt".to_string(), "12".to_string()]],
        };
        let mut db = Database::new();
        db.insert(Table::from_parsed("files", parsed.clone()).unwrap())
            .unwrap();

        let result = db.query("SELECT size * 2 FROM files").unwrap();
        assert_eq!(result.rows, vec![vec![Value::Integer(24)]]);

        let again = Table::from_parsed("FILES", parsed).unwrap();
        assert!(matches!(db.insert(again), Err(QqError::DuplicateTable(_))));
    }

    #[test]
    fn test_query_imported_csv() {
        let mut db = Database::new();
        let options = ImportOptions {
            format: InputFormat::Csv,
            ..ImportOptions::default()
        };
        db.import("name,size\na,10\nb,20\n".as_bytes(), STDIN_TABLE, &options)
            .unwrap();

        let result = db.query("SELECT name FROM stdin WHERE size > 15").unwrap();
        assert_eq!(result.columns, vec!["name"]);
        assert_eq!(result.rows, vec![vec![Value::Text("b".into())]]);
    }
}
