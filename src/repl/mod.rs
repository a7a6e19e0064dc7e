//! Interactive prompt over the imported tables

#[cfg(feature = "repl")]
pub mod interactive;

#[cfg(feature = "repl")]
pub use interactive::run_repl;

use crate::error::{QqError, Result};
use crate::output::{format_output, OutputOptions};
use crate::store::Database;

const HELP: &str = "\
Commands:
  tables          list imported tables
  schema <table>  show the columns of a table
  help            show this message
  exit, quit      leave
Anything else is run as a SELECT query.
";

/// What the prompt should do after one line of input.
#[derive(Debug, PartialEq)]
pub enum ReplAction {
    Print(String),
    Exit,
}

/// Handle one trimmed, non-empty line of prompt input.
pub fn handle_line(db: &Database, output: &OutputOptions, line: &str) -> Result<ReplAction> {
    let mut words = line.split_whitespace();
    let command = words.next().unwrap_or_default().to_ascii_lowercase();
    let rest: Vec<&str> = words.collect();

    match (command.as_str(), rest.as_slice()) {
        ("exit" | "quit", []) => Ok(ReplAction::Exit),
        ("help", []) => Ok(ReplAction::Print(HELP.to_string())),
        ("tables", []) => Ok(ReplAction::Print(list_tables(db))),
        ("schema", [name]) => describe_table(db, name).map(ReplAction::Print),
        ("schema", _) => Err(QqError::ExecutionError("usage: schema <table>".to_string())),
        _ => {
            let result = db.query(line)?;
            format_output(&result, output).map(ReplAction::Print)
        }
    }
}

fn list_tables(db: &Database) -> String {
    db.tables()
        .iter()
        .map(|t| format!("{} ({} rows)\n", t.name, t.rows.len()))
        .collect()
}

fn describe_table(db: &Database, name: &str) -> Result<String> {
    let table = db.table(name)?;
    Ok(table
        .columns
        .iter()
        .map(|c| format!("{} {}\n", c.name, c.column_type))
        .collect())
}

#[cfg(not(feature = "repl"))]
pub fn run_repl(_db: &Database, _output: &OutputOptions) -> Result<()> {
    Err(QqError::ExecutionError(
        "REPL not enabled. Rebuild with --features repl".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::ImportOptions;
    use crate::store::STDIN_TABLE;

    fn db() -> Database {
        let mut db = Database::new();
        let text = "  PID TTY          TIME CMD\n 4021 pts/0    00:00:00 bash\n12377 pts/0    00:00:01 ps\n";
        db.import(text.as_bytes(), STDIN_TABLE, &ImportOptions::default())
            .unwrap();
        db
    }

    fn run(line: &str) -> Result<ReplAction> {
        handle_line(&db(), &OutputOptions::default(), line)
    }

    #[test]
    fn test_exit() {
        assert_eq!(run("exit").unwrap(), ReplAction::Exit);
        assert_eq!(run("QUIT").unwrap(), ReplAction::Exit);
    }

    #[test]
    fn test_tables() {
        assert_eq!(
            run("tables").unwrap(),
            ReplAction::Print("stdin (2 rows)\n".to_string())
        );
    }

    #[test]
    fn test_schema() {
        assert_eq!(
            run("schema stdin").unwrap(),
            ReplAction::Print("PID INTEGER\nTTY TEXT\nTIME TEXT\nCMD TEXT\n".to_string())
        );
        assert!(matches!(run("schema nope"), Err(QqError::NoSuchTable(_))));
        assert!(run("schema").is_err());
    }

    #[test]
    fn test_query() {
        assert_eq!(
            run("SELECT CMD FROM stdin ORDER BY PID DESC").unwrap(),
            ReplAction::Print("ps\nbash\n".to_string())
        );
        assert!(matches!(run("SELEC 1"), Err(QqError::ParseError(_))));
    }
}
