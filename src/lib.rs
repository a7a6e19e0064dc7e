//! qq - query the aligned text output of ps, df, ls and friends with SQL
//!
//! Input is split into columns (by alignment, CSV, TSV, LTSV or a regular
//! expression), loaded into an in-memory table and queried with a SELECT
//! dialect close to SQLite's.
//!
//! # Example
//!
//! ```
//! use qq::{format_output, Database, ImportOptions, OutputOptions};
//!
//! let ps = "  PID TTY          TIME CMD\n 4021 pts/0    00:00:00 bash\n12377 pts/0    00:00:01 ps\n";
//! let mut db = Database::new();
//! db.import(ps.as_bytes(), "stdin", &ImportOptions::default()).unwrap();
//!
//! let result = db.query("SELECT CMD FROM stdin WHERE PID > 5000").unwrap();
//! assert_eq!(format_output(&result, &OutputOptions::default()).unwrap(), "ps\n");
//! ```

pub mod align;
pub mod cli;
pub mod engine;
pub mod error;
pub mod input;
pub mod output;
pub mod parser;
pub mod repl;
pub mod store;

pub use engine::{execute, ResultSet};
pub use error::{QqError, Result};
pub use input::{ImportOptions, InputFormat};
pub use output::{format_output, OutputFormat, OutputOptions};
pub use parser::{parse_query, Query};
pub use store::{Database, Table, Value, STDIN_TABLE};
