//! In-memory tables the query engine reads from

pub mod database;
pub mod table;
pub mod value;

pub use database::{Database, STDIN_TABLE};
pub use table::{Column, ColumnType, Table};
pub use value::Value;
