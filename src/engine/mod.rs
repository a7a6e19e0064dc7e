//! Execution engine for qq queries

pub mod eval;
pub mod executor;
pub mod functions;

pub use executor::{execute, ResultSet};
