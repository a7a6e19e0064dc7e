//! rustyline prompt loop

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use super::{handle_line, ReplAction};
use crate::error::{QqError, Result};
use crate::output::OutputOptions;
use crate::store::Database;

pub fn run_repl(db: &Database, output: &OutputOptions) -> Result<()> {
    let mut rl = DefaultEditor::new().map_err(|e| QqError::ReadlineError(e.to_string()))?;

    println!("qq v{} - Interactive Mode", env!("CARGO_PKG_VERSION"));
    println!("Type 'help' for commands, 'exit' to quit\n");

    loop {
        match rl.readline("qq> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                match handle_line(db, output, line) {
                    Ok(ReplAction::Print(text)) => print!("{}", text),
                    Ok(ReplAction::Exit) => break,
                    Err(e) => eprintln!("Error: {}", e),
                }
            }
            // Ctrl+C drops the current line only
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(QqError::ReadlineError(e.to_string())),
        }
    }

    Ok(())
}
