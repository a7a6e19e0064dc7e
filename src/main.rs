//! qq CLI - select stdin with query

use std::fs::File;
use std::io::{self, BufReader, IsTerminal, Write};
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use qq::cli::Args;
use qq::{format_output, Database, ImportOptions, STDIN_TABLE};

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(e) = run(args) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("QQ_LOG").unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(args: Args) -> Result<()> {
    let import = args.import_options()?;
    let output = args.output_options();
    let mut db = Database::new();

    if args.files.is_empty() {
        if !io::stdin().is_terminal() {
            import_stdin(&mut db, &import)?;
        }
    } else {
        for file in &args.files {
            if file.as_os_str() == "-" {
                import_stdin(&mut db, &import)?;
            } else {
                import_file(&mut db, file, &import)?;
            }
        }
    }

    if args.interactive {
        return Ok(qq::repl::run_repl(&db, &output)?);
    }

    let result = db.query(args.query())?;
    let text = format_output(&result, &output)?;
    let mut stdout = io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

fn import_stdin(db: &mut Database, options: &ImportOptions) -> Result<()> {
    db.import(io::stdin().lock(), STDIN_TABLE, options)
        .context("failed to import stdin")?;
    Ok(())
}

fn import_file(db: &mut Database, path: &Path, options: &ImportOptions) -> Result<()> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow!("not a file: {}", path.display()))?;
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    db.import(BufReader::new(file), &name, options)
        .with_context(|| format!("failed to import {}", path.display()))?;
    Ok(())
}
