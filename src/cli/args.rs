//! CLI argument parsing

use std::path::PathBuf;

use clap::{ArgGroup, Parser};
use regex::Regex;

use crate::error::Result;
use crate::input::{resolve_encoding, ImportOptions, InputFormat};
use crate::output::{OutputFormat, OutputOptions};

/// Query used when none is given on the command line or in `QQ_QUERY`.
pub const DEFAULT_QUERY: &str = "SELECT * FROM stdin";

#[derive(Parser, Debug)]
#[command(name = "qq")]
#[command(author, version, about = "Select stdin with query", long_about = None)]
#[command(group(
    ArgGroup::new("input")
        .args(["input_csv", "input_tsv", "input_ltsv", "input_pattern"])
        .multiple(false)
))]
#[command(group(
    ArgGroup::new("output")
        .args(["output_json", "output_raw"])
        .multiple(false)
))]
pub struct Args {
    /// Files to import, each as a table named after its base name ("-" is stdin)
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// SQL query to run
    #[arg(short, long, env = "QQ_QUERY", value_name = "SQL")]
    pub query: Option<String>,

    /// Treat the first line as data and name columns f1, f2, ...
    #[arg(long, visible_alias = "nh")]
    pub no_header: bool,

    /// Print the column names as the first output row
    #[arg(long, visible_alias = "oh")]
    pub out_header: bool,

    /// Read input as CSV
    #[arg(long, visible_alias = "ic")]
    pub input_csv: bool,

    /// Read input as TSV
    #[arg(long, visible_alias = "it")]
    pub input_tsv: bool,

    /// Read input as LTSV
    #[arg(long, visible_alias = "il")]
    pub input_ltsv: bool,

    /// Split input lines on a regular expression
    #[arg(long, visible_alias = "ip", value_name = "REGEX")]
    pub input_pattern: Option<String>,

    /// Write output as a JSON array of rows
    #[arg(long, visible_alias = "oj")]
    pub output_json: bool,

    /// Write output as tab-separated fields without quoting
    #[arg(long, visible_alias = "or")]
    pub output_raw: bool,

    /// Character encoding of the input
    #[arg(short, long, env = "QQ_ENCODING", value_name = "NAME")]
    pub encoding: Option<String>,

    /// Verbose logging on stderr
    #[arg(short, long)]
    pub verbose: bool,

    /// Open an interactive prompt after importing
    #[arg(short, long)]
    pub interactive: bool,
}

impl Args {
    pub fn input_format(&self) -> Result<InputFormat> {
        let format = if self.input_csv {
            InputFormat::Csv
        } else if self.input_tsv {
            InputFormat::Tsv
        } else if self.input_ltsv {
            InputFormat::Ltsv
        } else if let Some(pattern) = &self.input_pattern {
            InputFormat::Pattern(Regex::new(pattern)?)
        } else {
            InputFormat::Aligned
        };
        Ok(format)
    }

    pub fn import_options(&self) -> Result<ImportOptions> {
        let encoding = match &self.encoding {
            Some(name) => resolve_encoding(name)?,
            None => encoding_rs::UTF_8,
        };
        Ok(ImportOptions {
            no_header: self.no_header,
            format: self.input_format()?,
            encoding,
        })
    }

    pub fn output_options(&self) -> OutputOptions {
        let format = if self.output_json {
            OutputFormat::Json
        } else if self.output_raw {
            OutputFormat::Raw
        } else {
            OutputFormat::Csv
        };
        OutputOptions {
            format,
            out_header: self.out_header,
        }
    }

    pub fn query(&self) -> &str {
        self.query.as_deref().unwrap_or(DEFAULT_QUERY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("qq").chain(argv.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]);
        assert!(args.files.is_empty());
        assert!(matches!(args.input_format().unwrap(), InputFormat::Aligned));
        assert_eq!(args.output_options().format, OutputFormat::Csv);
        assert!(!args.output_options().out_header);
    }

    #[test]
    fn test_short_aliases() {
        let args = parse(&["--ic", "--oj", "--oh", "--nh", "ps.txt"]);
        assert!(matches!(args.input_format().unwrap(), InputFormat::Csv));
        assert_eq!(args.output_options().format, OutputFormat::Json);
        assert!(args.output_options().out_header);
        assert!(args.import_options().unwrap().no_header);
        assert_eq!(args.files, vec![PathBuf::from("ps.txt")]);
    }

    #[test]
    fn test_query_flag() {
        let args = parse(&["-q", "SELECT 1"]);
        assert_eq!(args.query(), "SELECT 1");
    }

    #[test]
    fn test_input_flags_conflict() {
        let argv = ["qq", "--input-csv", "--input-tsv"];
        assert!(Args::try_parse_from(argv).is_err());
    }

    #[test]
    fn test_output_flags_conflict() {
        let argv = ["qq", "--output-json", "--output-raw"];
        assert!(Args::try_parse_from(argv).is_err());
    }

    #[test]
    fn test_bad_pattern() {
        let args = parse(&["--ip", "("]);
        assert!(args.import_options().is_err());
    }

    #[test]
    fn test_encoding() {
        let args = parse(&["-e", "sjis"]);
        assert_eq!(args.import_options().unwrap().encoding, encoding_rs::SHIFT_JIS);
        let args = parse(&["-e", "klingon"]);
        assert!(args.import_options().is_err());
    }
}
