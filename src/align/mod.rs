//! Column boundary inference for whitespace-aligned text
//!
//! Tools such as `ps`, `df` or `ls -l` pad their output into columns with
//! spaces but never say where a column ends. [`align`] recovers the columns
//! by walking the first line (the reference line) in display-width units and
//! accepting a boundary only where every line of the sample set is blank at
//! the same cell.
//!
//! ```
//! use qq::align::{align, AlignOptions};
//!
//! let rows = align(&["  PID command", "   1  ls"], &AlignOptions::default());
//! assert_eq!(rows, vec![vec!["PID", "command"], vec!["1", "ls"]]);
//! ```

mod width;

pub use width::{char_width, display_width, is_clear_at, truncate_to_width};

/// One aligned line, split into trimmed fields.
pub type Row = Vec<String>;

/// Options for a single [`align`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlignOptions {
    /// The first line is data rather than a header, so its empty fields are
    /// left empty instead of receiving synthetic column names.
    pub header_is_data_row: bool,
}

/// Label given to a header column whose header text is blank.
pub fn synthetic_column_name(column: usize) -> String {
    format!("______f{}", column)
}

/// Split a sample set of aligned lines into rows of equal width.
///
/// The result has one row per input line, in input order, and every row has
/// the same number of fields. Inconsistent input never fails; it only yields
/// fewer and wider columns. An empty sample set yields no rows.
///
/// Every line is cut into consecutive pieces, so apart from surrounding
/// whitespace each visible character lands in exactly one field.
pub fn align<S: AsRef<str>>(lines: &[S], options: &AlignOptions) -> Vec<Row> {
    let lines: Vec<Vec<char>> = lines.iter().map(|l| l.as_ref().chars().collect()).collect();
    let Some(reference) = lines.first() else {
        return Vec::new();
    };

    let mut scan = Scan::after_leading_whitespace(&lines);
    let mut builder = RowBuilder::new(&lines, options, scan.pos);
    let mut final_closed = false;

    while scan.pos < reference.len() {
        let c = reference[scan.pos];
        scan.width += char_width(c);

        if scan.pos == reference.len() - 1 {
            builder.close_column(None);
            final_closed = true;
            break;
        }

        if !c.is_whitespace() || !all_clear_at(&lines, scan.width) {
            scan.pos += 1;
            continue;
        }

        builder.close_column(Some(scan.width));
        scan.skip_common_gap(&lines);
    }

    // The common gap can swallow the end of the reference line. Whatever
    // longer lines still hold past that point becomes one last column.
    if !final_closed && (builder.columns == 0 || builder.has_remaining_content()) {
        builder.close_column(None);
    }

    builder.rows
}

/// Scan state along the reference line.
#[derive(Debug, Clone, Copy)]
struct Scan {
    /// Rune index of the next reference character to examine.
    pos: usize,
    /// Display width of the reference line up to and including the last
    /// examined character.
    width: usize,
}

impl Scan {
    /// Skip the indentation shared by every line.
    ///
    /// Lines are compared by rune index here, not by display width, and the
    /// first column of every line starts at the same rune index. The last
    /// reference character is never skipped, so the final column always
    /// closes.
    fn after_leading_whitespace(lines: &[Vec<char>]) -> Self {
        let reference = &lines[0];
        let mut pos = 0;
        let mut width = 0;

        while pos + 1 < reference.len()
            && lines
                .iter()
                .all(|line| line.get(pos).map_or(true, |c| c.is_whitespace()))
        {
            width += char_width(reference[pos]);
            pos += 1;
        }

        Self { pos, width }
    }

    /// Consume the whitespace run after an accepted boundary for as long as
    /// every line stays blank.
    fn skip_common_gap(&mut self, lines: &[Vec<char>]) {
        let reference = &lines[0];
        let mut next = self.pos + 1;

        while let Some(&c) = reference.get(next) {
            let width = self.width + char_width(c);
            if !c.is_whitespace() || !all_clear_at(lines, width) {
                break;
            }
            self.width = width;
            next += 1;
        }

        self.pos = next;
    }
}

fn all_clear_at(lines: &[Vec<char>], width: usize) -> bool {
    lines.iter().all(|line| is_clear_at(line, width))
}

struct RowBuilder<'a> {
    lines: &'a [Vec<char>],
    options: &'a AlignOptions,
    rows: Vec<Row>,
    /// Rune index in each line where its next field begins.
    cursors: Vec<usize>,
    columns: usize,
}

impl<'a> RowBuilder<'a> {
    fn new(lines: &'a [Vec<char>], options: &'a AlignOptions, lead: usize) -> Self {
        Self {
            lines,
            options,
            rows: vec![Vec::new(); lines.len()],
            cursors: lines.iter().map(|line| lead.min(line.len())).collect(),
            columns: 0,
        }
    }

    fn has_remaining_content(&self) -> bool {
        self.lines
            .iter()
            .zip(&self.cursors)
            .any(|(line, &cursor)| line[cursor..].iter().any(|c| !c.is_whitespace()))
    }

    /// Append one field to every row: the cells from where the line's
    /// previous field stopped up to display offset `end`, or to the end of
    /// the line. Lines shorter than `end` are clipped to their own length.
    fn close_column(&mut self, end: Option<usize>) {
        self.columns += 1;

        let lines = self.lines.iter().zip(self.cursors.iter_mut());
        for (index, ((line, cursor), row)) in lines.zip(self.rows.iter_mut()).enumerate() {
            let from = *cursor;
            let to = end.map_or(line.len(), |e| truncate_to_width(line, e).len().max(from));
            *cursor = to;

            let field: String = line[from..to].iter().collect();
            let field = field.trim();

            if index == 0 && field.is_empty() && !self.options.header_is_data_row {
                row.push(synthetic_column_name(self.columns));
            } else {
                row.push(field.to_string());
            }
        }
    }
}
