//! Reading the unquoted delimited results files.
//!
//! The writer of these files never quotes a field: a delimiter or newline
//! occurring inside a field is carried with a UTF-8 substitute character and
//! unmapped on read. The delimiter itself is detected from the header line
//! among tab, pipe and comma.

use csv::ReaderBuilder;
use log::debug;
use snafu::prelude::*;

use std::fs;
use std::path::Path;

use crate::report::{
    MissingDelimiterSnafu, OpeningInputSnafu, ReadingDelimitedSnafu, ReportResult,
};

/// The delimiters recognized in a header line, in detection order.
const DELIMITERS: [char; 3] = ['\t', '|', ','];

/// Substitute carried in a field in place of a newline.
const NEWLINE_SUBSTITUTE: char = '\u{2424}'; // ␤

fn delimiter_substitute(sep: char) -> char {
    match sep {
        '\t' => '\u{2409}', // ␉
        '|' => '\u{00a6}',  // ¦
        _ => '\u{ff0c}',    // ，
    }
}

/// A parsed results file: a header line and the data rows, each padded to the
/// width of the header.
#[derive(Debug, Clone)]
pub struct TsvTable {
    pub path: String,
    pub sep: char,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

pub fn read_table(path: &Path) -> ReportResult<TsvTable> {
    let path_str = path.display().to_string();
    let contents = fs::read_to_string(path).context(OpeningInputSnafu {
        path: path_str.clone(),
    })?;
    parse_table(&contents, &path_str)
}

pub fn parse_table(contents: &str, path: &str) -> ReportResult<TsvTable> {
    let first_line = contents.lines().next().unwrap_or("");
    let sep = DELIMITERS
        .iter()
        .copied()
        .find(|c| first_line.contains(*c))
        .context(MissingDelimiterSnafu { path })?;
    debug!("parse_table: {} delimited by {:?}", path, sep);

    let mut reader = ReaderBuilder::new()
        .delimiter(sep as u8)
        .has_headers(false)
        .quoting(false)
        .flexible(true)
        .from_reader(contents.as_bytes());

    let mut header: Vec<String> = Vec::new();
    let mut rows: Vec<Vec<String>> = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.context(ReadingDelimitedSnafu { path })?;
        let mut fields: Vec<String> = record.iter().map(|f| unmap_field(f, sep)).collect();
        if idx == 0 {
            header = fields;
            continue;
        }
        if fields.iter().all(|f| f.is_empty()) {
            continue;
        }
        // The writer strips trailing empty fields, so short rows are padded
        // back to the header width.
        while fields.len() < header.len() {
            fields.push(String::new());
        }
        rows.push(fields);
    }
    Ok(TsvTable {
        path: path.to_string(),
        sep,
        header,
        rows,
    })
}

fn unmap_field(field: &str, sep: char) -> String {
    let sub = delimiter_substitute(sep);
    field
        .chars()
        .map(|c| {
            if c == NEWLINE_SUBSTITUTE {
                '\n'
            } else if c == sub {
                sep
            } else {
                c
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ReportError;

    #[test]
    fn test_tab_delimited() {
        let table = parse_table("area\tRSReg\tRSCst\nTOTAL\t100\t90\n", "t.tsv").unwrap();
        assert_eq!(table.sep, '\t');
        assert_eq!(table.header, vec!["area", "RSReg", "RSCst"]);
        assert_eq!(table.rows, vec![vec!["TOTAL", "100", "90"]]);
    }

    #[test]
    fn test_pipe_delimited() {
        let table = parse_table("area|RSReg\nTOTAL|100\n", "t.psv").unwrap();
        assert_eq!(table.sep, '|');
        assert_eq!(table.rows, vec![vec!["TOTAL", "100"]]);
    }

    #[test]
    fn test_comma_delimited() {
        let table = parse_table("area,RSReg\nTOTAL,100\n", "t.csv").unwrap();
        assert_eq!(table.sep, ',');
    }

    #[test]
    fn test_tab_wins_over_comma() {
        // Tab is checked first, so a comma inside a heading is data.
        let table = parse_table("area\ta,b\nTOTAL\t1\n", "t.tsv").unwrap();
        assert_eq!(table.sep, '\t');
        assert_eq!(table.header[1], "a,b");
    }

    #[test]
    fn test_unmaps_substitute_characters() {
        let table = parse_table("area|note\nTOTAL|up\u{2424}down \u{00a6} ok\n", "t.psv").unwrap();
        assert_eq!(table.rows[0][1], "up\ndown | ok");
    }

    #[test]
    fn test_pads_short_rows() {
        let table = parse_table("area\ta\tb\tc\nTOTAL\t1\n", "t.tsv").unwrap();
        assert_eq!(table.rows[0], vec!["TOTAL", "1", "", ""]);
    }

    #[test]
    fn test_skips_blank_lines() {
        let table = parse_table("area\ta\n\nTOTAL\t1\n\n", "t.tsv").unwrap();
        assert_eq!(table.rows.len(), 1);
    }

    #[test]
    fn test_missing_delimiter() {
        match parse_table("justoneword\n", "t.tsv") {
            Err(ReportError::MissingDelimiter { path }) => assert_eq!(path, "t.tsv"),
            other => panic!("unexpected result: {:?}", other.map(|t| t.header)),
        }
    }
}
