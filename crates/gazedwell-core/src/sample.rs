//! Gaze sample loading from delimited text.
//!
//! Layout is positional: `X, Y, Pupil, Timestamp, ...` after a fixed number
//! of leading label rows. The delimiter is sniffed from a candidate list:
//! the first candidate that splits the file into more than one column wins.
//! This is a heuristic, and both knobs live in [`InputFormat`] so callers can
//! pin them down instead of relying on the defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// X, Y, Pupil, Timestamp.
pub const MIN_COLUMNS: usize = 4;

const COLUMN_NAMES: [&str; MIN_COLUMNS] = ["X", "Y", "Pupil", "Timestamp"];

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read gaze data {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("gaze data must have at least 4 columns, found {found}")]
    InsufficientColumns { found: usize },
    #[error("row {row}: {column} value {value:?} is not a finite number")]
    MalformedSample {
        row: usize,
        column: &'static str,
        value: String,
    },
}

/// What to do with a row whose coordinates or timestamp do not parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedPolicy {
    /// Drop the row, log it, and record it in [`LoadedSamples::skipped`].
    #[default]
    Skip,
    /// Fail the whole file on the first bad row.
    Fail,
}

/// Describes how a gaze file is laid out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputFormat {
    /// Tried in order; the first one yielding more than one column is used.
    pub delimiter_candidates: Vec<char>,
    /// Leading non-blank rows dropped before data starts.
    pub header_rows_to_skip: usize,
    pub on_malformed: MalformedPolicy,
}

impl Default for InputFormat {
    fn default() -> Self {
        Self {
            delimiter_candidates: vec!['\t', ','],
            header_rows_to_skip: 1,
            on_malformed: MalformedPolicy::Skip,
        }
    }
}

/// One eye-tracking observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GazeSample {
    pub x: f64,
    pub y: f64,
    /// `NaN` when the source value was not numeric; unused by attribution.
    pub pupil: f64,
    pub timestamp: f64,
    /// Columns past the fourth, kept verbatim.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<String>,
}

impl GazeSample {
    pub fn new(x: f64, y: f64, timestamp: f64) -> Self {
        Self {
            x,
            y,
            pupil: f64::NAN,
            timestamp,
            extra: Vec::new(),
        }
    }
}

/// A data row that was dropped under [`MalformedPolicy::Skip`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRow {
    /// 1-based physical line number.
    pub row: usize,
    pub column: &'static str,
    pub value: String,
}

/// Output of a load: samples in file order plus what was learned on the way.
#[derive(Debug, Clone)]
pub struct LoadedSamples {
    pub samples: Vec<GazeSample>,
    pub skipped: Vec<SkippedRow>,
    pub delimiter: char,
    pub columns: usize,
}

/// Load gaze samples from a delimited text file.
pub fn load(path: impl AsRef<Path>, format: &InputFormat) -> Result<LoadedSamples, LoadError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let loaded = parse_str(&text, format)?;
    tracing::info!(
        path = %path.display(),
        samples = loaded.samples.len(),
        skipped = loaded.skipped.len(),
        columns = loaded.columns,
        delimiter = ?loaded.delimiter,
        "loaded gaze samples"
    );
    Ok(loaded)
}

/// Parse gaze samples from in-memory delimited text.
pub fn parse_str(text: &str, format: &InputFormat) -> Result<LoadedSamples, LoadError> {
    // Blank lines never count as rows, header or data.
    let lines: Vec<(usize, &str)> = text
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line))
        .filter(|(_, line)| !line.trim().is_empty())
        .collect();

    let (delimiter, columns) = sniff_delimiter(&lines, &format.delimiter_candidates);
    tracing::debug!(delimiter = ?delimiter, columns, "sniffed gaze data delimiter");

    if columns < MIN_COLUMNS {
        return Err(LoadError::InsufficientColumns { found: columns });
    }

    let mut samples = Vec::with_capacity(lines.len().saturating_sub(format.header_rows_to_skip));
    let mut skipped = Vec::new();

    for &(row, line) in lines.iter().skip(format.header_rows_to_skip) {
        match parse_row(row, line, delimiter) {
            Ok(sample) => samples.push(sample),
            Err(LoadError::MalformedSample { row, column, value })
                if format.on_malformed == MalformedPolicy::Skip =>
            {
                tracing::warn!(row, column, value = %value, "skipping malformed gaze sample");
                skipped.push(SkippedRow { row, column, value });
            }
            Err(e) => return Err(e),
        }
    }

    Ok(LoadedSamples {
        samples,
        skipped,
        delimiter,
        columns,
    })
}

/// Pick the first candidate that splits the input into more than one column.
///
/// Falls back to the first candidate when none does. Column count is the
/// widest physical row, header included.
fn sniff_delimiter(lines: &[(usize, &str)], candidates: &[char]) -> (char, usize) {
    let column_count = |delimiter: char| {
        lines
            .iter()
            .map(|(_, line)| line.split(delimiter).count())
            .max()
            .unwrap_or(0)
    };

    for &candidate in candidates {
        let columns = column_count(candidate);
        if columns > 1 {
            return (candidate, columns);
        }
    }

    let fallback = candidates.first().copied().unwrap_or(',');
    (fallback, column_count(fallback))
}

fn parse_row(row: usize, line: &str, delimiter: char) -> Result<GazeSample, LoadError> {
    let fields: Vec<&str> = line.split(delimiter).map(str::trim).collect();
    if fields.len() < MIN_COLUMNS {
        return Err(LoadError::MalformedSample {
            row,
            column: COLUMN_NAMES[fields.len()],
            value: String::new(),
        });
    }

    let x = parse_number(row, "X", fields[0])?;
    let y = parse_number(row, "Y", fields[1])?;
    let timestamp = parse_number(row, "Timestamp", fields[3])?;
    let pupil = fields[2].parse::<f64>().unwrap_or_else(|_| {
        tracing::debug!(row, value = fields[2], "non-numeric pupil value");
        f64::NAN
    });

    Ok(GazeSample {
        x,
        y,
        pupil,
        timestamp,
        extra: fields[MIN_COLUMNS..].iter().map(|f| f.to_string()).collect(),
    })
}

fn parse_number(row: usize, column: &'static str, raw: &str) -> Result<f64, LoadError> {
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| LoadError::MalformedSample {
            row,
            column,
            value: raw.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tab_delimited() {
        let text = "X\tY\tPupil\tTimestamp\n1\t2\t3.5\t100\n4\t5\t3.6\t110\n";
        let loaded = parse_str(text, &InputFormat::default()).unwrap();
        assert_eq!(loaded.delimiter, '\t');
        assert_eq!(loaded.columns, 4);
        assert_eq!(loaded.samples.len(), 2);
        assert_eq!(loaded.samples[0], GazeSample { x: 1.0, y: 2.0, pupil: 3.5, timestamp: 100.0, extra: vec![] });
    }

    #[test]
    fn test_parse_falls_back_to_comma() {
        let text = "a,b,c,d,e\n1,2,3,4,left\n";
        let loaded = parse_str(text, &InputFormat::default()).unwrap();
        assert_eq!(loaded.delimiter, ',');
        assert_eq!(loaded.columns, 5);
        assert_eq!(loaded.samples[0].extra, vec!["left".to_string()]);
        assert_eq!(loaded.samples[0].timestamp, 4.0);
    }

    #[test]
    fn test_insufficient_columns() {
        let text = "X,Y,T\n1,2,3\n4,5,6\n";
        match parse_str(text, &InputFormat::default()) {
            Err(LoadError::InsufficientColumns { found }) => assert_eq!(found, 3),
            other => panic!("expected InsufficientColumns, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_input_has_no_columns() {
        match parse_str("", &InputFormat::default()) {
            Err(LoadError::InsufficientColumns { found }) => assert_eq!(found, 0),
            other => panic!("expected InsufficientColumns, got {other:?}"),
        }
    }

    #[test]
    fn test_header_only_yields_no_samples() {
        let loaded = parse_str("X\tY\tPupil\tTimestamp\n", &InputFormat::default()).unwrap();
        assert!(loaded.samples.is_empty());
        assert!(loaded.skipped.is_empty());
    }

    #[test]
    fn test_header_is_dropped_unconditionally() {
        // A numeric first row is still treated as a label row.
        let text = "9,9,9,9\n1,1,1,1\n";
        let loaded = parse_str(text, &InputFormat::default()).unwrap();
        assert_eq!(loaded.samples.len(), 1);
        assert_eq!(loaded.samples[0].x, 1.0);
    }

    #[test]
    fn test_custom_header_rows() {
        let format = InputFormat { header_rows_to_skip: 0, ..InputFormat::default() };
        let loaded = parse_str("1,2,3,4\n5,6,7,8\n", &format).unwrap();
        assert_eq!(loaded.samples.len(), 2);
    }

    #[test]
    fn test_blank_lines_ignored() {
        let text = "\nX,Y,P,T\n\n1,2,3,4\r\n   \n5,6,7,8\r\n";
        let loaded = parse_str(text, &InputFormat::default()).unwrap();
        assert_eq!(loaded.samples.len(), 2);
        assert_eq!(loaded.samples[1].timestamp, 8.0);
    }

    #[test]
    fn test_malformed_row_skipped_leniently() {
        let text = "X,Y,P,T\n1,2,3,4\nabc,2,3,5\n1,2,3,\n7,8,9,10\n";
        let loaded = parse_str(text, &InputFormat::default()).unwrap();
        assert_eq!(loaded.samples.len(), 2);
        assert_eq!(loaded.skipped.len(), 2);
        assert_eq!(loaded.skipped[0], SkippedRow { row: 3, column: "X", value: "abc".into() });
        assert_eq!(loaded.skipped[1].column, "Timestamp");
        assert_eq!(loaded.skipped[1].row, 4);
    }

    #[test]
    fn test_short_row_skipped() {
        let text = "X,Y,P,T\n1,2\n3,4,5,6\n";
        let loaded = parse_str(text, &InputFormat::default()).unwrap();
        assert_eq!(loaded.samples.len(), 1);
        assert_eq!(loaded.skipped[0].column, "Pupil");
    }

    #[test]
    fn test_non_finite_rejected() {
        let text = "X,Y,P,T\nNaN,2,3,4\n1,inf,3,4\n";
        let loaded = parse_str(text, &InputFormat::default()).unwrap();
        assert!(loaded.samples.is_empty());
        assert_eq!(loaded.skipped.len(), 2);
    }

    #[test]
    fn test_malformed_row_fails_strictly() {
        let format = InputFormat { on_malformed: MalformedPolicy::Fail, ..InputFormat::default() };
        let text = "X,Y,P,T\n1,2,3,4\n1,oops,3,5\n";
        match parse_str(text, &format) {
            Err(LoadError::MalformedSample { row, column, value }) => {
                assert_eq!(row, 3);
                assert_eq!(column, "Y");
                assert_eq!(value, "oops");
            }
            other => panic!("expected MalformedSample, got {other:?}"),
        }
    }

    #[test]
    fn test_non_numeric_pupil_kept_as_nan() {
        let text = "X,Y,P,T\n1,2,-,4\n";
        let loaded = parse_str(text, &InputFormat::default()).unwrap();
        assert_eq!(loaded.samples.len(), 1);
        assert!(loaded.samples[0].pupil.is_nan());
    }

    #[test]
    fn test_whitespace_around_fields() {
        let text = "X, Y, P, T\n 1 , 2 , 3 , 4 \n";
        let loaded = parse_str(text, &InputFormat::default()).unwrap();
        assert_eq!(loaded.samples[0].x, 1.0);
        assert_eq!(loaded.samples[0].timestamp, 4.0);
    }

    #[test]
    fn test_file_order_preserved() {
        let text = "X,Y,P,T\n1,1,0,30\n2,2,0,10\n3,3,0,20\n";
        let loaded = parse_str(text, &InputFormat::default()).unwrap();
        let ts: Vec<f64> = loaded.samples.iter().map(|s| s.timestamp).collect();
        assert_eq!(ts, vec![30.0, 10.0, 20.0]);
    }

    #[test]
    fn test_single_delimiter_candidate() {
        let format = InputFormat { delimiter_candidates: vec![';'], ..InputFormat::default() };
        let loaded = parse_str("a;b;c;d\n1;2;3;4\n", &format).unwrap();
        assert_eq!(loaded.delimiter, ';');
        assert_eq!(loaded.samples.len(), 1);
    }

    #[test]
    fn test_load_missing_file() {
        match load("/nonexistent/gaze.csv", &InputFormat::default()) {
            Err(LoadError::Io { path, .. }) => assert!(path.ends_with("gaze.csv")),
            other => panic!("expected Io, got {other:?}"),
        }
    }
}
