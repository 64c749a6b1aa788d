//! Report rows and the sinks that serialize them.
//!
//! One row is written per match event with the columns
//! `Filename, Box_coordinates, TP/FP/FN, classe, Matched_boxes, IoU`.

use crate::classes::ClassNames;
use crate::error::{EvalError, Result};
use crate::matching::MatchEvent;
use crate::types::EventKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::str::FromStr;

/// Column names, in output order.
pub const REPORT_COLUMNS: [&str; 6] = [
    "Filename",
    "Box_coordinates",
    "TP/FP/FN",
    "classe",
    "Matched_boxes",
    "IoU",
];

/// One classified event, ready to be written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    #[serde(rename = "Filename")]
    pub filename: String,
    /// Raw label text of the row's own box (the ground truth for a TP)
    #[serde(rename = "Box_coordinates")]
    pub box_coordinates: String,
    #[serde(rename = "TP/FP/FN")]
    pub kind: EventKind,
    #[serde(rename = "classe")]
    pub class_name: String,
    /// Raw label text of the matched prediction, TP rows only
    #[serde(rename = "Matched_boxes")]
    pub matched_box: Option<String>,
    #[serde(rename = "IoU")]
    pub iou: Option<f64>,
}

impl ReportRow {
    /// Build the row for one event of image `filename`.
    pub fn from_event(filename: &str, event: &MatchEvent<'_>, class_names: &ClassNames) -> Self {
        let primary = event.primary();
        let (matched_box, iou) = match event {
            MatchEvent::TruePositive {
                prediction, iou, ..
            } => (Some(prediction.raw.clone()), Some(*iou)),
            _ => (None, None),
        };

        Self {
            filename: filename.to_string(),
            box_coordinates: primary.raw.clone(),
            kind: event.kind(),
            class_name: class_names.resolve(primary.class_id()),
            matched_box,
            iou,
        }
    }

    /// Column values as text, in [`REPORT_COLUMNS`] order.
    pub fn fields(&self) -> [String; 6] {
        [
            self.filename.clone(),
            self.box_coordinates.clone(),
            self.kind.to_string(),
            self.class_name.clone(),
            self.matched_box.clone().unwrap_or_default(),
            self.iou.map(format_iou).unwrap_or_default(),
        ]
    }
}

/// Shortest round-trip decimal, keeping a `.0` on integral values.
///
/// Values below `1e-4` switch to exponent form with at least two exponent
/// digits (`5e-05`), as in earlier reports.
///
/// ```
/// use yolo_eval::report::format_iou;
///
/// assert_eq!(format_iou(1.0), "1.0");
/// assert_eq!(format_iou(0.625), "0.625");
/// assert_eq!(format_iou(0.00005), "5e-05");
/// ```
pub fn format_iou(iou: f64) -> String {
    if !iou.is_finite() {
        iou.to_string()
    } else if iou.fract() == 0.0 {
        format!("{:.1}", iou)
    } else if iou.abs() < 1e-4 {
        let formatted = format!("{:e}", iou);
        match formatted.split_once('e') {
            Some((mantissa, exponent)) => {
                let (sign, digits) = match exponent.strip_prefix('-') {
                    Some(digits) => ('-', digits),
                    None => ('+', exponent),
                };
                format!("{}e{}{:0>2}", mantissa, sign, digits)
            }
            None => formatted,
        }
    } else {
        iou.to_string()
    }
}

/// Output encodings for a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    /// One JSON object per line
    Jsonl,
}

impl FromStr for OutputFormat {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "jsonl" | "json-lines" => Ok(OutputFormat::Jsonl),
            other => Err(EvalError::InvalidArgument(format!(
                "unknown output format '{}'; expected csv or jsonl",
                other
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Csv => f.write_str("csv"),
            OutputFormat::Jsonl => f.write_str("jsonl"),
        }
    }
}

/// A sink for report rows.
///
/// Rows must be written from a single thread, in final order.
pub trait ReportWriter {
    fn write_row(&mut self, row: &ReportRow) -> Result<()>;

    /// Flush buffered output.
    fn finish(&mut self) -> Result<()>;
}

impl<T: ReportWriter + ?Sized> ReportWriter for Box<T> {
    fn write_row(&mut self, row: &ReportRow) -> Result<()> {
        (**self).write_row(row)
    }

    fn finish(&mut self) -> Result<()> {
        (**self).finish()
    }
}

/// Create the writer for `format`.
pub fn create_writer<'w, W: Write + 'w>(
    format: OutputFormat,
    out: W,
) -> Result<Box<dyn ReportWriter + 'w>> {
    Ok(match format {
        OutputFormat::Csv => Box::new(CsvReportWriter::new(out)?),
        OutputFormat::Jsonl => Box::new(JsonLinesWriter::new(out)),
    })
}

/// Write every row and flush. Returns the number of rows written.
pub fn write_rows<R, I>(writer: &mut R, rows: I) -> Result<usize>
where
    R: ReportWriter + ?Sized,
    I: IntoIterator<Item = ReportRow>,
{
    let mut count = 0;
    for row in rows {
        writer.write_row(&row)?;
        count += 1;
    }
    writer.finish()?;
    Ok(count)
}

/// CSV sink with a header row and `\r\n` record terminators.
///
/// Fields containing a comma, quote or line break are quoted and embedded
/// quotes doubled.
pub struct CsvReportWriter<W: Write> {
    out: W,
}

impl<W: Write> CsvReportWriter<W> {
    /// Create the writer and emit the header row.
    pub fn new(out: W) -> Result<Self> {
        let mut writer = Self { out };
        writer.write_record(&REPORT_COLUMNS)?;
        Ok(writer)
    }

    fn write_record<S: AsRef<str>>(&mut self, fields: &[S]) -> Result<()> {
        let line = fields
            .iter()
            .map(|f| escape_csv_field(f.as_ref()))
            .collect::<Vec<_>>()
            .join(",");
        write!(self.out, "{}\r\n", line)?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ReportWriter for CsvReportWriter<W> {
    fn write_row(&mut self, row: &ReportRow) -> Result<()> {
        self.write_record(&row.fields())
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

fn escape_csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// JSON Lines sink: one serialized [`ReportRow`] per line.
pub struct JsonLinesWriter<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ReportWriter for JsonLinesWriter<W> {
    fn write_row(&mut self, row: &ReportRow) -> Result<()> {
        serde_json::to_writer(&mut self.out, row)?;
        self.out.write_all(b"\n")?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}
