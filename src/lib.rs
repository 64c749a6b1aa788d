//! # yolo-eval
//!
//! A Rust library for per-box evaluation of YOLO-format object detections
//! against ground-truth labels.
//!
//! Instead of aggregate scores, every box is classified:
//! - **TP** (true positive): a prediction matched to a ground truth box of the
//!   same class with IoU at or above the threshold
//! - **FP** (false positive): a prediction nothing was matched to
//! - **FN** (false negative): a ground truth box no prediction was matched to
//!
//! The result is a flat table (CSV or JSON Lines) with one row per event,
//! ready for downstream aggregation.
//!
//! ## Features
//!
//! - Parse YOLO label files (`class cx cy w h`, relative coordinates)
//! - Pair ground truth and prediction files by file name
//! - IoU with the discrete-pixel `+1` convention or plain continuous geometry
//! - Greedy one-to-one matching per image and per class
//! - Lazy row iteration, or parallel evaluation across images with rayon
//!
//! ## Quick Start
//!
//! ```rust
//! use yolo_eval::{Evaluator, MatchOptions, MemorySource, Role};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let source = MemorySource::new()
//!     .with_text("img1.txt", Role::GroundTruth, "0 0.5 0.5 0.2 0.2\n")
//!     .with_text("img1.txt", Role::Prediction, "0 0.5 0.5 0.2 0.2\n");
//!
//! let evaluator = Evaluator::new(source, MatchOptions::default())?;
//! for row in evaluator.rows()? {
//!     println!("{} {} {:?}", row.filename, row.kind, row.iou);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Label Format
//!
//! One text file per image, one box per line:
//!
//! ```text
//! <class_id> <cx> <cy> <w> <h>
//! 0 0.512 0.430 0.210 0.180
//! ```
//!
//! Ground truth and predictions live in separate directories; files with the
//! same name describe the same image.

pub mod error;
pub mod types;
pub mod loader;
pub mod classes;
pub mod threshold;
pub mod metrics;
pub mod matching;
pub mod stats;
pub mod report;
pub mod config;
pub mod evaluator;

// Re-export commonly used types and functions
pub use error::{EvalError, Result};
pub use types::{
    Annotation, BoundingBox, BoxSet, EventKind, Extrema, IouConvention, MatchStrategy, Role,
};
pub use loader::{parse_labels, DirectorySource, LabelSource, MemorySource, ParsedLabels};
pub use classes::ClassNames;
pub use matching::{match_boxes, MatchEvent, MatchOptions, MatchOutcome, TruePositive};
pub use metrics::calculate_iou;
pub use stats::EvaluationStats;
pub use report::{CsvReportWriter, JsonLinesWriter, OutputFormat, ReportRow, ReportWriter};
pub use config::EvalConfig;
pub use evaluator::{Evaluator, ReportRows};
