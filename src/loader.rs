//! Label record discovery and parsing.
//!
//! A label record is one text file per image with one box per line:
//! `<class_id> <cx> <cy> <w> <h>`. Ground truth and predictions live in
//! separate places and are paired by identical file name.
//!
//! [`LabelSource`] hides where records come from so the evaluator can run
//! against a directory tree ([`DirectorySource`]) or in-memory fixtures
//! ([`MemorySource`]).

use crate::error::{EvalError, Result};
use crate::types::{Annotation, BoundingBox, BoxSet, Role};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// File extension of label records.
pub const LABEL_EXTENSION: &str = "txt";

/// Class list that YOLO exports place next to the label files.
pub const CLASS_NAMES_FILE: &str = "classes.txt";

/// Boxes parsed from one record, plus the lines that could not be parsed.
#[derive(Debug, Default)]
pub struct ParsedLabels {
    pub boxes: BoxSet,
    pub errors: Vec<EvalError>,
}

/// Parse a single label line.
///
/// Blank lines yield `Ok(None)`. Tokens after the fifth (such as a
/// confidence column in prediction files) are ignored.
///
/// # Errors
///
/// Returns [`EvalError::Parse`] for short lines, unparsable numbers and
/// negative or non-finite box extents.
pub fn parse_label_line(line: &str, path: &Path, line_num: usize) -> Result<Option<Annotation>> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let tokens: Vec<&str> = trimmed.split_whitespace().take(5).collect();
    if tokens.len() < 5 {
        return Err(parse_error(
            path,
            line_num,
            format!("expected 5 fields, found {}", tokens.len()),
        ));
    }

    let class_id = tokens[0].parse::<u32>().map_err(|_| {
        parse_error(
            path,
            line_num,
            format!(
                "invalid class id '{}'; expected non-negative integer",
                tokens[0]
            ),
        )
    })?;

    let cx = parse_coordinate(tokens[1], "cx", path, line_num)?;
    let cy = parse_coordinate(tokens[2], "cy", path, line_num)?;
    let w = parse_coordinate(tokens[3], "w", path, line_num)?;
    let h = parse_coordinate(tokens[4], "h", path, line_num)?;

    let bbox = BoundingBox::new(class_id, cx, cy, w, h);
    if !bbox.is_valid() {
        return Err(parse_error(
            path,
            line_num,
            format!("negative box extent (w={}, h={})", w, h),
        ));
    }

    Ok(Some(Annotation::from_line(bbox, line_num, trimmed)))
}

fn parse_coordinate(token: &str, field: &str, path: &Path, line_num: usize) -> Result<f64> {
    match token.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(parse_error(
            path,
            line_num,
            format!("invalid {} '{}'; expected a finite number", field, token),
        )),
    }
}

fn parse_error(path: &Path, line: usize, message: String) -> EvalError {
    EvalError::Parse {
        path: path.to_path_buf(),
        line,
        message,
    }
}

/// Parse every line of a record.
///
/// Malformed lines are collected in [`ParsedLabels::errors`] and the rest
/// of the record is still returned.
///
/// # Example
///
/// ```
/// use std::path::Path;
/// use yolo_eval::loader::parse_labels;
///
/// let parsed = parse_labels("0 0.5 0.5 0.2 0.2\nbad line\n", Path::new("a.txt"));
/// assert_eq!(parsed.boxes.len(), 1);
/// assert_eq!(parsed.errors.len(), 1);
/// ```
pub fn parse_labels(content: &str, path: &Path) -> ParsedLabels {
    parse_label_bytes(content.as_bytes(), path)
}

/// Parse a record read as raw bytes.
///
/// Each line is decoded on its own, so invalid UTF-8 only costs the line it
/// appears on.
pub fn parse_label_bytes(content: &[u8], path: &Path) -> ParsedLabels {
    let mut parsed = ParsedLabels::default();

    for (idx, bytes) in content.split(|&b| b == b'\n').enumerate() {
        let line_num = idx + 1;
        let result = match std::str::from_utf8(bytes) {
            Ok(line) => parse_label_line(line, path, line_num),
            Err(err) => Err(parse_error(
                path,
                line_num,
                format!("invalid UTF-8 at byte {}", err.valid_up_to()),
            )),
        };

        match result {
            Ok(Some(annotation)) => parsed.boxes.push(annotation),
            Ok(None) => {}
            Err(err) => parsed.errors.push(err),
        }
    }

    parsed
}

/// Where label records come from.
///
/// Implementations must return image ids in a stable, sorted order; the
/// evaluator relies on it for deterministic output.
pub trait LabelSource {
    /// Ids of all images with a record for `role`, sorted.
    fn image_ids(&self, role: Role) -> Result<Vec<String>>;

    /// Load the record for `image`, or `None` if it has none for `role`.
    fn load(&self, image: &str, role: Role) -> Result<Option<ParsedLabels>>;
}

impl<T: LabelSource + ?Sized> LabelSource for &T {
    fn image_ids(&self, role: Role) -> Result<Vec<String>> {
        (**self).image_ids(role)
    }

    fn load(&self, image: &str, role: Role) -> Result<Option<ParsedLabels>> {
        (**self).load(image, role)
    }
}

/// Label records stored as `*.txt` files in two directories.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    ground_truth_dir: PathBuf,
    prediction_dir: PathBuf,
}

impl DirectorySource {
    pub fn new<P1: AsRef<Path>, P2: AsRef<Path>>(ground_truth_dir: P1, prediction_dir: P2) -> Self {
        Self {
            ground_truth_dir: ground_truth_dir.as_ref().to_path_buf(),
            prediction_dir: prediction_dir.as_ref().to_path_buf(),
        }
    }

    fn dir(&self, role: Role) -> &Path {
        match role {
            Role::GroundTruth => &self.ground_truth_dir,
            Role::Prediction => &self.prediction_dir,
        }
    }
}

impl LabelSource for DirectorySource {
    fn image_ids(&self, role: Role) -> Result<Vec<String>> {
        let mut ids = Vec::new();

        for entry in fs::read_dir(self.dir(role))? {
            let path = entry?.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(LABEL_EXTENSION)
            {
                continue;
            }

            match path.file_name().and_then(|n| n.to_str()) {
                Some(CLASS_NAMES_FILE) => {
                    log::debug!("Not a label record: {}", path.display());
                }
                Some(name) => ids.push(name.to_string()),
                None => log::warn!("Skipping non UTF-8 file name: {}", path.display()),
            }
        }

        ids.sort();
        Ok(ids)
    }

    fn load(&self, image: &str, role: Role) -> Result<Option<ParsedLabels>> {
        let path = self.dir(role).join(image);
        if !path.is_file() {
            return Ok(None);
        }

        let content = fs::read(&path)?;
        Ok(Some(parse_label_bytes(&content, &path)))
    }
}

/// In-memory label records keyed by image id.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    ground_truths: BTreeMap<String, String>,
    predictions: BTreeMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record as raw label text.
    pub fn insert_text(&mut self, image: &str, role: Role, content: &str) {
        self.records_mut(role)
            .insert(image.to_string(), content.to_string());
    }

    /// Add a record from boxes, one line per box.
    pub fn insert_boxes(&mut self, image: &str, role: Role, boxes: &[BoundingBox]) {
        let content: String = boxes.iter().map(|b| format!("{}\n", b)).collect();
        self.insert_text(image, role, &content);
    }

    pub fn with_text(mut self, image: &str, role: Role, content: &str) -> Self {
        self.insert_text(image, role, content);
        self
    }

    pub fn with_boxes(mut self, image: &str, role: Role, boxes: &[BoundingBox]) -> Self {
        self.insert_boxes(image, role, boxes);
        self
    }

    fn records(&self, role: Role) -> &BTreeMap<String, String> {
        match role {
            Role::GroundTruth => &self.ground_truths,
            Role::Prediction => &self.predictions,
        }
    }

    fn records_mut(&mut self, role: Role) -> &mut BTreeMap<String, String> {
        match role {
            Role::GroundTruth => &mut self.ground_truths,
            Role::Prediction => &mut self.predictions,
        }
    }
}

impl LabelSource for MemorySource {
    fn image_ids(&self, role: Role) -> Result<Vec<String>> {
        Ok(self.records(role).keys().cloned().collect())
    }

    fn load(&self, image: &str, role: Role) -> Result<Option<ParsedLabels>> {
        Ok(self
            .records(role)
            .get(image)
            .map(|content| parse_labels(content, Path::new(image))))
    }
}
