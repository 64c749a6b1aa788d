//! Core data types for YOLO label records and match results.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A bounding box in YOLO format (class, cx, cy, w, h).
///
/// Coordinates are relative to the image size:
/// - cx, cy: Box center
/// - w, h: Box width and height
///
/// The corner form is derived on demand with [`BoundingBox::to_extrema`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub class_id: u32,
    pub cx: f64,
    pub cy: f64,
    pub w: f64,
    pub h: f64,
}

impl BoundingBox {
    /// Create a new bounding box.
    pub fn new(class_id: u32, cx: f64, cy: f64, w: f64, h: f64) -> Self {
        Self {
            class_id,
            cx,
            cy,
            w,
            h,
        }
    }

    /// Convert to corner coordinates.
    ///
    /// ```
    /// use yolo_eval::types::BoundingBox;
    ///
    /// let bbox = BoundingBox::new(0, 0.5, 0.5, 0.2, 0.4);
    /// let e = bbox.to_extrema();
    /// assert!((e.x_min - 0.4).abs() < 1e-12);
    /// assert!((e.y_max - 0.7).abs() < 1e-12);
    /// ```
    pub fn to_extrema(&self) -> Extrema {
        Extrema {
            x_min: self.cx - self.w / 2.0,
            y_min: self.cy - self.h / 2.0,
            x_max: self.cx + self.w / 2.0,
            y_max: self.cy + self.h / 2.0,
        }
    }

    /// Check if the box has non-negative, finite extent.
    pub fn is_valid(&self) -> bool {
        [self.cx, self.cy, self.w, self.h].iter().all(|v| v.is_finite())
            && self.w >= 0.0
            && self.h >= 0.0
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.class_id, self.cx, self.cy, self.w, self.h
        )
    }
}

/// Corner coordinates of a box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extrema {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

/// A single parsed label line.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub bbox: BoundingBox,
    /// 1-based line number in the source file (0 for in-memory boxes)
    pub line: usize,
    /// Trimmed source text, reproduced verbatim in reports
    pub raw: String,
}

impl Annotation {
    /// Wrap a box that did not come from a file.
    pub fn new(bbox: BoundingBox) -> Self {
        Self {
            raw: bbox.to_string(),
            bbox,
            line: 0,
        }
    }

    /// Build an annotation from a parsed line of text.
    pub fn from_line(bbox: BoundingBox, line: usize, raw: &str) -> Self {
        Self {
            bbox,
            line,
            raw: raw.trim().to_string(),
        }
    }

    pub fn class_id(&self) -> u32 {
        self.bbox.class_id
    }
}

impl From<BoundingBox> for Annotation {
    fn from(bbox: BoundingBox) -> Self {
        Self::new(bbox)
    }
}

/// The ordered boxes of one image for one role.
///
/// Order is significant: it decides greedy tie-breaking in the matcher.
pub type BoxSet = Vec<Annotation>;

/// Which side of the evaluation a label file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    GroundTruth,
    Prediction,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::GroundTruth => f.write_str("ground-truth"),
            Role::Prediction => f.write_str("prediction"),
        }
    }
}

/// How the `+1` pixel offset is applied when computing IoU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IouConvention {
    /// Add 1 to every width and height (discrete pixel grid). Matches reports
    /// produced by earlier runs.
    #[default]
    PixelInclusive,
    /// Plain continuous geometry, no offset.
    Continuous,
}

/// Order in which ground truths claim predictions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchStrategy {
    /// Each ground truth, in input order, takes its best remaining prediction.
    /// An earlier ground truth may take a prediction that a later one
    /// overlaps more.
    #[default]
    GroundTruthOrder,
    /// Pairs are assigned in descending IoU order across the whole image, so
    /// a contested prediction goes to the ground truth it overlaps most.
    BestFirst,
}

/// Classification of a single event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "TP")]
    TruePositive,
    #[serde(rename = "FP")]
    FalsePositive,
    #[serde(rename = "FN")]
    FalseNegative,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::TruePositive => "TP",
            EventKind::FalsePositive => "FP",
            EventKind::FalseNegative => "FN",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
