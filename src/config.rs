//! Evaluation settings.
//!
//! Settings come from the caller, optionally seeded from a TOML file:
//!
//! ```toml
//! threshold = 0.5
//! iou_convention = "pixel-inclusive"
//! strategy = "ground-truth-order"
//!
//! [paths]
//! ground_truth = "labels_ann"
//! predictions = "labels_pred"
//! output = "results_for_graphics.csv"
//! classes = "classes.txt"
//!
//! [output]
//! format = "csv"
//! ```

use crate::error::{EvalError, Result};
use crate::matching::MatchOptions;
use crate::report::OutputFormat;
use crate::threshold::{validate_threshold, DEFAULT_IOU_THRESHOLD};
use crate::types::{IouConvention, MatchStrategy};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct EvalConfigFile {
    threshold: Option<f64>,
    iou_convention: Option<IouConvention>,
    strategy: Option<MatchStrategy>,
    parallel: Option<bool>,
    paths: Option<PathsConfigFile>,
    output: Option<OutputConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct PathsConfigFile {
    ground_truth: Option<PathBuf>,
    predictions: Option<PathBuf>,
    output: Option<PathBuf>,
    classes: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct OutputConfigFile {
    format: Option<OutputFormat>,
}

/// Resolved settings for one evaluation run.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalConfig {
    pub threshold: f64,
    pub iou_convention: IouConvention,
    pub strategy: MatchStrategy,
    pub ground_truth_dir: Option<PathBuf>,
    pub prediction_dir: Option<PathBuf>,
    /// Report destination; stdout when `None`
    pub output: Option<PathBuf>,
    pub format: OutputFormat,
    pub classes: Option<PathBuf>,
    /// Evaluate image pairs on the rayon pool
    pub parallel: bool,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_IOU_THRESHOLD,
            iou_convention: IouConvention::default(),
            strategy: MatchStrategy::default(),
            ground_truth_dir: None,
            prediction_dir: None,
            output: None,
            format: OutputFormat::default(),
            classes: None,
            parallel: false,
        }
    }
}

impl EvalConfig {
    /// Load settings from a TOML file, filling gaps with defaults.
    ///
    /// Relative paths in the file are resolved against the file's directory.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        let cfg = Self::from_toml_str(&content, base)?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(cfg)
    }

    /// Parse settings from TOML text, resolving relative paths against `base`.
    pub fn from_toml_str(content: &str, base: &Path) -> Result<Self> {
        let file: EvalConfigFile = toml::from_str(content)?;
        let cfg = Self::from_file(file, base);
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: EvalConfigFile, base: &Path) -> Self {
        let defaults = Self::default();
        let paths = file.paths.unwrap_or_default();
        let resolve = |p: Option<PathBuf>| p.map(|p| base.join(p));

        Self {
            threshold: file.threshold.unwrap_or(defaults.threshold),
            iou_convention: file.iou_convention.unwrap_or(defaults.iou_convention),
            strategy: file.strategy.unwrap_or(defaults.strategy),
            ground_truth_dir: resolve(paths.ground_truth),
            prediction_dir: resolve(paths.predictions),
            output: resolve(paths.output),
            format: file
                .output
                .and_then(|o| o.format)
                .unwrap_or(defaults.format),
            classes: resolve(paths.classes),
            parallel: file.parallel.unwrap_or(defaults.parallel),
        }
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        validate_threshold(self.threshold)
    }

    /// Matcher options derived from these settings.
    pub fn match_options(&self) -> MatchOptions {
        MatchOptions {
            threshold: self.threshold,
            convention: self.iou_convention,
            strategy: self.strategy,
        }
    }
}

impl FromStr for IouConvention {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pixel" | "pixel-inclusive" => Ok(IouConvention::PixelInclusive),
            "continuous" => Ok(IouConvention::Continuous),
            other => Err(EvalError::InvalidArgument(format!(
                "unknown IoU convention '{}'; expected pixel or continuous",
                other
            ))),
        }
    }
}

impl FromStr for MatchStrategy {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ground-truth-order" | "greedy" => Ok(MatchStrategy::GroundTruthOrder),
            "best-first" => Ok(MatchStrategy::BestFirst),
            other => Err(EvalError::InvalidArgument(format!(
                "unknown match strategy '{}'; expected ground-truth-order or best-first",
                other
            ))),
        }
    }
}
