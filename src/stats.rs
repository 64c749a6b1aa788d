//! Statistics tracking for an evaluation run
//!
//! Counts what the evaluator produced and, more importantly, what it had to
//! skip, so callers can tell a clean run from one that silently lost images.

use serde::{Deserialize, Serialize};

/// Counters collected while evaluating image pairs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationStats {
    /// Image pairs that were matched and reported
    pub images_evaluated: usize,

    /// Ground-truth records with no prediction record
    pub images_skipped_missing_prediction: usize,

    /// Prediction records with no ground-truth record
    pub orphan_predictions: usize,

    /// Image pairs dropped because matching failed
    pub images_failed: usize,

    /// Label lines that could not be parsed
    pub parse_errors: usize,

    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

impl EvaluationStats {
    /// Create a new `EvaluationStats` with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a ground-truth record without predictions
    pub fn skip_missing_prediction(&mut self) {
        self.images_skipped_missing_prediction += 1;
    }

    /// Record a prediction record without ground truth
    pub fn add_orphan_prediction(&mut self) {
        self.orphan_predictions += 1;
    }

    /// Record an image pair that failed to match
    pub fn fail_image(&mut self) {
        self.images_failed += 1;
    }

    /// Record unparsable label lines
    pub fn add_parse_errors(&mut self, count: usize) {
        self.parse_errors += count;
    }

    /// Record the outcome of one evaluated image pair
    pub fn add_image(&mut self, tp: usize, fp: usize, fn_: usize) {
        self.images_evaluated += 1;
        self.true_positives += tp;
        self.false_positives += fp;
        self.false_negatives += fn_;
    }

    /// Fold another set of counters into this one
    pub fn merge(&mut self, other: &EvaluationStats) {
        self.images_evaluated += other.images_evaluated;
        self.images_skipped_missing_prediction += other.images_skipped_missing_prediction;
        self.orphan_predictions += other.orphan_predictions;
        self.images_failed += other.images_failed;
        self.parse_errors += other.parse_errors;
        self.true_positives += other.true_positives;
        self.false_positives += other.false_positives;
        self.false_negatives += other.false_negatives;
    }

    /// Total number of images that produced no rows
    pub fn total_skipped(&self) -> usize {
        self.images_skipped_missing_prediction + self.orphan_predictions + self.images_failed
    }

    /// Total number of report rows
    pub fn total_events(&self) -> usize {
        self.true_positives + self.false_positives + self.false_negatives
    }

    /// Get a formatted string summary of the statistics
    pub fn summary_string(&self) -> String {
        format!(
            "EvaluationStats {{ images: {}, skipped: {}, parse_errors: {}, tp: {}, fp: {}, fn: {} }}",
            self.images_evaluated,
            self.total_skipped(),
            self.parse_errors,
            self.true_positives,
            self.false_positives,
            self.false_negatives
        )
    }
}
