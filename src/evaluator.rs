//! Evaluation orchestrator: pairs label records, matches them and emits
//! report rows.

use crate::classes::ClassNames;
use crate::error::{EvalError, Result};
use crate::loader::{LabelSource, ParsedLabels};
use crate::matching::{match_boxes, MatchOptions};
use crate::report::{ReportRow, ReportWriter};
use crate::stats::EvaluationStats;
use crate::threshold::validate_threshold;
use crate::types::Role;
use rayon::prelude::*;
use std::collections::HashSet;

/// Rows and counters for a single image pair.
#[derive(Debug, Clone, Default)]
pub struct ImageReport {
    pub image: String,
    pub rows: Vec<ReportRow>,
    pub stats: EvaluationStats,
}

/// Evaluates every ground-truth record of a [`LabelSource`] against the
/// prediction record with the same name.
///
/// Images are processed in the sorted order the source reports. Within an
/// image rows come as all TPs, then FPs, then FNs. Nothing that goes wrong
/// with a single image stops the run: the image is logged, counted in
/// [`EvaluationStats`] and skipped.
pub struct Evaluator<S> {
    source: S,
    options: MatchOptions,
    class_names: ClassNames,
}

impl<S: LabelSource> Evaluator<S> {
    /// Create an evaluator.
    ///
    /// # Errors
    ///
    /// Returns an error if the threshold in `options` is outside `[0, 1]`.
    pub fn new(source: S, options: MatchOptions) -> Result<Self> {
        validate_threshold(options.threshold)?;
        Ok(Self {
            source,
            options,
            class_names: ClassNames::new(),
        })
    }

    /// Use `class_names` to fill the `classe` column.
    pub fn with_class_names(mut self, class_names: ClassNames) -> Self {
        self.class_names = class_names;
        self
    }

    pub fn options(&self) -> &MatchOptions {
        &self.options
    }

    /// Lazily evaluate the whole source, one image pair at a time.
    ///
    /// # Errors
    ///
    /// Fails only if the source cannot list its records.
    pub fn rows(&self) -> Result<ReportRows<'_, S>> {
        let ground_truth_ids = self.source.image_ids(Role::GroundTruth)?;
        let orphans = orphan_predictions(
            &ground_truth_ids,
            &self.source.image_ids(Role::Prediction)?,
        );

        Ok(ReportRows {
            evaluator: self,
            images: ground_truth_ids.into_iter(),
            pending: Vec::new().into_iter(),
            orphans: Some(orphans),
            stats: EvaluationStats::new(),
        })
    }

    /// Evaluate everything and collect the rows.
    pub fn evaluate(&self) -> Result<(Vec<ReportRow>, EvaluationStats)> {
        let mut rows = self.rows()?;
        let collected: Vec<ReportRow> = rows.by_ref().collect();
        Ok((collected, rows.into_stats()))
    }

    /// Stream every row into `writer` and flush it.
    ///
    /// # Errors
    ///
    /// Fails if the source cannot be listed or the writer fails.
    pub fn write_report<W: ReportWriter + ?Sized>(&self, writer: &mut W) -> Result<EvaluationStats> {
        let mut rows = self.rows()?;
        for row in rows.by_ref() {
            writer.write_row(&row)?;
        }
        writer.finish()?;
        Ok(rows.into_stats())
    }

    /// Evaluate one image pair.
    ///
    /// Problems are recorded in the returned stats rather than returned as
    /// errors.
    pub fn evaluate_image(&self, image: &str) -> ImageReport {
        let mut report = ImageReport {
            image: image.to_string(),
            ..ImageReport::default()
        };

        let ground_truth = match self.load(image, Role::GroundTruth, &mut report.stats) {
            Some(labels) => labels,
            None => {
                report.stats.fail_image();
                return report;
            }
        };

        let predictions = match self.load(image, Role::Prediction, &mut report.stats) {
            Some(labels) => labels,
            None => {
                report.stats.skip_missing_prediction();
                return report;
            }
        };

        match match_boxes(&ground_truth.boxes, &predictions.boxes, &self.options) {
            Ok(outcome) => {
                report.rows = outcome
                    .events()
                    .iter()
                    .map(|event| ReportRow::from_event(image, event, &self.class_names))
                    .collect();
                report.stats.add_image(
                    outcome.true_positives.len(),
                    outcome.false_positives.len(),
                    outcome.false_negatives.len(),
                );
                log::debug!(
                    "{}: {} TP, {} FP, {} FN",
                    image,
                    outcome.true_positives.len(),
                    outcome.false_positives.len(),
                    outcome.false_negatives.len()
                );
            }
            Err(err) => {
                log::warn!("Skipping image '{}': {}", image, err);
                report.stats.fail_image();
            }
        }

        report
    }

    /// Load one record, logging and counting everything that goes wrong.
    fn load(&self, image: &str, role: Role, stats: &mut EvaluationStats) -> Option<ParsedLabels> {
        match self.source.load(image, role) {
            Ok(Some(labels)) => {
                for err in &labels.errors {
                    log::warn!("Skipping label line: {}", err);
                }
                stats.add_parse_errors(labels.errors.len());
                Some(labels)
            }
            Ok(None) => {
                let err = EvalError::MissingPair {
                    image: image.to_string(),
                    role,
                };
                log::warn!("Skipping image: {}", err);
                None
            }
            Err(err) => {
                log::warn!("Skipping image '{}': failed to read {} labels: {}", image, role, err);
                None
            }
        }
    }
}

impl<S: LabelSource + Sync> Evaluator<S> {
    /// Evaluate image pairs on the rayon thread pool.
    ///
    /// Produces exactly the rows and counters of [`Evaluator::evaluate`], in
    /// the same order.
    pub fn evaluate_parallel(&self) -> Result<(Vec<ReportRow>, EvaluationStats)> {
        let ground_truth_ids = self.source.image_ids(Role::GroundTruth)?;
        let orphans = orphan_predictions(
            &ground_truth_ids,
            &self.source.image_ids(Role::Prediction)?,
        );

        let reports: Vec<ImageReport> = ground_truth_ids
            .par_iter()
            .map(|image| self.evaluate_image(image))
            .collect();

        let mut stats = EvaluationStats::new();
        let mut rows = Vec::new();
        for report in reports {
            stats.merge(&report.stats);
            rows.extend(report.rows);
        }
        record_orphans(&orphans, &mut stats);
        log::info!("{}", stats.summary_string());

        Ok((rows, stats))
    }

    /// Evaluate in parallel, then write rows from the calling thread.
    pub fn write_report_parallel<W: ReportWriter + ?Sized>(
        &self,
        writer: &mut W,
    ) -> Result<EvaluationStats> {
        let (rows, stats) = self.evaluate_parallel()?;
        for row in &rows {
            writer.write_row(row)?;
        }
        writer.finish()?;
        Ok(stats)
    }
}

/// Lazy, non-restartable sequence of report rows.
///
/// Holds at most one image pair's rows at a time.
pub struct ReportRows<'e, S> {
    evaluator: &'e Evaluator<S>,
    images: std::vec::IntoIter<String>,
    pending: std::vec::IntoIter<ReportRow>,
    orphans: Option<Vec<String>>,
    stats: EvaluationStats,
}

impl<'e, S> ReportRows<'e, S> {
    /// Counters for the images processed so far.
    pub fn stats(&self) -> &EvaluationStats {
        &self.stats
    }

    pub fn into_stats(self) -> EvaluationStats {
        self.stats
    }
}

impl<'e, S: LabelSource> Iterator for ReportRows<'e, S> {
    type Item = ReportRow;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(row) = self.pending.next() {
                return Some(row);
            }

            match self.images.next() {
                Some(image) => {
                    let report = self.evaluator.evaluate_image(&image);
                    self.stats.merge(&report.stats);
                    self.pending = report.rows.into_iter();
                }
                None => {
                    if let Some(orphans) = self.orphans.take() {
                        record_orphans(&orphans, &mut self.stats);
                        log::info!("{}", self.stats.summary_string());
                    }
                    return None;
                }
            }
        }
    }
}

/// Prediction ids with no ground-truth counterpart, in prediction order.
fn orphan_predictions(ground_truth_ids: &[String], prediction_ids: &[String]) -> Vec<String> {
    let known: HashSet<&str> = ground_truth_ids.iter().map(String::as_str).collect();
    prediction_ids
        .iter()
        .filter(|id| !known.contains(id.as_str()))
        .cloned()
        .collect()
}

fn record_orphans(orphans: &[String], stats: &mut EvaluationStats) {
    for image in orphans {
        let err = EvalError::MissingPair {
            image: image.clone(),
            role: Role::GroundTruth,
        };
        log::warn!("Ignoring predictions: {}", err);
        stats.add_orphan_prediction();
    }
}
