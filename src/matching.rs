//! Matching of predicted boxes against ground truth for a single image.

use crate::error::Result;
use crate::metrics::iou::calculate_iou;
use crate::threshold::{validate_threshold, DEFAULT_IOU_THRESHOLD};
use crate::types::{Annotation, EventKind, IouConvention, MatchStrategy};
use std::cmp::Ordering;

/// Parameters controlling how boxes are paired.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchOptions {
    /// Minimum IoU for a pair to count as a true positive
    pub threshold: f64,
    pub convention: IouConvention,
    pub strategy: MatchStrategy,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_IOU_THRESHOLD,
            convention: IouConvention::default(),
            strategy: MatchStrategy::default(),
        }
    }
}

impl MatchOptions {
    /// Default options with a different threshold.
    pub fn with_threshold(threshold: f64) -> Self {
        Self {
            threshold,
            ..Self::default()
        }
    }
}

/// A ground truth paired with the prediction that detected it.
#[derive(Debug, Clone, PartialEq)]
pub struct TruePositive<'a> {
    pub ground_truth: &'a Annotation,
    pub prediction: &'a Annotation,
    pub iou: f64,
}

/// One classified box (or pair of boxes).
#[derive(Debug, Clone, PartialEq)]
pub enum MatchEvent<'a> {
    TruePositive {
        ground_truth: &'a Annotation,
        prediction: &'a Annotation,
        iou: f64,
    },
    FalsePositive {
        prediction: &'a Annotation,
    },
    FalseNegative {
        ground_truth: &'a Annotation,
    },
}

impl<'a> MatchEvent<'a> {
    pub fn kind(&self) -> EventKind {
        match self {
            MatchEvent::TruePositive { .. } => EventKind::TruePositive,
            MatchEvent::FalsePositive { .. } => EventKind::FalsePositive,
            MatchEvent::FalseNegative { .. } => EventKind::FalseNegative,
        }
    }

    /// The box the event is reported under (the ground truth for a TP).
    pub fn primary(&self) -> &'a Annotation {
        match self {
            MatchEvent::TruePositive { ground_truth, .. } => ground_truth,
            MatchEvent::FalsePositive { prediction } => prediction,
            MatchEvent::FalseNegative { ground_truth } => ground_truth,
        }
    }
}

/// Partition of one image's boxes into TP pairs, FPs and FNs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchOutcome<'a> {
    /// Matched pairs, in ground-truth input order
    pub true_positives: Vec<TruePositive<'a>>,
    /// Unconsumed predictions, in prediction input order
    pub false_positives: Vec<&'a Annotation>,
    /// Unmatched ground truths, in ground-truth input order
    pub false_negatives: Vec<&'a Annotation>,
}

impl<'a> MatchOutcome<'a> {
    /// Events in report order: all TPs, then FPs, then FNs.
    pub fn events(&self) -> Vec<MatchEvent<'a>> {
        let tps = self.true_positives.iter().map(|tp| MatchEvent::TruePositive {
            ground_truth: tp.ground_truth,
            prediction: tp.prediction,
            iou: tp.iou,
        });
        let fps = self
            .false_positives
            .iter()
            .map(|&prediction| MatchEvent::FalsePositive { prediction });
        let fns = self
            .false_negatives
            .iter()
            .map(|&ground_truth| MatchEvent::FalseNegative { ground_truth });

        tps.chain(fps).chain(fns).collect()
    }

    pub fn len(&self) -> usize {
        self.true_positives.len() + self.false_positives.len() + self.false_negatives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Match predictions to ground truth boxes for a single image.
///
/// Pairs are only formed between boxes with the same class id. A pair
/// qualifies when its IoU is strictly positive and at least
/// `options.threshold`. Each prediction is consumed by at most one ground
/// truth.
///
/// With [`MatchStrategy::GroundTruthOrder`] every ground truth, in input
/// order, takes the remaining prediction with the highest qualifying IoU; on
/// equal IoU the earlier prediction wins. With [`MatchStrategy::BestFirst`]
/// the qualifying pairs of the whole image are assigned in descending IoU
/// order instead.
///
/// # Arguments
///
/// * `ground_truths` - Ground truth boxes for this image
/// * `predictions` - Predicted boxes for this image
/// * `options` - Threshold, IoU convention and matching strategy
///
/// # Errors
///
/// Returns an error if the threshold is outside `[0, 1]`, or if an IoU is
/// undefined for a same-class pair.
pub fn match_boxes<'a>(
    ground_truths: &'a [Annotation],
    predictions: &'a [Annotation],
    options: &MatchOptions,
) -> Result<MatchOutcome<'a>> {
    validate_threshold(options.threshold)?;

    let assignments = match options.strategy {
        MatchStrategy::GroundTruthOrder => assign_in_order(ground_truths, predictions, options)?,
        MatchStrategy::BestFirst => assign_best_first(ground_truths, predictions, options)?,
    };

    let mut outcome = MatchOutcome::default();
    let mut consumed = vec![false; predictions.len()];

    for (gt, assignment) in ground_truths.iter().zip(assignments) {
        match assignment {
            Some((pred_idx, iou)) => {
                consumed[pred_idx] = true;
                outcome.true_positives.push(TruePositive {
                    ground_truth: gt,
                    prediction: &predictions[pred_idx],
                    iou,
                });
            }
            None => outcome.false_negatives.push(gt),
        }
    }

    outcome.false_positives = predictions
        .iter()
        .zip(consumed)
        .filter_map(|(pred, used)| (!used).then_some(pred))
        .collect();

    Ok(outcome)
}

/// Per ground truth, the index of its prediction and the pair's IoU.
type Assignments = Vec<Option<(usize, f64)>>;

fn assign_in_order(
    ground_truths: &[Annotation],
    predictions: &[Annotation],
    options: &MatchOptions,
) -> Result<Assignments> {
    let mut consumed = vec![false; predictions.len()];
    let mut assignments = Vec::with_capacity(ground_truths.len());

    for gt in ground_truths {
        let mut best_iou = 0.0;
        let mut best_pred_idx: Option<usize> = None;

        for (pred_idx, pred) in predictions.iter().enumerate() {
            if consumed[pred_idx] || pred.class_id() != gt.class_id() {
                continue;
            }

            let iou = calculate_iou(&gt.bbox, &pred.bbox, options.convention)?;
            if iou > best_iou && iou >= options.threshold {
                best_iou = iou;
                best_pred_idx = Some(pred_idx);
            }
        }

        if let Some(pred_idx) = best_pred_idx {
            consumed[pred_idx] = true;
        }
        assignments.push(best_pred_idx.map(|idx| (idx, best_iou)));
    }

    Ok(assignments)
}

fn assign_best_first(
    ground_truths: &[Annotation],
    predictions: &[Annotation],
    options: &MatchOptions,
) -> Result<Assignments> {
    let mut candidates: Vec<(usize, usize, f64)> = Vec::new();

    for (gt_idx, gt) in ground_truths.iter().enumerate() {
        for (pred_idx, pred) in predictions.iter().enumerate() {
            if pred.class_id() != gt.class_id() {
                continue;
            }

            let iou = calculate_iou(&gt.bbox, &pred.bbox, options.convention)?;
            if iou > 0.0 && iou >= options.threshold {
                candidates.push((gt_idx, pred_idx, iou));
            }
        }
    }

    candidates.sort_by(|a, b| {
        b.2.partial_cmp(&a.2)
            .unwrap_or(Ordering::Equal)
            .then(a.0.cmp(&b.0))
            .then(a.1.cmp(&b.1))
    });

    let mut consumed = vec![false; predictions.len()];
    let mut assignments: Assignments = vec![None; ground_truths.len()];

    for (gt_idx, pred_idx, iou) in candidates {
        if assignments[gt_idx].is_none() && !consumed[pred_idx] {
            consumed[pred_idx] = true;
            assignments[gt_idx] = Some((pred_idx, iou));
        }
    }

    Ok(assignments)
}
