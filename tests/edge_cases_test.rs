//! Edge case tests for parsing, IoU and matching.

use std::fs;
use std::path::Path;
use yolo_eval::loader::parse_label_line;
use yolo_eval::{
    calculate_iou, match_boxes, parse_labels, Annotation, BoundingBox, DirectorySource,
    EvalError, EventKind, Evaluator, IouConvention, MatchOptions, MatchStrategy, MemorySource,
    Role,
};

fn ann(class_id: u32, cx: f64, cy: f64, w: f64, h: f64) -> Annotation {
    Annotation::new(BoundingBox::new(class_id, cx, cy, w, h))
}

fn continuous(threshold: f64) -> MatchOptions {
    MatchOptions {
        threshold,
        convention: IouConvention::Continuous,
        ..MatchOptions::default()
    }
}

// ============================================================================
// Label parsing
// ============================================================================

#[test]
fn test_blank_and_whitespace_lines_skipped() {
    let parsed = parse_labels("\n   \n0 0.5 0.5 0.2 0.2\n\t\n", Path::new("a.txt"));
    assert_eq!(parsed.boxes.len(), 1);
    assert!(parsed.errors.is_empty());
    assert_eq!(parsed.boxes[0].line, 3);
}

#[test]
fn test_crlf_and_extra_spacing() {
    let parsed = parse_labels("0  0.5\t0.5 0.2 0.2\r\n1 0.1 0.1 0.1 0.1\r\n", Path::new("a.txt"));
    assert_eq!(parsed.boxes.len(), 2);
    assert_eq!(parsed.boxes[0].raw, "0  0.5\t0.5 0.2 0.2");
    assert_eq!(parsed.boxes[1].raw, "1 0.1 0.1 0.1 0.1");
}

#[test]
fn test_confidence_column_ignored_but_kept_in_raw() {
    let ann = parse_label_line("3 0.5 0.5 0.2 0.2 0.87", Path::new("p.txt"), 1)
        .unwrap()
        .unwrap();
    assert_eq!(ann.bbox, BoundingBox::new(3, 0.5, 0.5, 0.2, 0.2));
    assert_eq!(ann.raw, "3 0.5 0.5 0.2 0.2 0.87");
}

#[test]
fn test_scientific_notation_coordinates() {
    let ann = parse_label_line("0 5e-1 0.5 2E-1 0.2", Path::new("a.txt"), 1)
        .unwrap()
        .unwrap();
    assert!((ann.bbox.cx - 0.5).abs() < 1e-12);
    assert!((ann.bbox.w - 0.2).abs() < 1e-12);
}

#[test]
fn test_zero_size_box_is_accepted() {
    let ann = parse_label_line("0 0.5 0.5 0 0", Path::new("a.txt"), 1).unwrap();
    assert!(ann.is_some());
}

#[test]
fn test_rejected_lines() {
    for line in [
        "0 0.5 0.5 0.2",
        "-1 0.5 0.5 0.2 0.2",
        "1.5 0.5 0.5 0.2 0.2",
        "0 nan 0.5 0.2 0.2",
        "0 0.5 inf 0.2 0.2",
        "0 0.5 0.5 -0.2 0.2",
        "cat 0.5 0.5 0.2 0.2",
    ] {
        let result = parse_label_line(line, Path::new("bad.txt"), 7);
        assert!(
            matches!(result, Err(EvalError::Parse { line: 7, .. })),
            "line '{}' should be rejected",
            line
        );
    }
}

// ============================================================================
// IoU
// ============================================================================

#[test]
fn test_touching_boxes() {
    let a = BoundingBox::new(0, 0.25, 0.5, 0.5, 0.5);
    let b = BoundingBox::new(0, 0.75, 0.5, 0.5, 0.5);

    let iou = calculate_iou(&a, &b, IouConvention::Continuous).unwrap();
    assert!(iou.abs() < 1e-12, "edge contact should give 0, got {}", iou);
}

#[test]
fn test_pixel_convention_on_relative_coordinates() {
    // The +1 dominates sub-unit extents, so far-apart boxes still overlap.
    let a = BoundingBox::new(0, 0.1, 0.1, 0.1, 0.1);
    let b = BoundingBox::new(0, 0.9, 0.9, 0.1, 0.1);

    let iou = calculate_iou(&a, &b, IouConvention::PixelInclusive).unwrap();
    assert!(iou > 0.0 && iou < 1.0);
}

#[test]
fn test_contained_box() {
    let outer = BoundingBox::new(0, 0.5, 0.5, 0.4, 0.4);
    let inner = BoundingBox::new(0, 0.5, 0.5, 0.2, 0.2);

    let iou = calculate_iou(&outer, &inner, IouConvention::Continuous).unwrap();
    assert!((iou - 0.25).abs() < 1e-9, "expected 0.25, got {}", iou);
}

// ============================================================================
// Matching
// ============================================================================

#[test]
fn test_both_sides_empty() {
    let outcome = match_boxes(&[], &[], &MatchOptions::default()).unwrap();
    assert!(outcome.is_empty());
}

#[test]
fn test_only_predictions() {
    let preds = vec![ann(0, 0.5, 0.5, 0.1, 0.1), ann(1, 0.2, 0.2, 0.1, 0.1)];
    let outcome = match_boxes(&[], &preds, &MatchOptions::default()).unwrap();

    let kinds: Vec<EventKind> = outcome.events().iter().map(|e| e.kind()).collect();
    assert_eq!(kinds, vec![EventKind::FalsePositive, EventKind::FalsePositive]);
}

#[test]
fn test_only_ground_truth() {
    let gts = vec![ann(0, 0.5, 0.5, 0.1, 0.1)];
    let outcome = match_boxes(&gts, &[], &MatchOptions::default()).unwrap();

    assert_eq!(outcome.false_negatives.len(), 1);
    assert!(outcome.true_positives.is_empty());
}

#[test]
fn test_threshold_zero_still_needs_overlap() {
    let gts = vec![ann(0, 0.1, 0.1, 0.1, 0.1)];
    let preds = vec![ann(0, 0.9, 0.9, 0.1, 0.1)];

    let outcome = match_boxes(&gts, &preds, &continuous(0.0)).unwrap();
    assert!(outcome.true_positives.is_empty());
    assert_eq!(outcome.false_positives.len(), 1);
    assert_eq!(outcome.false_negatives.len(), 1);
}

#[test]
fn test_threshold_one_requires_exact_match() {
    let gts = vec![ann(0, 0.5, 0.5, 0.2, 0.2), ann(0, 0.2, 0.2, 0.1, 0.1)];
    let preds = vec![ann(0, 0.5, 0.5, 0.2, 0.2), ann(0, 0.21, 0.2, 0.1, 0.1)];

    let outcome = match_boxes(&gts, &preds, &continuous(1.0)).unwrap();
    assert_eq!(outcome.true_positives.len(), 1);
    assert_eq!(outcome.true_positives[0].iou, 1.0);
}

#[test]
fn test_iou_exactly_at_threshold_matches() {
    let gts = vec![ann(0, 0.5, 0.5, 0.4, 0.4)];
    let preds = vec![ann(0, 0.5, 0.5, 0.2, 0.2)];

    let outcome = match_boxes(&gts, &preds, &continuous(0.25)).unwrap();
    let iou = calculate_iou(&gts[0].bbox, &preds[0].bbox, IouConvention::Continuous).unwrap();
    let outcome_above = match_boxes(&gts, &preds, &continuous(iou)).unwrap();

    assert_eq!(outcome_above.true_positives.len(), 1);
    assert_eq!(outcome.true_positives.len(), usize::from(iou >= 0.25));
}

#[test]
fn test_duplicate_predictions_one_consumed() {
    let gts = vec![ann(0, 0.5, 0.5, 0.2, 0.2)];
    let preds = vec![ann(0, 0.5, 0.5, 0.2, 0.2), ann(0, 0.5, 0.5, 0.2, 0.2)];

    let outcome = match_boxes(&gts, &preds, &MatchOptions::default()).unwrap();
    assert_eq!(outcome.true_positives.len(), 1);
    assert!(std::ptr::eq(outcome.true_positives[0].prediction, &preds[0]));
    assert!(std::ptr::eq(outcome.false_positives[0], &preds[1]));
}

#[test]
fn test_greedy_order_can_miss_better_assignment() {
    // gt0 grabs the only prediction gt1 could use.
    let gts = vec![ann(0, 0.5, 0.5, 0.2, 0.2), ann(0, 0.45, 0.5, 0.2, 0.2)];
    let preds = vec![ann(0, 0.47, 0.5, 0.2, 0.2), ann(0, 0.55, 0.5, 0.2, 0.2)];

    let greedy = match_boxes(&gts, &preds, &continuous(0.5)).unwrap();
    let best_first = match_boxes(
        &gts,
        &preds,
        &MatchOptions {
            strategy: MatchStrategy::BestFirst,
            ..continuous(0.5)
        },
    )
    .unwrap();

    assert_eq!(greedy.true_positives.len(), 1);
    assert!(std::ptr::eq(greedy.true_positives[0].prediction, &preds[0]));
    assert_eq!(greedy.false_negatives.len(), 1);

    assert_eq!(best_first.true_positives.len(), 2);
    assert!(std::ptr::eq(best_first.true_positives[0].prediction, &preds[1]));
    assert!(std::ptr::eq(best_first.true_positives[1].prediction, &preds[0]));
}

#[test]
fn test_degenerate_boxes_error_under_continuous() {
    let gts = vec![ann(0, 0.5, 0.5, 0.0, 0.0)];
    let preds = vec![ann(0, 0.5, 0.5, 0.0, 0.0)];

    let result = match_boxes(&gts, &preds, &continuous(0.5));
    assert!(matches!(result, Err(EvalError::DivisionByZero { .. })));

    // Different classes are never compared, so no error.
    let other = vec![ann(1, 0.5, 0.5, 0.0, 0.0)];
    assert!(match_boxes(&gts, &other, &continuous(0.5)).is_ok());
}

// ============================================================================
// Evaluator
// ============================================================================

#[test]
fn test_evaluator_skips_failing_image_and_continues() {
    let source = MemorySource::new()
        .with_text("a.txt", Role::GroundTruth, "0 0.5 0.5 0 0\n")
        .with_text("a.txt", Role::Prediction, "0 0.5 0.5 0 0\n")
        .with_text("b.txt", Role::GroundTruth, "0 0.5 0.5 0.2 0.2\n")
        .with_text("b.txt", Role::Prediction, "0 0.5 0.5 0.2 0.2\n");

    let evaluator = Evaluator::new(source, continuous(0.5)).unwrap();
    let (rows, stats) = evaluator.evaluate().unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].filename, "b.txt");
    assert_eq!(stats.images_failed, 1);
    assert_eq!(stats.images_evaluated, 1);
}

#[test]
fn test_evaluator_empty_source() {
    let evaluator = Evaluator::new(MemorySource::new(), MatchOptions::default()).unwrap();
    let (rows, stats) = evaluator.evaluate().unwrap();

    assert!(rows.is_empty());
    assert_eq!(stats.images_evaluated, 0);
    assert_eq!(stats.total_skipped(), 0);
}

#[test]
fn test_evaluator_both_records_empty() {
    let source = MemorySource::new()
        .with_text("a.txt", Role::GroundTruth, "")
        .with_text("a.txt", Role::Prediction, "");

    let evaluator = Evaluator::new(source, MatchOptions::default()).unwrap();
    let (rows, stats) = evaluator.evaluate().unwrap();

    assert!(rows.is_empty());
    assert_eq!(stats.images_evaluated, 1);
}

#[test]
fn test_invalid_utf8_line_only_drops_that_line() {
    let temp = tempfile::tempdir().unwrap();
    let gt_dir = temp.path().join("labels_ann");
    let pred_dir = temp.path().join("labels_pred");
    fs::create_dir_all(&gt_dir).unwrap();
    fs::create_dir_all(&pred_dir).unwrap();

    fs::write(gt_dir.join("page.txt"), b"0 0.5 0.5 0.2 0.2\n1 0.3 0.3 0.1 0.1 \xe9\n").unwrap();
    fs::write(pred_dir.join("page.txt"), "0 0.5 0.5 0.2 0.2\n").unwrap();

    let evaluator =
        Evaluator::new(DirectorySource::new(&gt_dir, &pred_dir), MatchOptions::default()).unwrap();
    let (rows, stats) = evaluator.evaluate().unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].kind, EventKind::TruePositive);
    assert_eq!(stats.parse_errors, 1);
    assert_eq!(stats.images_failed, 0);
    assert_eq!(stats.images_evaluated, 1);
}

#[test]
fn test_class_list_in_label_directory_is_not_an_image() {
    let temp = tempfile::tempdir().unwrap();
    let gt_dir = temp.path().join("labels_ann");
    let pred_dir = temp.path().join("labels_pred");
    fs::create_dir_all(&gt_dir).unwrap();
    fs::create_dir_all(&pred_dir).unwrap();

    fs::write(gt_dir.join("classes.txt"), "miniature\nbook-in-miniature\n").unwrap();
    fs::write(pred_dir.join("classes.txt"), "miniature\nbook-in-miniature\n").unwrap();
    fs::write(gt_dir.join("page.txt"), "0 0.5 0.5 0.2 0.2\n").unwrap();
    fs::write(pred_dir.join("page.txt"), "0 0.5 0.5 0.2 0.2\n").unwrap();

    let evaluator =
        Evaluator::new(DirectorySource::new(&gt_dir, &pred_dir), MatchOptions::default()).unwrap();
    let (rows, stats) = evaluator.evaluate().unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].filename, "page.txt");
    assert_eq!(stats.parse_errors, 0);
    assert_eq!(stats.total_skipped(), 0);
}
