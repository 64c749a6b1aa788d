//! Stress tests with large label sets and many images.

use yolo_eval::report::{write_rows, CsvReportWriter};
use yolo_eval::{
    match_boxes, Annotation, BoundingBox, EventKind, Evaluator, IouConvention, MatchOptions,
    MatchStrategy, MemorySource, Role,
};

/// A non-overlapping grid of `count` boxes, 100 per row.
fn grid_boxes(count: usize, class_id: u32) -> Vec<BoundingBox> {
    (0..count)
        .map(|i| {
            let cx = (i % 100) as f64 * 0.01 + 0.005;
            let cy = (i / 100) as f64 * 0.1 + 0.05;
            BoundingBox::new(class_id, cx, cy, 0.008, 0.08)
        })
        .collect()
}

fn annotations(boxes: &[BoundingBox]) -> Vec<Annotation> {
    boxes.iter().copied().map(Annotation::new).collect()
}

#[test]
fn test_1000_boxes_single_image() {
    let gts = annotations(&grid_boxes(1000, 0));
    let mut preds = gts.clone();
    preds.reverse();

    for strategy in [MatchStrategy::GroundTruthOrder, MatchStrategy::BestFirst] {
        let options = MatchOptions {
            strategy,
            ..MatchOptions::default()
        };
        let outcome = match_boxes(&gts, &preds, &options).unwrap();

        assert_eq!(outcome.true_positives.len(), 1000, "{:?} should match every box", strategy);
        assert!(outcome.false_positives.is_empty());
        assert!(outcome.false_negatives.is_empty());
        assert!(outcome.true_positives.iter().all(|tp| tp.iou == 1.0));
    }
}

#[test]
fn test_1000_boxes_all_wrong_class() {
    let gts = annotations(&grid_boxes(1000, 0));
    let preds = annotations(&grid_boxes(1000, 1));

    let outcome = match_boxes(&gts, &preds, &MatchOptions::default()).unwrap();

    assert!(outcome.true_positives.is_empty());
    assert_eq!(outcome.false_positives.len(), 1000);
    assert_eq!(outcome.false_negatives.len(), 1000);
}

#[test]
fn test_shifted_grid_continuous() {
    let gts = annotations(&grid_boxes(500, 0));
    // Half a box width to the right: IoU 1/3, below the default threshold
    let preds: Vec<Annotation> = grid_boxes(500, 0)
        .into_iter()
        .map(|b| Annotation::new(BoundingBox { cx: b.cx + 0.004, ..b }))
        .collect();

    let options = MatchOptions {
        convention: IouConvention::Continuous,
        ..MatchOptions::default()
    };
    let strict = match_boxes(&gts, &preds, &options).unwrap();
    assert!(strict.true_positives.is_empty());

    let lenient = match_boxes(&gts, &preds, &MatchOptions { threshold: 0.3, ..options }).unwrap();
    assert_eq!(lenient.true_positives.len(), 500);
}

#[test]
fn test_10_classes_100_images() {
    let mut source = MemorySource::new();
    for image in 0..100 {
        let name = format!("page_{:03}.txt", image);
        let mut gts = Vec::new();
        let mut preds = Vec::new();
        for class_id in 0..10 {
            let boxes = grid_boxes(10, class_id);
            gts.extend(boxes.iter().copied());
            // Every third image misses the last class entirely
            if image % 3 != 0 || class_id != 9 {
                preds.extend(boxes.iter().copied());
            }
        }
        source.insert_boxes(&name, Role::GroundTruth, &gts);
        source.insert_boxes(&name, Role::Prediction, &preds);
    }

    let evaluator = Evaluator::new(source, MatchOptions::default()).unwrap();
    let (rows, stats) = evaluator.evaluate().unwrap();

    let missed_images = (0..100).filter(|i| i % 3 == 0).count();
    assert_eq!(stats.images_evaluated, 100);
    assert_eq!(stats.false_negatives, missed_images * 10);
    assert_eq!(stats.true_positives, 100 * 100 - missed_images * 10);
    assert_eq!(stats.false_positives, 0);
    assert_eq!(rows.len(), stats.total_events());

    // Rows stay grouped by image and sorted by name
    let mut names: Vec<&str> = rows.iter().map(|r| r.filename.as_str()).collect();
    names.dedup();
    assert_eq!(names.len(), 100);
    assert!(names.windows(2).all(|w| w[0] < w[1]));

    let (par_rows, par_stats) = evaluator.evaluate_parallel().unwrap();
    assert_eq!(par_rows, rows);
    assert_eq!(par_stats, stats);
}

#[test]
fn test_large_report_streams() {
    let mut source = MemorySource::new();
    for image in 0..50 {
        let name = format!("{}.txt", image);
        source.insert_boxes(&name, Role::GroundTruth, &grid_boxes(200, 0));
        source.insert_boxes(&name, Role::Prediction, &grid_boxes(100, 0));
    }

    let evaluator = Evaluator::new(source, MatchOptions::default()).unwrap();
    let mut rows = evaluator.rows().unwrap();

    let first = rows.next().unwrap();
    assert_eq!(first.kind, EventKind::TruePositive);
    assert_eq!(rows.stats().images_evaluated, 1);

    let mut writer = CsvReportWriter::new(Vec::new()).unwrap();
    let written = write_rows(&mut writer, rows).unwrap();
    assert_eq!(written, 50 * 200 - 1);

    let text = String::from_utf8(writer.into_inner()).unwrap();
    assert_eq!(text.lines().count(), 50 * 200);
}
