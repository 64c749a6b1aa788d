//! Sweep the IoU threshold and watch TP/FP/FN counts shift.

use yolo_eval::threshold::{
    generate_threshold_range, LENIENT_IOU_THRESHOLD, STRICT_IOU_THRESHOLD,
};
use yolo_eval::{BoundingBox, Evaluator, IouConvention, MatchOptions, MemorySource, Role};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== IoU Threshold Sweep ===\n");

    // Predictions drift further from ground truth on each page
    let mut source = MemorySource::new();
    for page in 0..10 {
        let drift = page as f64 * 0.01;
        let name = format!("page_{:03}.txt", page);
        source.insert_boxes(
            &name,
            Role::GroundTruth,
            &[
                BoundingBox::new(0, 0.3, 0.3, 0.2, 0.2),
                BoundingBox::new(1, 0.7, 0.7, 0.1, 0.15),
            ],
        );
        source.insert_boxes(
            &name,
            Role::Prediction,
            &[
                BoundingBox::new(0, 0.3 + drift, 0.3, 0.2, 0.2),
                BoundingBox::new(1, 0.7, 0.7 + drift, 0.1, 0.15),
            ],
        );
    }

    println!("{:>9} {:>5} {:>5} {:>5} {:>10}", "threshold", "TP", "FP", "FN", "precision");
    for threshold in generate_threshold_range(LENIENT_IOU_THRESHOLD, STRICT_IOU_THRESHOLD, 14)? {
        let options = MatchOptions {
            threshold,
            convention: IouConvention::Continuous,
            ..MatchOptions::default()
        };
        let (_, stats) = Evaluator::new(&source, options)?.evaluate()?;

        let predicted = stats.true_positives + stats.false_positives;
        let precision = if predicted > 0 {
            stats.true_positives as f64 / predicted as f64
        } else {
            0.0
        };
        println!(
            "{:>9.3} {:>5} {:>5} {:>5} {:>10.3}",
            threshold, stats.true_positives, stats.false_positives, stats.false_negatives, precision
        );
    }

    Ok(())
}
