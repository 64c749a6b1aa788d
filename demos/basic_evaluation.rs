//! Basic evaluation example demonstrating core functionality.

use yolo_eval::report::{create_writer, write_rows};
use yolo_eval::{
    calculate_iou, match_boxes, parse_labels, BoundingBox, ClassNames, Evaluator, IouConvention,
    MatchOptions, MemorySource, OutputFormat, Role,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== YOLO Evaluation Example ===\n");

    // Example 1: IoU under both conventions
    println!("1. IoU Calculation");
    let bbox1 = BoundingBox::new(0, 0.50, 0.50, 0.20, 0.20);
    let bbox2 = BoundingBox::new(0, 0.55, 0.52, 0.20, 0.20);
    println!(
        "   pixel-inclusive: {:.4}",
        calculate_iou(&bbox1, &bbox2, IouConvention::PixelInclusive)?
    );
    println!(
        "   continuous:      {:.4}",
        calculate_iou(&bbox1, &bbox2, IouConvention::Continuous)?
    );
    println!();

    // Example 2: Match one image
    println!("2. Matching One Image");
    let ground_truth = parse_labels(
        "0 0.512 0.430 0.210 0.180\n1 0.250 0.700 0.100 0.120\n",
        std::path::Path::new("page_001.txt"),
    );
    let predictions = parse_labels(
        "0 0.515 0.428 0.205 0.185 0.93\n0 0.900 0.100 0.050 0.050 0.41\n",
        std::path::Path::new("page_001.txt"),
    );

    let outcome = match_boxes(&ground_truth.boxes, &predictions.boxes, &MatchOptions::default())?;
    for event in outcome.events() {
        println!("   {:<2} {}", event.kind(), event.primary().raw);
    }
    println!();

    // Example 3: Full report over several images
    println!("3. Report");
    let source = MemorySource::new()
        .with_text("page_001.txt", Role::GroundTruth, "0 0.512 0.430 0.210 0.180\n1 0.250 0.700 0.100 0.120\n")
        .with_text("page_001.txt", Role::Prediction, "0 0.515 0.428 0.205 0.185\n")
        .with_text("page_002.txt", Role::GroundTruth, "")
        .with_text("page_002.txt", Role::Prediction, "1 0.300 0.300 0.100 0.100\n");

    let class_names = ClassNames::from_list(["miniature", "book-in-miniature"]);
    let evaluator = Evaluator::new(source, MatchOptions::default())?.with_class_names(class_names);

    let mut rows = evaluator.rows()?;
    let mut writer = create_writer(OutputFormat::Csv, std::io::stdout())?;
    write_rows(&mut *writer, rows.by_ref())?;

    println!();
    println!("   {}", rows.stats().summary_string());

    Ok(())
}
