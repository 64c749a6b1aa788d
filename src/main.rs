use clap::Parser;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use yolo_eval::report::create_writer;
use yolo_eval::{
    ClassNames, DirectorySource, EvalConfig, Evaluator, IouConvention, MatchStrategy, OutputFormat,
};

/// Classify every predicted and ground-truth box as TP, FP or FN and write one
/// report row per box.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory of ground-truth label files (*.txt)
    #[clap(long, short = 'g')]
    ground_truth: Option<PathBuf>,

    /// Directory of prediction label files with the same names
    #[clap(long, short = 'p')]
    predictions: Option<PathBuf>,

    /// Report file; written to stdout when omitted
    #[clap(long, short = 'o')]
    output: Option<PathBuf>,

    /// Minimum IoU for a match, between 0 and 1 [default: 0.5]
    #[clap(long, short = 't')]
    threshold: Option<f64>,

    /// IoU formula: pixel (adds 1 to every extent) or continuous
    #[clap(long)]
    iou_convention: Option<IouConvention>,

    /// Matching order: ground-truth-order (default) or best-first. With
    /// ground-truth-order an earlier ground truth can claim a prediction that
    /// overlaps a later one better; best-first always binds the higher IoU.
    #[clap(long)]
    strategy: Option<MatchStrategy>,

    /// Report format: csv or jsonl
    #[clap(long, short = 'f')]
    format: Option<OutputFormat>,

    /// Class names file: one name per line, or a JSON list/object
    #[clap(long, short = 'c')]
    classes: Option<PathBuf>,

    /// TOML file with default settings; command-line flags take precedence
    #[clap(long)]
    config: Option<PathBuf>,

    /// Evaluate images in parallel
    #[clap(long, short = 'j')]
    parallel: bool,

    /// Print run statistics as JSON to stderr
    #[clap(long)]
    summary: bool,
}

impl Args {
    fn resolve_config(&self) -> yolo_eval::Result<EvalConfig> {
        let mut cfg = match &self.config {
            Some(path) => EvalConfig::load_from_file(path)?,
            None => EvalConfig::default(),
        };

        if let Some(threshold) = self.threshold {
            cfg.threshold = threshold;
        }
        if let Some(convention) = self.iou_convention {
            cfg.iou_convention = convention;
        }
        if let Some(strategy) = self.strategy {
            cfg.strategy = strategy;
        }
        if let Some(format) = self.format {
            cfg.format = format;
        }
        if self.ground_truth.is_some() {
            cfg.ground_truth_dir.clone_from(&self.ground_truth);
        }
        if self.predictions.is_some() {
            cfg.prediction_dir.clone_from(&self.predictions);
        }
        if self.output.is_some() {
            cfg.output.clone_from(&self.output);
        }
        if self.classes.is_some() {
            cfg.classes.clone_from(&self.classes);
        }
        cfg.parallel |= self.parallel;

        cfg.validate()?;
        Ok(cfg)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = args.resolve_config()?;

    let ground_truth_dir = config
        .ground_truth_dir
        .clone()
        .ok_or("no ground-truth directory given (--ground-truth or [paths] ground_truth)")?;
    let prediction_dir = config
        .prediction_dir
        .clone()
        .ok_or("no prediction directory given (--predictions or [paths] predictions)")?;

    let class_names = match &config.classes {
        Some(path) => ClassNames::load_from_file(path)?,
        None => ClassNames::new(),
    };

    let source = DirectorySource::new(&ground_truth_dir, &prediction_dir);
    let evaluator = Evaluator::new(source, config.match_options())?.with_class_names(class_names);

    let out: Box<dyn Write> = match &config.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    let mut writer = create_writer(config.format, out)?;

    let stats = if config.parallel {
        evaluator.write_report_parallel(&mut *writer)?
    } else {
        evaluator.write_report(&mut *writer)?
    };

    if let Some(path) = &config.output {
        log::info!(
            "Wrote {} rows to {}",
            stats.total_events(),
            path.display()
        );
    }
    if stats.total_skipped() > 0 {
        log::warn!("{} image(s) produced no rows", stats.total_skipped());
    }

    if args.summary {
        eprintln!("{}", serde_json::to_string_pretty(&stats)?);
    }

    Ok(())
}
