//! IoU threshold constants and validation.

use crate::error::{EvalError, Result};

/// PASCAL VOC matching threshold.
pub const DEFAULT_IOU_THRESHOLD: f64 = 0.5;

/// Strict detection, as in COCO's AP75.
pub const STRICT_IOU_THRESHOLD: f64 = 0.75;

/// Low enough that localization errors are effectively ignored.
pub const LENIENT_IOU_THRESHOLD: f64 = 0.1;

/// Validate that a threshold is in the valid range [0.0, 1.0].
///
/// NaN is rejected.
///
/// # Example
///
/// ```
/// use yolo_eval::threshold::validate_threshold;
///
/// assert!(validate_threshold(0.5).is_ok());
/// assert!(validate_threshold(1.5).is_err());
/// ```
pub fn validate_threshold(threshold: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(EvalError::InvalidThreshold(format!(
            "Threshold must be between 0.0 and 1.0, got {}",
            threshold
        )));
    }
    Ok(())
}

/// Generate a range of threshold values for a sweep.
///
/// # Arguments
///
/// * `start` - Starting threshold value (inclusive)
/// * `end` - Ending threshold value (inclusive)
/// * `steps` - Number of threshold values to generate
///
/// # Returns
///
/// Returns a vector of evenly-spaced threshold values.
///
/// # Example
///
/// ```
/// use yolo_eval::threshold::generate_threshold_range;
///
/// let thresholds = generate_threshold_range(0.0, 1.0, 11).unwrap();
/// assert_eq!(thresholds.len(), 11);
/// assert_eq!(thresholds[0], 0.0);
/// assert_eq!(thresholds[10], 1.0);
/// ```
pub fn generate_threshold_range(start: f64, end: f64, steps: usize) -> Result<Vec<f64>> {
    if steps == 0 {
        return Err(EvalError::InvalidThreshold(
            "Number of steps must be greater than 0".to_string(),
        ));
    }

    validate_threshold(start)?;
    validate_threshold(end)?;

    if start > end {
        return Err(EvalError::InvalidThreshold(format!(
            "Start threshold ({}) must be <= end threshold ({})",
            start, end
        )));
    }

    if steps == 1 {
        return Ok(vec![start]);
    }

    let step_size = (end - start) / (steps - 1) as f64;
    Ok((0..steps)
        .map(|i| (start + step_size * i as f64).min(end))
        .collect())
}
