//! Intersection over Union (IoU) calculation.

use crate::error::{EvalError, Result};
use crate::types::{BoundingBox, IouConvention};

impl IouConvention {
    /// Offset added to every extent difference.
    fn offset(self) -> f64 {
        match self {
            IouConvention::PixelInclusive => 1.0,
            IouConvention::Continuous => 0.0,
        }
    }
}

/// Calculate the Intersection over Union (IoU) between two bounding boxes.
///
/// Both boxes are converted to corner form first. With
/// [`IouConvention::PixelInclusive`] every width and height gets `+1`, the
/// discrete-pixel formula used by the reports this crate must stay compatible
/// with. Class labels are ignored here; the matcher filters by class.
///
/// # Errors
///
/// Returns [`EvalError::DivisionByZero`] when the union area is zero or not
/// finite, which happens for two zero-area boxes under
/// [`IouConvention::Continuous`].
///
/// # Example
///
/// ```
/// use yolo_eval::metrics::iou::calculate_iou;
/// use yolo_eval::types::{BoundingBox, IouConvention};
///
/// let a = BoundingBox::new(0, 0.5, 0.5, 0.2, 0.2);
/// let iou = calculate_iou(&a, &a, IouConvention::PixelInclusive).unwrap();
/// assert_eq!(iou, 1.0);
/// ```
pub fn calculate_iou(
    bbox1: &BoundingBox,
    bbox2: &BoundingBox,
    convention: IouConvention,
) -> Result<f64> {
    let a = bbox1.to_extrema();
    let b = bbox2.to_extrema();
    let offset = convention.offset();

    // Intersection rectangle
    let x_min = a.x_min.max(b.x_min);
    let y_min = a.y_min.max(b.y_min);
    let x_max = a.x_max.min(b.x_max);
    let y_max = a.y_max.min(b.y_max);

    let intersection_area = (x_max - x_min + offset).max(0.0) * (y_max - y_min + offset).max(0.0);

    let bbox1_area = (a.x_max - a.x_min + offset) * (a.y_max - a.y_min + offset);
    let bbox2_area = (b.x_max - b.x_min + offset) * (b.y_max - b.y_min + offset);
    let union_area = bbox1_area + bbox2_area - intersection_area;

    if union_area == 0.0 || !union_area.is_finite() {
        return Err(EvalError::DivisionByZero {
            first: bbox1.to_string(),
            second: bbox2.to_string(),
            union: union_area,
        });
    }

    Ok(intersection_area / union_area)
}
