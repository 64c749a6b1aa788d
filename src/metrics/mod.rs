//! Geometry used to score box overlap.

pub mod iou;

pub use iou::calculate_iou;
