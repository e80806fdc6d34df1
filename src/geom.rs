pub mod bboxes;
pub mod point;
pub mod vector;
pub mod vector4;

/// Numerical guard used throughout the pipeline (plane intersections,
/// normalization, convergence ratios).
pub const EPS: f64 = 1e-10;
