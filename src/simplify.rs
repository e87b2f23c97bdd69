//! Point-density reduction for continuously sampled shapes.
//!
//! Reduction is always recomputed from the original points, so a preview can
//! be adjusted any number of times and still be cancelled back to the exact
//! input.

use crate::model::Point;

/// Decimate `points` by a minimum distance between kept points.
///
/// The first point is always kept; each following point is kept when it lies
/// at least `threshold` away from the last kept point. When that leaves fewer
/// than three points, the first three samples of the input at stride
/// `floor(n / 3)` are returned instead so the result is still a valid polygon.
pub fn reduce_points(points: &[Point], threshold: f64) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let mut kept = vec![points[0]];
    let mut last = points[0];
    for p in &points[1..] {
        if last.distance_to(p) >= threshold {
            kept.push(*p);
            last = *p;
        }
    }

    if kept.len() >= 3 {
        return kept;
    }

    let stride = (points.len() / 3).max(1);
    log::debug!(
        "Reduction at threshold {:.1} left {} points, sub-sampling at stride {}",
        threshold,
        kept.len(),
        stride
    );
    // Exactly three samples; the tail past 2 * stride is dropped
    points.iter().step_by(stride).take(3).copied().collect()
}

/// Live, reversible reduction preview.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityPreview {
    original: Vec<Point>,
    threshold: f64,
    preview: Vec<Point>,
}

impl DensityPreview {
    /// Start a preview of `original` at the given threshold.
    pub fn new(original: Vec<Point>, threshold: f64) -> Self {
        let preview = reduce_points(&original, threshold);
        Self {
            original,
            threshold,
            preview,
        }
    }

    /// Recompute the preview from the original points.
    pub fn set_threshold(&mut self, threshold: f64) {
        self.threshold = threshold;
        self.preview = reduce_points(&self.original, threshold);
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn original(&self) -> &[Point] {
        &self.original
    }

    /// The currently shown reduced points.
    pub fn preview(&self) -> &[Point] {
        &self.preview
    }

    /// Commit the currently shown preview.
    pub fn apply(self) -> Vec<Point> {
        self.preview
    }

    /// Discard the reduction and keep the pristine original points.
    pub fn cancel(self) -> Vec<Point> {
        self.original
    }
}
