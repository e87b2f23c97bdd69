//! Geometry primitives: bounding boxes, flattening and hit testing.
//!
//! Everything here is a pure function over image-pixel coordinates.

use crate::model::{Annotation, Point, Shape};

/// Axis-aligned extent of a shape as two corners.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Bounds {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    /// Fully contained in the `[0,width] × [0,height]` image rectangle.
    pub fn is_within(&self, width: f64, height: f64) -> bool {
        self.x1 >= 0.0 && self.y1 >= 0.0 && self.x2 <= width && self.y2 <= height
    }

    /// Shares at least one point with the image rectangle.
    pub fn overlaps(&self, width: f64, height: f64) -> bool {
        self.x2 >= 0.0 && self.y2 >= 0.0 && self.x1 <= width && self.y1 <= height
    }

    /// Check if a point is inside the bounds (edges included).
    pub fn contains(&self, p: &Point) -> bool {
        p.x >= self.x1 && p.x <= self.x2 && p.y >= self.y1 && p.y <= self.y2
    }
}

/// Bounds of a point list, or `None` for an empty list.
pub fn points_bounds(points: &[Point]) -> Option<Bounds> {
    let first = points.first()?;
    let mut b = Bounds::new(first.x, first.y, first.x, first.y);
    for p in &points[1..] {
        b.x1 = b.x1.min(p.x);
        b.y1 = b.y1.min(p.y);
        b.x2 = b.x2.max(p.x);
        b.y2 = b.y2.max(p.y);
    }
    Some(b)
}

/// Bounding box of a shape.
///
/// Vertex lists use min/max over their points (an empty list gives a zero box
/// at the origin), ellipses use center ± radius with rotation ignored, boxes
/// are normalized so negative width/height still produce ordered corners.
pub fn bounding_box(shape: &Shape) -> Bounds {
    match shape {
        Shape::BoundingBox {
            x,
            y,
            width,
            height,
        } => Bounds::new(
            x.min(x + width),
            y.min(y + height),
            x.max(x + width),
            y.max(y + height),
        ),
        Shape::Ellipse {
            x,
            y,
            radius_x,
            radius_y,
            ..
        } => {
            let rx = radius_x.abs();
            let ry = radius_y.abs();
            Bounds::new(x - rx, y - ry, x + rx, y + ry)
        }
        Shape::Point { x, y } => Bounds::new(*x, *y, *x, *y),
        Shape::Polygon { points, .. } | Shape::Polyline { points } | Shape::Points { points } => {
            points_bounds(points).unwrap_or_default()
        }
    }
}

/// Interleave point coordinates as `[x0, y0, x1, y1, ...]`.
pub fn flatten(points: &[Point]) -> Vec<f64> {
    points.iter().flat_map(|p| [p.x, p.y]).collect()
}

/// Translate every point in place.
pub fn translate_points(points: &mut [Point], dx: f64, dy: f64) {
    for p in points.iter_mut() {
        p.x += dx;
        p.y += dy;
    }
}

pub fn midpoint(a: &Point, b: &Point) -> Point {
    Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

/// Shortest distance from `p` to the segment `a`-`b`.
pub fn distance_to_segment(p: &Point, a: &Point, b: &Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return p.distance_to(a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    p.distance_to(&Point::new(a.x + t * dx, a.y + t * dy))
}

/// Point-in-polygon test using the ray casting algorithm.
pub fn point_in_polygon(p: &Point, ring: &[Point]) -> bool {
    if ring.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let vi = &ring[i];
        let vj = &ring[j];
        let crosses = (vi.y > p.y) != (vj.y > p.y);
        if crosses && p.x < (vj.x - vi.x) * (p.y - vi.y) / (vj.y - vi.y) + vi.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

impl Shape {
    /// Check if a point hits this shape.
    ///
    /// `tolerance` is the hit radius used for points, polylines and point sets.
    pub fn contains_point(&self, p: &Point, tolerance: f64) -> bool {
        match self {
            Shape::BoundingBox { .. } => bounding_box(self).contains(p),
            Shape::Ellipse {
                x,
                y,
                radius_x,
                radius_y,
                rotation,
            } => {
                if *radius_x <= 0.0 || *radius_y <= 0.0 {
                    return false;
                }
                // Rotate into the ellipse frame
                let (sin, cos) = (-rotation.to_radians()).sin_cos();
                let dx = p.x - x;
                let dy = p.y - y;
                let lx = dx * cos - dy * sin;
                let ly = dx * sin + dy * cos;
                (lx / radius_x).powi(2) + (ly / radius_y).powi(2) <= 1.0
            }
            Shape::Point { x, y } => p.distance_to(&Point::new(*x, *y)) <= tolerance,
            Shape::Polygon { points, holes, .. } => {
                point_in_polygon(p, points) && !holes.iter().any(|h| point_in_polygon(p, h))
            }
            Shape::Polyline { points } => points
                .windows(2)
                .any(|w| distance_to_segment(p, &w[0], &w[1]) <= tolerance),
            Shape::Points { points } => points.iter().any(|q| q.distance_to(p) <= tolerance),
        }
    }
}

/// Index of the top-most annotation (last in render order) under `p`.
pub fn hit_test(annotations: &[Annotation], p: &Point, tolerance: f64) -> Option<usize> {
    annotations
        .iter()
        .rposition(|ann| ann.shape.contains_point(p, tolerance))
}

/// Index of the vertex of `shape` within `radius` of `p`, closest first.
pub fn hit_test_vertex(shape: &Shape, p: &Point, radius: f64) -> Option<usize> {
    let points = shape.vertices()?;
    points
        .iter()
        .enumerate()
        .map(|(i, q)| (i, q.distance_to(p)))
        .filter(|(_, d)| *d <= radius)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}
