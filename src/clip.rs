//! Boundary clipping against the image rectangle.
//!
//! `clip` returns `None` when the clipped shape would be degenerate; callers
//! treat that as "delete this annotation".

use crate::constants::{
    MIN_ELLIPSE_RADIUS, MIN_POLYGON_VERTICES, MIN_POLYLINE_VERTICES, STITCH_TOLERANCE,
};
use crate::geometry::bounding_box;
use crate::model::{Annotation, Point, Shape};

/// Clip an annotation to the `[0,width] × [0,height]` image rectangle.
pub fn clip(annotation: &Annotation, width: f64, height: f64) -> Option<Annotation> {
    debug_assert!(
        annotation.shape.is_finite(),
        "non-finite coordinates in {:?}",
        annotation.shape
    );
    clip_shape(&annotation.shape, width, height).map(|shape| annotation.with_shape(shape))
}

/// Clip every annotation, dropping the ones that clip away.
pub fn clip_all(annotations: &[Annotation], width: f64, height: f64) -> Vec<Annotation> {
    annotations
        .iter()
        .filter_map(|ann| clip(ann, width, height))
        .collect()
}

/// Clip a bare shape. See [`clip`].
pub fn clip_shape(shape: &Shape, width: f64, height: f64) -> Option<Shape> {
    let shape = normalize(shape);

    // Fully-inside shapes pass through untouched unless they have no extent
    if bounding_box(&shape).is_within(width, height) {
        return (!is_degenerate(&shape)).then_some(shape);
    }

    log::trace!("Clipping {} against {}x{}", shape.kind().name(), width, height);

    match shape {
        Shape::BoundingBox {
            x,
            y,
            width: w,
            height: h,
        } => clip_box(x, y, w, h, width, height),
        Shape::Ellipse {
            x,
            y,
            radius_x,
            radius_y,
            rotation,
        } => clip_ellipse(x, y, radius_x, radius_y, width, height).map(|(rx, ry)| {
            Shape::Ellipse {
                x,
                y,
                radius_x: rx,
                radius_y: ry,
                rotation,
            }
        }),
        Shape::Polygon {
            points,
            holes,
            instance_id,
            opacity,
        } => {
            let clipped = clip_polygon(&points, width, height);
            (clipped.len() >= MIN_POLYGON_VERTICES).then_some(Shape::Polygon {
                points: clipped,
                holes,
                instance_id,
                opacity,
            })
        }
        Shape::Polyline { points } => {
            let clipped = clip_polyline(&points, width, height);
            (clipped.len() >= MIN_POLYLINE_VERTICES).then_some(Shape::Polyline { points: clipped })
        }
        Shape::Point { x, y } => Some(Shape::Point {
            x: x.clamp(0.0, width),
            y: y.clamp(0.0, height),
        }),
        Shape::Points { points } => {
            let clamped: Vec<Point> = points
                .iter()
                .map(|p| clamp_point(p, width, height))
                .collect();
            (!clamped.is_empty()).then_some(Shape::Points { points: clamped })
        }
    }
}

/// Flip negative box extents and negative radii.
fn normalize(shape: &Shape) -> Shape {
    match *shape {
        Shape::BoundingBox {
            x,
            y,
            width,
            height,
        } => Shape::BoundingBox {
            x: x.min(x + width),
            y: y.min(y + height),
            width: width.abs(),
            height: height.abs(),
        },
        Shape::Ellipse {
            x,
            y,
            radius_x,
            radius_y,
            rotation,
        } => Shape::Ellipse {
            x,
            y,
            radius_x: radius_x.abs(),
            radius_y: radius_y.abs(),
            rotation,
        },
        _ => shape.clone(),
    }
}

/// Boxes without area and ellipses under a pixel of radius are not kept.
fn is_degenerate(shape: &Shape) -> bool {
    match *shape {
        Shape::BoundingBox { width, height, .. } => width <= 0.0 || height <= 0.0,
        Shape::Ellipse {
            radius_x, radius_y, ..
        } => radius_x < MIN_ELLIPSE_RADIUS || radius_y < MIN_ELLIPSE_RADIUS,
        _ => !shape.has_min_vertices(),
    }
}

fn clip_box(x: f64, y: f64, w: f64, h: f64, width: f64, height: f64) -> Option<Shape> {
    let x1 = x.max(0.0);
    let y1 = y.max(0.0);
    let x2 = (x + w).min(width);
    let y2 = (y + h).min(height);
    let (w, h) = (x2 - x1, y2 - y1);
    if w <= 0.0 || h <= 0.0 {
        return None;
    }
    Some(Shape::BoundingBox {
        x: x1,
        y: y1,
        width: w,
        height: h,
    })
}

/// Shrink radii so every extremum lies inside the image.
fn clip_ellipse(
    x: f64,
    y: f64,
    mut rx: f64,
    mut ry: f64,
    width: f64,
    height: f64,
) -> Option<(f64, f64)> {
    if x - rx < 0.0 {
        rx = x;
    }
    if x + rx > width {
        rx = width - x;
    }
    if y - ry < 0.0 {
        ry = y;
    }
    if y + ry > height {
        ry = height - y;
    }
    if rx < MIN_ELLIPSE_RADIUS || ry < MIN_ELLIPSE_RADIUS {
        return None;
    }
    Some((rx, ry))
}

fn clamp_point(p: &Point, width: f64, height: f64) -> Point {
    Point::new(p.x.clamp(0.0, width), p.y.clamp(0.0, height))
}

// ============================================================================
// Sutherland–Hodgman
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum Edge {
    Left,
    Right,
    Top,
    Bottom,
}

impl Edge {
    fn inside(&self, p: &Point, width: f64, height: f64) -> bool {
        match self {
            Edge::Left => p.x >= 0.0,
            Edge::Right => p.x <= width,
            Edge::Top => p.y >= 0.0,
            Edge::Bottom => p.y <= height,
        }
    }

    /// Intersection of segment `a`-`b` with this edge's boundary line.
    fn intersect(&self, a: &Point, b: &Point, width: f64, height: f64) -> Point {
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        match self {
            Edge::Left | Edge::Right => {
                let bx = if matches!(self, Edge::Left) { 0.0 } else { width };
                let t = (bx - a.x) / dx;
                Point::new(bx, a.y + t * dy)
            }
            Edge::Top | Edge::Bottom => {
                let by = if matches!(self, Edge::Top) { 0.0 } else { height };
                let t = (by - a.y) / dy;
                Point::new(a.x + t * dx, by)
            }
        }
    }
}

/// Clip a closed ring against the four image half-planes in sequence.
pub fn clip_polygon(points: &[Point], width: f64, height: f64) -> Vec<Point> {
    let mut output = points.to_vec();
    for edge in [Edge::Left, Edge::Right, Edge::Top, Edge::Bottom] {
        if output.is_empty() {
            break;
        }
        let input = std::mem::take(&mut output);
        let mut prev = input[input.len() - 1];
        for current in input {
            let cur_in = edge.inside(&current, width, height);
            let prev_in = edge.inside(&prev, width, height);
            if cur_in {
                if !prev_in {
                    output.push(edge.intersect(&prev, &current, width, height));
                }
                output.push(current);
            } else if prev_in {
                output.push(edge.intersect(&prev, &current, width, height));
            }
            prev = current;
        }
    }
    let mut ring: Vec<Point> = Vec::with_capacity(output.len());
    for p in output.iter().map(|p| clamp_point(p, width, height)) {
        if ring.last().is_none_or(|last| last.distance_to(&p) > STITCH_TOLERANCE) {
            ring.push(p);
        }
    }
    // Vertices on a boundary line come back twice, including across the seam
    while ring.len() > 1 && ring[0].distance_to(&ring[ring.len() - 1]) <= STITCH_TOLERANCE {
        ring.pop();
    }
    ring
}

// ============================================================================
// Liang–Barsky
// ============================================================================

/// Clip one segment, returning the surviving sub-segment.
pub fn clip_segment(a: &Point, b: &Point, width: f64, height: f64) -> Option<(Point, Point)> {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let mut t0: f64 = 0.0;
    let mut t1: f64 = 1.0;

    // (p, q) per boundary: left, right, top, bottom
    let checks = [
        (-dx, a.x),
        (dx, width - a.x),
        (-dy, a.y),
        (dy, height - a.y),
    ];
    for (p, q) in checks {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    // Clamp away rounding drift past the boundary
    Some((
        clamp_point(&Point::new(a.x + t0 * dx, a.y + t0 * dy), width, height),
        clamp_point(&Point::new(a.x + t1 * dx, a.y + t1 * dy), width, height),
    ))
}

/// Clip each polyline segment and stitch the pieces back into one line.
pub fn clip_polyline(points: &[Point], width: f64, height: f64) -> Vec<Point> {
    let mut out: Vec<Point> = Vec::with_capacity(points.len());
    for w in points.windows(2) {
        let Some((p, q)) = clip_segment(&w[0], &w[1], width, height) else {
            continue;
        };
        let coincident = out
            .last()
            .is_some_and(|last| last.distance_to(&p) <= STITCH_TOLERANCE);
        if !coincident {
            out.push(p);
        }
        if p.distance_to(&q) > STITCH_TOLERANCE {
            out.push(q);
        }
    }
    out
}
