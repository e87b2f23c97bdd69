//! Annotation shape types and data structures.

use serde::{Deserialize, Serialize};

use crate::constants::{MIN_POINTS_MEMBERS, MIN_POLYGON_VERTICES, MIN_POLYLINE_VERTICES};

/// A 2D point in image-pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Calculate distance to another point.
    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Offset this point by a delta.
    pub fn offset(&self, dx: f64, dy: f64) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }

    /// Both coordinates are finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Discriminator of an annotation's shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    BoundingBox,
    Ellipse,
    Polygon,
    Polyline,
    Point,
    Points,
}

impl ShapeKind {
    /// Get the display name for this kind.
    pub fn name(&self) -> &'static str {
        match self {
            ShapeKind::BoundingBox => "bbox",
            ShapeKind::Ellipse => "ellipse",
            ShapeKind::Polygon => "polygon",
            ShapeKind::Polyline => "polyline",
            ShapeKind::Point => "point",
            ShapeKind::Points => "points",
        }
    }

    /// Minimum vertex count for vertex-list kinds, `None` for the others.
    pub fn min_vertices(&self) -> Option<usize> {
        match self {
            ShapeKind::Polygon => Some(MIN_POLYGON_VERTICES),
            ShapeKind::Polyline => Some(MIN_POLYLINE_VERTICES),
            ShapeKind::Points => Some(MIN_POINTS_MEMBERS),
            _ => None,
        }
    }
}

/// Shape geometry of an annotation (in image coordinates).
///
/// Serialized with a `kind` tag and camelCase fields so the host can persist
/// annotations verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum Shape {
    /// Axis-aligned box. Width/height may be negative while drawing.
    #[serde(rename = "bbox")]
    BoundingBox {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    /// Ellipse defined by its center and radii.
    Ellipse {
        x: f64,
        y: f64,
        radius_x: f64,
        radius_y: f64,
        #[serde(default)]
        rotation: f64,
    },
    /// Closed polygon, optionally with holes.
    Polygon {
        points: Vec<Point>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        holes: Vec<Vec<Point>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        instance_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        opacity: Option<f64>,
    },
    /// Open polyline.
    Polyline { points: Vec<Point> },
    /// Single point marker.
    Point { x: f64, y: f64 },
    /// Set of independently editable points.
    Points { points: Vec<Point> },
}

impl Shape {
    /// Create a polygon without holes or instance data.
    pub fn polygon(points: Vec<Point>) -> Self {
        Shape::Polygon {
            points,
            holes: Vec::new(),
            instance_id: None,
            opacity: None,
        }
    }

    /// Get the kind of this shape.
    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::BoundingBox { .. } => ShapeKind::BoundingBox,
            Shape::Ellipse { .. } => ShapeKind::Ellipse,
            Shape::Polygon { .. } => ShapeKind::Polygon,
            Shape::Polyline { .. } => ShapeKind::Polyline,
            Shape::Point { .. } => ShapeKind::Point,
            Shape::Points { .. } => ShapeKind::Points,
        }
    }

    /// Vertex list for polygon/polyline/points shapes.
    pub fn vertices(&self) -> Option<&[Point]> {
        match self {
            Shape::Polygon { points, .. }
            | Shape::Polyline { points }
            | Shape::Points { points } => Some(points),
            _ => None,
        }
    }

    /// Mutable vertex list for polygon/polyline/points shapes.
    pub fn vertices_mut(&mut self) -> Option<&mut Vec<Point>> {
        match self {
            Shape::Polygon { points, .. }
            | Shape::Polyline { points }
            | Shape::Points { points } => Some(points),
            _ => None,
        }
    }

    /// Check the minimum-vertex invariant for this shape.
    pub fn has_min_vertices(&self) -> bool {
        match (self.vertices(), self.kind().min_vertices()) {
            (Some(points), Some(min)) => points.len() >= min,
            _ => true,
        }
    }

    /// Translate every coordinate of the shape, holes included.
    pub fn translated(&self, dx: f64, dy: f64) -> Shape {
        let mut shape = self.clone();
        match &mut shape {
            Shape::BoundingBox { x, y, .. }
            | Shape::Ellipse { x, y, .. }
            | Shape::Point { x, y } => {
                *x += dx;
                *y += dy;
            }
            Shape::Polygon { points, holes, .. } => {
                crate::geometry::translate_points(points, dx, dy);
                for hole in holes.iter_mut() {
                    crate::geometry::translate_points(hole, dx, dy);
                }
            }
            Shape::Polyline { points } | Shape::Points { points } => {
                crate::geometry::translate_points(points, dx, dy);
            }
        }
        shape
    }

    /// Every coordinate is finite.
    pub fn is_finite(&self) -> bool {
        match self {
            Shape::BoundingBox {
                x,
                y,
                width,
                height,
            } => [*x, *y, *width, *height].iter().all(|v| v.is_finite()),
            Shape::Ellipse {
                x,
                y,
                radius_x,
                radius_y,
                rotation,
            } => [*x, *y, *radius_x, *radius_y, *rotation]
                .iter()
                .all(|v| v.is_finite()),
            Shape::Point { x, y } => x.is_finite() && y.is_finite(),
            Shape::Polygon { points, holes, .. } => {
                points.iter().all(Point::is_finite)
                    && holes.iter().flatten().all(Point::is_finite)
            }
            Shape::Polyline { points } | Shape::Points { points } => {
                points.iter().all(Point::is_finite)
            }
        }
    }
}

/// A committed annotation: shape plus label metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Name of the label class.
    pub label: String,
    /// Display color as `#rrggbb`.
    pub color: String,
    /// The shape geometry.
    #[serde(flatten)]
    pub shape: Shape,
}

impl Annotation {
    /// Create a new annotation with the given shape and label.
    pub fn new(shape: Shape, label: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            color: color.into(),
            shape,
        }
    }

    /// Get the kind of this annotation's shape.
    pub fn kind(&self) -> ShapeKind {
        self.shape.kind()
    }

    /// Instance id, only set on instance-segmentation polygons.
    pub fn instance_id(&self) -> Option<&str> {
        match &self.shape {
            Shape::Polygon { instance_id, .. } => instance_id.as_deref(),
            _ => None,
        }
    }

    /// Copy of this annotation with a different shape.
    pub fn with_shape(&self, shape: Shape) -> Self {
        Self {
            label: self.label.clone(),
            color: self.color.clone(),
            shape,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_distance() {
        let p1 = Point::new(0.0, 0.0);
        let p2 = Point::new(3.0, 4.0);
        assert!((p1.distance_to(&p2) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_min_vertices() {
        let tri = Shape::polygon(vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
        ]);
        assert!(tri.has_min_vertices());

        let line = Shape::Polyline {
            points: vec![Point::new(0.0, 0.0)],
        };
        assert!(!line.has_min_vertices());

        let empty = Shape::Points { points: vec![] };
        assert!(!empty.has_min_vertices());

        let bbox = Shape::BoundingBox {
            x: 0.0,
            y: 0.0,
            width: 1.0,
            height: 1.0,
        };
        assert!(bbox.has_min_vertices());
    }

    #[test]
    fn test_translated_moves_holes() {
        let shape = Shape::Polygon {
            points: vec![
                Point::new(0.0, 0.0),
                Point::new(10.0, 0.0),
                Point::new(10.0, 10.0),
            ],
            holes: vec![vec![
                Point::new(2.0, 1.0),
                Point::new(3.0, 1.0),
                Point::new(3.0, 2.0),
            ]],
            instance_id: None,
            opacity: None,
        };

        let Shape::Polygon { points, holes, .. } = shape.translated(5.0, -1.0) else {
            panic!("Expected polygon");
        };
        assert_eq!(points[1], Point::new(15.0, -1.0));
        assert_eq!(holes[0][0], Point::new(7.0, 0.0));
    }

    #[test]
    fn test_serialized_shape_uses_kind_tag() {
        let ann = Annotation::new(
            Shape::Ellipse {
                x: 5.0,
                y: 6.0,
                radius_x: 2.0,
                radius_y: 3.0,
                rotation: 0.0,
            },
            "cell",
            "#00ff00",
        );

        let json = serde_json::to_value(&ann).expect("serialize");
        assert_eq!(json["kind"], "ellipse");
        assert_eq!(json["radiusX"], 2.0);
        assert_eq!(json["label"], "cell");

        let back: Annotation = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, ann);
    }

    #[test]
    fn test_bbox_kind_name() {
        let json = r##"{"kind":"bbox","x":1,"y":2,"width":3,"height":4,"label":"car","color":"#ff0000"}"##;
        let ann: Annotation = serde_json::from_str(json).expect("deserialize");
        assert_eq!(ann.kind(), ShapeKind::BoundingBox);
        assert_eq!(ann.kind().name(), "bbox");
    }
}
