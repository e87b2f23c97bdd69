//! Vertex and whole-shape editing of committed annotations.
//!
//! Every operation takes the committed list by reference and returns a fresh
//! [`Edit`]. `None` means nothing changed (stale index or an operation the
//! shape kind does not support), so callers never push an undo entry for it.

use crate::clip::clip;
use crate::constants::MIN_DRAG_DISTANCE;
use crate::geometry::midpoint;
use crate::model::{Annotation, Point, Shape};

/// Result of an editing operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Edit {
    /// The complete replacement annotation list
    pub annotations: Vec<Annotation>,
    /// Index of the annotation that was removed, if the edit deleted one
    pub deleted: Option<usize>,
}

impl Edit {
    fn replaced(list: &[Annotation], index: usize, annotation: Annotation) -> Self {
        let mut annotations = list.to_vec();
        annotations[index] = annotation;
        Self {
            annotations,
            deleted: None,
        }
    }

    fn removed(list: &[Annotation], index: usize) -> Self {
        let mut annotations = list.to_vec();
        annotations.remove(index);
        Self {
            annotations,
            deleted: Some(index),
        }
    }

    /// Replace with the clipped annotation, or delete when it clipped away.
    fn clipped(
        list: &[Annotation],
        index: usize,
        edited: &Annotation,
        width: f64,
        height: f64,
    ) -> Self {
        match clip(edited, width, height) {
            Some(annotation) => Self::replaced(list, index, annotation),
            None => {
                log::info!(
                    "Annotation {} ({}) left the image, deleting",
                    index,
                    edited.kind().name()
                );
                Self::removed(list, index)
            }
        }
    }
}

fn lookup(list: &[Annotation], index: usize) -> Option<&Annotation> {
    let found = list.get(index);
    if found.is_none() {
        log::debug!("No annotation at index {} ({} total)", index, list.len());
    }
    found
}

/// Move a whole shape by a delta, then re-clip.
pub fn translate(
    list: &[Annotation],
    index: usize,
    dx: f64,
    dy: f64,
    width: f64,
    height: f64,
) -> Option<Edit> {
    let annotation = lookup(list, index)?;
    let moved = annotation.with_shape(annotation.shape.translated(dx, dy));
    log::debug!("Translated annotation {} by ({:.1}, {:.1})", index, dx, dy);
    Some(Edit::clipped(list, index, &moved, width, height))
}

/// Move one vertex of a polygon, polyline or point set, then re-clip.
pub fn move_vertex(
    list: &[Annotation],
    index: usize,
    vertex: usize,
    pos: Point,
    width: f64,
    height: f64,
) -> Option<Edit> {
    let mut edited = lookup(list, index)?.clone();
    let slot = edited.shape.vertices_mut()?.get_mut(vertex)?;
    *slot = pos;
    Some(Edit::clipped(list, index, &edited, width, height))
}

/// Remove one vertex. Breaching the kind's minimum deletes the annotation.
pub fn remove_vertex(list: &[Annotation], index: usize, vertex: usize) -> Option<Edit> {
    let mut edited = lookup(list, index)?.clone();
    let points = edited.shape.vertices_mut()?;
    if vertex >= points.len() {
        return None;
    }
    points.remove(vertex);

    if !edited.shape.has_min_vertices() {
        log::info!(
            "Removing vertex {} left {} {} below its minimum, deleting",
            vertex,
            index,
            edited.kind().name()
        );
        return Some(Edit::removed(list, index));
    }
    Some(Edit::replaced(list, index, edited))
}

/// Insert a vertex halfway between `vertex` and its successor.
///
/// Polygons wrap around to the first vertex; polylines have no successor
/// after their last vertex. Point sets have no edges to split.
pub fn insert_vertex(list: &[Annotation], index: usize, vertex: usize) -> Option<Edit> {
    let mut edited = lookup(list, index)?.clone();
    let wraps = match edited.shape {
        Shape::Polygon { .. } => true,
        Shape::Polyline { .. } => false,
        _ => return None,
    };
    let points = edited.shape.vertices_mut()?;
    let n = points.len();
    if vertex >= n || (!wraps && vertex + 1 >= n) {
        return None;
    }

    let mid = midpoint(&points[vertex], &points[(vertex + 1) % n]);
    points.insert(vertex + 1, mid);
    log::debug!("Inserted vertex after {} on annotation {}", vertex, index);
    Some(Edit::replaced(list, index, edited))
}

/// Transform reported by the host's resize handles when a resize ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeTransform {
    /// New x of the shape (box corner or ellipse center)
    pub x: f64,
    /// New y of the shape
    pub y: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    /// Rotation in degrees, ellipses only
    pub rotation: f64,
}

impl ResizeTransform {
    /// Identity transform at a position, for resetting the host's handle node.
    pub fn identity_at(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            scale_x: 1.0,
            scale_y: 1.0,
            rotation: 0.0,
        }
    }
}

/// Fold a resize transform into a box or ellipse, then re-clip.
///
/// The transform's scale is absorbed into width/height or the radii so it
/// never compounds across resizes.
pub fn resize(
    list: &[Annotation],
    index: usize,
    transform: ResizeTransform,
    width: f64,
    height: f64,
) -> Option<Edit> {
    let annotation = lookup(list, index)?;
    let sx = transform.scale_x.abs();
    let sy = transform.scale_y.abs();

    let shape = match &annotation.shape {
        Shape::BoundingBox {
            width: w,
            height: h,
            ..
        } => Shape::BoundingBox {
            x: transform.x,
            y: transform.y,
            width: w * sx,
            height: h * sy,
        },
        Shape::Ellipse {
            radius_x, radius_y, ..
        } => Shape::Ellipse {
            x: transform.x,
            y: transform.y,
            radius_x: radius_x * sx,
            radius_y: radius_y * sy,
            rotation: transform.rotation,
        },
        other => {
            log::debug!("Resize is not supported for {}", other.kind().name());
            return None;
        }
    };

    log::debug!("Resized annotation {} by ({:.3}, {:.3})", index, sx, sy);
    Some(Edit::clipped(list, index, &annotation.with_shape(shape), width, height))
}

/// Remove an annotation.
pub fn delete(list: &[Annotation], index: usize) -> Option<Edit> {
    lookup(list, index)?;
    log::info!("Deleted annotation {}", index);
    Some(Edit::removed(list, index))
}

/// Single-slot copy buffer for annotations.
#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    copied: Option<Annotation>,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the annotation at `index`. Returns whether anything was copied.
    pub fn copy(&mut self, list: &[Annotation], index: usize) -> bool {
        match lookup(list, index) {
            Some(annotation) => {
                self.copied = Some(annotation.clone());
                log::debug!("Copied annotation {}", index);
                true
            }
            None => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.copied.is_none()
    }

    pub fn contents(&self) -> Option<&Annotation> {
        self.copied.as_ref()
    }

    pub fn clear(&mut self) {
        self.copied = None;
    }

    /// A clipped, offset copy of the clipboard, ready to append.
    ///
    /// `None` when the clipboard is empty or the copy clips away entirely.
    pub fn paste(&self, offset: (f64, f64), width: f64, height: f64) -> Option<Annotation> {
        let source = self.copied.as_ref()?;
        let moved = source.with_shape(source.shape.translated(offset.0, offset.1));
        let pasted = clip(&moved, width, height);
        if pasted.is_none() {
            log::debug!("Pasted {} clipped away", source.kind().name());
        }
        pasted
    }
}

/// What a move-tool press landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragTarget {
    /// The whole annotation
    Shape(usize),
    /// One vertex (annotation index, vertex index)
    Vertex(usize, usize),
}

impl DragTarget {
    pub fn annotation(&self) -> usize {
        match self {
            DragTarget::Shape(index) | DragTarget::Vertex(index, _) => *index,
        }
    }
}

/// Press/drag state of the move tool.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum EditState {
    #[default]
    Idle,
    /// Pressed on a target, not yet moved far enough to count as a drag
    PotentialDrag { target: DragTarget, start: Point },
    /// Actively dragging
    Dragging {
        target: DragTarget,
        start: Point,
        current: Point,
    },
}

/// A completed move-tool gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    /// Released without moving past the drag threshold
    Click { target: DragTarget, at: Point },
    /// Released after dragging
    Drag {
        target: DragTarget,
        start: Point,
        end: Point,
    },
}

impl EditState {
    /// Start a potential drag on a target.
    pub fn press(target: DragTarget, start: Point) -> Self {
        EditState::PotentialDrag { target, start }
    }

    pub fn is_potential_drag(&self) -> bool {
        matches!(self, EditState::PotentialDrag { .. })
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self, EditState::Dragging { .. })
    }

    pub fn target(&self) -> Option<DragTarget> {
        match self {
            EditState::Idle => None,
            EditState::PotentialDrag { target, .. } | EditState::Dragging { target, .. } => {
                Some(*target)
            }
        }
    }

    /// Track pointer movement, promoting to a drag once it travels
    /// `MIN_DRAG_DISTANCE`.
    pub fn update(&mut self, pos: Point) {
        match self {
            EditState::PotentialDrag { target, start } => {
                if start.distance_to(&pos) >= MIN_DRAG_DISTANCE {
                    log::debug!("Starting drag on {:?}", target);
                    *self = EditState::Dragging {
                        target: *target,
                        start: *start,
                        current: pos,
                    };
                }
            }
            EditState::Dragging { current, .. } => *current = pos,
            EditState::Idle => {}
        }
    }

    /// Finish the gesture and return to Idle.
    pub fn release(&mut self, pos: Point) -> Option<Gesture> {
        match std::mem::take(self) {
            EditState::Idle => None,
            EditState::PotentialDrag { target, .. } => Some(Gesture::Click { target, at: pos }),
            EditState::Dragging { target, start, .. } => Some(Gesture::Drag {
                target,
                start,
                end: pos,
            }),
        }
    }

    /// Live, unclipped preview of the dragged annotation.
    pub fn preview(&self, list: &[Annotation]) -> Option<Annotation> {
        let EditState::Dragging {
            target,
            start,
            current,
        } = self
        else {
            return None;
        };
        let annotation = list.get(target.annotation())?;
        match target {
            DragTarget::Shape(_) => Some(
                annotation.with_shape(
                    annotation
                        .shape
                        .translated(current.x - start.x, current.y - start.y),
                ),
            ),
            DragTarget::Vertex(_, vertex) => {
                let mut preview = annotation.clone();
                *preview.shape.vertices_mut()?.get_mut(*vertex)? = *current;
                Some(preview)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::PASTE_OFFSET;
    use pretty_assertions::assert_eq;

    const W: f64 = 100.0;
    const H: f64 = 100.0;

    fn pts(coords: &[(f64, f64)]) -> Vec<Point> {
        coords.iter().map(|&c| Point::from(c)).collect()
    }

    fn ann(shape: Shape) -> Annotation {
        Annotation::new(shape, "object", "#ff0000")
    }

    fn triangle() -> Annotation {
        ann(Shape::polygon(pts(&[(10.0, 10.0), (30.0, 10.0), (30.0, 30.0)])))
    }

    #[test]
    fn test_translate_box() {
        let list = vec![ann(Shape::BoundingBox {
            x: 10.0,
            y: 10.0,
            width: 20.0,
            height: 20.0,
        })];
        let edit = translate(&list, 0, 5.0, -5.0, W, H).expect("edit");
        assert_eq!(
            edit.annotations[0].shape,
            Shape::BoundingBox {
                x: 15.0,
                y: 5.0,
                width: 20.0,
                height: 20.0
            }
        );
        assert_eq!(edit.deleted, None);
    }

    #[test]
    fn test_translate_composes_and_clips() {
        let list = vec![triangle()];
        let once = translate(&list, 0, 10.0, 0.0, W, H).expect("edit");
        let twice = translate(&once.annotations, 0, 10.0, 0.0, W, H).expect("edit");
        assert_eq!(
            twice.annotations[0].shape.vertices(),
            Some(pts(&[(30.0, 10.0), (50.0, 10.0), (50.0, 30.0)]).as_slice())
        );

        let clipped = translate(&list, 0, 80.0, 0.0, W, H).expect("edit");
        let points = clipped.annotations[0].shape.vertices().expect("points");
        assert!(points.iter().all(|p| p.x <= W));
    }

    #[test]
    fn test_translate_off_canvas_deletes() {
        let list = vec![triangle(), triangle()];
        let edit = translate(&list, 1, 500.0, 0.0, W, H).expect("edit");
        assert_eq!(edit.annotations.len(), 1);
        assert_eq!(edit.deleted, Some(1));
    }

    #[test]
    fn test_stale_index_is_noop() {
        let list = vec![triangle()];
        assert!(translate(&list, 3, 1.0, 1.0, W, H).is_none());
        assert!(move_vertex(&list, 0, 9, Point::new(0.0, 0.0), W, H).is_none());
        assert!(remove_vertex(&list, 2, 0).is_none());
        assert!(delete(&list, 1).is_none());
    }

    #[test]
    fn test_move_vertex_reclips() {
        let list = vec![triangle()];
        let edit = move_vertex(&list, 0, 2, Point::new(30.0, 150.0), W, H).expect("edit");
        let points = edit.annotations[0].shape.vertices().expect("points");
        assert!(points.iter().all(|p| p.y <= H));
        assert!(points.contains(&Point::new(10.0, 10.0)));
        assert!(points.contains(&Point::new(30.0, 100.0)));
    }

    #[test]
    fn test_move_vertex_unsupported_kind() {
        let list = vec![ann(Shape::Point { x: 1.0, y: 1.0 })];
        assert!(move_vertex(&list, 0, 0, Point::new(2.0, 2.0), W, H).is_none());
    }

    #[test]
    fn test_remove_vertex_below_minimum_deletes() {
        let list = vec![triangle()];
        let edit = remove_vertex(&list, 0, 1).expect("edit");
        assert!(edit.annotations.is_empty());
        assert_eq!(edit.deleted, Some(0));

        let line = vec![ann(Shape::Polyline {
            points: pts(&[(0.0, 0.0), (5.0, 5.0), (9.0, 0.0)]),
        })];
        let edit = remove_vertex(&line, 0, 1).expect("edit");
        assert_eq!(
            edit.annotations[0].shape,
            Shape::Polyline {
                points: pts(&[(0.0, 0.0), (9.0, 0.0)])
            }
        );
    }

    #[test]
    fn test_insert_vertex_wraps_for_polygons() {
        let list = vec![triangle()];
        let edit = insert_vertex(&list, 0, 2).expect("edit");
        assert_eq!(
            edit.annotations[0].shape.vertices(),
            Some(pts(&[(10.0, 10.0), (30.0, 10.0), (30.0, 30.0), (20.0, 20.0)]).as_slice())
        );
    }

    #[test]
    fn test_insert_vertex_polyline_end() {
        let list = vec![ann(Shape::Polyline {
            points: pts(&[(0.0, 0.0), (10.0, 0.0)]),
        })];
        assert!(insert_vertex(&list, 0, 1).is_none());
        let edit = insert_vertex(&list, 0, 0).expect("edit");
        assert_eq!(
            edit.annotations[0].shape.vertices(),
            Some(pts(&[(0.0, 0.0), (5.0, 0.0), (10.0, 0.0)]).as_slice())
        );
    }

    #[test]
    fn test_resize_box_and_ellipse() {
        let list = vec![
            ann(Shape::BoundingBox {
                x: 10.0,
                y: 10.0,
                width: 20.0,
                height: 10.0,
            }),
            ann(Shape::Ellipse {
                x: 50.0,
                y: 50.0,
                radius_x: 10.0,
                radius_y: 5.0,
                rotation: 0.0,
            }),
        ];
        let transform = ResizeTransform {
            x: 5.0,
            y: 5.0,
            scale_x: 2.0,
            scale_y: -1.5,
            rotation: 0.0,
        };
        let edit = resize(&list, 0, transform, W, H).expect("edit");
        assert_eq!(
            edit.annotations[0].shape,
            Shape::BoundingBox {
                x: 5.0,
                y: 5.0,
                width: 40.0,
                height: 15.0
            }
        );

        let transform = ResizeTransform {
            rotation: 30.0,
            ..ResizeTransform::identity_at(50.0, 50.0)
        };
        let edit = resize(&list, 1, transform, W, H).expect("edit");
        assert_eq!(
            edit.annotations[1].shape,
            Shape::Ellipse {
                x: 50.0,
                y: 50.0,
                radius_x: 10.0,
                radius_y: 5.0,
                rotation: 30.0
            }
        );

        assert!(resize(&[triangle()], 0, transform, W, H).is_none());
    }

    #[test]
    fn test_paste_offsets_copy() {
        let list = vec![ann(Shape::polygon(pts(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)])))];
        let mut clipboard = Clipboard::new();
        assert!(clipboard.paste(PASTE_OFFSET, W, H).is_none());
        assert!(clipboard.copy(&list, 0));

        let pasted = clipboard.paste(PASTE_OFFSET, W, H).expect("pasted");
        assert_eq!(
            pasted.shape.vertices(),
            Some(pts(&[(10.0, 10.0), (20.0, 10.0), (20.0, 20.0)]).as_slice())
        );
        assert_eq!(pasted.label, "object");
        // Original is untouched
        assert_eq!(list[0].shape.vertices().map(|p| p[0]), Some(Point::new(0.0, 0.0)));
    }

    #[test]
    fn test_paste_clips() {
        let list = vec![ann(Shape::BoundingBox {
            x: 80.0,
            y: 80.0,
            width: 20.0,
            height: 20.0,
        })];
        let mut clipboard = Clipboard::new();
        clipboard.copy(&list, 0);
        let pasted = clipboard.paste(PASTE_OFFSET, W, H).expect("pasted");
        assert_eq!(
            pasted.shape,
            Shape::BoundingBox {
                x: 90.0,
                y: 90.0,
                width: 10.0,
                height: 10.0
            }
        );
        assert!(clipboard.paste((50.0, 50.0), W, H).is_none());
    }

    #[test]
    fn test_drag_promotion() {
        let mut state = EditState::press(DragTarget::Shape(0), Point::new(10.0, 10.0));
        state.update(Point::new(11.0, 10.0));
        assert!(state.is_potential_drag());

        state.update(Point::new(14.0, 10.0));
        assert!(state.is_dragging());

        let gesture = state.release(Point::new(20.0, 10.0));
        assert_eq!(
            gesture,
            Some(Gesture::Drag {
                target: DragTarget::Shape(0),
                start: Point::new(10.0, 10.0),
                end: Point::new(20.0, 10.0)
            })
        );
        assert_eq!(state, EditState::Idle);
    }

    #[test]
    fn test_release_without_drag_is_click() {
        let mut state = EditState::press(DragTarget::Vertex(0, 1), Point::new(10.0, 10.0));
        state.update(Point::new(11.0, 11.0));
        assert_eq!(
            state.release(Point::new(11.0, 11.0)),
            Some(Gesture::Click {
                target: DragTarget::Vertex(0, 1),
                at: Point::new(11.0, 11.0)
            })
        );
        assert_eq!(EditState::Idle.release(Point::new(0.0, 0.0)), None);
    }

    #[test]
    fn test_drag_preview() {
        let list = vec![triangle()];
        let mut state = EditState::press(DragTarget::Vertex(0, 0), Point::new(10.0, 10.0));
        assert!(state.preview(&list).is_none());
        state.update(Point::new(0.0, 0.0));
        let preview = state.preview(&list).expect("preview");
        assert_eq!(preview.shape.vertices().map(|p| p[0]), Some(Point::new(0.0, 0.0)));
    }
}
