//! Shape construction state machine.
//!
//! A [`ShapeBuilder`] owns one [`DrawingState`] value and turns pointer/key
//! input into finished shapes through a single reducer, [`ShapeBuilder::handle`].
//! The builder only produces raw geometry; labeling, clipping and committing a
//! finished shape is the session's job.

use web_time::{Duration, Instant};

use crate::constants::{
    DEFAULT_MIN_SAMPLE_DISTANCE, DEFAULT_POINT_LIMIT, DEFAULT_REDUCTION_THRESHOLD,
    DOUBLE_CLICK_WINDOW,
};
use crate::model::{Point, Shape, ShapeKind};
use crate::simplify::DensityPreview;

/// Tools the host can activate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawingTool {
    /// Select/move tool for editing committed annotations
    #[default]
    Move,
    BoundingBox,
    Ellipse,
    Polygon,
    Polyline,
    Point,
    Points,
}

impl DrawingTool {
    /// Get the display name for this tool.
    pub fn name(&self) -> &'static str {
        match self {
            DrawingTool::Move => "Move",
            DrawingTool::BoundingBox => "Bounding Box",
            DrawingTool::Ellipse => "Ellipse",
            DrawingTool::Polygon => "Polygon",
            DrawingTool::Polyline => "Polyline",
            DrawingTool::Point => "Point",
            DrawingTool::Points => "Points",
        }
    }

    /// Get all available tools.
    pub fn all() -> &'static [DrawingTool] {
        &[
            DrawingTool::Move,
            DrawingTool::BoundingBox,
            DrawingTool::Ellipse,
            DrawingTool::Polygon,
            DrawingTool::Polyline,
            DrawingTool::Point,
            DrawingTool::Points,
        ]
    }

    /// Check if this tool is a drawing tool (not Move).
    pub fn is_drawing_tool(&self) -> bool {
        !matches!(self, DrawingTool::Move)
    }

    /// Kind of shape this tool produces.
    pub fn shape_kind(&self) -> Option<ShapeKind> {
        match self {
            DrawingTool::Move => None,
            DrawingTool::BoundingBox => Some(ShapeKind::BoundingBox),
            DrawingTool::Ellipse => Some(ShapeKind::Ellipse),
            DrawingTool::Polygon => Some(ShapeKind::Polygon),
            DrawingTool::Polyline => Some(ShapeKind::Polyline),
            DrawingTool::Point => Some(ShapeKind::Point),
            DrawingTool::Points => Some(ShapeKind::Points),
        }
    }

    /// Tools that build shapes click by click.
    pub fn collects_points(&self) -> bool {
        matches!(
            self,
            DrawingTool::Polygon | DrawingTool::Polyline | DrawingTool::Points
        )
    }

    /// Tools that support modifier-drag continuous sampling.
    pub fn supports_sampling(&self) -> bool {
        matches!(self, DrawingTool::Polygon | DrawingTool::Polyline)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEventKind {
    Down,
    Move,
    Up,
}

/// A pointer event in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerEventKind,
    pub button: PointerButton,
    pub pos: Point,
    /// Continuous-sampling modifier held
    pub modifier: bool,
    pub at: Instant,
}

impl PointerEvent {
    pub fn new(kind: PointerEventKind, pos: Point, at: Instant) -> Self {
        Self {
            kind,
            button: PointerButton::Primary,
            pos,
            modifier: false,
            at,
        }
    }

    pub fn down(pos: Point, at: Instant) -> Self {
        Self::new(PointerEventKind::Down, pos, at)
    }

    pub fn moved(pos: Point, at: Instant) -> Self {
        Self::new(PointerEventKind::Move, pos, at)
    }

    pub fn up(pos: Point, at: Instant) -> Self {
        Self::new(PointerEventKind::Up, pos, at)
    }

    pub fn with_button(mut self, button: PointerButton) -> Self {
        self.button = button;
        self
    }

    pub fn with_modifier(mut self, modifier: bool) -> Self {
        self.modifier = modifier;
        self
    }
}

/// Keyboard commands understood while drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawKey {
    /// Finish the shape being collected
    Finish,
    /// Remove the last added point (delete/backspace)
    RemoveLast,
    /// Drop all in-progress state
    Cancel,
    /// The continuous-sampling modifier was released
    ModifierReleased,
}

/// Input to the construction reducer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawInput {
    Pointer(PointerEvent),
    Key(DrawKey),
}

/// Result of feeding one input to the builder.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOutcome {
    None,
    /// A shape is complete and ready to be labeled, clipped and committed
    Finished(Shape),
    /// In-progress state was discarded
    Cancelled,
    /// Continuous sampling ended and a density preview is waiting
    ReductionStarted,
}

/// State of the shape under construction.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DrawingState {
    /// Not currently drawing anything.
    #[default]
    Idle,
    /// Dragging out a bounding box from its anchor corner.
    Box { anchor: Point, current: Point },
    /// Dragging out an ellipse from its center.
    Ellipse { center: Point, current: Point },
    /// Collecting vertices for a polygon, polyline or point set.
    Collecting {
        kind: ShapeKind,
        points: Vec<Point>,
        /// Time of the last click, for double-click detection
        last_click: Option<Instant>,
        sampling: bool,
    },
    /// Previewing a density reduction of sampled vertices.
    Reducing {
        kind: ShapeKind,
        preview: DensityPreview,
    },
}

impl DrawingState {
    /// Check if we're currently drawing something.
    pub fn is_drawing(&self) -> bool {
        !matches!(self, DrawingState::Idle)
    }
}

/// Tunables of the construction state machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuilderSettings {
    /// Auto-finalize once this many points are collected (0 = unlimited)
    pub point_limit: usize,
    /// Minimum pointer travel between continuous samples
    pub min_sample_distance: f64,
    /// Initial threshold of the reduction preview
    pub reduction_threshold: f64,
    /// Second click within this window finalizes
    pub double_click_window: Duration,
}

impl Default for BuilderSettings {
    fn default() -> Self {
        Self {
            point_limit: DEFAULT_POINT_LIMIT,
            min_sample_distance: DEFAULT_MIN_SAMPLE_DISTANCE,
            reduction_threshold: DEFAULT_REDUCTION_THRESHOLD,
            double_click_window: DOUBLE_CLICK_WINDOW,
        }
    }
}

/// Incremental shape builder for the active tool.
#[derive(Debug, Clone, Default)]
pub struct ShapeBuilder {
    tool: DrawingTool,
    settings: BuilderSettings,
    state: DrawingState,
}

impl ShapeBuilder {
    pub fn new(tool: DrawingTool, settings: BuilderSettings) -> Self {
        Self {
            tool,
            settings,
            state: DrawingState::Idle,
        }
    }

    pub fn tool(&self) -> DrawingTool {
        self.tool
    }

    pub fn state(&self) -> &DrawingState {
        &self.state
    }

    pub fn settings(&self) -> &BuilderSettings {
        &self.settings
    }

    /// Switch tools, discarding anything in progress.
    pub fn set_tool(&mut self, tool: DrawingTool) {
        if self.tool != tool {
            self.cancel();
            self.tool = tool;
        }
    }

    pub fn set_point_limit(&mut self, limit: usize) {
        self.settings.point_limit = limit;
    }

    pub fn is_drawing(&self) -> bool {
        self.state.is_drawing()
    }

    /// Drop all in-progress state. Returns whether anything was discarded.
    pub fn cancel(&mut self) -> bool {
        let was_drawing = self.state.is_drawing();
        if was_drawing {
            log::debug!("{}: cancelled", self.tool.name());
        }
        self.state = DrawingState::Idle;
        was_drawing
    }

    /// Feed one input through the state machine.
    pub fn handle(&mut self, input: DrawInput) -> DrawOutcome {
        match input {
            DrawInput::Key(key) => self.handle_key(key),
            DrawInput::Pointer(event) => self.handle_pointer(event),
        }
    }

    fn handle_pointer(&mut self, event: PointerEvent) -> DrawOutcome {
        log::trace!(
            "{}: {:?} {:?} at ({:.1}, {:.1})",
            self.tool.name(),
            event.kind,
            event.button,
            event.pos.x,
            event.pos.y
        );

        match self.tool {
            DrawingTool::Move => DrawOutcome::None,
            DrawingTool::BoundingBox | DrawingTool::Ellipse => self.handle_drag_shape(event),
            DrawingTool::Point => {
                if event.kind == PointerEventKind::Down && event.button == PointerButton::Primary {
                    DrawOutcome::Finished(Shape::Point {
                        x: event.pos.x,
                        y: event.pos.y,
                    })
                } else {
                    DrawOutcome::None
                }
            }
            DrawingTool::Polygon | DrawingTool::Polyline | DrawingTool::Points => {
                self.handle_collecting(event)
            }
        }
    }

    /// Press-drag-release construction for boxes and ellipses.
    fn handle_drag_shape(&mut self, event: PointerEvent) -> DrawOutcome {
        if event.button != PointerButton::Primary {
            return DrawOutcome::None;
        }

        if event.kind == PointerEventKind::Down {
            self.state = if self.tool == DrawingTool::Ellipse {
                DrawingState::Ellipse {
                    center: event.pos,
                    current: event.pos,
                }
            } else {
                DrawingState::Box {
                    anchor: event.pos,
                    current: event.pos,
                }
            };
            log::debug!(
                "{}: started at ({:.1}, {:.1})",
                self.tool.name(),
                event.pos.x,
                event.pos.y
            );
            return DrawOutcome::None;
        }

        match &mut self.state {
            DrawingState::Box { current, .. } | DrawingState::Ellipse { current, .. } => {
                *current = event.pos;
            }
            _ => return DrawOutcome::None,
        }

        if event.kind == PointerEventKind::Up {
            let shape = self.preview_shape();
            self.state = DrawingState::Idle;
            if let Some(shape) = shape {
                log::debug!("{}: finished", self.tool.name());
                return DrawOutcome::Finished(shape);
            }
        }
        DrawOutcome::None
    }

    /// Click-by-click construction for polygons, polylines and point sets.
    fn handle_collecting(&mut self, event: PointerEvent) -> DrawOutcome {
        if matches!(self.state, DrawingState::Reducing { .. }) {
            return DrawOutcome::None;
        }

        match (event.kind, event.button) {
            (PointerEventKind::Down, PointerButton::Secondary) => {
                self.remove_last();
                DrawOutcome::None
            }
            (PointerEventKind::Down, PointerButton::Primary)
                if event.modifier && self.tool.supports_sampling() =>
            {
                self.start_sampling(event.pos)
            }
            (PointerEventKind::Down, PointerButton::Primary) => self.click(event.pos, event.at),
            (PointerEventKind::Move, _) => {
                if !self.is_sampling() {
                    return DrawOutcome::None;
                }
                if !event.modifier {
                    return self.end_sampling();
                }
                self.sample(event.pos);
                DrawOutcome::None
            }
            (PointerEventKind::Up, _) => {
                if self.is_sampling() {
                    self.end_sampling()
                } else {
                    DrawOutcome::None
                }
            }
        }
    }

    fn handle_key(&mut self, key: DrawKey) -> DrawOutcome {
        match key {
            DrawKey::Finish => match self.state {
                DrawingState::Reducing { .. } => self.apply_reduction(),
                DrawingState::Collecting { .. } => self.finalize(),
                _ => DrawOutcome::None,
            },
            DrawKey::RemoveLast => {
                self.remove_last();
                DrawOutcome::None
            }
            DrawKey::ModifierReleased => {
                if self.is_sampling() {
                    self.end_sampling()
                } else {
                    DrawOutcome::None
                }
            }
            DrawKey::Cancel => {
                if self.cancel() {
                    DrawOutcome::Cancelled
                } else {
                    DrawOutcome::None
                }
            }
        }
    }

    // ========================================================================
    // Point collection
    // ========================================================================

    /// Add a vertex, or finalize when this click completes a double-click.
    fn click(&mut self, pos: Point, at: Instant) -> DrawOutcome {
        let Some(kind) = self.tool.shape_kind() else {
            return DrawOutcome::None;
        };
        let window = self.settings.double_click_window;
        let limit = self.settings.point_limit;

        let previous = match &self.state {
            DrawingState::Collecting { last_click, .. } => *last_click,
            _ => None,
        };
        if previous.is_some_and(|prev| at.saturating_duration_since(prev) < window) {
            log::debug!("{}: double-click", self.tool.name());
            let outcome = self.finalize();
            if let DrawingState::Collecting { last_click, .. } = &mut self.state {
                *last_click = None;
            }
            return outcome;
        }

        let count = match &mut self.state {
            DrawingState::Collecting {
                points, last_click, ..
            } => {
                points.push(pos);
                *last_click = Some(at);
                points.len()
            }
            _ => {
                log::debug!(
                    "{}: started at ({:.1}, {:.1})",
                    self.tool.name(),
                    pos.x,
                    pos.y
                );
                self.state = DrawingState::Collecting {
                    kind,
                    points: vec![pos],
                    last_click: Some(at),
                    sampling: false,
                };
                1
            }
        };
        log::trace!(
            "{}: added vertex {} at ({:.1}, {:.1})",
            self.tool.name(),
            count,
            pos.x,
            pos.y
        );

        if limit > 0 && count >= limit {
            log::debug!("{}: point limit {} reached", self.tool.name(), limit);
            return self.finalize();
        }
        DrawOutcome::None
    }

    fn remove_last(&mut self) {
        let now_empty = match &mut self.state {
            DrawingState::Collecting {
                points,
                sampling: false,
                ..
            } => {
                points.pop();
                points.is_empty()
            }
            _ => return,
        };
        log::debug!("{}: removed last point", self.tool.name());
        if now_empty {
            self.state = DrawingState::Idle;
        }
    }

    /// Build the collected shape if it has enough vertices.
    ///
    /// Too few vertices refuses the finalize and keeps collecting.
    fn finalize(&mut self) -> DrawOutcome {
        let DrawingState::Collecting { kind, points, .. } = &self.state else {
            return DrawOutcome::None;
        };

        let min = kind.min_vertices().unwrap_or(1);
        if points.len() < min {
            log::debug!(
                "{}: {} of {} required points, not finishing",
                self.tool.name(),
                points.len(),
                min
            );
            if points.is_empty() {
                self.state = DrawingState::Idle;
            }
            return DrawOutcome::None;
        }

        let shape = shape_from_points(*kind, points.clone());
        self.state = DrawingState::Idle;
        DrawOutcome::Finished(shape)
    }

    // ========================================================================
    // Continuous sampling and reduction
    // ========================================================================

    fn is_sampling(&self) -> bool {
        matches!(self.state, DrawingState::Collecting { sampling: true, .. })
    }

    fn start_sampling(&mut self, pos: Point) -> DrawOutcome {
        let Some(kind) = self.tool.shape_kind() else {
            return DrawOutcome::None;
        };
        match &mut self.state {
            DrawingState::Collecting {
                points,
                last_click,
                sampling,
                ..
            } => {
                points.push(pos);
                *last_click = None;
                *sampling = true;
            }
            _ => {
                self.state = DrawingState::Collecting {
                    kind,
                    points: vec![pos],
                    last_click: None,
                    sampling: true,
                };
            }
        }
        log::debug!("{}: continuous sampling started", self.tool.name());
        DrawOutcome::None
    }

    fn sample(&mut self, pos: Point) {
        let min_distance = self.settings.min_sample_distance;
        if let DrawingState::Collecting { points, .. } = &mut self.state {
            let far_enough = points
                .last()
                .is_none_or(|last| last.distance_to(&pos) >= min_distance);
            if far_enough {
                points.push(pos);
            }
        }
    }

    fn end_sampling(&mut self) -> DrawOutcome {
        let threshold = self.settings.reduction_threshold;
        let DrawingState::Collecting {
            kind,
            points,
            sampling,
            ..
        } = &mut self.state
        else {
            return DrawOutcome::None;
        };
        *sampling = false;

        let min = kind.min_vertices().unwrap_or(1);
        if points.len() < min {
            log::debug!(
                "{}: sampling ended with {} points, still collecting",
                self.tool.name(),
                points.len()
            );
            return DrawOutcome::None;
        }

        let kind = *kind;
        let original = std::mem::take(points);
        log::debug!(
            "{}: sampling ended with {} points, previewing reduction",
            self.tool.name(),
            original.len()
        );
        self.state = DrawingState::Reducing {
            kind,
            preview: DensityPreview::new(original, threshold),
        };
        DrawOutcome::ReductionStarted
    }

    /// Current reduction preview, if one is shown.
    pub fn reduction(&self) -> Option<&DensityPreview> {
        match &self.state {
            DrawingState::Reducing { preview, .. } => Some(preview),
            _ => None,
        }
    }

    /// Recompute the reduction preview from the original points.
    pub fn set_reduction_threshold(&mut self, threshold: f64) {
        if let DrawingState::Reducing { preview, .. } = &mut self.state {
            preview.set_threshold(threshold);
        }
    }

    /// Finish with the currently previewed points.
    pub fn apply_reduction(&mut self) -> DrawOutcome {
        self.finish_reduction(DensityPreview::apply)
    }

    /// Finish with the original, unreduced points.
    pub fn cancel_reduction(&mut self) -> DrawOutcome {
        self.finish_reduction(DensityPreview::cancel)
    }

    fn finish_reduction(&mut self, pick: fn(DensityPreview) -> Vec<Point>) -> DrawOutcome {
        match std::mem::take(&mut self.state) {
            DrawingState::Reducing { kind, preview } => {
                DrawOutcome::Finished(shape_from_points(kind, pick(preview)))
            }
            other => {
                self.state = other;
                DrawOutcome::None
            }
        }
    }

    /// The in-progress shape for live rendering.
    ///
    /// Boxes may have negative extents here.
    pub fn preview_shape(&self) -> Option<Shape> {
        match &self.state {
            DrawingState::Idle => None,
            DrawingState::Box { anchor, current } => Some(Shape::BoundingBox {
                x: anchor.x,
                y: anchor.y,
                width: current.x - anchor.x,
                height: current.y - anchor.y,
            }),
            DrawingState::Ellipse { center, current } => Some(Shape::Ellipse {
                x: center.x,
                y: center.y,
                radius_x: (current.x - center.x).abs(),
                radius_y: (current.y - center.y).abs(),
                rotation: 0.0,
            }),
            DrawingState::Collecting { kind, points, .. } => {
                Some(shape_from_points(*kind, points.clone()))
            }
            DrawingState::Reducing { kind, preview } => {
                Some(shape_from_points(*kind, preview.preview().to_vec()))
            }
        }
    }
}

fn shape_from_points(kind: ShapeKind, points: Vec<Point>) -> Shape {
    match kind {
        ShapeKind::Polyline => Shape::Polyline { points },
        ShapeKind::Points => Shape::Points { points },
        _ => Shape::polygon(points),
    }
}
