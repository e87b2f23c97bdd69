//! Per-image annotation sessions.
//!
//! An [`AnnotationSession`] owns one image's committed annotations and wires
//! the shape builder, the editor, the clipper and the undo history together.
//! Every change to the committed list goes through one private `commit`, which
//! records the pre-mutation snapshot first.

use std::collections::HashMap;

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::clip::{clip, clip_all};
use crate::color_utils::allocate_instance_color;
use crate::config::EngineConfig;
use crate::drawing::{
    DrawInput, DrawKey, DrawOutcome, DrawingTool, PointerButton, PointerEvent, PointerEventKind,
    ShapeBuilder,
};
use crate::edit::{self, Clipboard, DragTarget, Edit, EditState, Gesture, ResizeTransform};
use crate::geometry::{hit_test, hit_test_vertex};
use crate::model::{Annotation, LabelClass, Point, Shape};
use crate::undo::AnnotationHistory;


/// Signals for the host, drained with [`AnnotationSession::drain_events`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    /// A drawn shape was finalized; the host may switch back to the move tool
    ShapeFinished,
    /// The annotation at this index was removed
    AnnotationDeleted(usize),
    SelectionChanged(Option<usize>),
    /// Undo/redo availability may have changed
    HistoryChanged,
}

/// Interactive annotation state of one image.
#[derive(Debug)]
pub struct AnnotationSession {
    annotations: Vec<Annotation>,
    width: f64,
    height: f64,

    labels: Vec<LabelClass>,
    active_label: LabelClass,
    instance_mode: bool,

    builder: ShapeBuilder,
    edit_state: EditState,
    selected: Option<usize>,
    clipboard: Clipboard,
    history: AnnotationHistory,

    rng: StdRng,
    color_retry_limit: usize,
    paste_offset: (f64, f64),
    hit_radius: f64,

    events: Vec<EngineEvent>,
}

impl AnnotationSession {
    /// Create an empty session for an image of the given size.
    pub fn new(width: f64, height: f64, config: &EngineConfig) -> Self {
        let rng = match config.colors.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            annotations: Vec::new(),
            width,
            height,
            labels: vec![LabelClass::default()],
            active_label: LabelClass::default(),
            instance_mode: false,
            builder: ShapeBuilder::new(DrawingTool::Move, config.builder_settings()),
            edit_state: EditState::Idle,
            selected: None,
            clipboard: Clipboard::new(),
            history: AnnotationHistory::new(config.editing.undo_limit),
            rng,
            color_retry_limit: config.colors.retry_limit,
            paste_offset: config.editing.paste_offset,
            hit_radius: config.editing.handle_hit_radius,
            events: Vec::new(),
        }
    }

    // ========================================================================
    // State access
    // ========================================================================

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn dimensions(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    pub fn tool(&self) -> DrawingTool {
        self.builder.tool()
    }

    pub fn builder(&self) -> &ShapeBuilder {
        &self.builder
    }

    pub fn edit_state(&self) -> &EditState {
        &self.edit_state
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn labels(&self) -> &[LabelClass] {
        &self.labels
    }

    pub fn active_label(&self) -> &LabelClass {
        &self.active_label
    }

    pub fn instance_mode(&self) -> bool {
        self.instance_mode
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// The in-progress shape or dragged annotation for live rendering.
    pub fn preview(&self) -> Option<Annotation> {
        if let Some(dragged) = self.edit_state.preview(&self.annotations) {
            return Some(dragged);
        }
        self.builder.preview_shape().map(|shape| {
            Annotation::new(shape, &self.active_label.name, &self.active_label.color)
        })
    }

    /// Take all pending events.
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    // ========================================================================
    // Host settings
    // ========================================================================

    /// Replace the annotation list without recording history (image load).
    ///
    /// Loaded annotations are clipped to the current dimensions.
    pub fn load(&mut self, annotations: Vec<Annotation>) {
        let count = annotations.len();
        self.annotations = clip_all(&annotations, self.width, self.height);
        if self.annotations.len() != count {
            log::info!(
                "Dropped {} loaded annotations outside the image",
                count - self.annotations.len()
            );
        }
        self.history.clear();
        self.edit_state = EditState::Idle;
        self.builder.cancel();
        self.set_selected(None);
        self.events.push(EngineEvent::HistoryChanged);
    }

    /// Update the image size and re-clip every annotation against it.
    pub fn set_dimensions(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
        let clipped = clip_all(&self.annotations, width, height);
        if clipped != self.annotations {
            log::debug!("Re-clipped annotations to {}x{}", width, height);
            self.set_selected(None);
            self.commit(clipped);
        }
    }

    /// Switch tools, dropping any in-progress shape or drag.
    pub fn set_tool(&mut self, tool: DrawingTool) {
        if self.builder.tool() != tool {
            log::debug!("Tool changed to {}", tool.name());
        }
        self.builder.set_tool(tool);
        self.edit_state = EditState::Idle;
    }

    pub fn set_labels(&mut self, labels: Vec<LabelClass>) {
        self.labels = labels;
    }

    /// Label and color stamped onto newly drawn shapes.
    pub fn set_active_label(&mut self, label: LabelClass) {
        self.active_label = label;
    }

    pub fn set_point_limit(&mut self, limit: usize) {
        self.builder.set_point_limit(limit);
    }

    /// Cap undo depth (0 = unbounded), dropping the oldest recorded steps.
    pub fn set_undo_limit(&mut self, limit: usize) {
        self.history.set_max_history(limit);
        self.events.push(EngineEvent::HistoryChanged);
    }

    /// Give new polygons their own instance id and color.
    pub fn set_instance_mode(&mut self, enabled: bool) {
        self.instance_mode = enabled;
    }

    /// Select an annotation; stale indices clear the selection.
    pub fn select(&mut self, index: Option<usize>) {
        let index = index.filter(|&i| i < self.annotations.len());
        self.set_selected(index);
    }

    fn set_selected(&mut self, index: Option<usize>) {
        if self.selected != index {
            self.selected = index;
            self.events.push(EngineEvent::SelectionChanged(index));
        }
    }

    // ========================================================================
    // Input
    // ========================================================================

    /// Route a pointer event to the builder or, for the move tool, the editor.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> DrawOutcome {
        if self.builder.tool() == DrawingTool::Move {
            self.handle_move_tool(event);
            return DrawOutcome::None;
        }
        let outcome = self.builder.handle(DrawInput::Pointer(event));
        self.after_draw(outcome)
    }

    pub fn handle_key(&mut self, key: DrawKey) -> DrawOutcome {
        if key == DrawKey::Cancel && self.edit_state != EditState::Idle {
            self.edit_state = EditState::Idle;
            return DrawOutcome::Cancelled;
        }
        let outcome = self.builder.handle(DrawInput::Key(key));
        self.after_draw(outcome)
    }

    /// Discard the shape being drawn, if any.
    pub fn cancel_in_progress_shape(&mut self) -> bool {
        self.builder.cancel()
    }

    pub fn set_reduction_threshold(&mut self, threshold: f64) {
        self.builder.set_reduction_threshold(threshold);
    }

    /// Commit the previewed reduction.
    pub fn apply_reduction(&mut self) -> DrawOutcome {
        let outcome = self.builder.apply_reduction();
        self.after_draw(outcome)
    }

    /// Commit the sampled shape without reduction.
    pub fn cancel_reduction(&mut self) -> DrawOutcome {
        let outcome = self.builder.cancel_reduction();
        self.after_draw(outcome)
    }

    fn after_draw(&mut self, outcome: DrawOutcome) -> DrawOutcome {
        if let DrawOutcome::Finished(shape) = &outcome {
            self.finish_shape(shape.clone());
        }
        outcome
    }

    /// Stamp, clip and commit a finished shape.
    fn finish_shape(&mut self, shape: Shape) {
        let annotation = self.stamp(shape);
        match clip(&annotation, self.width, self.height) {
            Some(clipped) => {
                log::info!("Committed {} '{}'", clipped.kind().name(), clipped.label);
                let mut next = self.annotations.clone();
                next.push(clipped);
                self.commit(next);
            }
            None => {
                log::debug!("Finished {} clipped away", annotation.kind().name());
            }
        }
        self.events.push(EngineEvent::ShapeFinished);
    }

    /// Apply the active label, or a fresh instance identity for instance-mode
    /// polygons.
    fn stamp(&mut self, shape: Shape) -> Annotation {
        let label = self.active_label.name.clone();
        if !self.instance_mode || !matches!(shape, Shape::Polygon { .. }) {
            return Annotation::new(shape, label, self.active_label.color.clone());
        }

        let (id, color) = self.allocate_instance(&label);
        let shape = match shape {
            Shape::Polygon {
                points,
                holes,
                opacity,
                ..
            } => Shape::Polygon {
                points,
                holes,
                instance_id: Some(id),
                opacity,
            },
            other => other,
        };
        Annotation::new(shape, label, color)
    }

    fn allocate_instance(&mut self, label: &str) -> (String, String) {
        let id = next_instance_id(&self.annotations, label);
        let label_colors: Vec<String> = self.labels.iter().map(|l| l.color.clone()).collect();
        let instance_colors: Vec<String> = self
            .annotations
            .iter()
            .filter(|ann| ann.instance_id().is_some())
            .map(|ann| ann.color.clone())
            .collect();
        let color = allocate_instance_color(
            &mut self.rng,
            &label_colors,
            &instance_colors,
            self.color_retry_limit,
        );
        log::debug!("Allocated instance {} with color {}", id, color);
        (id, color)
    }

    fn handle_move_tool(&mut self, event: PointerEvent) {
        let pos = event.pos;
        match (event.kind, event.button) {
            (PointerEventKind::Down, PointerButton::Primary) => {
                if let Some(vertex) = self.selected_vertex_at(&pos) {
                    self.edit_state = EditState::press(vertex, pos);
                    return;
                }
                let hit = hit_test(&self.annotations, &pos, self.hit_radius);
                self.set_selected(hit);
                self.edit_state = match hit {
                    Some(index) => EditState::press(DragTarget::Shape(index), pos),
                    None => EditState::Idle,
                };
            }
            (PointerEventKind::Down, PointerButton::Secondary) => {
                if let Some(DragTarget::Vertex(index, vertex)) = self.selected_vertex_at(&pos) {
                    self.remove_vertex(index, vertex);
                }
            }
            (PointerEventKind::Move, _) => self.edit_state.update(pos),
            (PointerEventKind::Up, _) => match self.edit_state.release(pos) {
                Some(Gesture::Drag {
                    target: DragTarget::Shape(index),
                    start,
                    end,
                }) => {
                    self.translate(index, end.x - start.x, end.y - start.y);
                }
                Some(Gesture::Drag {
                    target: DragTarget::Vertex(index, vertex),
                    end,
                    ..
                }) => {
                    self.move_vertex(index, vertex, end);
                }
                Some(Gesture::Click {
                    target: DragTarget::Vertex(index, vertex),
                    ..
                }) => {
                    self.insert_vertex(index, vertex);
                }
                Some(Gesture::Click { .. }) | None => {}
            },
        }
    }

    fn selected_vertex_at(&self, pos: &Point) -> Option<DragTarget> {
        let index = self.selected?;
        let annotation = self.annotations.get(index)?;
        hit_test_vertex(&annotation.shape, pos, self.hit_radius)
            .map(|vertex| DragTarget::Vertex(index, vertex))
    }

    // ========================================================================
    // Editing
    // ========================================================================

    pub fn translate(&mut self, index: usize, dx: f64, dy: f64) -> bool {
        let edit = edit::translate(&self.annotations, index, dx, dy, self.width, self.height);
        self.apply_edit(edit)
    }

    pub fn move_vertex(&mut self, index: usize, vertex: usize, pos: Point) -> bool {
        let edit = edit::move_vertex(
            &self.annotations,
            index,
            vertex,
            pos,
            self.width,
            self.height,
        );
        self.apply_edit(edit)
    }

    pub fn remove_vertex(&mut self, index: usize, vertex: usize) -> bool {
        let edit = edit::remove_vertex(&self.annotations, index, vertex);
        self.apply_edit(edit)
    }

    pub fn insert_vertex(&mut self, index: usize, vertex: usize) -> bool {
        let edit = edit::insert_vertex(&self.annotations, index, vertex);
        self.apply_edit(edit)
    }

    pub fn resize(&mut self, index: usize, transform: ResizeTransform) -> bool {
        let edit = edit::resize(&self.annotations, index, transform, self.width, self.height);
        self.apply_edit(edit)
    }

    pub fn delete(&mut self, index: usize) -> bool {
        let edit = edit::delete(&self.annotations, index);
        self.apply_edit(edit)
    }

    pub fn delete_selected(&mut self) -> bool {
        match self.selected {
            Some(index) => self.delete(index),
            None => false,
        }
    }

    pub fn copy_selected(&mut self) -> bool {
        match self.selected {
            Some(index) => self.clipboard.copy(&self.annotations, index),
            None => false,
        }
    }

    /// Append an offset, clipped copy of the clipboard and select it.
    pub fn paste(&mut self) -> bool {
        let Some(mut pasted) = self
            .clipboard
            .paste(self.paste_offset, self.width, self.height)
        else {
            return false;
        };

        // Instance identities stay unique
        if pasted.instance_id().is_some() {
            let (id, color) = self.allocate_instance(&pasted.label);
            if let Shape::Polygon { instance_id, .. } = &mut pasted.shape {
                *instance_id = Some(id);
            }
            pasted.color = color;
        }

        let mut next = self.annotations.clone();
        next.push(pasted);
        let index = next.len() - 1;
        self.commit(next);
        self.set_selected(Some(index));
        true
    }

    fn apply_edit(&mut self, edit: Option<Edit>) -> bool {
        let Some(edit) = edit else {
            return false;
        };
        self.commit(edit.annotations);

        if let Some(deleted) = edit.deleted {
            self.events.push(EngineEvent::AnnotationDeleted(deleted));
            match self.selected {
                Some(sel) if sel == deleted => self.set_selected(None),
                Some(sel) if sel > deleted => self.set_selected(Some(sel - 1)),
                _ => {}
            }
        }
        true
    }

    /// Replace the committed list, recording the previous one for undo.
    fn commit(&mut self, annotations: Vec<Annotation>) {
        let previous = std::mem::replace(&mut self.annotations, annotations);
        self.history.push(previous);
        self.events.push(EngineEvent::HistoryChanged);
    }

    // ========================================================================
    // History
    // ========================================================================

    pub fn undo(&mut self) -> bool {
        let current = self.annotations.clone();
        match self.history.undo(current) {
            Some(previous) => {
                self.restore(previous);
                log::debug!("Undo ({} steps left)", self.history.undo_count());
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        let current = self.annotations.clone();
        match self.history.redo(current) {
            Some(next) => {
                self.restore(next);
                log::debug!("Redo ({} steps left)", self.history.redo_count());
                true
            }
            None => false,
        }
    }

    fn restore(&mut self, annotations: Vec<Annotation>) {
        self.annotations = annotations;
        self.edit_state = EditState::Idle;
        if self.selected.is_some_and(|i| i >= self.annotations.len()) {
            self.set_selected(None);
        }
        self.events.push(EngineEvent::HistoryChanged);
    }
}

/// `"{label}_{n}"` with the smallest `n` not used by a live polygon of `label`.
fn next_instance_id(annotations: &[Annotation], label: &str) -> String {
    let prefix = format!("{}_", label);
    let used: Vec<u32> = annotations
        .iter()
        .filter(|ann| ann.label == label)
        .filter_map(|ann| ann.instance_id())
        .filter_map(|id| id.strip_prefix(&prefix))
        .filter_map(|n| n.parse().ok())
        .collect();
    let n = (1..).find(|n| !used.contains(n)).unwrap_or(1);
    format!("{}{}", prefix, n)
}

/// Sessions keyed by image (URL or path).
#[derive(Debug, Default)]
pub struct SessionStore {
    config: EngineConfig,
    sessions: HashMap<String, AnnotationSession>,
}

impl SessionStore {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            sessions: HashMap::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Get the session for an image, creating an empty one if it does not
    /// exist yet.
    pub fn get_or_create(&mut self, key: &str, width: f64, height: f64) -> &mut AnnotationSession {
        let config = &self.config;
        self.sessions.entry(key.to_string()).or_insert_with(|| {
            log::debug!("New annotation session for {}", key);
            AnnotationSession::new(width, height, config)
        })
    }

    pub fn get(&self, key: &str) -> Option<&AnnotationSession> {
        self.sessions.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut AnnotationSession> {
        self.sessions.get_mut(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<AnnotationSession> {
        self.sessions.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.sessions.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
