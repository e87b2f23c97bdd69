//! Snapshot-based undo/redo history.
//!
//! Each entry is a whole snapshot (for the engine: the full annotation array of
//! one image), not a diff. Mutations push the pre-mutation state; undo and redo
//! swap the current state with the top of the opposite stack.

use crate::constants::UNDO_STACK_LIMIT;
use crate::model::Annotation;

/// Undo history of one image's annotation list.
pub type AnnotationHistory = UndoStack<Vec<Annotation>>;

/// Bounded two-sided snapshot stack.
///
/// # Example
/// ```
/// use annotate_geom::undo::AnnotationHistory;
/// use annotate_geom::{Annotation, Shape};
///
/// let mut history = AnnotationHistory::new(0);
/// let mut annotations: Vec<Annotation> = Vec::new();
///
/// // Record the list before adding a box
/// history.push(annotations.clone());
/// annotations.push(Annotation::new(
///     Shape::BoundingBox { x: 10.0, y: 10.0, width: 20.0, height: 5.0 },
///     "car",
///     "#00ff00",
/// ));
///
/// annotations = history.undo(annotations).expect("one step recorded");
/// assert!(annotations.is_empty());
///
/// annotations = history.redo(annotations).expect("undone step is redoable");
/// assert_eq!(annotations[0].label, "car");
/// ```
#[derive(Debug, Clone)]
pub struct UndoStack<T: Clone> {
    undo_stack: Vec<T>,
    redo_stack: Vec<T>,
    /// Depth cap applied to both stacks, 0 for unbounded
    max_history: usize,
}

impl<T: Clone> Default for UndoStack<T> {
    fn default() -> Self {
        Self::new(UNDO_STACK_LIMIT)
    }
}

impl<T: Clone> UndoStack<T> {
    /// Create a stack holding at most `max_history` entries per side (0 = unbounded).
    pub fn new(max_history: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_history,
        }
    }

    /// Record the state from before a mutation.
    ///
    /// A new mutation forks history, so the redo side is dropped.
    pub fn push(&mut self, state: T) {
        self.undo_stack.push(state);
        self.redo_stack.clear();
        trim(&mut self.undo_stack, self.max_history);
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Step back, trading `current` onto the redo side.
    pub fn undo(&mut self, current: T) -> Option<T> {
        let prev = self.undo_stack.pop()?;
        self.redo_stack.push(current);
        trim(&mut self.redo_stack, self.max_history);
        Some(prev)
    }

    /// Step forward, trading `current` onto the undo side.
    pub fn redo(&mut self, current: T) -> Option<T> {
        let next = self.redo_stack.pop()?;
        self.undo_stack.push(current);
        trim(&mut self.undo_stack, self.max_history);
        Some(next)
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }

    /// Change the depth cap, evicting the oldest entries of both sides.
    ///
    /// The redo side loses the steps furthest from the current state.
    pub fn set_max_history(&mut self, max_history: usize) {
        self.max_history = max_history;
        trim(&mut self.undo_stack, max_history);
        trim(&mut self.redo_stack, max_history);
    }

    /// Forget both sides, e.g. when another image is loaded.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        log::debug!("Undo history cleared");
    }
}

/// Evict entries past `max` (0 = unbounded) from the bottom of a stack, which
/// is the step furthest from the current state on either side.
fn trim<T>(stack: &mut Vec<T>, max: usize) {
    if max > 0 && stack.len() > max {
        let excess = stack.len() - max;
        stack.drain(..excess);
        log::trace!("History trimmed by {}", excess);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Shape;

    fn point(x: f64) -> Annotation {
        Annotation::new(Shape::Point { x, y: 0.0 }, "dot", "#000000")
    }

    #[test]
    fn test_undo_stack_basic() {
        let mut stack: UndoStack<i32> = UndoStack::new(10);
        assert!(!stack.can_undo());
        assert!(!stack.can_redo());

        stack.push(1);
        assert!(stack.can_undo());
        assert!(!stack.can_redo());

        assert_eq!(stack.undo(2), Some(1));
        assert!(!stack.can_undo());
        assert!(stack.can_redo());

        assert_eq!(stack.redo(1), Some(2));
        assert!(stack.can_undo());
        assert!(!stack.can_redo());
    }

    #[test]
    fn test_push_clears_redo() {
        let mut stack: UndoStack<i32> = UndoStack::new(10);
        stack.push(1);
        stack.undo(2);
        assert!(stack.can_redo());

        stack.push(3);
        assert!(!stack.can_redo());
    }

    #[test]
    fn test_empty_stacks_are_noops() {
        let mut history = AnnotationHistory::default();
        assert_eq!(history.max_history(), 0);
        assert_eq!(history.undo(vec![point(1.0)]), None);
        assert_eq!(history.redo(vec![point(1.0)]), None);
        assert_eq!(history.redo_count(), 0);
    }

    #[test]
    fn test_max_history() {
        let mut stack: UndoStack<i32> = UndoStack::new(3);
        for i in 0..5 {
            stack.push(i);
        }
        assert_eq!(stack.undo_count(), 3);
        // Oldest entries are evicted first
        assert_eq!(stack.undo(5), Some(4));
        assert_eq!(stack.undo(4), Some(3));
        assert_eq!(stack.undo(3), Some(2));
        assert_eq!(stack.undo(2), None);
    }

    #[test]
    fn test_lowering_cap_trims_both_sides() {
        let mut stack: UndoStack<i32> = UndoStack::new(0);
        for i in 0..6 {
            stack.push(i);
        }
        // undo side [0, 1, 2], redo side [6, 5, 4]
        let mut current = 6;
        for _ in 0..3 {
            current = stack.undo(current).expect("recorded");
        }
        assert_eq!(current, 3);

        stack.set_max_history(2);
        assert_eq!(stack.max_history(), 2);
        assert_eq!(stack.undo_count(), 2);
        assert_eq!(stack.redo_count(), 2);

        // Redoing grows the undo side, which stays capped
        assert_eq!(stack.redo(3), Some(4));
        assert_eq!(stack.redo(4), Some(5));
        assert_eq!(stack.redo(5), None);
        assert_eq!(stack.undo_count(), 2);

        assert_eq!(stack.undo(5), Some(4));
        assert_eq!(stack.undo(4), Some(3));
        assert_eq!(stack.undo(3), None);
        assert_eq!(stack.redo_count(), 2);
    }

    #[test]
    fn test_zero_limit_is_unbounded() {
        let mut stack: UndoStack<usize> = UndoStack::new(0);
        for i in 0..500 {
            stack.push(i);
        }
        assert_eq!(stack.undo_count(), 500);
    }

    #[test]
    fn test_round_trip_restores_annotation_lists() {
        let mut history = AnnotationHistory::new(0);
        let mut current: Vec<Annotation> = Vec::new();
        for i in 0..4 {
            history.push(current.clone());
            current.push(point(i as f64));
        }
        let final_state = current.clone();

        while let Some(prev) = history.undo(current.clone()) {
            current = prev;
        }
        assert!(current.is_empty());

        while let Some(next) = history.redo(current.clone()) {
            current = next;
        }
        assert_eq!(current, final_state);
    }
}
