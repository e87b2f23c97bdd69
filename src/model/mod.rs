//! Data models for the annotation engine.

mod annotation;
mod label;

pub use annotation::{Annotation, Point, Shape, ShapeKind};
pub use label::LabelClass;
