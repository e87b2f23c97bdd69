//! annotate_geom - Interactive vector annotation geometry
//!
//! Shape construction, boundary clipping, vertex editing, point-density
//! reduction, undo/redo and instance color allocation for drawing labels over
//! raster images. Rendering, persistence and networking belong to the host.

pub mod clip;
pub mod color_utils;
pub mod config;
pub mod constants;
pub mod drawing;
pub mod edit;
pub mod error;
pub mod format;
pub mod geometry;
pub mod model;
pub mod session;
pub mod simplify;
pub mod undo;

pub use config::{EngineConfig, LogLevel};
pub use drawing::{DrawInput, DrawKey, DrawOutcome, DrawingTool, PointerEvent, ShapeBuilder};
pub use error::{EngineError, Result};
pub use format::ImageDocument;
pub use model::{Annotation, LabelClass, Point, Shape, ShapeKind};
pub use session::{AnnotationSession, EngineEvent, SessionStore};
