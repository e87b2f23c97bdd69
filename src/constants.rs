//! Global constants for the annotation engine

use web_time::Duration;

/// Two clicks closer together than this finalize the shape being collected
pub const DOUBLE_CLICK_WINDOW: Duration = Duration::from_millis(250);

/// Default point limit for point-collecting tools (0 = unlimited)
pub const DEFAULT_POINT_LIMIT: usize = 0;

/// Minimum pointer travel (image pixels) between continuous-drag samples
pub const DEFAULT_MIN_SAMPLE_DISTANCE: f64 = 5.0;

/// Initial threshold of the point-density reduction preview
pub const DEFAULT_REDUCTION_THRESHOLD: f64 = 5.0;

/// Minimum number of vertices required for a valid polygon.
pub const MIN_POLYGON_VERTICES: usize = 3;

/// Minimum number of vertices required for a valid polyline.
pub const MIN_POLYLINE_VERTICES: usize = 2;

/// Minimum number of members of a multi-point annotation.
pub const MIN_POINTS_MEMBERS: usize = 1;

/// Ellipses with a radius below this are removed by clipping.
pub const MIN_ELLIPSE_RADIUS: f64 = 1.0;

/// Polyline sub-segment endpoints closer than this are merged when stitching.
pub const STITCH_TOLERANCE: f64 = 1e-8;

/// Offset applied to every coordinate of a pasted annotation
pub const PASTE_OFFSET: (f64, f64) = (10.0, 10.0);

/// Pointer travel (image pixels) before a press on a shape becomes a drag
pub const MIN_DRAG_DISTANCE: f64 = 3.0;

/// Hit radius for vertex handles and point annotations (image pixels)
pub const HANDLE_HIT_RADIUS: f64 = 8.0;

/// Random candidates tried before the instance color allocator gives up
pub const COLOR_RETRY_LIMIT: usize = 100;

/// Default undo history depth per image, 0 keeps every step
pub const UNDO_STACK_LIMIT: usize = 0;
