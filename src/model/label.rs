//! Label class data model.

use serde::{Deserialize, Serialize};

use crate::color_utils::default_label_color;

/// A label class with a name and a base color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelClass {
    /// Display name of the label
    pub name: String,
    /// Base color as `#rrggbb`
    pub color: String,
}

impl LabelClass {
    /// Create a new label with the given name and color.
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
        }
    }

    /// Create a label colored from the default palette slot `index`.
    pub fn with_default_color(name: impl Into<String>, index: usize) -> Self {
        Self::new(name, default_label_color(index))
    }
}

impl Default for LabelClass {
    fn default() -> Self {
        Self::with_default_color("object", 0)
    }
}
