//! Persistence document for one image.
//!
//! The host stores and loads this document verbatim; the engine only defines
//! its shape. Field names are camelCase so documents interoperate with web
//! frontends.

mod timestamp;

pub use timestamp::{format_iso8601, now_iso8601};

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::model::{Annotation, LabelClass};

/// Current document format version.
pub const DOCUMENT_VERSION: u32 = 1;

fn default_version() -> u32 {
    DOCUMENT_VERSION
}

/// Annotations and label palette of one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageDocument {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub label_classes: Vec<LabelClass>,

    #[serde(default)]
    pub annotations: Vec<Annotation>,

    /// Last modified timestamp (ISO 8601)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

impl ImageDocument {
    /// Create a document stamped with the current time.
    pub fn new(label_classes: Vec<LabelClass>, annotations: Vec<Annotation>) -> Self {
        Self {
            version: DOCUMENT_VERSION,
            label_classes,
            annotations,
            last_updated: Some(now_iso8601()),
        }
    }

    /// Update the modified timestamp.
    pub fn touch(&mut self) {
        self.last_updated = Some(now_iso8601());
    }

    /// Serialize the document to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize a document from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let document: Self = serde_json::from_str(json)?;
        if document.version > DOCUMENT_VERSION {
            return Err(EngineError::VersionMismatch {
                expected: DOCUMENT_VERSION,
                found: document.version,
            });
        }
        log::debug!(
            "Loaded document with {} annotations and {} labels",
            document.annotations.len(),
            document.label_classes.len()
        );
        Ok(document)
    }
}

impl Default for ImageDocument {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new())
    }
}
