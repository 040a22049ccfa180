//! Finding-aid model: description components and the containers they cite.
//!
//! Components are held in a flat arena indexed in document (pre-)order.
//! The arena is read-only once parsed; back-references are injected into a
//! rewritten copy of the document, never into the model.

pub mod inject;
pub mod parse;

use std::path::{Path, PathBuf};

pub use inject::DigitalObjectRefs;
pub use parse::{parse_finding_aid, parse_finding_aid_str};

/// A physical or logical holder cited by a component, e.g. "Box 1".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Container {
    pub id: Option<String>,
    /// Free-text `type` attribute (`box`, `folder`, `othertype`, ...).
    pub kind: Option<String>,
    /// Element content, e.g. `1` for Box 1.
    pub label: String,
    /// Explicit `label` attribute naming a custom type.
    pub custom_label: Option<String>,
    /// Identifier of another container of the same component.
    pub parent: Option<String>,
}

impl Container {
    pub fn new(kind: Option<&str>, label: &str) -> Self {
        Self {
            kind: kind.map(str::to_string),
            label: label.to_string(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_parent(mut self, parent: &str) -> Self {
        self.parent = Some(parent.to_string());
        self
    }

    pub fn with_custom_label(mut self, label: &str) -> Self {
        self.custom_label = Some(label.to_string());
        self
    }
}

/// One unit of description (`c`, `c01` .. `c12`).
#[derive(Debug, Clone, Default)]
pub struct Component {
    /// Position in document pre-order; stable for a given document.
    pub index: usize,
    pub id: Option<String>,
    pub level: Option<String>,
    pub title: Option<String>,
    pub date: Option<String>,
    pub containers: Vec<Container>,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    /// Nesting depth, 1 for top-level components.
    pub depth: usize,
}

#[derive(Debug, Clone)]
pub struct FindingAid {
    path: PathBuf,
    raw: String,
    components: Vec<Component>,
}

impl FindingAid {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File stem of the finding aid; archival paths are rooted at it.
    pub fn base_name(&self) -> String {
        self.path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("finding_aid")
            .to_string()
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn component(&self, index: usize) -> Option<&Component> {
        self.components.get(index)
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }
}
