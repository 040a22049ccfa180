//! Container Path Resolver.
//!
//! Turns the containers cited by a component into canonical relative
//! directory paths (`Box_1/Folder_2`), plus the label-only legacy paths used
//! to find directories laid out under the earlier naming scheme.

pub mod graph;
pub mod legacy;
pub mod render;

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use crate::finding_aid::{Component, Container, FindingAid};

pub use graph::{ContainerGraph, ContainerMode};
pub use legacy::{LegacyCollision, LegacyPathMap};
pub use render::{CurrentNaming, LegacyNaming, PathRenderer, DEFAULT_KIND};

/// Ordered container tokens rooted at the finding-aid base name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArchivalPath {
    base: String,
    tokens: Vec<String>,
}

impl ArchivalPath {
    pub fn new(base: impl Into<String>, tokens: Vec<String>) -> Self {
        Self {
            base: base.into(),
            tokens,
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Tokens joined with `/`, without the base, e.g. `Box_1/Folder_2`.
    pub fn relative_string(&self) -> String {
        self.tokens.join("/")
    }

    pub fn relative(&self) -> PathBuf {
        self.tokens.iter().collect()
    }

    /// Path below a data root: `<base>/<tokens...>`.
    pub fn rooted(&self) -> PathBuf {
        let mut path = PathBuf::from(&self.base);
        path.extend(&self.tokens);
        path
    }
}

impl fmt::Display for ArchivalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.relative_string())
    }
}

/// One section of a component, rendered under both naming schemes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    pub current: ArchivalPath,
    pub legacy: ArchivalPath,
}

pub struct PathResolver {
    base: String,
}

impl PathResolver {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }

    /// One path per independent section, in section order. Sections that
    /// render to an already emitted path are dropped.
    pub fn resolve(&self, component: &Component) -> Vec<ResolvedPath> {
        let graph = ContainerGraph::build(&component.containers);
        let mut resolved: Vec<ResolvedPath> = Vec::new();

        for section in graph.sections() {
            let current = self.section_path(&section, &CurrentNaming);
            if resolved.iter().any(|r| r.current == current) {
                continue;
            }
            let legacy = self.section_path(&section, &LegacyNaming);
            resolved.push(ResolvedPath { current, legacy });
        }

        resolved
    }

    fn section_path(&self, section: &[&Container], renderer: &dyn PathRenderer) -> ArchivalPath {
        let mut tokens: Vec<String> = Vec::with_capacity(section.len());
        for container in section {
            let token = renderer.render(container);
            if !tokens.contains(&token) {
                tokens.push(token);
            }
        }
        ArchivalPath::new(self.base.clone(), tokens)
    }
}

/// Components whose containers are used: they cite at least one container
/// and none of their direct children does. Returned in document order.
pub fn eligible_components(finding_aid: &FindingAid) -> Vec<&Component> {
    finding_aid
        .components()
        .iter()
        .filter(|c| !c.containers.is_empty())
        .filter(|c| {
            c.children.iter().all(|&child| {
                finding_aid
                    .component(child)
                    .map_or(true, |d| d.containers.is_empty())
            })
        })
        .collect()
}

/// Archival paths already handled in this run, compared by value.
#[derive(Debug, Clone, Default)]
pub struct SeenPaths {
    seen: HashSet<(String, Vec<String>)>,
}

impl SeenPaths {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if the path was seen before.
    pub fn insert(&mut self, path: &ArchivalPath) -> bool {
        self.seen
            .insert((path.base.clone(), path.tokens.clone()))
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
