use std::collections::{HashMap, HashSet};

use crate::finding_aid::Container;

/// How a component's containers relate to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerMode {
    /// No container declares a `parent`: one flat sibling list.
    Simple,
    /// At least one `parent` pointer: containers form a forest.
    Sectioned,
}

/// Containers of one component grouped into independent sections.
///
/// Built once from the flat parent-pointer records through an id-keyed
/// lookup table; read-only afterwards.
#[derive(Debug, Clone)]
pub struct ContainerGraph<'a> {
    containers: &'a [Container],
    mode: ContainerMode,
    sections: Vec<Vec<usize>>,
}

impl<'a> ContainerGraph<'a> {
    pub fn build(containers: &'a [Container]) -> Self {
        let mode = if containers.iter().any(|c| c.parent.is_some()) {
            ContainerMode::Sectioned
        } else {
            ContainerMode::Simple
        };

        let sections = match mode {
            ContainerMode::Simple if containers.is_empty() => Vec::new(),
            ContainerMode::Simple => vec![(0..containers.len()).collect()],
            ContainerMode::Sectioned => group_by_root(containers),
        };

        Self {
            containers,
            mode,
            sections,
        }
    }

    pub fn mode(&self) -> ContainerMode {
        self.mode
    }

    /// Sections in order of their root's position in the document. Each
    /// section starts with its root followed by its descendants in document
    /// order.
    pub fn sections(&self) -> impl Iterator<Item = Vec<&'a Container>> + '_ {
        let containers = self.containers;
        self.sections
            .iter()
            .map(move |members| members.iter().map(|&i| &containers[i]).collect())
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }
}

fn group_by_root(containers: &[Container]) -> Vec<Vec<usize>> {
    let mut by_id: HashMap<&str, usize> = HashMap::new();
    for (i, container) in containers.iter().enumerate() {
        if let Some(id) = container.id.as_deref() {
            by_id.entry(id).or_insert(i);
        }
    }

    let mut sections: Vec<Vec<usize>> = Vec::new();
    let mut section_of_root: HashMap<usize, usize> = HashMap::new();

    let roots: Vec<usize> = (0..containers.len())
        .map(|i| root_of(i, containers, &by_id))
        .collect();

    // Roots first so a section's order follows its root's document position.
    for (i, &root) in roots.iter().enumerate() {
        if root == i {
            section_of_root.insert(i, sections.len());
            sections.push(vec![i]);
        }
    }
    for (i, &root) in roots.iter().enumerate() {
        if root != i {
            if let Some(&section) = section_of_root.get(&root) {
                sections[section].push(i);
            }
        }
    }

    sections
}

/// Follows `parent` pointers up to a container without a resolvable parent.
/// Dangling or cyclic pointers make the starting container its own root.
fn root_of(start: usize, containers: &[Container], by_id: &HashMap<&str, usize>) -> usize {
    let mut visited = HashSet::new();
    let mut current = start;
    visited.insert(current);

    while let Some(parent) = containers[current].parent.as_deref() {
        match by_id.get(parent) {
            Some(&next) if next != current => {
                if !visited.insert(next) {
                    return start;
                }
                current = next;
            }
            _ => return current,
        }
    }

    current
}
