//! Structural Metadata Builder.
//!
//! Collects the sections planned during a run, in discovery order, and turns
//! them into file groups and a logical structural map. Sections and the items
//! within them are numbered from 1 without gaps. File identifiers are derived
//! from each target path and its use, so rebuilding the map later yields the
//! same identifiers.

pub mod template;

use std::path::{Path, PathBuf};

use crate::finding_aid::{Component, DigitalObjectRefs};
use crate::planner::{FileUse, Job};
use crate::resolve::ArchivalPath;
use crate::sanitize::file_id;

pub use template::MetsTemplate;

/// Classification of an item's `TYPE` in the structural map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemKind {
    Item,
    Audio,
    Video,
    /// Configured display format for image-bearing items, e.g. `photograph`.
    Display(String),
}

impl ItemKind {
    pub fn as_str(&self) -> &str {
        match self {
            ItemKind::Item => "item",
            ItemKind::Audio => "audio",
            ItemKind::Video => "video",
            ItemKind::Display(format) => format,
        }
    }

    fn classify(jobs: &[&Job], display_format: Option<&str>) -> Self {
        let has = |prefix: &str| jobs.iter().any(|j| j.mime_type.starts_with(prefix));
        if has("video/") {
            ItemKind::Video
        } else if has("audio/") {
            ItemKind::Audio
        } else {
            match display_format {
                Some(format) if has("image/") => ItemKind::Display(format.to_string()),
                _ => ItemKind::Item,
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub id: String,
    pub usage: FileUse,
    pub mime_type: String,
    /// Absolute target path of the derivative.
    pub target: PathBuf,
    /// Target path relative to the output root, `/`-separated.
    pub href: String,
}

#[derive(Debug, Clone)]
pub struct Item {
    pub order: usize,
    pub key: String,
    pub label: String,
    pub kind: ItemKind,
    pub files: Vec<FileEntry>,
}

#[derive(Debug, Clone)]
pub struct Section {
    pub number: usize,
    pub path: ArchivalPath,
    /// Index of the originating component in the finding aid.
    pub component: usize,
    pub items: Vec<Item>,
}

pub struct StructMapBuilder {
    package_id: String,
    output_root: PathBuf,
    display_format: Option<String>,
    sections: Vec<Section>,
}

impl StructMapBuilder {
    pub fn new(package_id: impl Into<String>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            package_id: package_id.into(),
            output_root: output_root.into(),
            display_format: None,
            sections: Vec::new(),
        }
    }

    pub fn with_display_format(mut self, display_format: Option<String>) -> Self {
        self.display_format = display_format;
        self
    }

    pub fn package_id(&self) -> &str {
        &self.package_id
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Records the jobs planned for one path-group. A group without jobs
    /// contributes no section. Items keep the order in which their key first
    /// appears among `jobs`.
    pub fn add_section(&mut self, component: &Component, path: &ArchivalPath, jobs: &[Job]) -> Option<&Section> {
        if jobs.is_empty() {
            return None;
        }

        let mut groups: Vec<(&str, Vec<&Job>)> = Vec::new();
        for job in jobs {
            match groups.iter_mut().find(|(key, _)| *key == job.item) {
                Some((_, members)) => members.push(job),
                None => groups.push((job.item.as_str(), vec![job])),
            }
        }

        let item_count = groups.len();
        let items = groups
            .into_iter()
            .enumerate()
            .map(|(i, (key, members))| {
                let order = i + 1;
                Item {
                    order,
                    key: key.to_string(),
                    label: item_label(component, order, item_count),
                    kind: ItemKind::classify(&members, self.display_format.as_deref()),
                    files: members.iter().map(|job| self.file_entry(job)).collect(),
                }
            })
            .collect();

        self.sections.push(Section {
            number: self.sections.len() + 1,
            path: path.clone(),
            component: component.index,
            items,
        });
        self.sections.last()
    }

    /// `{package_id}_{section}_{item}`, the structural-map id of an item.
    pub fn item_id(&self, section: usize, item: usize) -> String {
        format!("{}_{}_{}", self.package_id, section, item)
    }

    pub fn section_id(&self, section: usize) -> String {
        format!("{}_{}", self.package_id, section)
    }

    /// One reference per section, pointing at the section's first item, keyed
    /// by the originating component.
    pub fn digital_object_refs(&self) -> DigitalObjectRefs {
        let mut refs = DigitalObjectRefs::new();
        for section in &self.sections {
            refs.add(section.component, self.item_id(section.number, 1));
        }
        refs
    }

    /// File entries grouped by use, groups in order of first appearance.
    pub fn file_groups(&self) -> Vec<(FileUse, Vec<&FileEntry>)> {
        let mut groups: Vec<(FileUse, Vec<&FileEntry>)> = Vec::new();
        let entries = self
            .sections
            .iter()
            .flat_map(|s| &s.items)
            .flat_map(|i| &i.files);

        for entry in entries {
            match groups.iter_mut().find(|(usage, _)| *usage == entry.usage) {
                Some((_, members)) => {
                    if !members.iter().any(|m| m.id == entry.id) {
                        members.push(entry);
                    }
                }
                None => groups.push((entry.usage, vec![entry])),
            }
        }
        groups
    }

    pub fn file_count(&self) -> usize {
        self.file_groups().iter().map(|(_, files)| files.len()).sum()
    }

    fn file_entry(&self, job: &Job) -> FileEntry {
        FileEntry {
            id: file_id(job.usage.as_str(), &job.target),
            usage: job.usage,
            mime_type: job.mime_type.clone(),
            target: job.target.clone(),
            href: relative_href(&self.output_root, &job.target),
        }
    }
}

/// Title, else date, else the order. Items sharing a section also carry
/// their order so their labels stay distinct.
fn item_label(component: &Component, order: usize, item_count: usize) -> String {
    let descriptive = [component.title.as_deref(), component.date.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|l| !l.is_empty());

    match descriptive {
        Some(label) if item_count > 1 => format!("{}, {}", label, order),
        Some(label) => label.to_string(),
        None => order.to_string(),
    }
}

fn relative_href(root: &Path, target: &Path) -> String {
    let relative = target.strip_prefix(root).unwrap_or(target);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
