//! Derivative Job Planner.
//!
//! Turns the files found under one resolved directory into derivative jobs.
//! Each source type maps to a fixed list of job templates. A template whose
//! guard fails against the source directory is not planned at all. One whose
//! guard fails only against the output mirror is planned but marked as
//! already present, so re-runs describe the same files without queueing the
//! work again.

pub mod job;
pub mod source;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::{canonical_mime, DerivativeSizes};
use crate::discovery::{DiscoveredFile, NoPageCount, PageCounter};
use crate::sanitize::item_key;

pub use job::{DerivativeCommand, FileUse, Job};
pub use source::{Guard, JobTemplate, SourceKind, Suffix, TemplateOptions};

/// MIME types and lowercased file names present in one directory.
#[derive(Debug, Clone, Default)]
pub struct SiblingSet {
    mimes: HashSet<String>,
    names: HashSet<String>,
}

impl SiblingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_files(files: &[DiscoveredFile]) -> Self {
        let mut set = Self::new();
        set.extend(files);
        set
    }

    pub fn extend(&mut self, files: &[DiscoveredFile]) {
        for file in files {
            if let Some(mime) = &file.mime_type {
                self.mimes.insert(canonical_mime(mime));
            }
            if let Some(name) = file.file_name() {
                self.names.insert(name.to_lowercase());
            }
        }
    }

    pub fn has_mime(&self, mime: &str) -> bool {
        self.mimes.contains(&canonical_mime(mime))
    }

    pub fn has_file_named(&self, name: &str) -> bool {
        self.names.contains(&name.to_lowercase())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlanOptions {
    pub ocr_required: bool,
    pub pdf_master: bool,
    pub sizes: DerivativeSizes,
}

/// One directory's worth of planning input.
pub struct PlanRequest<'a> {
    /// Logical position below the data root, e.g. `ms1/Box_1/Folder_2`.
    /// Prefixes every item key.
    pub logical_dir: &'a Path,
    /// Directory targets are written to.
    pub output_dir: &'a Path,
    /// Allow-listed files to derive from.
    pub files: &'a [DiscoveredFile],
    /// Everything in the source directory.
    pub source_siblings: &'a SiblingSet,
    /// Everything already in the output directory.
    pub output_siblings: &'a SiblingSet,
}

#[derive(Debug, Clone)]
pub struct PlannedJob {
    pub job: Job,
    /// The output mirror already holds this derivative.
    pub already_present: bool,
}

/// Jobs planned for one directory, files in path order and each file's jobs
/// in template order.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    jobs: Vec<PlannedJob>,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Every planned job, including those already produced.
    pub fn jobs(&self) -> Vec<Job> {
        self.jobs.iter().map(|p| p.job.clone()).collect()
    }

    /// Jobs whose output does not exist yet.
    pub fn pending(&self) -> impl Iterator<Item = &Job> {
        self.jobs.iter().filter(|p| !p.already_present).map(|p| &p.job)
    }

    pub fn planned(&self) -> &[PlannedJob] {
        &self.jobs
    }
}

pub struct DerivativePlanner {
    options: PlanOptions,
    page_counter: Box<dyn PageCounter>,
}

impl DerivativePlanner {
    pub fn new(options: PlanOptions) -> Self {
        Self {
            options,
            page_counter: Box::new(NoPageCount),
        }
    }

    pub fn with_page_counter(mut self, page_counter: Box<dyn PageCounter>) -> Self {
        self.page_counter = page_counter;
        self
    }

    pub fn plan(&self, request: &PlanRequest) -> Plan {
        let template_options = TemplateOptions {
            ocr_required: self.options.ocr_required,
            pdf_master: self.options.pdf_master,
            sizes: self.options.sizes,
        };

        let mut files: Vec<&DiscoveredFile> = request.files.iter().collect();
        files.sort_by(|a, b| a.path.cmp(&b.path));

        let mut plan = Plan::default();
        for file in files {
            let Some(kind) = file.mime_type.as_deref().and_then(SourceKind::from_mime) else {
                debug!(file = %crate::sanitize::redact_path(&file.path), "No derivatives for file type");
                continue;
            };
            let Some(stem) = file.path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let item = item_key(&request.logical_dir.join(stem).to_string_lossy());
            let item_base = item_key(stem);
            let page_count = match kind {
                SourceKind::Pdf => self.page_counter.page_count(&file.path),
                _ => None,
            };

            for template in kind.templates(&template_options) {
                if !template.applies(request.source_siblings, stem) {
                    debug!(item = %item, usage = %template.usage, "Derivative not needed");
                    continue;
                }
                let already_present = !template.applies(request.output_siblings, stem);
                if already_present {
                    debug!(item = %item, usage = %template.usage, "Derivative already present");
                }

                let job = Job {
                    id: uuid::Uuid::new_v4().to_string(),
                    item: item.clone(),
                    item_base: item_base.clone(),
                    command: template.command,
                    source: file.path.clone(),
                    target: target_path(request.output_dir, &template.suffix, stem, &file.path),
                    mime_type: template.mime_type.to_string(),
                    usage: template.usage,
                    page_count,
                    ocr_required: Some(self.options.ocr_required),
                };
                plan.jobs.push(PlannedJob { job, already_present });
            }
        }

        plan
    }
}

fn target_path(output_dir: &Path, suffix: &Suffix, stem: &str, source: &Path) -> PathBuf {
    output_dir.join(suffix.file_name(stem, source))
}
