use std::path::PathBuf;

use crate::finding_aid::FindingAid;
use crate::resolve::{LegacyPathMap, SeenPaths};
use crate::structmap::{MetsTemplate, StructMapBuilder};

use super::error::PipelineWarning;

/// Why an archival path produced no section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Resolved earlier in the run by another component.
    AlreadySeen,
    OutsideSubdirectory,
    MissingDirectory,
    NoEligibleFiles,
    /// No file yields a derivative.
    NothingToPlan,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedPath {
    pub path: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionSummary {
    pub number: usize,
    pub path: String,
    pub component: usize,
    pub items: usize,
    pub jobs: usize,
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    pub package_id: String,
    pub sections: Vec<SectionSummary>,
    /// Ids of enqueued jobs in enqueue order.
    pub job_ids: Vec<String>,
    pub skipped: Vec<SkippedPath>,
    pub warnings: Vec<PipelineWarning>,
    pub finding_aid_output: PathBuf,
    pub structural_metadata_output: PathBuf,
}

impl PipelineReport {
    pub fn job_count(&self) -> usize {
        self.job_ids.len()
    }
}

/// Metadata loaded before any output is written.
pub struct LoadedMetadata {
    pub template: MetsTemplate,
    pub finding_aid: FindingAid,
    pub package_id: String,
}

pub struct PipelineContext {
    // Step 1 result
    pub template: MetsTemplate,
    pub finding_aid: FindingAid,

    // Step 2 state
    pub seen: SeenPaths,
    pub legacy: LegacyPathMap,
    pub builder: StructMapBuilder,

    pub report: PipelineReport,
}

impl PipelineContext {
    pub fn new(metadata: LoadedMetadata, builder: StructMapBuilder) -> Self {
        Self {
            template: metadata.template,
            finding_aid: metadata.finding_aid,
            seen: SeenPaths::new(),
            legacy: LegacyPathMap::new(),
            builder,
            report: PipelineReport {
                package_id: metadata.package_id,
                ..PipelineReport::default()
            },
        }
    }

    pub fn skip(&mut self, path: String, reason: SkipReason) {
        self.report.skipped.push(SkippedPath { path, reason });
    }
}
