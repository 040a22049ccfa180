//! Test harness for isolated pipeline runs.
//!
//! The `TestHarness` lays out a submission package in a temporary directory:
//! - `aip/METS.xml` and `aip/ms1.xml` metadata documents
//! - `aip/data/` holding the source files
//! - `dip/` receiving the dissemination package

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use assert_fs::prelude::*;
use assert_fs::TempDir;

use dipgen::{load_config, Job, PackageConfig, Pipeline, PipelineConfig, PipelineError, PipelineReport};

use super::builders::{mets_template, PackageConfigBuilder};

pub const FINDING_AID: &str = "ms1.xml";
pub const STRUCTURAL_METADATA: &str = "METS.xml";

pub struct TestHarness {
    temp_dir: TempDir,
    pub aip_dir: PathBuf,
    pub source_root: PathBuf,
    pub output_root: PathBuf,
}

impl TestHarness {
    /// Package with a METS template (OBJID `dip1`) and the given finding aid.
    pub fn new(ead: &str) -> Self {
        let harness = Self::empty();
        harness.write_mets(&mets_template(Some("dip1"), FINDING_AID));
        harness.write_ead(ead);
        harness
    }

    /// Package without metadata documents.
    pub fn empty() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let aip_dir = temp_dir.path().join("aip");
        let source_root = aip_dir.join("data");
        let output_root = temp_dir.path().join("dip");
        std::fs::create_dir_all(&source_root).expect("Failed to create source root");

        Self {
            temp_dir,
            aip_dir,
            source_root,
            output_root,
        }
    }

    pub fn temp_path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn write_mets(&self, xml: &str) {
        self.temp_dir
            .child("aip")
            .child(STRUCTURAL_METADATA)
            .write_str(xml)
            .expect("Failed to write METS");
    }

    pub fn write_ead(&self, xml: &str) {
        self.temp_dir
            .child("aip")
            .child(FINDING_AID)
            .write_str(xml)
            .expect("Failed to write EAD");
    }

    /// Creates a source file below `aip/data`.
    pub fn add_source_file(&self, relative: &str) -> PathBuf {
        let child = self.temp_dir.child("aip/data").child(relative);
        child.write_binary(b"fixture").expect("Failed to write source file");
        child.path().to_path_buf()
    }

    /// Creates a file below `dip/data`, as a completed worker would.
    pub fn add_output_file(&self, relative: &str) -> PathBuf {
        let child = self.temp_dir.child("dip/data").child(relative);
        child.write_binary(b"derived").expect("Failed to write output file");
        child.path().to_path_buf()
    }

    /// Config builder with this harness's paths filled in.
    pub fn config(&self) -> PackageConfigBuilder {
        PackageConfigBuilder::new(
            &self.aip_dir.join(STRUCTURAL_METADATA).to_string_lossy(),
            &self.source_root.to_string_lossy(),
            &self.output_root.to_string_lossy(),
        )
    }

    pub fn write_config(&self, config: &PackageConfig) -> PathBuf {
        let child = self.temp_dir.child("config.json");
        let json = serde_json::to_string_pretty(config).expect("Failed to serialize config");
        child.write_str(&json).expect("Failed to write config");
        child.path().to_path_buf()
    }

    /// Writes `config` to disk, loads it back and runs the pipeline.
    pub fn run(&self, config: PackageConfig) -> Result<PipelineReport, PipelineError> {
        let path = self.write_config(&config);
        let loaded = load_config(&path)?;
        let pipeline_config = PipelineConfig::from_config(&loaded)?;
        Pipeline::from_config(Arc::new(pipeline_config)).run()
    }

    pub fn run_default(&self) -> PipelineReport {
        self.run(self.config().build()).expect("Pipeline run failed")
    }

    pub fn stage_dir(&self, stage: &str) -> PathBuf {
        self.output_root.join("jobs/services").join(stage)
    }

    /// File names under a queue stage, sorted.
    pub fn stage_entries(&self, stage: &str) -> Vec<String> {
        let mut names: Vec<String> = match std::fs::read_dir(self.stage_dir(stage)) {
            Ok(entries) => entries
                .map(|e| e.expect("Failed to read entry").file_name().to_string_lossy().into_owned())
                .collect(),
            Err(_) => Vec::new(),
        };
        names.sort();
        names
    }

    /// Published jobs in enqueue order.
    pub fn queued_jobs(&self, report: &PipelineReport) -> Vec<Job> {
        report
            .job_ids
            .iter()
            .map(|id| {
                let content = std::fs::read_to_string(self.stage_dir("new").join(id))
                    .expect("Queued job missing");
                serde_json::from_str(&content).expect("Queued job is not valid JSON")
            })
            .collect()
    }

    pub fn read_output(&self, path: &Path) -> String {
        std::fs::read_to_string(path).expect("Failed to read output document")
    }
}
