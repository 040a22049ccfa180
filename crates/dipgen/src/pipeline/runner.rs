use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, debug_span, info, info_span, warn};

use crate::discovery::{DirectoryDiscovery, DiscoveredFile, FileDiscovery, LopdfPageCounter};
use crate::finding_aid::{parse_finding_aid, Component};
use crate::planner::{DerivativePlanner, PlanRequest, SiblingSet};
use crate::queue::JobQueue;
use crate::resolve::{eligible_components, PathResolver, ResolvedPath};
use crate::sanitize;
use crate::storage::{ensure_directory, FileStorage};
use crate::structmap::{MetsTemplate, StructMapBuilder};

use super::config::PipelineConfig;
use super::context::{LoadedMetadata, PipelineContext, PipelineReport, SectionSummary, SkipReason};
use super::error::{PipelineError, PipelineWarning};

pub struct Pipeline {
    config: Arc<PipelineConfig>,
    discovery: Box<dyn FileDiscovery>,
    planner: DerivativePlanner,
    storage: FileStorage,
}

impl Pipeline {
    /// Production constructor: filesystem discovery and PDF page counting.
    pub fn from_config(config: Arc<PipelineConfig>) -> Self {
        let planner = DerivativePlanner::new(config.plan).with_page_counter(Box::new(LopdfPageCounter));
        Self::new(config, Box::new(DirectoryDiscovery), planner)
    }

    /// Constructor with injected collaborators.
    pub fn new(config: Arc<PipelineConfig>, discovery: Box<dyn FileDiscovery>, planner: DerivativePlanner) -> Self {
        let storage = FileStorage::new(config.metadata_root());
        Self {
            config,
            discovery,
            planner,
            storage,
        }
    }

    /// Builds the dissemination package. Metadata problems abort the run
    /// before the first job is enqueued.
    pub fn run(&self) -> Result<PipelineReport, PipelineError> {
        let _pipeline_span = info_span!("pipeline",
            object_type = %self.config.object_type,
            metadata = %sanitize::redact_path(&self.config.structural_metadata),
        )
        .entered();

        // Step 1: Load template and finding aid
        let metadata = {
            let _step = info_span!("load_metadata").entered();
            self.step_load_metadata()?
        };

        let builder = StructMapBuilder::new(metadata.package_id.clone(), &self.config.output_root)
            .with_display_format(self.config.display_format.clone());
        let mut ctx = PipelineContext::new(metadata, builder);

        // Step 2: Open the job queue
        let queue = {
            let _step = info_span!("open_queue").entered();
            JobQueue::open(&self.config.output_root, &self.config.queue)?
        };

        // Step 3: Resolve, plan and enqueue per component
        {
            let _step = info_span!("plan_components").entered();
            self.step_plan_components(&mut ctx, &queue)?;
        }

        // Step 4: Surface naming-scheme collisions
        {
            let _step = info_span!("report_legacy_paths").entered();
            self.step_report_legacy_paths(&mut ctx);
        }

        // Step 5: Write updated metadata
        {
            let _step = info_span!("write_metadata").entered();
            self.step_write_metadata(&mut ctx)?;
        }

        info!(
            package_id = %ctx.report.package_id,
            sections = ctx.report.sections.len(),
            jobs = ctx.report.job_count(),
            skipped = ctx.report.skipped.len(),
            "Package built"
        );
        Ok(ctx.report)
    }

    fn step_load_metadata(&self) -> Result<LoadedMetadata, PipelineError> {
        let template = MetsTemplate::load(&self.config.structural_metadata)?;
        let package_id = template.package_id(self.config.output_id.as_deref())?;
        let finding_aid = parse_finding_aid(&template.finding_aid_path())?;

        debug!(
            package_id = %package_id,
            components = finding_aid.components().len(),
            "Metadata loaded"
        );
        Ok(LoadedMetadata {
            template,
            finding_aid,
            package_id,
        })
    }

    fn step_plan_components(&self, ctx: &mut PipelineContext, queue: &JobQueue) -> Result<(), PipelineError> {
        let resolver = PathResolver::new(ctx.finding_aid.base_name());
        let eligible: Vec<Component> = eligible_components(&ctx.finding_aid)
            .into_iter()
            .cloned()
            .collect();

        // Every legacy name is recorded before any directory lookup consults it.
        let mut resolved_paths: Vec<(&Component, ResolvedPath)> = Vec::new();
        for component in &eligible {
            for resolved in resolver.resolve(component) {
                ctx.legacy.record(&resolved);
                resolved_paths.push((component, resolved));
            }
        }

        for (component, resolved) in &resolved_paths {
            let _component_span = debug_span!("component", index = component.index).entered();
            self.step_process_path(ctx, queue, component, resolved)?;
        }
        Ok(())
    }

    fn step_process_path(
        &self,
        ctx: &mut PipelineContext,
        queue: &JobQueue,
        component: &Component,
        resolved: &ResolvedPath,
    ) -> Result<(), PipelineError> {
        let path = &resolved.current;
        let label = path.to_string();

        if !ctx.seen.insert(path) {
            debug!(path = %label, "Path already handled");
            ctx.skip(label, SkipReason::AlreadySeen);
            return Ok(());
        }

        if let Some(subdirectory) = &self.config.subdirectory {
            if !path.relative().starts_with(subdirectory) && !path.rooted().starts_with(subdirectory) {
                ctx.skip(label, SkipReason::OutsideSubdirectory);
                return Ok(());
            }
        }

        let Some(source_dir) = self.locate_directory(ctx, resolved) else {
            debug!(path = %label, "No directory for path");
            ctx.skip(label, SkipReason::MissingDirectory);
            return Ok(());
        };

        let listing = self.discovery.list(&source_dir)?;
        let files: Vec<DiscoveredFile> = listing
            .iter()
            .filter(|f| {
                f.mime_type
                    .as_deref()
                    .is_some_and(|m| self.config.allow_list.allows(m))
            })
            .cloned()
            .collect();
        if files.is_empty() {
            ctx.skip(label, SkipReason::NoEligibleFiles);
            return Ok(());
        }

        let logical_dir = path.rooted();
        let output_dir = self.config.data_root().join(&logical_dir);
        let source_siblings = SiblingSet::from_files(&listing);
        let output_siblings = SiblingSet::from_files(&self.discovery.list(&output_dir)?);

        let plan = self.planner.plan(&PlanRequest {
            logical_dir: &logical_dir,
            output_dir: &output_dir,
            files: &files,
            source_siblings: &source_siblings,
            output_siblings: &output_siblings,
        });
        if plan.is_empty() {
            ctx.skip(label, SkipReason::NothingToPlan);
            return Ok(());
        }

        ensure_directory(&output_dir)?;
        let mut enqueued = 0;
        for job in plan.pending() {
            queue.enqueue(job)?;
            ctx.report.job_ids.push(job.id.clone());
            enqueued += 1;
        }

        let summary = ctx
            .builder
            .add_section(component, path, &plan.jobs())
            .map(|section| SectionSummary {
                number: section.number,
                path: label.clone(),
                component: section.component,
                items: section.items.len(),
                jobs: enqueued,
            });
        if let Some(summary) = summary {
            debug!(
                path = %label,
                section = summary.number,
                items = summary.items,
                jobs = summary.jobs,
                planned = plan.len(),
                "Section planned"
            );
            ctx.report.sections.push(summary);
        }
        Ok(())
    }

    /// Source directory for a resolved path. Falls back to the legacy-named
    /// directory when the current one is absent and the legacy name maps to
    /// this path alone.
    fn locate_directory(&self, ctx: &mut PipelineContext, resolved: &ResolvedPath) -> Option<PathBuf> {
        let current = self.config.source_root.join(resolved.current.rooted());
        if current.is_dir() {
            return Some(current);
        }

        let legacy_key = resolved.legacy.relative_string();
        let legacy = self.config.source_root.join(resolved.legacy.rooted());
        if legacy != current && legacy.is_dir() && ctx.legacy.is_unambiguous(&legacy_key) {
            warn!(
                path = %resolved.current,
                legacy = %legacy_key,
                "Reading files from legacy directory"
            );
            ctx.report.warnings.push(PipelineWarning::LegacyLocation {
                current: resolved.current.relative_string(),
                legacy: resolved.legacy.rooted(),
            });
            return Some(legacy);
        }

        None
    }

    fn step_report_legacy_paths(&self, ctx: &mut PipelineContext) {
        for (legacy, current) in ctx.legacy.migrations() {
            debug!(legacy = %legacy, current = %current, "Legacy path migratable");
        }
        for collision in ctx.legacy.collisions() {
            warn!(collision = ?collision, "Legacy naming collision");
            ctx.report.warnings.push(PipelineWarning::LegacyCollision(collision));
        }
    }

    fn step_write_metadata(&self, ctx: &mut PipelineContext) -> Result<(), PipelineError> {
        let refs = ctx.builder.digital_object_refs();
        let finding_aid_xml = ctx.finding_aid.render_with_references(&refs)?;
        let mets_xml = ctx.template.render(&ctx.builder, Utc::now())?;

        let finding_aid_name = file_name_or(ctx.finding_aid.path(), "finding_aid.xml");
        let mets_name = file_name_or(ctx.template.path(), "METS.xml");

        ctx.report.finding_aid_output = self.storage.store(&finding_aid_name, finding_aid_xml.as_bytes())?;
        ctx.report.structural_metadata_output = self.storage.store(&mets_name, mets_xml.as_bytes())?;

        debug!(
            references = refs.len(),
            files = ctx.builder.file_count(),
            "Metadata written"
        );
        Ok(())
    }
}

fn file_name_or(path: &Path, fallback: &str) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(fallback)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;
    use crate::error::MetadataError;
    use crate::planner::FileUse;
    use crate::resolve::LegacyCollision;
    use tempfile::TempDir;

    const METS: &str = r#"<mets:mets xmlns:mets="http://www.loc.gov/METS/" xmlns:xlink="http://www.w3.org/1999/xlink" OBJID="dip1">
  <mets:metsHdr CREATEDATE="2020-01-01T00:00:00Z"/>
  <mets:dmdSec ID="dmd1"><mets:mdRef LOCTYPE="URL" MDTYPE="EAD" xlink:href="ms1.xml"/></mets:dmdSec>
  <mets:fileSec/>
</mets:mets>"#;

    struct Fixture {
        dir: TempDir,
    }

    impl Fixture {
        fn new(ead: &str) -> Self {
            let dir = TempDir::new().unwrap();
            std::fs::create_dir_all(dir.path().join("aip/data")).unwrap();
            std::fs::write(dir.path().join("aip/METS.xml"), METS).unwrap();
            std::fs::write(dir.path().join("aip/ms1.xml"), ead).unwrap();
            Self { dir }
        }

        fn add_file(&self, relative: &str) {
            let path = self.dir.path().join("aip/data").join(relative);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, b"fixture").unwrap();
        }

        fn config(&self, extra: &str) -> Arc<PipelineConfig> {
            let json = format!(
                r#"{{
                    "version": "1.0",
                    "structural_metadata": "{}",
                    "source_root": "{}",
                    "output_root": "{}"{}
                }}"#,
                self.dir.path().join("aip/METS.xml").display(),
                self.dir.path().join("aip/data").display(),
                self.dir.path().join("dip").display(),
                extra
            );
            Arc::new(PipelineConfig::from_config(&load_config_from_str(&json).unwrap()).unwrap())
        }

        fn pipeline(&self, extra: &str) -> Pipeline {
            let config = self.config(extra);
            let planner = DerivativePlanner::new(config.plan);
            Pipeline::new(config, Box::new(DirectoryDiscovery), planner)
        }

        fn new_jobs(&self) -> usize {
            std::fs::read_dir(self.dir.path().join("dip/jobs/services/new"))
                .map(|entries| entries.count())
                .unwrap_or(0)
        }
    }

    fn ead(components: &str) -> String {
        format!(r#"<ead xmlns="urn:isbn:1-931666-22-9"><archdesc><dsc>{}</dsc></archdesc></ead>"#, components)
    }

    #[test]
    fn test_run_plans_and_enqueues() {
        let fixture = Fixture::new(&ead(
            r#"<c01><did><unittitle>Letters</unittitle><container type="box">1</container><container type="folder">2</container></did></c01>"#,
        ));
        fixture.add_file("ms1/Box_1/Folder_2/page_001.tif");

        let report = fixture.pipeline("").run().unwrap();

        assert_eq!(report.package_id, "dip1");
        assert_eq!(report.sections.len(), 1);
        assert_eq!(report.sections[0].path, "ms1/Box_1/Folder_2");
        assert_eq!(report.job_count(), 4);
        assert_eq!(fixture.new_jobs(), 4);
        assert!(report.finding_aid_output.ends_with("metadata/ms1.xml"));
        assert!(report.structural_metadata_output.ends_with("metadata/METS.xml"));

        let ead_out = std::fs::read_to_string(&report.finding_aid_output).unwrap();
        assert!(ead_out.contains(r#"xlink:href="dip1_1_1""#));
    }

    #[test]
    fn test_repeated_path_processed_once() {
        let box1 = r#"<c01><did><container type="box">1</container></did></c01>"#;
        let fixture = Fixture::new(&ead(&format!("{}{}", box1, box1)));
        fixture.add_file("ms1/Box_1/notes.xml");

        let report = fixture.pipeline("").run().unwrap();

        assert_eq!(report.sections.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].reason, SkipReason::AlreadySeen);
    }

    #[test]
    fn test_subdirectory_restriction() {
        let fixture = Fixture::new(&ead(
            r#"<c01><did><container type="box">1</container></did></c01>
               <c01><did><container type="box">2</container></did></c01>"#,
        ));
        fixture.add_file("ms1/Box_1/a.xml");
        fixture.add_file("ms1/Box_2/b.xml");

        let report = fixture.pipeline(r#", "subdirectory": "Box_2""#).run().unwrap();

        assert_eq!(report.sections.len(), 1);
        assert_eq!(report.sections[0].path, "ms1/Box_2");
        assert_eq!(report.skipped[0].reason, SkipReason::OutsideSubdirectory);
    }

    #[test]
    fn test_missing_and_ineligible_directories_skipped() {
        let fixture = Fixture::new(&ead(
            r#"<c01><did><container type="box">1</container></did></c01>
               <c01><did><container type="box">2</container></did></c01>"#,
        ));
        fixture.add_file("ms1/Box_2/cover.png");

        let report = fixture.pipeline("").run().unwrap();

        let reasons: Vec<SkipReason> = report.skipped.iter().map(|s| s.reason).collect();
        assert_eq!(reasons, vec![SkipReason::MissingDirectory, SkipReason::NoEligibleFiles]);
        assert!(report.sections.is_empty());
        assert_eq!(fixture.new_jobs(), 0);
    }

    #[test]
    fn test_legacy_directory_fallback() {
        let fixture = Fixture::new(&ead(
            r#"<c01><did><container type="box">7</container></did></c01>"#,
        ));
        fixture.add_file("ms1/7/report.pdf");

        let report = fixture.pipeline("").run().unwrap();

        assert_eq!(report.sections.len(), 1);
        assert_eq!(
            report.warnings,
            vec![PipelineWarning::LegacyLocation {
                current: "Box_7".to_string(),
                legacy: PathBuf::from("ms1/7"),
            }]
        );
        let job: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(
                fixture
                    .dir
                    .path()
                    .join("dip/jobs/services/new")
                    .join(&report.job_ids[0]),
            )
            .unwrap(),
        )
        .unwrap();
        assert_eq!(job["use"], FileUse::PrintImage.as_str());
        assert!(job["target"].as_str().unwrap().ends_with("data/ms1/Box_7/report.pdf"));
        assert!(job["source"].as_str().unwrap().ends_with("ms1/7/report.pdf"));
    }

    #[test]
    fn test_metadata_errors_abort_before_queue() {
        let fixture = Fixture::new(&ead(
            r#"<c01><did><container type="box">1</container></did></c01>"#,
        ));
        fixture.add_file("ms1/Box_1/a.xml");
        std::fs::write(
            fixture.dir.path().join("aip/METS.xml"),
            METS.replace(" OBJID=\"dip1\"", ""),
        )
        .unwrap();

        let result = fixture.pipeline("").run();

        assert!(matches!(
            result,
            Err(PipelineError::Metadata(MetadataError::MissingBaseIdentifier(_)))
        ));
        assert!(!fixture.dir.path().join("dip/jobs").exists());
    }

    #[test]
    fn test_rerun_skips_existing_derivatives() {
        let fixture = Fixture::new(&ead(
            r#"<c01><did><container type="box">1</container></did></c01>"#,
        ));
        fixture.add_file("ms1/Box_1/page_001.tif");
        let pipeline = fixture.pipeline("");

        assert_eq!(pipeline.run().unwrap().job_count(), 4);
        // A worker completed the print image.
        std::fs::write(fixture.dir.path().join("dip/data/ms1/Box_1/page_001.pdf"), b"%PDF").unwrap();

        let report = pipeline.run().unwrap();
        assert_eq!(report.job_count(), 3);
        assert_eq!(report.sections[0].jobs, 3);
        let mets = std::fs::read_to_string(&report.structural_metadata_output).unwrap();
        assert!(mets.contains("PrintImageFile"));
    }

    fn mets_file_ids(report: &PipelineReport) -> Vec<String> {
        let mets = std::fs::read_to_string(&report.structural_metadata_output).unwrap();
        let mut ids: Vec<String> = mets
            .split("<mets:file ")
            .skip(1)
            .filter_map(|tail| tail.split("ID=\"").nth(1))
            .filter_map(|tail| tail.split('"').next())
            .map(str::to_string)
            .collect();
        ids.sort();
        ids
    }

    #[test]
    fn test_rerun_with_all_outputs_keeps_mets_files() {
        let fixture = Fixture::new(&ead(
            r#"<c01><did><unittitle>Letters</unittitle><container type="box">1</container></did></c01>"#,
        ));
        fixture.add_file("ms1/Box_1/page_001.tif");
        let pipeline = fixture.pipeline(r#", "ocr_required": true"#);

        let first = pipeline.run().unwrap();
        assert_eq!(first.job_count(), 5);
        let first_ids = mets_file_ids(&first);
        assert_eq!(first_ids.len(), 5);

        // Workers completed every derivative.
        for name in [
            "page_001_thumb.jpg",
            "page_001_front_thumb.jpg",
            "page_001.jpg",
            "page_001.pdf",
            "page_001.txt",
        ] {
            std::fs::write(fixture.dir.path().join("dip/data/ms1/Box_1").join(name), b"done").unwrap();
        }

        let second = pipeline.run().unwrap();
        assert_eq!(mets_file_ids(&second), first_ids);
        assert_eq!(second.sections.len(), 1);
        assert_eq!(second.sections[0].path, "ms1/Box_1");
        assert!(second.skipped.is_empty());

        let mets = std::fs::read_to_string(&second.structural_metadata_output).unwrap();
        assert!(mets.contains("PrintImageFile"));
        assert!(mets.contains("OcrFile"));
    }

    #[test]
    fn test_legacy_name_shared_by_later_component_not_used() {
        let fixture = Fixture::new(&ead(
            r#"<c01><did><container type="box">7</container></did></c01>
               <c01><did><container type="othertype" label="Reel">7</container></did></c01>"#,
        ));
        fixture.add_file("ms1/7/report.pdf");

        let report = fixture.pipeline("").run().unwrap();

        assert!(report.sections.is_empty());
        assert_eq!(fixture.new_jobs(), 0);
        let reasons: Vec<SkipReason> = report.skipped.iter().map(|s| s.reason).collect();
        assert_eq!(reasons, vec![SkipReason::MissingDirectory, SkipReason::MissingDirectory]);
        assert!(!report
            .warnings
            .iter()
            .any(|w| matches!(w, PipelineWarning::LegacyLocation { .. })));
        assert_eq!(
            report.warnings,
            vec![PipelineWarning::LegacyCollision(LegacyCollision::Merged {
                legacy: "7".to_string(),
                current: vec!["Box_7".to_string(), "Reel_7".to_string()],
            })]
        );
    }

    #[test]
    fn test_output_id_overrides_objid() {
        let fixture = Fixture::new(&ead(
            r#"<c01><did><container type="box">1</container></did></c01>"#,
        ));
        fixture.add_file("ms1/Box_1/a.xml");

        let report = fixture.pipeline(r#", "output_id": "dip-override""#).run().unwrap();
        assert_eq!(report.package_id, "dip-override");

        let mets = std::fs::read_to_string(&report.structural_metadata_output).unwrap();
        assert!(mets.contains(r#"ID="dip-override_1_1""#));
    }
}
