use std::path::PathBuf;

use crate::config::{resolve_object_type, MimeAllowList, ObjectType, PackageConfig, QueueLayout};
use crate::error::ConfigError;
use crate::planner::PlanOptions;

const DATA_DIR: &str = "data";
const METADATA_DIR: &str = "metadata";

/// Runtime values handed to the pipeline components.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub structural_metadata: PathBuf,
    pub source_root: PathBuf,
    pub output_root: PathBuf,
    pub object_type: ObjectType,
    pub output_id: Option<String>,
    pub display_format: Option<String>,
    pub subdirectory: Option<PathBuf>,
    pub allow_list: MimeAllowList,
    pub queue: QueueLayout,
    pub plan: PlanOptions,
}

impl PipelineConfig {
    pub fn from_config(config: &PackageConfig) -> Result<Self, ConfigError> {
        let object_type = resolve_object_type(config)?;
        let display_format = config
            .display_format
            .clone()
            .filter(|f| !f.trim().is_empty())
            .or_else(|| object_type.default_display_format().map(str::to_string));

        Ok(Self {
            structural_metadata: PathBuf::from(&config.structural_metadata),
            source_root: PathBuf::from(&config.source_root),
            output_root: PathBuf::from(&config.output_root),
            object_type,
            output_id: config.output_id.clone(),
            display_format,
            subdirectory: config.subdirectory.as_ref().map(PathBuf::from),
            allow_list: MimeAllowList::new(&config.mime_allow_list),
            queue: config.queue.clone(),
            plan: PlanOptions {
                ocr_required: config.ocr_required,
                pdf_master: config.pdf_master,
                sizes: config.derivatives,
            },
        })
    }

    /// Root that derivative targets mirror the source tree under.
    pub fn data_root(&self) -> PathBuf {
        self.output_root.join(DATA_DIR)
    }

    pub fn metadata_root(&self) -> PathBuf {
        self.output_root.join(METADATA_DIR)
    }
}
