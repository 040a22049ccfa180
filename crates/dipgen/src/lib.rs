pub mod config;
pub mod discovery;
pub mod error;
pub mod finding_aid;
pub mod pipeline;
pub mod planner;
pub mod queue;
pub mod resolve;
pub mod sanitize;
pub mod storage;
pub mod structmap;
pub mod telemetry;
mod xml;

pub use config::{load_config, load_config_from_str, ObjectType, PackageConfig};
pub use discovery::{DirectoryDiscovery, DiscoveredFile, FileDiscovery, LopdfPageCounter, PageCounter};
pub use error::{ConfigError, DipError, DiscoveryError, MetadataError, QueueError, Result, StorageError};
pub use finding_aid::{parse_finding_aid, Component, Container, FindingAid};
pub use pipeline::{Pipeline, PipelineConfig, PipelineError, PipelineReport};
pub use planner::{DerivativeCommand, DerivativePlanner, FileUse, Job, PlanOptions};
pub use queue::{JobQueue, QueueStage};
pub use resolve::{ArchivalPath, PathResolver};
pub use structmap::{MetsTemplate, StructMapBuilder};
