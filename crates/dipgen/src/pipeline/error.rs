use std::path::PathBuf;

use thiserror::Error;

use crate::resolve::LegacyCollision;

/// Conditions that abort a run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration rejected: {0}")]
    Config(#[from] crate::error::ConfigError),

    #[error("Package metadata unusable: {0}")]
    Metadata(#[from] crate::error::MetadataError),

    #[error("File discovery failed: {0}")]
    Discovery(#[from] crate::error::DiscoveryError),

    #[error("Job queue write failed: {0}")]
    Queue(#[from] crate::error::QueueError),

    #[error("Output write failed: {0}")]
    Storage(#[from] crate::error::StorageError),
}

impl From<PipelineError> for crate::error::DipError {
    fn from(error: PipelineError) -> Self {
        match error {
            PipelineError::Config(e) => e.into(),
            PipelineError::Metadata(e) => e.into(),
            PipelineError::Discovery(e) => e.into(),
            PipelineError::Queue(e) => e.into(),
            PipelineError::Storage(e) => e.into(),
        }
    }
}

/// Conditions logged and absorbed during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineWarning {
    /// Files were read from the legacy-named directory.
    LegacyLocation { current: String, legacy: PathBuf },
    LegacyCollision(LegacyCollision),
}
