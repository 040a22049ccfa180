use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DipError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),

    #[error("Discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Unsupported package object type '{requested}' (supported: {supported})")]
    UnsupportedObjectType { requested: String, supported: String },
}

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Failed to read metadata document '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed XML in '{path}': {message}")]
    Xml { path: PathBuf, message: String },

    #[error("Structural metadata '{0}' does not reference a finding aid")]
    MissingFindingAidReference(PathBuf),

    #[error("Structural metadata template '{0}' has no fileSec marker (old-style template)")]
    OldStyleTemplate(PathBuf),

    #[error("Cannot determine the package identifier: no output id configured and no OBJID in '{0}'")]
    MissingBaseIdentifier(PathBuf),
}

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Directory scan failed for '{path}': {source}")]
    ScanFailed {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Failed to create queue stage directory '{path}': {source}")]
    CreateStage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize job '{id}': {source}")]
    Serialize {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write job file '{path}': {source}")]
    WriteJob {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to publish job from '{from}' to '{to}': {source}")]
    Publish {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, DipError>;
