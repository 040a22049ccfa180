use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::queue::QueueStage;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageConfig {
    pub version: String,
    /// Structural-metadata document of the submission package. It also serves
    /// as the template for the synthesized output document.
    pub structural_metadata: String,
    /// Data root of the submission package; archival paths are resolved below it.
    pub source_root: String,
    pub output_root: String,
    #[serde(default = "default_object_type")]
    pub object_type: String,
    /// Overrides the template's `OBJID` as the package identifier.
    #[serde(default)]
    pub output_id: Option<String>,
    #[serde(default)]
    pub ocr_required: bool,
    #[serde(default)]
    pub pdf_master: bool,
    /// Alternate item type for image-bearing items, e.g. `photograph`.
    #[serde(default)]
    pub display_format: Option<String>,
    /// Restricts processing to archival paths below this relative prefix.
    #[serde(default)]
    pub subdirectory: Option<String>,
    #[serde(default = "default_mime_allow_list")]
    pub mime_allow_list: Vec<String>,
    #[serde(default = "default_supported_object_types")]
    pub supported_object_types: Vec<String>,
    #[serde(default)]
    pub queue: QueueLayout,
    #[serde(default)]
    pub derivatives: DerivativeSizes,
}

fn default_object_type() -> String {
    ObjectType::ArchivalCollection.as_str().to_string()
}

pub fn default_mime_allow_list() -> Vec<String> {
    [
        "image/tiff",
        "application/pdf",
        "application/xml",
        "text/plain",
        "audio/mpeg",
        "audio/ogg",
        "video/mp4",
    ]
    .iter()
    .map(|m| m.to_string())
    .collect()
}

fn default_supported_object_types() -> Vec<String> {
    ObjectType::ALL
        .iter()
        .map(|t| t.as_str().to_string())
        .collect()
}

/// Package object types. The derivative and structural logic is shared;
/// only presentation defaults vary per type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    ArchivalCollection,
    PhotographCollection,
    AudiovisualCollection,
}

impl ObjectType {
    pub const ALL: [ObjectType; 3] = [
        ObjectType::ArchivalCollection,
        ObjectType::PhotographCollection,
        ObjectType::AudiovisualCollection,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::ArchivalCollection => "archival_collection",
            ObjectType::PhotographCollection => "photograph_collection",
            ObjectType::AudiovisualCollection => "audiovisual_collection",
        }
    }

    /// Item type applied to image-bearing items when no explicit display
    /// format is configured.
    pub fn default_display_format(&self) -> Option<&'static str> {
        match self {
            ObjectType::PhotographCollection => Some("photograph"),
            ObjectType::ArchivalCollection | ObjectType::AudiovisualCollection => None,
        }
    }
}

impl FromStr for ObjectType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ObjectType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Directory names of the job queue, relative to the output root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueLayout {
    #[serde(default = "default_queue_root")]
    pub root: String,
    #[serde(default = "default_tmp")]
    pub tmp: String,
    #[serde(default = "default_new")]
    pub new: String,
    #[serde(default = "default_working")]
    pub working: String,
    #[serde(default = "default_success")]
    pub success: String,
    #[serde(default = "default_failure")]
    pub failure: String,
}

fn default_queue_root() -> String {
    "jobs/services".to_string()
}

fn default_tmp() -> String {
    "tmp".to_string()
}

fn default_new() -> String {
    "new".to_string()
}

fn default_working() -> String {
    "working".to_string()
}

fn default_success() -> String {
    "success".to_string()
}

fn default_failure() -> String {
    "failure".to_string()
}

impl QueueLayout {
    pub fn stage_name(&self, stage: QueueStage) -> &str {
        match stage {
            QueueStage::Tmp => &self.tmp,
            QueueStage::New => &self.new,
            QueueStage::Working => &self.working,
            QueueStage::Success => &self.success,
            QueueStage::Failure => &self.failure,
        }
    }
}

impl Default for QueueLayout {
    fn default() -> Self {
        Self {
            root: default_queue_root(),
            tmp: default_tmp(),
            new: default_new(),
            working: default_working(),
            success: default_success(),
            failure: default_failure(),
        }
    }
}

/// Pixel sizes handed to the scaling service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivativeSizes {
    #[serde(default = "default_thumbnail_size")]
    pub thumbnail_size: u32,
    #[serde(default = "default_front_thumbnail_size")]
    pub front_thumbnail_size: u32,
}

fn default_thumbnail_size() -> u32 {
    150
}

fn default_front_thumbnail_size() -> u32 {
    300
}

impl Default for DerivativeSizes {
    fn default() -> Self {
        Self {
            thumbnail_size: default_thumbnail_size(),
            front_thumbnail_size: default_front_thumbnail_size(),
        }
    }
}
