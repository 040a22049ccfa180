use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Derivative operation requested from the external services.
///
/// On the wire a command is a string, with an optional parameter after a
/// `;` separator (`scale;150`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum DerivativeCommand {
    /// Scale an image so its longest side is the given number of pixels.
    Scale(u32),
    TiffToJpeg,
    TiffToPdf,
    Tesseract,
    Copy,
    PdfToXml,
    PdfToText,
}

impl DerivativeCommand {
    fn name(&self) -> &'static str {
        match self {
            DerivativeCommand::Scale(_) => "scale",
            DerivativeCommand::TiffToJpeg => "tiff2jpg",
            DerivativeCommand::TiffToPdf => "tiff2pdf",
            DerivativeCommand::Tesseract => "tesseract",
            DerivativeCommand::Copy => "copy",
            DerivativeCommand::PdfToXml => "pdf2xml",
            DerivativeCommand::PdfToText => "pdf2txt",
        }
    }
}

impl fmt::Display for DerivativeCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DerivativeCommand::Scale(size) => write!(f, "{};{}", self.name(), size),
            other => f.write_str(other.name()),
        }
    }
}

impl FromStr for DerivativeCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, param) = match s.split_once(';') {
            Some((name, param)) => (name, Some(param)),
            None => (s, None),
        };

        let command = match (name, param) {
            ("scale", Some(size)) => {
                let size = size
                    .trim()
                    .parse::<u32>()
                    .map_err(|e| format!("invalid scale size '{}': {}", size, e))?;
                DerivativeCommand::Scale(size)
            }
            ("tiff2jpg", None) => DerivativeCommand::TiffToJpeg,
            ("tiff2pdf", None) => DerivativeCommand::TiffToPdf,
            ("tesseract", None) => DerivativeCommand::Tesseract,
            ("copy", None) => DerivativeCommand::Copy,
            ("pdf2xml", None) => DerivativeCommand::PdfToXml,
            ("pdf2txt", None) => DerivativeCommand::PdfToText,
            _ => return Err(format!("unknown derivative command '{}'", s)),
        };
        Ok(command)
    }
}

impl From<DerivativeCommand> for String {
    fn from(command: DerivativeCommand) -> Self {
        command.to_string()
    }
}

impl TryFrom<String> for DerivativeCommand {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Semantic role of a derived file in the dissemination package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileUse {
    #[serde(rename = "thumbnail")]
    Thumbnail,
    #[serde(rename = "front thumbnail")]
    FrontThumbnail,
    #[serde(rename = "reference image")]
    ReferenceImage,
    #[serde(rename = "print image")]
    PrintImage,
    #[serde(rename = "master")]
    Master,
    #[serde(rename = "ocr")]
    Ocr,
    #[serde(rename = "coordinates")]
    Coordinates,
    #[serde(rename = "reference audio")]
    ReferenceAudio,
    #[serde(rename = "secondary reference audio")]
    SecondaryReferenceAudio,
    #[serde(rename = "reference video")]
    ReferenceVideo,
}

impl FileUse {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileUse::Thumbnail => "thumbnail",
            FileUse::FrontThumbnail => "front thumbnail",
            FileUse::ReferenceImage => "reference image",
            FileUse::PrintImage => "print image",
            FileUse::Master => "master",
            FileUse::Ocr => "ocr",
            FileUse::Coordinates => "coordinates",
            FileUse::ReferenceAudio => "reference audio",
            FileUse::SecondaryReferenceAudio => "secondary reference audio",
            FileUse::ReferenceVideo => "reference video",
        }
    }
}

impl fmt::Display for FileUse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A derivative-generation work order, serialized as the queue payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    /// Grouping key shared by every job derived from the same archival unit.
    pub item: String,
    pub item_base: String,
    pub command: DerivativeCommand,
    pub source: PathBuf,
    pub target: PathBuf,
    /// MIME type of the output.
    pub mime_type: String,
    #[serde(rename = "use")]
    pub usage: FileUse,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_required: Option<bool>,
}
