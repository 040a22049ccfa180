use std::path::Path;

use crate::config::{canonical_mime, DerivativeSizes};

use super::job::{DerivativeCommand, FileUse};
use super::SiblingSet;

const MIME_PDF: &str = "application/pdf";
const MIME_XML: &str = "application/xml";
const MIME_TEXT: &str = "text/plain";
const MIME_JPEG: &str = "image/jpeg";

/// Source file types the planner derives from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Tiff,
    Pdf,
    Xml,
    Text,
    Mp3,
    Ogg,
    Mp4,
}

impl SourceKind {
    /// `None` for types that yield no jobs.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match canonical_mime(mime).as_str() {
            "image/tiff" => Some(SourceKind::Tiff),
            "application/pdf" => Some(SourceKind::Pdf),
            "application/xml" => Some(SourceKind::Xml),
            "text/plain" => Some(SourceKind::Text),
            "audio/mpeg" => Some(SourceKind::Mp3),
            "audio/ogg" => Some(SourceKind::Ogg),
            "video/mp4" => Some(SourceKind::Mp4),
            _ => None,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            SourceKind::Tiff => "image/tiff",
            SourceKind::Pdf => MIME_PDF,
            SourceKind::Xml => MIME_XML,
            SourceKind::Text => MIME_TEXT,
            SourceKind::Mp3 => "audio/mpeg",
            SourceKind::Ogg => "audio/ogg",
            SourceKind::Mp4 => "video/mp4",
        }
    }

    /// Job templates in emission order, already filtered by the run options.
    pub fn templates(&self, options: &TemplateOptions) -> Vec<JobTemplate> {
        match self {
            SourceKind::Tiff => {
                let mut templates = vec![
                    JobTemplate::new(
                        DerivativeCommand::Scale(options.sizes.thumbnail_size),
                        FileUse::Thumbnail,
                        MIME_JPEG,
                        Suffix::Fixed("_thumb.jpg"),
                    ),
                    JobTemplate::new(
                        DerivativeCommand::Scale(options.sizes.front_thumbnail_size),
                        FileUse::FrontThumbnail,
                        MIME_JPEG,
                        Suffix::Fixed("_front_thumb.jpg"),
                    ),
                    JobTemplate::new(
                        DerivativeCommand::TiffToJpeg,
                        FileUse::ReferenceImage,
                        MIME_JPEG,
                        Suffix::Fixed(".jpg"),
                    ),
                    JobTemplate::new(
                        DerivativeCommand::TiffToPdf,
                        FileUse::PrintImage,
                        MIME_PDF,
                        Suffix::Fixed(".pdf"),
                    )
                    .guarded(Guard::NoSiblingMime(MIME_PDF)),
                ];
                if options.ocr_required {
                    templates.push(
                        JobTemplate::new(
                            DerivativeCommand::Tesseract,
                            FileUse::Ocr,
                            MIME_TEXT,
                            Suffix::Fixed(".txt"),
                        )
                        .guarded(Guard::NoSiblingMime(MIME_PDF))
                        .guarded(Guard::NoCompanion("txt")),
                    );
                }
                templates
            }
            SourceKind::Pdf => {
                let usage = if options.pdf_master {
                    FileUse::Master
                } else {
                    FileUse::PrintImage
                };
                let mut templates = vec![JobTemplate::new(
                    DerivativeCommand::Copy,
                    usage,
                    MIME_PDF,
                    Suffix::KeepExtension,
                )];
                if options.ocr_required {
                    templates.push(
                        JobTemplate::new(
                            DerivativeCommand::PdfToXml,
                            FileUse::Coordinates,
                            MIME_XML,
                            Suffix::Fixed(".xml"),
                        )
                        .guarded(Guard::NoSiblingMime(MIME_XML)),
                    );
                    templates.push(
                        JobTemplate::new(
                            DerivativeCommand::PdfToText,
                            FileUse::Ocr,
                            MIME_TEXT,
                            Suffix::Fixed(".txt"),
                        )
                        .guarded(Guard::NoSiblingMime(MIME_TEXT)),
                    );
                }
                templates
            }
            SourceKind::Xml => vec![JobTemplate::copy(FileUse::Coordinates, MIME_XML)],
            SourceKind::Text => vec![JobTemplate::copy(FileUse::Ocr, MIME_TEXT)],
            SourceKind::Mp3 => vec![JobTemplate::copy(FileUse::ReferenceAudio, "audio/mpeg")],
            SourceKind::Ogg => vec![JobTemplate::copy(
                FileUse::SecondaryReferenceAudio,
                "audio/ogg",
            )],
            SourceKind::Mp4 => vec![JobTemplate::copy(FileUse::ReferenceVideo, "video/mp4")],
        }
    }
}

/// Run options that select which templates apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateOptions {
    pub ocr_required: bool,
    pub pdf_master: bool,
    pub sizes: DerivativeSizes,
}

/// How a target file name is formed from the source stem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suffix {
    Fixed(&'static str),
    KeepExtension,
}

impl Suffix {
    pub fn file_name(&self, stem: &str, source: &Path) -> String {
        match self {
            Suffix::Fixed(suffix) => format!("{}{}", stem, suffix),
            Suffix::KeepExtension => match source.extension().and_then(|e| e.to_str()) {
                Some(ext) => format!("{}.{}", stem, ext),
                None => stem.to_string(),
            },
        }
    }
}

/// Condition that must hold among sibling files for a job to be emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// No sibling carries this MIME type.
    NoSiblingMime(&'static str),
    /// No sibling named `<stem>.<extension>` exists.
    NoCompanion(&'static str),
}

impl Guard {
    pub fn allows(&self, siblings: &SiblingSet, stem: &str) -> bool {
        match self {
            Guard::NoSiblingMime(mime) => !siblings.has_mime(mime),
            Guard::NoCompanion(ext) => !siblings.has_file_named(&format!("{}.{}", stem, ext)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobTemplate {
    pub command: DerivativeCommand,
    pub usage: FileUse,
    pub mime_type: &'static str,
    pub suffix: Suffix,
    pub guards: Vec<Guard>,
}

impl JobTemplate {
    fn new(command: DerivativeCommand, usage: FileUse, mime_type: &'static str, suffix: Suffix) -> Self {
        Self {
            command,
            usage,
            mime_type,
            suffix,
            guards: Vec::new(),
        }
    }

    fn copy(usage: FileUse, mime_type: &'static str) -> Self {
        Self::new(DerivativeCommand::Copy, usage, mime_type, Suffix::KeepExtension)
    }

    fn guarded(mut self, guard: Guard) -> Self {
        self.guards.push(guard);
        self
    }

    pub fn applies(&self, siblings: &SiblingSet, stem: &str) -> bool {
        self.guards.iter().all(|g| g.allows(siblings, stem))
    }
}
