use std::collections::BTreeSet;

/// Folds MIME aliases onto the single spelling used for allow-list and
/// sibling checks.
pub fn canonical_mime(mime: &str) -> String {
    let lowered = mime.trim().to_ascii_lowercase();
    let canonical = match lowered.as_str() {
        "text/xml" => "application/xml",
        "audio/mp3" | "audio/x-mp3" | "audio/x-mpeg" | "audio/mpeg3" | "audio/x-mpeg-3" => {
            "audio/mpeg"
        }
        "image/tif" | "image/x-tiff" => "image/tiff",
        "application/ogg" | "audio/vorbis" => "audio/ogg",
        other => other,
    };
    canonical.to_string()
}

/// The set of MIME types eligible for packaging. Anything else is ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MimeAllowList {
    types: BTreeSet<String>,
}

impl MimeAllowList {
    pub fn new<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            types: types
                .into_iter()
                .map(|t| canonical_mime(t.as_ref()))
                .collect(),
        }
    }

    pub fn allows(&self, mime: &str) -> bool {
        self.types.contains(&canonical_mime(mime))
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl Default for MimeAllowList {
    fn default() -> Self {
        Self::new(super::schema::default_mime_allow_list())
    }
}
