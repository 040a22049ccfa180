//! Small helpers over `quick-xml` shared by the finding-aid and structural
//! metadata readers/writers.

use std::path::Path;

use quick_xml::events::attributes::Attribute;
use quick_xml::events::BytesStart;

use crate::error::MetadataError;

pub(crate) const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

/// Value of the first attribute whose local name is `local`, unescaped.
pub(crate) fn attr(element: &BytesStart, local: &str) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == local.as_bytes())
        .map(|a| attr_text(&a))
}

pub(crate) fn attr_text(attribute: &Attribute) -> String {
    let raw = String::from_utf8_lossy(&attribute.value);
    match quick_xml::escape::unescape(&raw) {
        Ok(value) => value.into_owned(),
        Err(_) => raw.into_owned(),
    }
}

/// True if the element declares the xlink namespace prefix.
pub(crate) fn declares_xlink(element: &BytesStart) -> bool {
    element
        .attributes()
        .flatten()
        .any(|a| a.key.as_ref() == b"xmlns:xlink")
}

/// Namespace prefix of a qualified name including the colon, or empty.
pub(crate) fn prefix_of(qualified: &[u8]) -> String {
    match qualified.iter().position(|b| *b == b':') {
        Some(i) => format!("{}:", String::from_utf8_lossy(&qualified[..i])),
        None => String::new(),
    }
}

pub(crate) fn xml_error<E: std::fmt::Display>(path: &Path, error: E) -> MetadataError {
    MetadataError::Xml {
        path: path.to_path_buf(),
        message: error.to_string(),
    }
}
