//! String normalisation shared by path rendering, job grouping and file ids.
//!
//! Also holds the helpers that keep tracing span attributes free of full
//! filesystem paths.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};

static RE_NON_ALNUM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\p{L}\p{N}]+").unwrap());

/// Length of the hex digest kept in file identifiers.
const FILE_ID_HASH_LEN: usize = 32;

/// Lowercases `raw` and collapses every run of non-alphanumeric characters
/// into a single underscore. Leading and trailing separators are dropped.
pub fn normalize_token(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    RE_NON_ALNUM
        .replace_all(&lowered, "_")
        .trim_matches('_')
        .to_string()
}

/// Uppercases the first character, leaving the rest untouched.
pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Builds an item grouping key from a path with its extension already removed.
///
/// Case is preserved; separators and punctuation become underscores.
pub fn item_key(path_without_extension: &str) -> String {
    RE_NON_ALNUM
        .replace_all(path_without_extension, "_")
        .trim_matches('_')
        .to_string()
}

/// Deterministic digest of a target path, stable across runs and platforms.
pub fn hash_target(path: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.to_string_lossy().as_bytes());
    let mut digest = hex::encode(hasher.finalize());
    digest.truncate(FILE_ID_HASH_LEN);
    digest
}

/// Structural file identifier: `ReferenceImageFile<hash>` for a
/// `reference image` target.
pub fn file_id(usage: &str, target: &Path) -> String {
    let prefix: String = usage.split_whitespace().map(capitalize).collect();
    format!("{}File{}", prefix, hash_target(target))
}

/// Returns only the filename component of a path (no directory).
///
/// Safe for span fields: reveals the file name without exposing the full path.
pub fn redact_path(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
        .to_string()
}
