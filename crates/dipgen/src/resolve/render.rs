use crate::finding_aid::Container;
use crate::sanitize::{capitalize, normalize_token};

/// Type used for containers that carry no usable `type` attribute.
pub const DEFAULT_KIND: &str = "container";

const CUSTOM_KIND: &str = "othertype";

/// Turns one container into one path token.
///
/// Implementations must be pure: the same container always renders to the
/// same token, and the token is never empty.
pub trait PathRenderer {
    fn render(&self, container: &Container) -> String;
}

/// `Capitalize(type)_label`, e.g. `Box_1`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurrentNaming;

impl PathRenderer for CurrentNaming {
    fn render(&self, container: &Container) -> String {
        let mut kind = container
            .kind
            .as_deref()
            .map(normalize_token)
            .filter(|k| !k.is_empty())
            .unwrap_or_else(|| DEFAULT_KIND.to_string());

        if kind == CUSTOM_KIND {
            if let Some(custom) = container
                .custom_label
                .as_deref()
                .map(normalize_token)
                .filter(|l| !l.is_empty())
            {
                kind = custom;
            }
        }

        let label = normalize_token(&container.label);
        if label.is_empty() {
            capitalize(&kind)
        } else {
            format!("{}_{}", capitalize(&kind), label)
        }
    }
}

/// Label-only naming of earlier package layouts, e.g. `1` for Box 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyNaming;

impl PathRenderer for LegacyNaming {
    fn render(&self, container: &Container) -> String {
        let label = normalize_token(&container.label);
        if label.is_empty() {
            DEFAULT_KIND.to_string()
        } else {
            label
        }
    }
}
