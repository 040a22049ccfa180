use std::collections::{BTreeMap, BTreeSet};

use super::ResolvedPath;

/// A relationship between naming schemes that a migration cannot settle
/// automatically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LegacyCollision {
    /// One legacy directory stands for several current paths.
    Merged {
        legacy: String,
        current: Vec<String>,
    },
    /// Several legacy directories stand for one current path.
    Split {
        current: String,
        legacy: Vec<String>,
    },
}

/// Legacy path → current path(s), accumulated over a run.
#[derive(Debug, Clone, Default)]
pub struct LegacyPathMap {
    forward: BTreeMap<String, BTreeSet<String>>,
}

impl LegacyPathMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, resolved: &ResolvedPath) {
        self.forward
            .entry(resolved.legacy.relative_string())
            .or_default()
            .insert(resolved.current.relative_string());
    }

    pub fn current_for(&self, legacy: &str) -> Option<&BTreeSet<String>> {
        self.forward.get(legacy)
    }

    /// True when `legacy` maps to exactly one current path and no other
    /// legacy path maps to that same current path.
    pub fn is_unambiguous(&self, legacy: &str) -> bool {
        match self.forward.get(legacy) {
            Some(current) if current.len() == 1 => current.iter().all(|target| {
                self.forward.values().filter(|c| c.contains(target)).count() == 1
            }),
            _ => false,
        }
    }

    /// Unambiguous `(legacy, current)` pairs whose names differ.
    pub fn migrations(&self) -> Vec<(String, String)> {
        self.forward
            .iter()
            .filter(|(legacy, _)| self.is_unambiguous(legacy))
            .filter_map(|(legacy, current)| {
                let current = current.iter().next()?;
                (legacy != current).then(|| (legacy.clone(), current.clone()))
            })
            .collect()
    }

    pub fn collisions(&self) -> Vec<LegacyCollision> {
        let mut collisions = Vec::new();
        let mut reverse: BTreeMap<&str, Vec<String>> = BTreeMap::new();

        for (legacy, current) in &self.forward {
            if current.len() > 1 {
                collisions.push(LegacyCollision::Merged {
                    legacy: legacy.clone(),
                    current: current.iter().cloned().collect(),
                });
            }
            for path in current {
                reverse.entry(path.as_str()).or_default().push(legacy.clone());
            }
        }

        for (current, legacy) in reverse {
            if legacy.len() > 1 {
                collisions.push(LegacyCollision::Split {
                    current: current.to_string(),
                    legacy,
                });
            }
        }

        collisions
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}
