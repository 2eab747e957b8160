//! Vertical taxonomy: per-vertical aspect vocabulary and aspect → stakeholder
//! ownership, loaded once from a declarative JSON document.
//!
//! The effective vocabulary for a vertical is the union of the global
//! aspects and the vertical's own additions. Stakeholder ownership starts
//! from the global map and is overridden entry-by-entry by the vertical's
//! declarations. Unknown verticals are not an error: they degrade to the
//! global-only view, so onboarding a new vertical is purely a config change.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use revlens_core::{Error, Result};

/// A single vertical's taxonomy additions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Vertical {
    /// Aspects allowed for this vertical in addition to the global set.
    #[serde(default)]
    pub aspects: Vec<String>,
    /// Team → aspects owned, overriding global ownership per aspect.
    #[serde(default)]
    pub stakeholders: BTreeMap<String, Vec<String>>,
}

/// The full taxonomy document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaxonomyConfig {
    #[serde(default)]
    pub global_aspects: Vec<String>,
    #[serde(default)]
    pub global_stakeholders: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub verticals: BTreeMap<String, Vertical>,
}

/// The resolved view for one vertical: what the guardrail and the prompt
/// renderer consume.
#[derive(Debug, Clone)]
pub struct VerticalView {
    /// Deduplicated allowed aspect vocabulary.
    pub allowed: BTreeSet<String>,
    /// Aspect → owning team.
    pub aspect_to_stakeholder: HashMap<String, String>,
}

impl VerticalView {
    pub fn is_allowed(&self, aspect: &str) -> bool {
        self.allowed.contains(aspect)
    }
}

impl TaxonomyConfig {
    /// Load the taxonomy document from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_str(&text)
    }

    /// Parse the taxonomy document from a JSON string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| Error::Config(format!("invalid taxonomy document: {}", e)))
    }

    /// Resolve the effective view for a vertical.
    ///
    /// Falls back to the global-only view when the vertical key is unknown.
    pub fn effective(&self, vertical_key: &str) -> VerticalView {
        let vertical = match self.verticals.get(vertical_key) {
            Some(v) => v,
            None => {
                warn!(
                    "Unknown vertical '{}', using global-only taxonomy",
                    vertical_key
                );
                return self.global_view();
            }
        };

        let mut allowed: BTreeSet<String> = self.global_aspects.iter().cloned().collect();
        allowed.extend(vertical.aspects.iter().cloned());

        let mut aspect_to_stakeholder = ownership_map(&self.global_stakeholders);
        for (team, aspects) in &vertical.stakeholders {
            for aspect in aspects {
                aspect_to_stakeholder.insert(aspect.clone(), team.clone());
            }
        }

        VerticalView {
            allowed,
            aspect_to_stakeholder,
        }
    }

    fn global_view(&self) -> VerticalView {
        VerticalView {
            allowed: self.global_aspects.iter().cloned().collect(),
            aspect_to_stakeholder: ownership_map(&self.global_stakeholders),
        }
    }
}

fn ownership_map(stakeholders: &BTreeMap<String, Vec<String>>) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for (team, aspects) in stakeholders {
        for aspect in aspects {
            map.insert(aspect.clone(), team.clone());
        }
    }
    map
}
