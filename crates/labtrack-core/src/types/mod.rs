//! # Core Type Definitions
//!
//! This module contains the data model shared by every labtrack component:
//! - Difficulty tiers (`Tier`) with an explicit rank table
//! - Static catalog shapes (`LabStep`, `LabLayer`, `LabDefinition`)
//! - Persisted state (`ProgressRecord`, `TierSelection`)
//! - Error types (`LabTrackError`)
//!
//! ## Persistence Shapes
//!
//! Both persisted types serialize as flat JSON objects keyed by lab id:
//! - `ProgressRecord`: `{"generative": ["setup-openai-resource", "l1-test"]}`
//! - `TierSelection`:  `{"generative": "advanced"}`
//!
//! `BTreeMap`/`BTreeSet` keep the serialized form deterministic.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// TIER
// =============================================================================

/// Difficulty band of a lab layer.
///
/// Selecting a tier is cumulative: `Advanced` shows every `Core` and
/// `Advanced` layer. Comparisons go through [`Tier::rank`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Core,
    Advanced,
    Expert,
}

impl Tier {
    /// Every tier, lowest rank first.
    pub const ALL: [Tier; 3] = [Tier::Core, Tier::Advanced, Tier::Expert];

    /// Position of this tier in the difficulty order.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Tier::Core => 0,
            Tier::Advanced => 1,
            Tier::Expert => 2,
        }
    }

    /// Whether a layer tagged `layer_tier` is visible when `self` is selected.
    #[must_use]
    pub const fn includes(self, layer_tier: Tier) -> bool {
        layer_tier.rank() <= self.rank()
    }

    /// Lowercase identifier used in storage and on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Tier::Core => "core",
            Tier::Advanced => "advanced",
            Tier::Expert => "expert",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Tier::Core => "Core",
            Tier::Advanced => "Advanced",
            Tier::Expert => "Expert",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = LabTrackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "core" => Ok(Tier::Core),
            "advanced" => Ok(Tier::Advanced),
            "expert" => Ok(Tier::Expert),
            _ => Err(LabTrackError::InvalidTier(s.to_string())),
        }
    }
}

// =============================================================================
// CATALOG SHAPES
// =============================================================================

/// A single checkable unit of progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabStep {
    /// Stable id, unique within its lab.
    pub id: String,
    pub label: String,
}

impl LabStep {
    #[must_use]
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// A tiered group of steps inside a lab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabLayer {
    /// Layer number, unique and ascending within a lab.
    pub id: u32,
    pub title: String,
    pub tier: Tier,
    pub steps: Vec<LabStep>,
}

impl LabLayer {
    /// Whether every step of this layer is in `completed`.
    ///
    /// A layer without steps is complete.
    #[must_use]
    pub fn is_complete(&self, completed: &BTreeSet<String>) -> bool {
        self.steps.iter().all(|step| completed.contains(&step.id))
    }

    /// Number of this layer's steps present in `completed`.
    #[must_use]
    pub fn completed_steps(&self, completed: &BTreeSet<String>) -> usize {
        self.steps
            .iter()
            .filter(|step| completed.contains(&step.id))
            .count()
    }
}

/// Static definition of one lab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabDefinition {
    pub lab_id: String,
    /// Relative path of the lab's markdown guide, e.g. `docs/labs/01-genai.md`.
    pub guide_file: String,
    /// Tier-independent steps, always in scope.
    pub setup: Vec<LabStep>,
    pub layers: Vec<LabLayer>,
}

impl LabDefinition {
    /// Find a layer by its id.
    #[must_use]
    pub fn layer(&self, layer_id: u32) -> Option<&LabLayer> {
        self.layers.iter().find(|layer| layer.id == layer_id)
    }
}

// =============================================================================
// PROGRESS RECORD
// =============================================================================

static NO_STEPS: BTreeSet<String> = BTreeSet::new();

/// Persisted mapping `lab_id -> completed step ids`.
///
/// Ids are kept verbatim even when the catalog no longer knows them;
/// counting code filters against the catalog. Labs with no completed
/// steps are never stored, so a toggle followed by the same toggle
/// restores an equal record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgressRecord {
    labs: BTreeMap<String, BTreeSet<String>>,
}

impl ProgressRecord {
    /// Create an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Completed step ids for a lab (empty when the lab has none).
    #[must_use]
    pub fn completed(&self, lab_id: &str) -> &BTreeSet<String> {
        self.labs.get(lab_id).unwrap_or(&NO_STEPS)
    }

    /// Check whether a step is marked complete.
    #[must_use]
    pub fn is_completed(&self, lab_id: &str, step_id: &str) -> bool {
        self.completed(lab_id).contains(step_id)
    }

    /// Flip membership of `step_id` for `lab_id`.
    ///
    /// Returns `true` if the step is now complete.
    pub fn toggle(&mut self, lab_id: &str, step_id: &str) -> bool {
        let steps = self.labs.entry(lab_id.to_string()).or_default();
        let now_complete = if steps.remove(step_id) {
            false
        } else {
            steps.insert(step_id.to_string());
            true
        };
        if steps.is_empty() {
            self.labs.remove(lab_id);
        }
        now_complete
    }

    /// Mark several steps complete. Returns how many were newly added.
    pub fn mark_completed<'a>(
        &mut self,
        lab_id: &str,
        step_ids: impl IntoIterator<Item = &'a str>,
    ) -> usize {
        let mut added = 0usize;
        let mut ids = step_ids.into_iter().peekable();
        if ids.peek().is_none() {
            return 0;
        }
        let steps = self.labs.entry(lab_id.to_string()).or_default();
        for id in ids {
            if steps.insert(id.to_string()) {
                added = added.saturating_add(1);
            }
        }
        added
    }

    /// Iterate labs that have at least one completed step.
    pub fn labs(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.labs.iter().map(|(lab, steps)| (lab.as_str(), steps))
    }

    /// True when no lab has any completed step.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labs.is_empty()
    }

    /// Drop labs with empty step sets (possible in hand-edited storage).
    #[must_use]
    pub(crate) fn normalized(mut self) -> Self {
        self.labs.retain(|_, steps| !steps.is_empty());
        self
    }
}

// =============================================================================
// TIER SELECTION
// =============================================================================

/// Persisted mapping `lab_id -> selected tier`, `Core` when absent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct TierSelection {
    tiers: BTreeMap<String, Tier>,
}

impl TierSelection {
    /// Create an empty selection (every lab at `Core`).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selected tier for a lab.
    #[must_use]
    pub fn get(&self, lab_id: &str) -> Tier {
        self.tiers.get(lab_id).copied().unwrap_or_default()
    }

    /// Select a tier for a lab.
    pub fn set(&mut self, lab_id: &str, tier: Tier) {
        self.tiers.insert(lab_id.to_string(), tier);
    }

    /// Iterate explicit selections.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Tier)> {
        self.tiers.iter().map(|(lab, tier)| (lab.as_str(), *tier))
    }
}

impl<'de> Deserialize<'de> for TierSelection {
    /// Entries that are not a known tier name, including non-string
    /// values, are dropped one by one; the other labs keep their selection.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, serde_json::Value>::deserialize(deserializer)?;
        let tiers = raw
            .into_iter()
            .filter_map(|(lab, value)| {
                let tier = value.as_str()?.parse::<Tier>().ok()?;
                Some((lab, tier))
            })
            .collect();
        Ok(Self { tiers })
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in labtrack.
///
/// Store reads never surface these; they degrade to defaults instead.
#[derive(Debug, Error)]
pub enum LabTrackError {
    /// The lab id is not in the catalog.
    #[error("Unknown lab: {0}")]
    UnknownLab(String),

    /// The layer id is not defined for the lab.
    #[error("Unknown layer {layer_id} in lab {lab_id}")]
    UnknownLayer { lab_id: String, layer_id: u32 },

    /// The step id is not defined for the lab.
    #[error("Unknown step {step_id} in lab {lab_id}")]
    UnknownStep { lab_id: String, step_id: String },

    /// A tier name could not be parsed.
    #[error("Invalid tier: {0}")]
    InvalidTier(String),

    /// A catalog definition violates its invariants.
    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    /// The key-value backend failed.
    #[error("Storage error: {0}")]
    StorageError(String),

    /// A value could not be serialized or deserialized.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A file or network operation failed.
    #[error("IO error: {0}")]
    IoError(String),

    /// Configuration could not be loaded.
    #[error("Config error: {0}")]
    ConfigError(String),

    /// A lab guide could not be fetched.
    #[error("Guide unavailable for {lab_id}: {reason}")]
    GuideUnavailable { lab_id: String, reason: String },
}

// =============================================================================
// TESTS
// =============================================================================
