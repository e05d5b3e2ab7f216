//! # Progress Store
//!
//! Durable completion and tier state on top of a [`KeyValueStore`].
//!
//! Every mutation is a synchronous read-modify-write-persist-broadcast
//! sequence against the freshest persisted value. Reads never fail: an
//! absent or corrupt value degrades to its default. Writes are best-effort;
//! a failed write is logged and no change event is sent.

use crate::events::{EventBus, StoredValue, Subscription};
use crate::{Catalog, KeyValueStore, LabTrackError, MemoryStore, ProgressRecord, Tier, TierSelection};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

/// Storage key of the [`ProgressRecord`].
pub const PROGRESS_KEY: &str = "labtrack-lab-progress";

/// Storage key of the [`TierSelection`].
pub const TIERS_KEY: &str = "labtrack-lab-tiers";

/// Storage key of the UI [`Preferences`].
pub const PREFERENCES_KEY: &str = "labtrack-preferences";

// =============================================================================
// PREFERENCES
// =============================================================================

/// Colour scheme of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    System,
    Light,
    Dark,
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Theme::System => "system",
            Theme::Light => "light",
            Theme::Dark => "dark",
        })
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "system" => Ok(Theme::System),
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("unknown theme '{other}'")),
        }
    }
}

/// Persisted UI preferences shared by every view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub theme: Theme,
    pub sidebar_collapsed: bool,
}

// =============================================================================
// PROGRESS STORE
// =============================================================================

/// Handle to the persisted progress state.
///
/// Cloning is cheap and clones share storage, event bus, and write lock.
#[derive(Debug, Clone)]
pub struct ProgressStore {
    bus: EventBus,
    progress: StoredValue<ProgressRecord>,
    tiers: StoredValue<TierSelection>,
    preferences: StoredValue<Preferences>,
    write_lock: Arc<Mutex<()>>,
}

impl ProgressStore {
    /// Create a store over `storage` with a fresh event bus.
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        let bus = EventBus::new();
        Self {
            progress: StoredValue::new(PROGRESS_KEY, Arc::clone(&storage), bus.clone()),
            tiers: StoredValue::new(TIERS_KEY, Arc::clone(&storage), bus.clone()),
            preferences: StoredValue::new(PREFERENCES_KEY, storage, bus.clone()),
            bus,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Create a store over volatile memory.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// The bus change events are published on.
    #[must_use]
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    // -------------------------------------------------------------------------
    // Progress
    // -------------------------------------------------------------------------

    /// Current progress record; empty when absent or unreadable.
    #[must_use]
    pub fn load_progress(&self) -> ProgressRecord {
        self.progress.load().normalized()
    }

    /// Persist the full record and broadcast the change.
    pub fn save_progress(&self, record: &ProgressRecord) {
        let _guard = self.lock();
        self.progress.save(record);
    }

    /// Completed step ids of one lab.
    #[must_use]
    pub fn completed_steps(&self, lab_id: &str) -> BTreeSet<String> {
        self.load_progress().completed(lab_id).clone()
    }

    /// Flip one step. Returns `true` if the step is now complete.
    pub fn toggle_step(&self, lab_id: &str, step_id: &str) -> bool {
        let _guard = self.lock();
        let now_complete = self
            .progress
            .update(|record| record.toggle(lab_id, step_id));
        tracing::debug!(lab_id, step_id, now_complete, "step toggled");
        now_complete
    }

    /// Mark every step of one layer complete.
    ///
    /// Returns how many steps were newly completed.
    ///
    /// # Errors
    ///
    /// - `LabTrackError::UnknownLab` if the lab is not in `catalog`
    /// - `LabTrackError::UnknownLayer` if the lab has no such layer
    pub fn complete_layer(
        &self,
        catalog: &Catalog,
        lab_id: &str,
        layer_id: u32,
    ) -> Result<usize, LabTrackError> {
        let lab = catalog
            .get_lab_definition(lab_id)
            .ok_or_else(|| LabTrackError::UnknownLab(lab_id.to_string()))?;
        let layer = lab.layer(layer_id).ok_or_else(|| LabTrackError::UnknownLayer {
            lab_id: lab_id.to_string(),
            layer_id,
        })?;

        let _guard = self.lock();
        let added = self.progress.update(|record| {
            record.mark_completed(lab_id, layer.steps.iter().map(|step| step.id.as_str()))
        });
        tracing::debug!(lab_id, layer_id, added, "layer completed");
        Ok(added)
    }

    // -------------------------------------------------------------------------
    // Tiers
    // -------------------------------------------------------------------------

    /// Every explicit tier selection.
    #[must_use]
    pub fn load_tiers(&self) -> TierSelection {
        self.tiers.load()
    }

    /// Selected tier for a lab, `Core` when never chosen.
    #[must_use]
    pub fn load_tier(&self, lab_id: &str) -> Tier {
        self.load_tiers().get(lab_id)
    }

    /// Select a tier for a lab and broadcast the change.
    pub fn save_tier(&self, lab_id: &str, tier: Tier) {
        let _guard = self.lock();
        self.tiers.update(|selection| selection.set(lab_id, tier));
        tracing::debug!(lab_id, %tier, "tier selected");
    }

    // -------------------------------------------------------------------------
    // Preferences
    // -------------------------------------------------------------------------

    /// Current UI preferences.
    #[must_use]
    pub fn preferences(&self) -> Preferences {
        self.preferences.load()
    }

    /// Apply `f` to the stored preferences and return the new value.
    pub fn update_preferences(&self, f: impl FnOnce(&mut Preferences)) -> Preferences {
        let _guard = self.lock();
        self.preferences.update(|prefs| {
            f(prefs);
            *prefs
        })
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Forget all progress and tier selections.
    pub fn reset(&self) {
        let _guard = self.lock();
        self.progress.clear();
        self.tiers.clear();
        tracing::info!("progress reset");
    }

    /// Subscribe to progress and tier changes.
    pub fn subscribe(&self) -> Subscription {
        self.bus.subscribe([PROGRESS_KEY, TIERS_KEY])
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// =============================================================================
// TESTS
// =============================================================================
