//! # Progress Views
//!
//! A mounted view model for one lab's checklist.
//!
//! Views never share state directly. Each view keeps a local copy of its
//! lab's completed steps and tier, writes through the [`ProgressStore`],
//! and reloads after every write and every change event. Two views mounted
//! on the same lab converge after each calls [`ProgressView::sync`].

use crate::events::Subscription;
use crate::readiness::percent;
use crate::{Catalog, LabDefinition, LabTrackError, LayerProgress, ProgressStore, Tier};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One checkbox row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: String,
    pub label: String,
    pub checked: bool,
}

/// A titled block of checkboxes: the setup block or one layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistGroup {
    pub title: String,
    /// `None` for the setup block.
    pub layer_id: Option<u32>,
    pub tier: Option<Tier>,
    pub complete: bool,
    pub items: Vec<ChecklistItem>,
}

/// Live view of one lab's progress.
///
/// Dropping the view releases its subscription.
#[derive(Debug)]
pub struct ProgressView<'c> {
    store: ProgressStore,
    lab: &'c LabDefinition,
    catalog: &'c Catalog,
    completed: BTreeSet<String>,
    tier: Tier,
    subscription: Subscription,
}

impl<'c> ProgressView<'c> {
    /// Load `lab_id`'s state and start listening for changes.
    ///
    /// # Errors
    ///
    /// Returns `LabTrackError::UnknownLab` if the lab is not in `catalog`.
    pub fn mount(
        store: &ProgressStore,
        catalog: &'c Catalog,
        lab_id: &str,
    ) -> Result<Self, LabTrackError> {
        let lab = catalog
            .get_lab_definition(lab_id)
            .ok_or_else(|| LabTrackError::UnknownLab(lab_id.to_string()))?;
        let subscription = store.subscribe();
        Ok(Self {
            completed: store.completed_steps(lab_id),
            tier: store.load_tier(lab_id),
            store: store.clone(),
            lab,
            catalog,
            subscription,
        })
    }

    #[must_use]
    pub fn lab_id(&self) -> &str {
        &self.lab.lab_id
    }

    #[must_use]
    pub fn tier(&self) -> Tier {
        self.tier
    }

    #[must_use]
    pub fn completed(&self) -> &BTreeSet<String> {
        &self.completed
    }

    #[must_use]
    pub fn is_checked(&self, step_id: &str) -> bool {
        self.completed.contains(step_id)
    }

    /// Reload if any change event arrived since the last reload.
    ///
    /// Returns `true` when the view reloaded.
    pub fn sync(&mut self) -> bool {
        if self.subscription.drain().is_empty() {
            return false;
        }
        self.reload();
        true
    }

    /// Flip a step through the store, then reload.
    ///
    /// Returns whether the step is checked after the reload.
    pub fn toggle(&mut self, step_id: &str) -> bool {
        self.store.toggle_step(&self.lab.lab_id, step_id);
        self.reload();
        self.is_checked(step_id)
    }

    /// Select a tier through the store, then reload.
    pub fn select_tier(&mut self, tier: Tier) {
        self.store.save_tier(&self.lab.lab_id, tier);
        self.reload();
    }

    /// Percentage of tier-scoped steps checked.
    #[must_use]
    pub fn percent(&self) -> u8 {
        let scoped = self.catalog.all_step_ids_for_tier(&self.lab.lab_id, self.tier);
        let done = scoped
            .iter()
            .filter(|id| self.completed.contains(**id))
            .count();
        percent(done, scoped.len())
    }

    /// Completed vs. visible layers.
    #[must_use]
    pub fn layer_progress(&self) -> LayerProgress {
        self.catalog
            .layer_progress_for_tier(&self.lab.lab_id, self.tier, &self.completed)
    }

    /// Setup block followed by one block per tier-visible layer.
    #[must_use]
    pub fn checklist(&self) -> Vec<ChecklistGroup> {
        let item = |step: &crate::LabStep| ChecklistItem {
            id: step.id.clone(),
            label: step.label.clone(),
            checked: self.completed.contains(&step.id),
        };

        let mut groups = Vec::new();
        if !self.lab.setup.is_empty() {
            groups.push(ChecklistGroup {
                title: "Setup".to_string(),
                layer_id: None,
                tier: None,
                complete: self
                    .lab
                    .setup
                    .iter()
                    .all(|step| self.completed.contains(&step.id)),
                items: self.lab.setup.iter().map(item).collect(),
            });
        }
        for layer in self.catalog.layers_for_tier(&self.lab.lab_id, self.tier) {
            groups.push(ChecklistGroup {
                title: format!("Layer {}: {}", layer.id, layer.title),
                layer_id: Some(layer.id),
                tier: Some(layer.tier),
                complete: layer.is_complete(&self.completed),
                items: layer.steps.iter().map(item).collect(),
            });
        }
        groups
    }

    /// Replace the local copy with the persisted state.
    ///
    /// Pending events are discarded: the state they announce is already
    /// loaded.
    fn reload(&mut self) {
        self.subscription.drain();
        self.completed = self.store.completed_steps(&self.lab.lab_id);
        self.tier = self.store.load_tier(&self.lab.lab_id);
    }
}
