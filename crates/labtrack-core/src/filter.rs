//! # Tier Filter
//!
//! Tier-scoped views of a lab. Selecting tier `T` keeps every layer whose
//! tier rank is `<= T` (cumulative). Setup steps are always in scope.
//! Layer order is the catalog order; layers are never regrouped by tier.

use crate::{Catalog, LabLayer, Tier};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Completed vs. total layers within a tier scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LayerProgress {
    pub completed: usize,
    pub total: usize,
}

impl Catalog {
    /// Layers visible at `tier`, in original order.
    #[must_use]
    pub fn layers_for_tier(&self, lab_id: &str, tier: Tier) -> Vec<&LabLayer> {
        self.get_lab_definition(lab_id)
            .map(|lab| {
                lab.layers
                    .iter()
                    .filter(|layer| tier.includes(layer.tier))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Setup step ids followed by the step ids of [`Catalog::layers_for_tier`].
    #[must_use]
    pub fn all_step_ids_for_tier(&self, lab_id: &str, tier: Tier) -> Vec<&str> {
        let Some(lab) = self.get_lab_definition(lab_id) else {
            return Vec::new();
        };
        lab.setup
            .iter()
            .chain(
                lab.layers
                    .iter()
                    .filter(|layer| tier.includes(layer.tier))
                    .flat_map(|layer| layer.steps.iter()),
            )
            .map(|step| step.id.as_str())
            .collect()
    }

    /// Tier-visible layers whose every step is in `completed`.
    ///
    /// A layer with zero steps counts as complete.
    #[must_use]
    pub fn completed_layer_count_for_tier(
        &self,
        lab_id: &str,
        tier: Tier,
        completed: &BTreeSet<String>,
    ) -> usize {
        self.layers_for_tier(lab_id, tier)
            .into_iter()
            .filter(|layer| layer.is_complete(completed))
            .count()
    }

    /// Completed and total layer counts at `tier`.
    #[must_use]
    pub fn layer_progress_for_tier(
        &self,
        lab_id: &str,
        tier: Tier,
        completed: &BTreeSet<String>,
    ) -> LayerProgress {
        let layers = self.layers_for_tier(lab_id, tier);
        LayerProgress {
            completed: layers
                .iter()
                .filter(|layer| layer.is_complete(completed))
                .count(),
            total: layers.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LabDefinition, LabStep};

    fn completed(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|id| (*id).to_string()).collect()
    }

    #[test]
    fn core_tier_generative() {
        let catalog = Catalog::builtin();
        let layers = catalog.layers_for_tier("generative", Tier::Core);
        let ids: Vec<u32> = layers.iter().map(|layer| layer.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(catalog.all_step_ids_for_tier("generative", Tier::Core).len(), 12);
    }

    #[test]
    fn expert_tier_matches_all_steps() {
        let catalog = Catalog::builtin();
        for lab in catalog.labs() {
            assert_eq!(
                catalog.all_step_ids_for_tier(&lab.lab_id, Tier::Expert),
                catalog.all_step_ids(&lab.lab_id)
            );
        }
    }

    #[test]
    fn advanced_adds_advanced_layers() {
        let catalog = Catalog::builtin();
        let ids: Vec<u32> = catalog
            .layers_for_tier("rag", Tier::Advanced)
            .iter()
            .map(|layer| layer.id)
            .collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn completed_layer_count_only_full_layers() {
        let catalog = Catalog::builtin();
        let done = completed(&[
            "l1-get-client",
            "l1-chat-completion",
            "l1-test",
            "l2-add-params",
            "l3-test",
        ]);
        assert_eq!(
            catalog.completed_layer_count_for_tier("generative", Tier::Core, &done),
            1
        );
        let progress = catalog.layer_progress_for_tier("generative", Tier::Core, &done);
        assert_eq!(progress, LayerProgress { completed: 1, total: 3 });
    }

    #[test]
    fn unknown_lab_filters_to_nothing() {
        let catalog = Catalog::builtin();
        assert!(catalog.layers_for_tier("nope", Tier::Expert).is_empty());
        assert!(catalog.all_step_ids_for_tier("nope", Tier::Expert).is_empty());
        assert_eq!(
            catalog.completed_layer_count_for_tier("nope", Tier::Expert, &BTreeSet::new()),
            0
        );
    }

    #[test]
    fn zero_step_layer_counts_as_complete() {
        let lab = LabDefinition {
            lab_id: "sparse".to_string(),
            guide_file: "docs/labs/sparse.md".to_string(),
            setup: vec![LabStep::new("setup-a", "Setup")],
            layers: vec![
                LabLayer {
                    id: 1,
                    title: "Empty".to_string(),
                    tier: Tier::Core,
                    steps: Vec::new(),
                },
                LabLayer {
                    id: 2,
                    title: "One".to_string(),
                    tier: Tier::Core,
                    steps: vec![LabStep::new("l2-a", "Step")],
                },
            ],
        };
        let catalog = Catalog::new(vec![lab]).expect("catalog");
        assert_eq!(
            catalog.completed_layer_count_for_tier("sparse", Tier::Core, &BTreeSet::new()),
            1
        );
    }
}
