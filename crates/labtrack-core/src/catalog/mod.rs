//! # Lab Catalog
//!
//! Read-only lookups over the static set of [`LabDefinition`]s.
//!
//! The catalog is built once and never mutated. Every lookup is pure and
//! an unknown lab id is an expected outcome: lookups return `None`, an
//! empty sequence, or zero.
//!
//! Tier-scoped lookups live in [`crate::filter`].

mod builtin;

use crate::{LabDefinition, LabTrackError};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

static BUILTIN: LazyLock<Catalog> = LazyLock::new(|| Catalog::indexed(builtin::definitions()));

/// Keyed collection of lab definitions.
#[derive(Debug, Clone)]
pub struct Catalog {
    labs: Vec<LabDefinition>,
    index: BTreeMap<String, usize>,
}

impl Catalog {
    /// The built-in catalog of hands-on labs.
    #[must_use]
    pub fn builtin() -> &'static Catalog {
        &BUILTIN
    }

    /// Build a catalog from definitions, checking its invariants.
    ///
    /// # Errors
    ///
    /// Returns `LabTrackError::InvalidCatalog` if:
    /// - two labs share a `lab_id`
    /// - layer ids within a lab are not strictly ascending
    /// - two steps within a lab share an id
    pub fn new(labs: Vec<LabDefinition>) -> Result<Self, LabTrackError> {
        let mut seen_labs = BTreeSet::new();
        for lab in &labs {
            if !seen_labs.insert(lab.lab_id.as_str()) {
                return Err(LabTrackError::InvalidCatalog(format!(
                    "duplicate lab id '{}'",
                    lab.lab_id
                )));
            }

            for pair in lab.layers.windows(2) {
                if pair[0].id >= pair[1].id {
                    return Err(LabTrackError::InvalidCatalog(format!(
                        "lab '{}': layer {} follows layer {}",
                        lab.lab_id, pair[1].id, pair[0].id
                    )));
                }
            }

            let mut seen_steps = BTreeSet::new();
            let all_steps = lab
                .setup
                .iter()
                .chain(lab.layers.iter().flat_map(|layer| layer.steps.iter()));
            for step in all_steps {
                if !seen_steps.insert(step.id.as_str()) {
                    return Err(LabTrackError::InvalidCatalog(format!(
                        "lab '{}': duplicate step id '{}'",
                        lab.lab_id, step.id
                    )));
                }
            }
        }

        Ok(Self::indexed(labs))
    }

    fn indexed(labs: Vec<LabDefinition>) -> Self {
        let index = labs
            .iter()
            .enumerate()
            .map(|(pos, lab)| (lab.lab_id.clone(), pos))
            .collect();
        Self { labs, index }
    }

    /// Look up a lab by id.
    #[must_use]
    pub fn get_lab_definition(&self, lab_id: &str) -> Option<&LabDefinition> {
        self.index.get(lab_id).and_then(|&pos| self.labs.get(pos))
    }

    /// All labs in catalog order.
    pub fn labs(&self) -> impl Iterator<Item = &LabDefinition> {
        self.labs.iter()
    }

    /// Number of labs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.labs.len()
    }

    /// True when the catalog has no labs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labs.is_empty()
    }

    /// Every step id of a lab: setup first, then each layer in order.
    /// Tiers are ignored.
    #[must_use]
    pub fn all_step_ids(&self, lab_id: &str) -> Vec<&str> {
        let Some(lab) = self.get_lab_definition(lab_id) else {
            return Vec::new();
        };
        lab.setup
            .iter()
            .chain(lab.layers.iter().flat_map(|layer| layer.steps.iter()))
            .map(|step| step.id.as_str())
            .collect()
    }

    /// Count of [`Catalog::all_step_ids`].
    #[must_use]
    pub fn total_steps(&self, lab_id: &str) -> usize {
        self.get_lab_definition(lab_id)
            .map(|lab| {
                lab.layers
                    .iter()
                    .fold(lab.setup.len(), |sum, layer| sum.saturating_add(layer.steps.len()))
            })
            .unwrap_or(0)
    }

    /// Layers (any tier) whose every step is in `completed`.
    #[must_use]
    pub fn completed_layer_count(&self, lab_id: &str, completed: &BTreeSet<String>) -> usize {
        self.get_lab_definition(lab_id)
            .map(|lab| {
                lab.layers
                    .iter()
                    .filter(|layer| layer.is_complete(completed))
                    .count()
            })
            .unwrap_or(0)
    }

    /// Whether `step_id` belongs to the lab (setup or any layer).
    #[must_use]
    pub fn contains_step(&self, lab_id: &str, step_id: &str) -> bool {
        self.all_step_ids(lab_id).contains(&step_id)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LabLayer, LabStep, Tier};

    fn tiny_lab(lab_id: &str, layer_ids: &[u32]) -> LabDefinition {
        LabDefinition {
            lab_id: lab_id.to_string(),
            guide_file: format!("docs/labs/{lab_id}.md"),
            setup: vec![LabStep::new("setup-a", "Setup A")],
            layers: layer_ids
                .iter()
                .map(|&id| LabLayer {
                    id,
                    title: format!("Layer {id}"),
                    tier: Tier::Core,
                    steps: vec![LabStep::new(format!("l{id}-a"), "Step")],
                })
                .collect(),
        }
    }

    #[test]
    fn builtin_catalog_is_valid() {
        let labs: Vec<_> = Catalog::builtin().labs().cloned().collect();
        assert_eq!(labs.len(), 7);
        assert!(Catalog::new(labs).is_ok());
    }

    #[test]
    fn builtin_lab_ids() {
        let ids: Vec<_> = Catalog::builtin()
            .labs()
            .map(|lab| lab.lab_id.as_str())
            .collect();
        assert_eq!(
            ids,
            vec![
                "generative",
                "rag",
                "search",
                "vision",
                "language",
                "agents",
                "responsible-ai"
            ]
        );
    }

    #[test]
    fn unknown_lab_is_empty() {
        let catalog = Catalog::builtin();
        assert!(catalog.get_lab_definition("foundry").is_none());
        assert!(catalog.all_step_ids("foundry").is_empty());
        assert_eq!(catalog.total_steps("foundry"), 0);
        assert_eq!(catalog.completed_layer_count("foundry", &BTreeSet::new()), 0);
    }

    #[test]
    fn all_step_ids_setup_first() {
        let catalog = Catalog::builtin();
        let ids = catalog.all_step_ids("generative");
        assert_eq!(ids.first().copied(), Some("setup-openai-resource"));
        assert_eq!(ids.get(5).copied(), Some("l1-get-client"));
        assert_eq!(ids.last().copied(), Some("l6-questions"));
        assert_eq!(catalog.total_steps("generative"), ids.len());
        assert_eq!(catalog.total_steps("generative"), 22);
    }

    #[test]
    fn search_lab_has_no_setup() {
        let catalog = Catalog::builtin();
        let lab = catalog.get_lab_definition("search").expect("search lab");
        assert!(lab.setup.is_empty());
        assert_eq!(catalog.all_step_ids("search").first().copied(), Some("l1-review-clients"));
    }

    #[test]
    fn rejects_duplicate_lab() {
        let result = Catalog::new(vec![tiny_lab("x", &[1]), tiny_lab("x", &[1])]);
        assert!(matches!(result, Err(LabTrackError::InvalidCatalog(_))));
    }

    #[test]
    fn rejects_unordered_layers() {
        let result = Catalog::new(vec![tiny_lab("x", &[2, 1])]);
        assert!(matches!(result, Err(LabTrackError::InvalidCatalog(_))));
    }

    #[test]
    fn rejects_duplicate_step() {
        let mut lab = tiny_lab("x", &[1]);
        lab.setup.push(LabStep::new("setup-a", "Again"));
        assert!(matches!(
            Catalog::new(vec![lab]),
            Err(LabTrackError::InvalidCatalog(_))
        ));
    }

    #[test]
    fn contains_step_checks_membership() {
        let catalog = Catalog::builtin();
        assert!(catalog.contains_step("rag", "l8-vector-query"));
        assert!(!catalog.contains_step("rag", "l1-get-client"));
    }
}
