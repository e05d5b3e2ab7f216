//! # Progress Aggregation
//!
//! Pure percentages over `(Catalog, DomainMap, ProgressRecord, TierSelection)`.
//!
//! Every figure is a ratio of summed step counts, never an average of
//! percentages. Each lab is scoped to its own selected tier and completed
//! ids are filtered against the catalog before counting, so stale ids left
//! in storage never inflate a figure.
//!
//! Percentages are integers rounded half up and clamped to `0..=100`.

use crate::{Catalog, DomainMap, LayerProgress, ProgressRecord, Tier, TierSelection};
use serde::{Deserialize, Serialize};

/// Integer percentage of `completed / total`, rounded half up.
///
/// `0` when `total` is zero.
#[must_use]
pub fn percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let completed = completed.min(total);
    let rounded = completed
        .saturating_mul(200)
        .saturating_add(total)
        / total.saturating_mul(2);
    rounded.min(100) as u8
}

/// Where a module stands at its selected tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModuleStatus {
    NotStarted,
    InProgress,
    Completed,
}

impl ModuleStatus {
    /// Status from scoped step counts.
    #[must_use]
    pub fn from_counts(completed: usize, total: usize) -> Self {
        if completed == 0 {
            ModuleStatus::NotStarted
        } else if completed >= total {
            ModuleStatus::Completed
        } else {
            ModuleStatus::InProgress
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            ModuleStatus::NotStarted => "not started",
            ModuleStatus::InProgress => "in progress",
            ModuleStatus::Completed => "completed",
        }
    }
}

/// Dashboard row for one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSummary {
    pub module_id: String,
    pub name: String,
    pub domain: Option<u8>,
    pub tier: Tier,
    pub completed: usize,
    pub total: usize,
    pub percent: u8,
    pub status: ModuleStatus,
    pub layers: LayerProgress,
}

/// Dashboard row for one exam domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainSummary {
    pub number: u8,
    pub name: String,
    pub weight: String,
    pub completed: usize,
    pub total: usize,
    pub percent: u8,
    pub modules: Vec<String>,
}

/// Everything the readiness page shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadinessReport {
    pub overall: u8,
    pub domains: Vec<DomainSummary>,
    pub modules: Vec<ModuleSummary>,
}

/// Borrowed snapshot that all readiness figures are computed from.
#[derive(Debug, Clone, Copy)]
pub struct Readiness<'a> {
    catalog: &'a Catalog,
    domains: &'a DomainMap,
    progress: &'a ProgressRecord,
    tiers: &'a TierSelection,
}

impl<'a> Readiness<'a> {
    #[must_use]
    pub fn new(
        catalog: &'a Catalog,
        domains: &'a DomainMap,
        progress: &'a ProgressRecord,
        tiers: &'a TierSelection,
    ) -> Self {
        Self {
            catalog,
            domains,
            progress,
            tiers,
        }
    }

    /// `(completed, total)` over the lab's steps visible at `tier`.
    fn scoped_counts(&self, lab_id: &str, tier: Tier) -> (usize, usize) {
        let scoped = self.catalog.all_step_ids_for_tier(lab_id, tier);
        let done = self.progress.completed(lab_id);
        let completed = scoped.iter().filter(|id| done.contains(**id)).count();
        (completed, scoped.len())
    }

    /// Counts at the lab's selected tier.
    fn selected_counts(&self, lab_id: &str) -> (usize, usize) {
        self.scoped_counts(lab_id, self.tiers.get(lab_id))
    }

    fn sum_counts<'i>(&self, lab_ids: impl Iterator<Item = &'i str>) -> (usize, usize) {
        lab_ids
            .map(|lab_id| self.selected_counts(lab_id))
            .fold((0usize, 0usize), |(c, t), (lc, lt)| {
                (c.saturating_add(lc), t.saturating_add(lt))
            })
    }

    /// Percentage of the lab's steps at `tier` that are complete.
    #[must_use]
    pub fn module_progress_percent(&self, lab_id: &str, tier: Tier) -> u8 {
        let (completed, total) = self.scoped_counts(lab_id, tier);
        percent(completed, total)
    }

    /// Summed percentage over every lab mapped to domain `number`.
    #[must_use]
    pub fn domain_progress_percent(&self, number: u8) -> u8 {
        let (completed, total) = self.sum_counts(self.domains.modules_in_domain(number));
        percent(completed, total)
    }

    /// Summed percentage over every catalog lab.
    #[must_use]
    pub fn overall_readiness(&self) -> u8 {
        let (completed, total) =
            self.sum_counts(self.catalog.labs().map(|lab| lab.lab_id.as_str()));
        percent(completed, total)
    }

    /// Status of a module at its selected tier.
    #[must_use]
    pub fn module_status(&self, lab_id: &str) -> ModuleStatus {
        let (completed, total) = self.selected_counts(lab_id);
        ModuleStatus::from_counts(completed, total)
    }

    /// Dashboard row for a module or lab id.
    ///
    /// Ids known to neither the catalog nor the domain map yield `None`.
    #[must_use]
    pub fn module_summary(&self, module_id: &str) -> Option<ModuleSummary> {
        let module = self.domains.module(module_id);
        if module.is_none() && self.catalog.get_lab_definition(module_id).is_none() {
            return None;
        }

        let tier = self.tiers.get(module_id);
        let (completed, total) = self.scoped_counts(module_id, tier);
        Some(ModuleSummary {
            module_id: module_id.to_string(),
            name: module.map_or_else(|| module_id.to_string(), |m| m.name.clone()),
            domain: module.map(|m| m.domain),
            tier,
            completed,
            total,
            percent: percent(completed, total),
            status: ModuleStatus::from_counts(completed, total),
            layers: self.catalog.layer_progress_for_tier(
                module_id,
                tier,
                self.progress.completed(module_id),
            ),
        })
    }

    /// One row per exam domain, in domain order.
    #[must_use]
    pub fn domain_summaries(&self) -> Vec<DomainSummary> {
        self.domains
            .domains()
            .iter()
            .map(|domain| {
                let (completed, total) =
                    self.sum_counts(self.domains.modules_in_domain(domain.number));
                DomainSummary {
                    number: domain.number,
                    name: domain.name.clone(),
                    weight: domain.weight.clone(),
                    completed,
                    total,
                    percent: percent(completed, total),
                    modules: self
                        .domains
                        .modules_in_domain(domain.number)
                        .map(str::to_string)
                        .collect(),
                }
            })
            .collect()
    }

    /// Overall figure plus every domain and module row.
    #[must_use]
    pub fn report(&self) -> ReadinessReport {
        ReadinessReport {
            overall: self.overall_readiness(),
            domains: self.domain_summaries(),
            modules: self
                .domains
                .modules()
                .iter()
                .filter_map(|module| self.module_summary(&module.id))
                .collect(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn record(lab: &str, ids: &[&str]) -> ProgressRecord {
        let mut record = ProgressRecord::new();
        record.mark_completed(lab, ids.iter().copied());
        record
    }

    #[test]
    fn percent_rounds_half_up() {
        assert_eq!(percent(0, 0), 0);
        assert_eq!(percent(0, 12), 0);
        assert_eq!(percent(8, 12), 67);
        assert_eq!(percent(1, 8), 13);
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(12, 12), 100);
        assert_eq!(percent(20, 12), 100);
    }

    #[test]
    fn status_from_counts() {
        assert_eq!(ModuleStatus::from_counts(0, 0), ModuleStatus::NotStarted);
        assert_eq!(ModuleStatus::from_counts(0, 5), ModuleStatus::NotStarted);
        assert_eq!(ModuleStatus::from_counts(2, 5), ModuleStatus::InProgress);
        assert_eq!(ModuleStatus::from_counts(5, 5), ModuleStatus::Completed);
    }

    #[test]
    fn stale_ids_are_not_counted() {
        let catalog = Catalog::builtin();
        let progress = record("generative", &["gone-step", "another-gone-step"]);
        let tiers = TierSelection::new();
        let readiness = Readiness::new(catalog, DomainMap::builtin(), &progress, &tiers);
        assert_eq!(readiness.module_progress_percent("generative", Tier::Core), 0);
        assert_eq!(readiness.module_status("generative"), ModuleStatus::NotStarted);
    }

    #[test]
    fn domain_sums_counts_not_percentages() {
        let catalog = Catalog::builtin();
        let generative: Vec<&str> = catalog.all_step_ids_for_tier("generative", Tier::Core);
        let progress = record("generative", &generative);
        let tiers = TierSelection::new();
        let readiness = Readiness::new(catalog, DomainMap::builtin(), &progress, &tiers);

        let rag_total = catalog.all_step_ids_for_tier("rag", Tier::Core).len();
        let expected = percent(generative.len(), generative.len() + rag_total);
        assert_eq!(readiness.domain_progress_percent(2), expected);
        assert_ne!(expected, 50);
    }

    #[test]
    fn foundry_summary_has_no_steps() {
        let progress = ProgressRecord::new();
        let tiers = TierSelection::new();
        let readiness =
            Readiness::new(Catalog::builtin(), DomainMap::builtin(), &progress, &tiers);
        let summary = readiness.module_summary("foundry").expect("foundry module");
        assert_eq!(summary.total, 0);
        assert_eq!(summary.percent, 0);
        assert_eq!(summary.status, ModuleStatus::NotStarted);
        assert!(readiness.module_summary("nope").is_none());
    }

    #[test]
    fn report_covers_every_module_and_domain() {
        let progress = ProgressRecord::new();
        let tiers = TierSelection::new();
        let report =
            Readiness::new(Catalog::builtin(), DomainMap::builtin(), &progress, &tiers).report();
        assert_eq!(report.overall, 0);
        assert_eq!(report.domains.len(), 6);
        assert_eq!(report.modules.len(), 8);
    }
}
