//! # Property-Based Tests
//!
//! Tier scoping, percentage, and toggle invariants checked with proptest.

use labtrack_core::{
    Catalog, DomainMap, ProgressRecord, Readiness, Tier, TierSelection, percent,
};
use proptest::prelude::*;
use proptest::sample::subsequence;

fn lab_ids() -> Vec<String> {
    Catalog::builtin()
        .labs()
        .map(|lab| lab.lab_id.clone())
        .collect()
}

fn any_tier() -> impl Strategy<Value = Tier> {
    prop_oneof![Just(Tier::Core), Just(Tier::Advanced), Just(Tier::Expert)]
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// A lower tier never shows a layer the higher tier hides.
    #[test]
    fn tier_scopes_are_nested(
        lab in proptest::sample::select(lab_ids()),
        low in any_tier(),
        high in any_tier(),
    ) {
        prop_assume!(low <= high);
        let catalog = Catalog::builtin();

        let low_layers: Vec<u32> = catalog.layers_for_tier(&lab, low).iter().map(|l| l.id).collect();
        let high_layers: Vec<u32> = catalog.layers_for_tier(&lab, high).iter().map(|l| l.id).collect();
        for id in &low_layers {
            prop_assert!(high_layers.contains(id));
        }

        let low_steps = catalog.all_step_ids_for_tier(&lab, low);
        let high_steps = catalog.all_step_ids_for_tier(&lab, high);
        prop_assert!(low_steps.len() <= high_steps.len());
        for step in &low_steps {
            prop_assert!(high_steps.contains(step));
        }
    }

    /// Toggling any step twice restores the record.
    #[test]
    fn toggle_twice_is_identity(
        seed in proptest::collection::vec(("[a-z]{1,8}", "[a-z0-9-]{1,12}"), 0..20),
        lab in "[a-z]{1,8}",
        step in "[a-z0-9-]{1,12}",
    ) {
        let mut record = ProgressRecord::new();
        for (seed_lab, seed_step) in &seed {
            record.toggle(seed_lab, seed_step);
        }
        let before = record.clone();

        record.toggle(&lab, &step);
        record.toggle(&lab, &step);

        prop_assert_eq!(record, before);
    }

    /// Completing more steps never lowers the percentage.
    #[test]
    fn module_percent_is_monotone(
        lab in proptest::sample::select(lab_ids()),
        tier in any_tier(),
        cut in 0usize..64,
    ) {
        let catalog = Catalog::builtin();
        let ids = catalog.all_step_ids_for_tier(&lab, tier);
        let cut = cut.min(ids.len());
        let tiers = TierSelection::new();

        let mut fewer = ProgressRecord::new();
        fewer.mark_completed(&lab, ids[..cut].iter().copied());
        let mut more = fewer.clone();
        more.mark_completed(&lab, ids[cut..].iter().take(1).copied());

        let fewer_pct = Readiness::new(catalog, DomainMap::builtin(), &fewer, &tiers)
            .module_progress_percent(&lab, tier);
        let more_pct = Readiness::new(catalog, DomainMap::builtin(), &more, &tiers)
            .module_progress_percent(&lab, tier);
        prop_assert!(fewer_pct <= more_pct);
        prop_assert!(more_pct <= 100);
    }

    /// Any subset of scoped steps stays within bounds; all of them is 100.
    #[test]
    fn module_percent_bounds(
        lab in proptest::sample::select(lab_ids()),
        tier in any_tier(),
        pick in subsequence((0usize..100).collect::<Vec<_>>(), 0..100),
    ) {
        let catalog = Catalog::builtin();
        let ids = catalog.all_step_ids_for_tier(&lab, tier);
        let tiers = TierSelection::new();

        let mut partial = ProgressRecord::new();
        partial.mark_completed(&lab, pick.iter().filter_map(|&i| ids.get(i).copied()));
        let pct = Readiness::new(catalog, DomainMap::builtin(), &partial, &tiers)
            .module_progress_percent(&lab, tier);
        prop_assert!(pct <= 100);

        let mut full = ProgressRecord::new();
        full.mark_completed(&lab, ids.iter().copied());
        let full_pct = Readiness::new(catalog, DomainMap::builtin(), &full, &tiers)
            .module_progress_percent(&lab, tier);
        prop_assert_eq!(full_pct, 100);
    }

    /// Integer rounding agrees with round-half-up on exact ratios.
    #[test]
    fn percent_matches_exact_rounding(total in 1usize..500, completed in 0usize..500) {
        let completed = completed.min(total);
        let pct = usize::from(percent(completed, total));
        // pct is the nearest integer to 100*c/t, ties upward
        prop_assert!(pct * 2 * total <= 200 * completed + total);
        prop_assert!(200 * completed + total < (pct + 1) * 2 * total);
    }
}
