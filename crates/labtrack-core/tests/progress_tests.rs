//! # Progress Scenario Tests
//!
//! End-to-end behaviour of store, readiness, and mounted views.

use labtrack_core::{
    Catalog, DomainMap, MemoryStore, PROGRESS_KEY, ProgressStore, ProgressView, Readiness,
    RedbStore, TIERS_KEY, Tier,
};
use std::sync::Arc;

// =============================================================================
// READINESS
// =============================================================================

mod readiness {
    use super::*;

    /// Core tier of the GenAI lab is 12 steps; setup plus layer 1 is 8/12.
    #[test]
    fn generative_core_setup_and_layer_one_is_67() {
        let store = ProgressStore::in_memory();
        let catalog = Catalog::builtin();
        let lab = catalog.get_lab_definition("generative").expect("lab");

        for step in &lab.setup {
            store.toggle_step("generative", &step.id);
        }
        store
            .complete_layer(catalog, "generative", 1)
            .expect("layer 1");

        let progress = store.load_progress();
        let tiers = store.load_tiers();
        let readiness = Readiness::new(catalog, DomainMap::builtin(), &progress, &tiers);
        assert_eq!(readiness.module_progress_percent("generative", Tier::Core), 67);
        assert_eq!(
            catalog.completed_layer_count_for_tier(
                "generative",
                Tier::Core,
                progress.completed("generative")
            ),
            1
        );
    }

    /// Switching tier rescopes the percentage without touching progress.
    #[test]
    fn tier_switch_keeps_record() {
        let store = ProgressStore::in_memory();
        let catalog = Catalog::builtin();
        store
            .complete_layer(catalog, "rag", 1)
            .expect("layer 1");
        let before = store.load_progress();

        let core = catalog.all_step_ids_for_tier("rag", Tier::Core).len();
        store.save_tier("rag", Tier::Advanced);
        let advanced = catalog.all_step_ids_for_tier("rag", store.load_tier("rag")).len();

        assert!(advanced > core);
        assert_eq!(store.load_progress(), before);
    }

    /// Empty storage reads as zero everywhere.
    #[test]
    fn empty_storage_is_zero_readiness() {
        let store = ProgressStore::in_memory();
        let progress = store.load_progress();
        let tiers = store.load_tiers();
        let readiness =
            Readiness::new(Catalog::builtin(), DomainMap::builtin(), &progress, &tiers);

        assert!(progress.is_empty());
        assert_eq!(readiness.overall_readiness(), 0);
        for domain in 1..=6 {
            assert_eq!(readiness.domain_progress_percent(domain), 0);
        }
    }

    /// A domain with no mapped steps is zero, never a division error.
    #[test]
    fn domain_without_steps_is_zero() {
        let store = ProgressStore::in_memory();
        let progress = store.load_progress();
        let tiers = store.load_tiers();
        let readiness =
            Readiness::new(Catalog::builtin(), DomainMap::builtin(), &progress, &tiers);
        assert_eq!(readiness.domain_progress_percent(9), 0);
    }

    /// Domain totals follow each lab's own selected tier.
    #[test]
    fn domain_uses_selected_tiers() {
        let store = ProgressStore::in_memory();
        let catalog = Catalog::builtin();
        store.save_tier("generative", Tier::Expert);

        let progress = store.load_progress();
        let tiers = store.load_tiers();
        let readiness = Readiness::new(catalog, DomainMap::builtin(), &progress, &tiers);
        let summaries = readiness.domain_summaries();
        let domain_two = summaries
            .iter()
            .find(|d| d.number == 2)
            .expect("domain 2");

        assert_eq!(
            domain_two.total,
            catalog.total_steps("generative")
                + catalog.all_step_ids_for_tier("rag", Tier::Core).len()
        );
    }
}

// =============================================================================
// CROSS-VIEW SYNC
// =============================================================================

mod views {
    use super::*;

    /// A toggle in one view shows up in another after sync.
    #[test]
    fn mutation_propagates_to_other_view() {
        let store = ProgressStore::in_memory();
        let catalog = Catalog::builtin();
        let mut sidebar = ProgressView::mount(&store, catalog, "vision").expect("mount");
        let mut page = ProgressView::mount(&store, catalog, "vision").expect("mount");

        page.toggle("l1-test");
        assert!(!sidebar.is_checked("l1-test"));

        assert!(sidebar.sync());
        assert!(sidebar.is_checked("l1-test"));

        page.select_tier(Tier::Expert);
        assert!(sidebar.sync());
        assert_eq!(sidebar.tier(), Tier::Expert);
    }

    /// Views over different labs still reload, and stay consistent.
    #[test]
    fn other_lab_change_keeps_view_state() {
        let store = ProgressStore::in_memory();
        let catalog = Catalog::builtin();
        let mut rag = ProgressView::mount(&store, catalog, "rag").expect("mount");

        store.toggle_step("vision", "l1-test");
        rag.sync();
        assert!(rag.completed().is_empty());
        assert_eq!(rag.percent(), 0);
    }

    /// A dropped view releases its subscription.
    #[test]
    fn dropped_view_unsubscribes() {
        let store = ProgressStore::in_memory();
        let catalog = Catalog::builtin();
        let baseline = store.bus().subscriber_count();

        let view = ProgressView::mount(&store, catalog, "agents").expect("mount");
        assert_eq!(store.bus().subscriber_count(), baseline + 1);
        drop(view);
        assert_eq!(store.bus().subscriber_count(), baseline);
    }

    /// Layer badge counts only tier-visible layers.
    #[test]
    fn layer_progress_tracks_tier() {
        let store = ProgressStore::in_memory();
        let catalog = Catalog::builtin();
        store
            .complete_layer(catalog, "generative", 1)
            .expect("layer 1");
        let mut view = ProgressView::mount(&store, catalog, "generative").expect("mount");

        let core = view.layer_progress();
        assert_eq!((core.completed, core.total), (1, 3));

        view.select_tier(Tier::Expert);
        let expert = view.layer_progress();
        assert_eq!((expert.completed, expert.total), (1, 6));
    }
}

// =============================================================================
// PERSISTENCE
// =============================================================================

mod persistence {
    use super::*;

    /// Corrupt JSON under either key loads as the default.
    #[test]
    fn corrupt_values_load_as_default() {
        let storage = Arc::new(MemoryStore::with_entries([
            (PROGRESS_KEY, "not json"),
            (TIERS_KEY, "{\"rag\": 7}"),
        ]));
        let store = ProgressStore::new(storage);

        assert!(store.load_progress().is_empty());
        assert_eq!(store.load_tier("rag"), Tier::Core);

        store.toggle_step("rag", "l1-create-index");
        assert!(store.load_progress().is_completed("rag", "l1-create-index"));
    }

    /// Progress and tiers written through redb survive a reopen.
    #[test]
    fn redb_progress_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("labtrack.redb");

        {
            let store = ProgressStore::new(Arc::new(RedbStore::open(&path).expect("open")));
            store.toggle_step("language", "l1-test");
            store.save_tier("language", Tier::Advanced);
        }

        let store = ProgressStore::new(Arc::new(RedbStore::open(&path).expect("reopen")));
        assert!(store.load_progress().is_completed("language", "l1-test"));
        assert_eq!(store.load_tier("language"), Tier::Advanced);
    }

    /// Concurrent toggles through clones of one store lose no update.
    #[test]
    fn concurrent_toggles_are_serialized() {
        let store = ProgressStore::in_memory();
        let catalog = Catalog::builtin();
        let ids: Vec<String> = catalog
            .all_step_ids("responsible-ai")
            .into_iter()
            .map(str::to_string)
            .collect();

        std::thread::scope(|scope| {
            for chunk in ids.chunks(4) {
                let store = store.clone();
                scope.spawn(move || {
                    for id in chunk {
                        store.toggle_step("responsible-ai", id);
                    }
                });
            }
        });

        assert_eq!(store.completed_steps("responsible-ai").len(), ids.len());
    }
}
