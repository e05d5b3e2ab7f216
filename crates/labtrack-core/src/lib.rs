//! # labtrack-core
//!
//! The lab progress model for labtrack.
//!
//! This crate owns everything that does not need a network: the static
//! lab catalog, cumulative tier filtering, the persisted progress and tier
//! selections, readiness percentages, mounted view models, and lab guide
//! parsing.
//!
//! ## Data Flow
//!
//! ```text
//! KeyValueStore ──> StoredValue<T> ──> ProgressStore ──> ProgressView
//!                         │                                  ▲
//!                         └──── EventBus (key changed) ──────┘
//! ```
//!
//! Views hold no shared references to each other. A write persists, then
//! broadcasts the key; every subscriber reloads from storage.
//!
//! ## Architectural Constraints
//!
//! - No async, no network dependencies
//! - Integer-only percentages (round half up, `0..=100`)
//! - Reads never fail: absent or corrupt data loads as the default
//! - Unknown lab ids yield empty results, never a panic

// =============================================================================
// MODULES
// =============================================================================

pub mod catalog;
pub mod domains;
pub mod events;
pub mod filter;
pub mod guide;
pub mod readiness;
pub mod storage;
pub mod store;
pub mod types;
pub mod views;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    LabDefinition, LabLayer, LabStep, LabTrackError, ProgressRecord, Tier, TierSelection,
};

// =============================================================================
// RE-EXPORTS: Catalog and Aggregation
// =============================================================================

pub use catalog::Catalog;
pub use domains::{DomainMap, ExamDomain, LabModule};
pub use filter::LayerProgress;
pub use readiness::{
    DomainSummary, ModuleStatus, ModuleSummary, Readiness, ReadinessReport, percent,
};

// =============================================================================
// RE-EXPORTS: Persistence and Views
// =============================================================================

pub use events::{ChangeEvent, EventBus, StoredValue, Subscription};
pub use storage::{KeyValueStore, MemoryStore, RedbStore};
pub use store::{PREFERENCES_KEY, PROGRESS_KEY, Preferences, ProgressStore, TIERS_KEY, Theme};
pub use views::{ChecklistGroup, ChecklistItem, ProgressView};

// =============================================================================
// RE-EXPORTS: Guides
// =============================================================================

pub use guide::{
    FsGuideSource, GuideCache, GuideSection, GuideSource, LabGuide, SectionKind,
    parse_lab_markdown,
};
