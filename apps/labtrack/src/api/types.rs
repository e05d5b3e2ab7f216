//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.

use labtrack_core::{
    ChecklistGroup, GuideSection, LabDefinition, LayerProgress, Preferences, Theme, Tier,
};
use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// ERROR RESPONSE
// =============================================================================

/// Body of every 4xx/5xx answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

// =============================================================================
// CATALOG RESPONSES
// =============================================================================

/// One row of `GET /catalog`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabSummary {
    pub lab_id: String,
    pub name: String,
    pub guide_file: String,
    pub setup_steps: usize,
    pub layers: usize,
    pub total_steps: usize,
}

/// `GET /catalog` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogResponse {
    pub labs: Vec<LabSummary>,
}

/// `GET /catalog/{lab}` response: the full definition.
pub type LabResponse = LabDefinition;

// =============================================================================
// PROGRESS RESPONSES
// =============================================================================

/// State of one lab at its selected tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabProgressResponse {
    pub lab_id: String,
    pub tier: Tier,
    pub percent: u8,
    pub completed_steps: Vec<String>,
    pub layers: LayerProgress,
    pub checklist: Vec<ChecklistGroup>,
}

/// `POST /progress/{lab}/toggle` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleRequest {
    pub step_id: String,
}

/// `POST /progress/{lab}/toggle` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleResponse {
    pub lab_id: String,
    pub step_id: String,
    pub completed: bool,
    pub percent: u8,
}

/// `PUT /progress/{lab}/tier` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierRequest {
    pub tier: Tier,
}

/// `POST /progress/{lab}/complete` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteLayerRequest {
    pub layer_id: u32,
}

/// `POST /progress/{lab}/complete` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteLayerResponse {
    pub lab_id: String,
    pub layer_id: u32,
    pub newly_completed: usize,
    pub percent: u8,
}

/// `DELETE /progress` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetResponse {
    pub reset: bool,
}

// =============================================================================
// GUIDE RESPONSE
// =============================================================================

/// `GET /guide/{lab}` response: the sections visible at the lab's tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuideResponse {
    pub lab_id: String,
    pub tier: Tier,
    pub header: String,
    pub sections: Vec<GuideSection>,
}

// =============================================================================
// PREFERENCES
// =============================================================================

/// `PUT /preferences` request. Omitted fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreferencesRequest {
    pub theme: Option<Theme>,
    pub sidebar_collapsed: Option<bool>,
}

impl PreferencesRequest {
    /// Overlay the provided fields onto `prefs`.
    pub fn apply(&self, prefs: &mut Preferences) {
        if let Some(theme) = self.theme {
            prefs.theme = theme;
        }
        if let Some(collapsed) = self.sidebar_collapsed {
            prefs.sidebar_collapsed = collapsed;
        }
    }
}
