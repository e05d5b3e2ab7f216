//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.
//!
//! Handlers run the synchronous store operations inline. Each mutation is
//! a single locked read-modify-write inside the store, so concurrent
//! requests never lose an update.

use super::{
    AppState,
    types::{
        CatalogResponse, CompleteLayerRequest, CompleteLayerResponse, ErrorResponse,
        GuideResponse, HealthResponse, LabProgressResponse, LabResponse, LabSummary,
        PreferencesRequest, ResetResponse, TierRequest, ToggleRequest, ToggleResponse,
    },
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use labtrack_core::{
    LabTrackError, Preferences, ProgressView, Readiness, ReadinessReport,
};

/// Error half of every fallible handler.
type HandlerError = (StatusCode, Json<ErrorResponse>);

fn error_response(err: &LabTrackError) -> HandlerError {
    let status = match err {
        LabTrackError::UnknownLab(_)
        | LabTrackError::UnknownLayer { .. }
        | LabTrackError::UnknownStep { .. }
        | LabTrackError::GuideUnavailable { .. } => StatusCode::NOT_FOUND,
        LabTrackError::InvalidTier(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ErrorResponse::new(err.to_string())))
}

/// Mount a view on `lab_id`, mapping an unknown lab to 404.
fn mount<'s>(state: &'s AppState, lab_id: &str) -> Result<ProgressView<'s>, HandlerError> {
    ProgressView::mount(&state.store, state.catalog, lab_id).map_err(|e| error_response(&e))
}

fn lab_progress(view: &ProgressView<'_>) -> LabProgressResponse {
    LabProgressResponse {
        lab_id: view.lab_id().to_string(),
        tier: view.tier(),
        percent: view.percent(),
        completed_steps: view.completed().iter().cloned().collect(),
        layers: view.layer_progress(),
        checklist: view.checklist(),
    }
}

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// CATALOG HANDLERS
// =============================================================================

/// List every lab with its step counts.
pub async fn catalog_handler(State(state): State<AppState>) -> impl IntoResponse {
    let labs = state
        .catalog
        .labs()
        .map(|lab| LabSummary {
            lab_id: lab.lab_id.clone(),
            name: state
                .domains
                .module(&lab.lab_id)
                .map_or_else(|| lab.lab_id.clone(), |m| m.name.clone()),
            guide_file: lab.guide_file.clone(),
            setup_steps: lab.setup.len(),
            layers: lab.layers.len(),
            total_steps: state.catalog.total_steps(&lab.lab_id),
        })
        .collect();

    (StatusCode::OK, Json(CatalogResponse { labs }))
}

/// Full definition of one lab.
pub async fn lab_handler(
    State(state): State<AppState>,
    Path(lab_id): Path<String>,
) -> Result<Json<LabResponse>, HandlerError> {
    state
        .catalog
        .get_lab_definition(&lab_id)
        .cloned()
        .map(Json)
        .ok_or_else(|| error_response(&LabTrackError::UnknownLab(lab_id)))
}

// =============================================================================
// PROGRESS HANDLERS
// =============================================================================

/// Raw persisted progress record.
pub async fn progress_handler(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.store.load_progress()))
}

/// Progress of one lab at its selected tier.
pub async fn lab_progress_handler(
    State(state): State<AppState>,
    Path(lab_id): Path<String>,
) -> Result<Json<LabProgressResponse>, HandlerError> {
    let view = mount(&state, &lab_id)?;
    Ok(Json(lab_progress(&view)))
}

/// Flip one step of a lab.
pub async fn toggle_handler(
    State(state): State<AppState>,
    Path(lab_id): Path<String>,
    Json(request): Json<ToggleRequest>,
) -> Result<Json<ToggleResponse>, HandlerError> {
    let mut view = mount(&state, &lab_id)?;
    if !state.catalog.contains_step(&lab_id, &request.step_id) {
        return Err(error_response(&LabTrackError::UnknownStep {
            lab_id,
            step_id: request.step_id,
        }));
    }

    let completed = view.toggle(&request.step_id);
    Ok(Json(ToggleResponse {
        lab_id,
        step_id: request.step_id,
        completed,
        percent: view.percent(),
    }))
}

/// Select the tier of a lab.
pub async fn tier_handler(
    State(state): State<AppState>,
    Path(lab_id): Path<String>,
    Json(request): Json<TierRequest>,
) -> Result<Json<LabProgressResponse>, HandlerError> {
    let mut view = mount(&state, &lab_id)?;
    view.select_tier(request.tier);
    Ok(Json(lab_progress(&view)))
}

/// Mark every step of one layer complete.
pub async fn complete_layer_handler(
    State(state): State<AppState>,
    Path(lab_id): Path<String>,
    Json(request): Json<CompleteLayerRequest>,
) -> Result<Json<CompleteLayerResponse>, HandlerError> {
    let newly_completed = state
        .store
        .complete_layer(state.catalog, &lab_id, request.layer_id)
        .map_err(|e| error_response(&e))?;
    let view = mount(&state, &lab_id)?;

    Ok(Json(CompleteLayerResponse {
        lab_id,
        layer_id: request.layer_id,
        newly_completed,
        percent: view.percent(),
    }))
}

/// Forget all progress and tier selections.
pub async fn reset_handler(State(state): State<AppState>) -> impl IntoResponse {
    state.store.reset();
    (StatusCode::OK, Json(ResetResponse { reset: true }))
}

// =============================================================================
// GUIDE HANDLER
// =============================================================================

/// Guide of one lab, limited to layers visible at its selected tier.
pub async fn guide_handler(
    State(state): State<AppState>,
    Path(lab_id): Path<String>,
) -> Result<Json<GuideResponse>, HandlerError> {
    let lab = state
        .catalog
        .get_lab_definition(&lab_id)
        .ok_or_else(|| error_response(&LabTrackError::UnknownLab(lab_id.clone())))?;
    let guide = state.guides.get(lab).map_err(|e| error_response(&e))?;
    let tier = state.store.load_tier(&lab_id);

    Ok(Json(GuideResponse {
        sections: guide
            .sections_for_tier(state.catalog, &lab_id, tier)
            .into_iter()
            .cloned()
            .collect(),
        header: guide.header.clone(),
        tier,
        lab_id,
    }))
}

// =============================================================================
// READINESS HANDLER
// =============================================================================

/// Overall, per-domain, and per-module readiness.
pub async fn readiness_handler(State(state): State<AppState>) -> Json<ReadinessReport> {
    let progress = state.store.load_progress();
    let tiers = state.store.load_tiers();
    Json(Readiness::new(state.catalog, state.domains, &progress, &tiers).report())
}

// =============================================================================
// PREFERENCES HANDLERS
// =============================================================================

/// Stored UI preferences.
pub async fn preferences_handler(State(state): State<AppState>) -> Json<Preferences> {
    Json(state.store.preferences())
}

/// Update UI preferences; omitted fields are kept.
pub async fn update_preferences_handler(
    State(state): State<AppState>,
    Json(request): Json<PreferencesRequest>,
) -> Json<Preferences> {
    Json(state.store.update_preferences(|prefs| request.apply(prefs)))
}
