//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.
//! Every command prints a plain-text report, or pretty JSON with
//! `--json-mode`.

use crate::api;
use crate::backend::BackendClient;
use crate::config::{Backend, Settings};
use labtrack_core::{
    Catalog, DomainMap, FsGuideSource, GuideCache, LabTrackError, ProgressStore, ProgressView,
    Readiness, SectionKind, Theme, Tier,
};
use serde::Serialize;

fn print_json(value: &impl Serialize) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

fn lab_name(lab_id: &str) -> &str {
    DomainMap::builtin()
        .module(lab_id)
        .map_or(lab_id, |module| module.name.as_str())
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(settings: &Settings) -> Result<(), LabTrackError> {
    let store = settings.open_store()?;

    println!("labtrack Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:     {}", settings.host);
    println!("  Port:     {}", settings.port);
    println!("  Backend:  {}", settings.backend);
    println!("  Database: {:?}", settings.database);
    println!();
    println!("Endpoints:");
    println!("  GET  /catalog                 - List labs");
    println!("  GET  /progress/{{lab}}          - Lab progress");
    println!("  POST /progress/{{lab}}/toggle   - Flip a step");
    println!("  PUT  /progress/{{lab}}/tier     - Select a tier");
    println!("  GET  /guide/{{lab}}             - Lab guide at its tier");
    println!("  GET  /readiness               - Readiness report");
    println!("  GET  /health                  - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let addr = format!("{}:{}", settings.host, settings.port);
    let state = api::AppState::new(store).with_docs_root(&settings.docs_root);
    api::run_server(&addr, state).await
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show overall, per-domain, and per-module readiness.
pub fn cmd_status(settings: &Settings, json_mode: bool) -> Result<(), LabTrackError> {
    let store = settings.open_store()?;
    let progress = store.load_progress();
    let tiers = store.load_tiers();
    let report = Readiness::new(Catalog::builtin(), DomainMap::builtin(), &progress, &tiers)
        .report();

    if json_mode {
        print_json(&report);
        return Ok(());
    }

    println!("Exam Readiness: {}%", report.overall);
    println!("=================");
    println!();
    println!("Domains:");
    for domain in &report.domains {
        println!(
            "  {}. {:<46} {:>7}  {:>3}%  ({}/{})",
            domain.number, domain.name, domain.weight, domain.percent, domain.completed,
            domain.total
        );
    }
    println!();
    println!("Modules:");
    for module in &report.modules {
        println!(
            "  {:<12} {:<9} {:>3}%  layers {}/{}  {}",
            module.module_id,
            module.tier.label(),
            module.percent,
            module.layers.completed,
            module.layers.total,
            module.status.label()
        );
    }

    Ok(())
}

// =============================================================================
// LAB COMMANDS
// =============================================================================

/// Show a lab's checklist at its selected tier.
pub fn cmd_lab(settings: &Settings, json_mode: bool, lab_id: &str) -> Result<(), LabTrackError> {
    let store = settings.open_store()?;
    let view = ProgressView::mount(&store, Catalog::builtin(), lab_id)?;
    let checklist = view.checklist();

    if json_mode {
        print_json(&serde_json::json!({
            "lab_id": view.lab_id(),
            "tier": view.tier(),
            "percent": view.percent(),
            "layers": view.layer_progress(),
            "checklist": checklist,
        }));
        return Ok(());
    }

    let layers = view.layer_progress();
    println!("{} ({})", lab_name(lab_id), lab_id);
    println!(
        "Tier: {}   Progress: {}%   Layers: {}/{}",
        view.tier().label(),
        view.percent(),
        layers.completed,
        layers.total
    );
    for group in &checklist {
        println!();
        let mark = if group.complete { " ✓" } else { "" };
        match group.tier {
            Some(tier) => println!("{} [{}]{}", group.title, tier.label(), mark),
            None => println!("{}{}", group.title, mark),
        }
        for item in &group.items {
            let check = if item.checked { "[x]" } else { "[ ]" };
            println!("  {} {:<24} {}", check, item.id, item.label);
        }
    }

    Ok(())
}

/// Flip one step of a lab.
pub fn cmd_toggle(
    settings: &Settings,
    json_mode: bool,
    lab_id: &str,
    step_id: &str,
) -> Result<(), LabTrackError> {
    let catalog = Catalog::builtin();
    let store = settings.open_store()?;
    let mut view = ProgressView::mount(&store, catalog, lab_id)?;
    if !catalog.contains_step(lab_id, step_id) {
        return Err(LabTrackError::UnknownStep {
            lab_id: lab_id.to_string(),
            step_id: step_id.to_string(),
        });
    }

    let completed = view.toggle(step_id);

    if json_mode {
        print_json(&serde_json::json!({
            "lab_id": lab_id,
            "step_id": step_id,
            "completed": completed,
            "percent": view.percent(),
        }));
    } else {
        let state = if completed { "done" } else { "not done" };
        println!("{} marked {} ({}%)", step_id, state, view.percent());
    }
    Ok(())
}

/// Show or select a lab's tier.
pub fn cmd_tier(
    settings: &Settings,
    json_mode: bool,
    lab_id: &str,
    tier: Option<Tier>,
) -> Result<(), LabTrackError> {
    let store = settings.open_store()?;
    let mut view = ProgressView::mount(&store, Catalog::builtin(), lab_id)?;
    if let Some(tier) = tier {
        view.select_tier(tier);
    }

    if json_mode {
        print_json(&serde_json::json!({
            "lab_id": lab_id,
            "tier": view.tier(),
            "percent": view.percent(),
            "layers": view.layer_progress(),
        }));
    } else {
        let layers = view.layer_progress();
        println!(
            "{}: {} tier, {}%, {} layers in scope",
            lab_id,
            view.tier().label(),
            view.percent(),
            layers.total
        );
    }
    Ok(())
}

/// Complete every step of one layer.
pub fn cmd_complete(
    settings: &Settings,
    json_mode: bool,
    lab_id: &str,
    layer_id: u32,
) -> Result<(), LabTrackError> {
    let catalog = Catalog::builtin();
    let store = settings.open_store()?;
    let newly_completed = store.complete_layer(catalog, lab_id, layer_id)?;
    let view = ProgressView::mount(&store, catalog, lab_id)?;

    if json_mode {
        print_json(&serde_json::json!({
            "lab_id": lab_id,
            "layer_id": layer_id,
            "newly_completed": newly_completed,
            "percent": view.percent(),
        }));
    } else {
        println!(
            "Layer {} of {} complete ({} new steps, {}%)",
            layer_id,
            lab_id,
            newly_completed,
            view.percent()
        );
    }
    Ok(())
}

// =============================================================================
// DOMAINS COMMAND
// =============================================================================

/// List exam domains with their weights and modules.
pub fn cmd_domains(json_mode: bool) -> Result<(), LabTrackError> {
    let domains = DomainMap::builtin();

    if json_mode {
        print_json(&serde_json::json!({
            "domains": domains.domains(),
            "modules": domains.modules(),
        }));
        return Ok(());
    }

    for domain in domains.domains() {
        println!("{}. {} ({})", domain.number, domain.name, domain.weight);
        for module_id in domains.modules_in_domain(domain.number) {
            println!("     {:<12} {}", module_id, lab_name(module_id));
        }
    }
    Ok(())
}

// =============================================================================
// GUIDE COMMAND
// =============================================================================

/// Print the guide sections visible at the lab's selected tier, or only
/// one visible layer of it.
pub fn cmd_guide(
    settings: &Settings,
    json_mode: bool,
    lab_id: &str,
    layer: Option<u32>,
) -> Result<(), LabTrackError> {
    let catalog = Catalog::builtin();
    let lab = catalog
        .get_lab_definition(lab_id)
        .ok_or_else(|| LabTrackError::UnknownLab(lab_id.to_string()))?;
    let tier = settings.open_store()?.load_tier(lab_id);
    let cache = GuideCache::new(FsGuideSource::new(&settings.docs_root));
    let guide = cache.get(lab)?;
    let sections = guide.sections_for_tier(catalog, lab_id, tier);

    if let Some(number) = layer {
        let section = sections
            .into_iter()
            .find(|section| section.kind == SectionKind::Layer { number: Some(number) })
            .ok_or(LabTrackError::UnknownLayer {
                lab_id: lab_id.to_string(),
                layer_id: number,
            })?;
        if json_mode {
            print_json(section);
        } else {
            println!("{}", section.content);
        }
        return Ok(());
    }

    if json_mode {
        print_json(&serde_json::json!({
            "lab_id": lab_id,
            "tier": tier,
            "header": guide.header,
            "sections": sections,
        }));
        return Ok(());
    }

    if !guide.header.is_empty() {
        println!("{}", guide.header);
        println!();
    }
    for section in sections {
        println!("{}", section.content);
        println!();
    }
    Ok(())
}

// =============================================================================
// VALIDATE COMMAND
// =============================================================================

/// Fetch layer results from the lab backend.
///
/// A backend that does not answer `GET /health` is reported as unreachable
/// before validation is attempted.
///
/// Local progress is never touched, whatever the backend answers.
pub async fn cmd_validate(settings: &Settings, json_mode: bool) -> Result<(), LabTrackError> {
    let client = BackendClient::new(&settings.backend_url);
    if !client.health().await {
        return Err(LabTrackError::IoError(format!(
            "Lab backend at {} is not reachable",
            client.base_url()
        )));
    }
    let report = client
        .validate_all()
        .await
        .map_err(|e| LabTrackError::IoError(format!("Validation failed: {}", e)))?;

    if json_mode {
        print_json(&report);
        return Ok(());
    }

    let total: usize = report.labs.values().map(Vec::len).sum();
    println!("Validation: {}/{} layers pass", report.passed(), total);
    for (lab_id, layers) in &report.labs {
        println!();
        println!("{} ({})", lab_name(lab_id), lab_id);
        for result in layers {
            println!(
                "  {} Layer {}: {}  {}",
                result.status.symbol(),
                result.layer,
                result.name,
                result.message
            );
        }
    }
    Ok(())
}

// =============================================================================
// PREFERENCES COMMAND
// =============================================================================

/// Show preferences, applying any given changes first.
pub fn cmd_prefs(
    settings: &Settings,
    json_mode: bool,
    theme: Option<Theme>,
    sidebar_collapsed: Option<bool>,
) -> Result<(), LabTrackError> {
    let store = settings.open_store()?;
    let prefs = if theme.is_some() || sidebar_collapsed.is_some() {
        store.update_preferences(|prefs| {
            if let Some(theme) = theme {
                prefs.theme = theme;
            }
            if let Some(collapsed) = sidebar_collapsed {
                prefs.sidebar_collapsed = collapsed;
            }
        })
    } else {
        store.preferences()
    };

    if json_mode {
        print_json(&prefs);
    } else {
        println!("Theme:             {}", prefs.theme);
        println!("Sidebar collapsed: {}", prefs.sidebar_collapsed);
    }
    Ok(())
}

// =============================================================================
// RESET / INIT COMMANDS
// =============================================================================

/// Forget all progress and tier selections. Preferences are kept.
pub fn cmd_reset(settings: &Settings, yes: bool) -> Result<(), LabTrackError> {
    if !yes {
        return Err(LabTrackError::ConfigError(
            "Reset discards all progress. Re-run with --yes to confirm.".to_string(),
        ));
    }
    settings.open_store()?.reset();
    println!("Progress and tier selections cleared");
    Ok(())
}

/// Initialize a new empty database.
pub fn cmd_init(settings: &Settings, force: bool) -> Result<(), LabTrackError> {
    let db_path = &settings.database;
    match settings.backend {
        Backend::Memory => {
            println!("Memory backend selected; nothing to initialize");
            Ok(())
        }
        Backend::Redb => {
            if db_path.exists() {
                if !force {
                    return Err(LabTrackError::StorageError(
                        "Database already exists. Use --force to overwrite.".to_string(),
                    ));
                }
                std::fs::remove_file(db_path).map_err(|e| {
                    LabTrackError::IoError(format!("Cannot remove {:?}: {}", db_path, e))
                })?;
            }
            let _store: ProgressStore = settings.open_store()?;
            println!("Initialized new redb database at {:?}", db_path);
            Ok(())
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    const GENAI_GUIDE: &str = "# GenAI\n<!-- section:overview -->\nIntro\n\
<!-- section:layer:1 -->\nChat\n<!-- section:layer:4 -->\nStreaming\n";

    fn settings(dir: &Path, backend: Backend) -> Settings {
        Settings {
            database: dir.join("labtrack.db"),
            backend,
            docs_root: dir.join("docs"),
            backend_url: "http://127.0.0.1:9".to_string(),
            host: "127.0.0.1".to_string(),
            port: 0,
        }
    }

    fn write_guide(dir: &Path) {
        let labs = dir.join("docs").join("labs");
        std::fs::create_dir_all(&labs).expect("mkdir");
        std::fs::write(labs.join("01-genai.md"), GENAI_GUIDE).expect("write guide");
    }

    #[test]
    fn guide_layer_outside_selected_tier_is_unknown() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_guide(dir.path());
        let settings = settings(dir.path(), Backend::Redb);

        assert!(cmd_guide(&settings, true, "generative", Some(1)).is_ok());
        assert!(matches!(
            cmd_guide(&settings, true, "generative", Some(4)),
            Err(LabTrackError::UnknownLayer { layer_id: 4, .. })
        ));

        settings
            .open_store()
            .expect("open")
            .save_tier("generative", Tier::Advanced);
        assert!(cmd_guide(&settings, true, "generative", Some(4)).is_ok());
    }

    #[test]
    fn guide_for_unknown_lab_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = settings(dir.path(), Backend::Memory);
        assert!(matches!(
            cmd_guide(&settings, false, "nope", None),
            Err(LabTrackError::UnknownLab(_))
        ));
    }

    #[tokio::test]
    async fn validate_reports_unreachable_backend() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = settings(dir.path(), Backend::Memory);
        let result = cmd_validate(&settings, true).await;
        assert!(
            matches!(&result, Err(LabTrackError::IoError(message)) if message.contains("not reachable")),
            "{result:?}"
        );
    }
}
