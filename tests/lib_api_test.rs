//! Integration tests for the jabberwocky library public API.
//!
//! These drive the engine the way an external consumer would, over a
//! temporary mod folder.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use jabberwocky::config::Settings;
use jabberwocky::engine::{EngineContext, EngineState};
use jabberwocky::error::EngineError;
use jabberwocky::json::JsonDocument;
use jabberwocky::pointer::PointerType;
use jabberwocky::{completion, context, gotodef, hover, requests};
use tower_lsp::lsp_types::{CompletionResponse, HoverContents, Position};

/// Helper: Create a temporary mod directory for testing.
///
/// Returns (TempDir, PathBuf) - keep TempDir alive for test duration.
fn create_test_mod_dir() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let mod_dir = temp_dir.path().join("mod");
    fs::create_dir(&mod_dir).expect("Failed to create mod subdirectory");
    (temp_dir, mod_dir)
}

fn build(mod_dir: &Path) -> EngineContext {
    let settings = Settings {
        schema_dir: mod_dir
            .parent()
            .unwrap()
            .join("schemas")
            .to_string_lossy()
            .to_string(),
        ..Settings::default()
    };
    EngineContext::build(mod_dir, settings)
}

fn write_trader_mod(mod_dir: &Path) {
    fs::write(mod_dir.join("trader_frigate.unit"), "{}").unwrap();
    fs::write(mod_dir.join("trader_loyalist.player"), "{}").unwrap();
    fs::write(mod_dir.join("unit.entity_manifest"), r#"{"ids": ["trader_frigate"]}"#).unwrap();
    fs::write(
        mod_dir.join("weapon.uniforms"),
        r#"{"weapon_tags": [{"name": "plasma", "localized_name": "tag_plasma"}]}"#,
    )
    .unwrap();
    fs::write(
        mod_dir.join("en.localized_text"),
        r#"{"tag_plasma": "Plasma", "frigate_name": "Frigate"}"#,
    )
    .unwrap();
}

// ============================================================================
// Engine lifecycle
// ============================================================================

#[test]
fn test_state_machine_from_external_crate() {
    let (_temp_dir, mod_dir) = create_test_mod_dir();
    write_trader_mod(&mod_dir);

    let mut state = EngineState::default();
    assert!(matches!(state.context(), Err(EngineError::NotReady(_))));

    state.start_indexing().unwrap();
    assert!(matches!(
        state.start_indexing(),
        Err(EngineError::AlreadyIndexing)
    ));
    assert!(matches!(state.context(), Err(EngineError::NotReady(_))));

    state.finish_indexing(build(&mod_dir));
    assert!(state.is_ready());
    let engine = state.context().unwrap();
    assert_eq!(engine.language(), "en");
}

// ============================================================================
// Providers through the public API
// ============================================================================

#[test]
fn test_completion_and_definition_for_buildable_units() {
    let (_temp_dir, mod_dir) = create_test_mod_dir();
    write_trader_mod(&mod_dir);
    let engine = build(&mod_dir);

    let document = JsonDocument::parse(r#"{"buildable_units": ["trader_"]}"#);
    let inside = Position::new(0, 29);

    assert_eq!(
        context::resolve_context(&engine, "trader_loyalist.player", &document, document.node_at_offset(29)),
        PointerType::Unit
    );

    let Some(CompletionResponse::List(list)) =
        completion::get_completions(&engine, "trader_loyalist.player", &document, inside)
    else {
        panic!("expected completions");
    };
    let labels: Vec<_> = list.items.iter().map(|item| item.label.as_str()).collect();
    assert_eq!(labels, vec!["trader_frigate"]);

    let document = JsonDocument::parse(r#"{"buildable_units": ["trader_frigate"]}"#);
    let locations =
        gotodef::goto_definition(&engine, "trader_loyalist.player", &document, inside).unwrap();
    assert_eq!(locations.len(), 1);
    assert!(locations[0].uri.path().ends_with("trader_frigate.unit"));
}

#[test]
fn test_weapon_tag_hover() {
    let (_temp_dir, mod_dir) = create_test_mod_dir();
    write_trader_mod(&mod_dir);
    let engine = build(&mod_dir);

    let document = JsonDocument::parse(r#"{"tags": ["plasma"]}"#);
    let hover = hover::hover(&engine, "beam.weapon", &document, Position::new(0, 13)).unwrap();
    let HoverContents::Markup(markup) = hover.contents else {
        panic!("expected markdown");
    };
    assert!(markup.value.starts_with("**Tag**"));
    assert!(markup.value.ends_with("Plasma"));
}

#[test]
fn test_custom_requests() {
    let (_temp_dir, mod_dir) = create_test_mod_dir();
    write_trader_mod(&mod_dir);
    let engine = build(&mod_dir);

    assert_eq!(requests::player_ids(&engine), vec!["trader_loyalist"]);

    let path = requests::entity_path(
        &engine,
        &requests::EntityPathParams {
            identifier: "trader_frigate".to_string(),
        },
    )
    .unwrap();
    assert!(path.ends_with("trader_frigate.unit"));

    let text = requests::localization(
        &engine,
        &requests::LocalizationParams {
            language: "en".to_string(),
            key: "frigate_name".to_string(),
        },
    );
    assert_eq!(text.as_deref(), Some("Frigate"));
}

#[test]
fn test_settings_struct_accessible() {
    let settings = Settings::default();

    assert_eq!(settings.language, "en");
    assert!(settings.reference_diagnostics);
    assert!(settings.structural_diagnostics);
    assert_eq!(settings.max_completions, 1000);
}
