use std::{collections::HashSet, fs, path::PathBuf};

use tower_lsp::lsp_types::{Diagnostic, DiagnosticSeverity, Range};
use tracing::warn;

use crate::{
    context,
    engine::EngineContext,
    index::{files, paths, ExistenceCache, ModFiles, WorkspaceIndex},
    json::{JsonDocument, NodeId, NodeKind},
    pointer::PointerType,
    schema::MatchingSchema,
};

pub const SOURCE: &str = "jabberwocky";

/// Every diagnostic for a document: syntax and structural problems, then
/// unresolved references. Each family can be switched off in the settings.
pub fn diagnostics(
    context: &EngineContext,
    file_name: &str,
    document: &JsonDocument,
) -> Vec<Diagnostic> {
    let settings = &context.settings;
    let mut diags = Vec::new();

    if settings.structural_diagnostics {
        diags.extend(syntax_diagnostics(document));
        diags.extend(
            context
                .schemas
                .structural_errors(file_name, document)
                .into_iter()
                .map(|error| diagnostic(error.range, error.message, DiagnosticSeverity::WARNING)),
        );
    }

    if settings.reference_diagnostics {
        let matches = context.matching_schemas(file_name, document);
        diags.extend(reference_diagnostics(
            &context.index,
            document,
            &matches,
            context::entity_category(file_name),
        ));
    }

    diags
}

/// Validates every entity file under the engine's root, in path order.
/// Files without diagnostics are left out.
pub fn check_workspace(context: &EngineContext) -> Vec<(PathBuf, Vec<Diagnostic>)> {
    let mod_files = ModFiles::scan(&context.root_dir);
    mod_files
        .iter()
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(paths::is_json_extension)
        })
        .filter_map(|path| {
            let text = match fs::read_to_string(path) {
                Ok(text) => text,
                Err(err) => {
                    warn!(path = %path.display(), "could not read file: {}", err);
                    return None;
                }
            };
            let file_name = files::file_name(path)?;
            let diags = diagnostics(context, &file_name, &JsonDocument::parse(&text));
            (!diags.is_empty()).then(|| (path.to_path_buf(), diags))
        })
        .collect()
}

pub fn syntax_diagnostics(document: &JsonDocument) -> Vec<Diagnostic> {
    document
        .errors()
        .iter()
        .map(|error| {
            diagnostic(
                document.range(error.offset, error.offset + error.length),
                error.message.clone(),
                DiagnosticSeverity::ERROR,
            )
        })
        .collect()
}

/// Checks every value of a pointer-marked property against the indices.
///
/// Arrays are checked item by item, `null` means "no reference" and is
/// skipped. Each value node is reported at most once, however many
/// matching schemas mark it.
pub fn reference_diagnostics(
    index: &WorkspaceIndex,
    document: &JsonDocument,
    matches: &[MatchingSchema],
    entity: PointerType,
) -> Vec<Diagnostic> {
    let mut validator = Validator {
        index,
        document,
        entity,
        seen: HashSet::new(),
        diags: Vec::new(),
    };

    for matching in matches {
        let schema = &matching.schema;
        for (key, fragment) in &matching.fragment().properties {
            let pointer = schema.effective_pointer(*fragment);
            if pointer.is_none() {
                continue;
            }

            for property in document.find_properties(key) {
                if !matching.owns_property(document, property) {
                    continue;
                }
                if let Some(value) = document.property_value(property) {
                    validator.walk(value, pointer);
                }
            }
        }
    }

    validator.diags
}

struct Validator<'a> {
    index: &'a WorkspaceIndex,
    document: &'a JsonDocument,
    entity: PointerType,
    seen: HashSet<NodeId>,
    diags: Vec<Diagnostic>,
}

impl Validator<'_> {
    fn walk(&mut self, node: NodeId, pointer: PointerType) {
        let document = self.document;
        match &document.node(node).kind {
            NodeKind::Array => {
                for &item in &document.node(node).children {
                    self.walk(item, pointer);
                }
            }
            NodeKind::String(value) => {
                if !self.seen.insert(node) {
                    return;
                }
                let key = document
                    .enclosing_property(node)
                    .and_then(|property| document.property_key(property))
                    .unwrap_or_default();
                self.check(pointer, key, value, document.node_range(node));
            }
            _ => {}
        }
    }

    fn check(&mut self, pointer: PointerType, key: &str, value: &str, range: Range) {
        let index = self.index;
        let existence = &index.existence;
        match pointer {
            PointerType::LocalizedText => {
                if self.entity == PointerType::UnitSkin && key == "description" && value.is_empty() {
                    self.report(range, Report::empty_description(), DiagnosticSeverity::INFORMATION);
                } else if !existence.contains(pointer, value) {
                    self.report(range, Report::missing_in_files(value, pointer), DiagnosticSeverity::ERROR);
                }
            }
            PointerType::WeaponTag => {
                if !index.uniforms.contains(pointer, value) {
                    self.report(range, Report::missing_in_files(value, pointer), DiagnosticSeverity::ERROR);
                }
            }
            category if ExistenceCache::tracks(category) => {
                if !existence.contains(category, value) {
                    self.report(range, Report::missing_in_files(value, category), DiagnosticSeverity::ERROR);
                } else if category.has_manifest_roster()
                    && !index.manifests.contains(category, value)
                {
                    self.report(
                        range,
                        Report::missing_in_manifest(value, category),
                        DiagnosticSeverity::WARNING,
                    );
                }
            }
            // Nothing on disk declares these.
            _ => {}
        }
    }

    fn report(&mut self, range: Range, message: String, severity: DiagnosticSeverity) {
        self.diags.push(diagnostic(range, message, severity));
    }
}

fn diagnostic(range: Range, message: String, severity: DiagnosticSeverity) -> Diagnostic {
    Diagnostic {
        range,
        message,
        source: Some(SOURCE.into()),
        severity: Some(severity),
        ..Default::default()
    }
}

/// Diagnostic message texts.
pub struct Report;

impl Report {
    pub fn missing_in_files(value: &str, category: PointerType) -> String {
        format!("[{}]: \"{}\" is missing.", category, value)
    }

    pub fn missing_in_manifest(value: &str, category: PointerType) -> String {
        format!("[{}]: \"{}\" is missing in {}.entity_manifest", category, value, category)
    }

    pub fn empty_description() -> String {
        "Empty localization key. Consider providing a description.".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serde_json::json;

    use super::*;
    use crate::config::Settings;
    use crate::test_utils::{create_test_mod_dir, test_context, write_game_schema};

    fn run(context: &EngineContext, file_name: &str, text: &str) -> Vec<Diagnostic> {
        diagnostics(context, file_name, &JsonDocument::parse(text))
    }

    fn unit_schema() -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "skin_groups": { "$ref": "#/$defs/unit_skin_definition_group" }
            },
            "$defs": {
                "unit_skin_definition_group": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "skins": {
                                "type": "array",
                                "items": { "type": ["string", "null"] }
                            }
                        }
                    }
                }
            }
        })
    }

    /// Weapon tags: one known, one unknown.
    #[test]
    fn test_unknown_weapon_tag_is_one_error() {
        let (_temp_dir, mod_dir) = create_test_mod_dir();
        fs::write(
            mod_dir.join("weapon.uniforms"),
            r#"{"weapon_tags": [{"name": "plasma"}]}"#,
        )
        .unwrap();
        let context = test_context(&mod_dir);

        let text = r#"{"tags": ["plasma", "unknown_tag"]}"#;
        let diags = run(&context, "laser.weapon", text);

        assert_eq!(diags.len(), 1, "{:?}", diags);
        assert_eq!(diags[0].severity, Some(DiagnosticSeverity::ERROR));
        assert_eq!(diags[0].message, "[weapon_tag]: \"unknown_tag\" is missing.");
        assert_eq!(diags[0].source, Some("jabberwocky".to_string()));

        let doc = JsonDocument::parse(text);
        let start = text.find("\"unknown_tag\"").unwrap();
        assert_eq!(diags[0].range, doc.range(start, start + "\"unknown_tag\"".len()));
    }

    #[test]
    fn test_unit_skin_missing_from_manifest_is_warning() {
        let (_temp_dir, mod_dir) = create_test_mod_dir();
        write_game_schema(&mod_dir, "unit-schema.json", &unit_schema());
        fs::write(mod_dir.join("trader_skin.unit_skin"), "{}").unwrap();
        fs::write(mod_dir.join("unit_skin.entity_manifest"), r#"{"ids": []}"#).unwrap();
        let context = test_context(&mod_dir);

        let diags = run(
            &context,
            "trader.unit",
            r#"{"skin_groups": [{"skins": ["trader_skin"]}]}"#,
        );

        assert_eq!(diags.len(), 1, "{:?}", diags);
        assert_eq!(diags[0].severity, Some(DiagnosticSeverity::WARNING));
        assert_eq!(
            diags[0].message,
            "[unit_skin]: \"trader_skin\" is missing in unit_skin.entity_manifest"
        );
    }

    #[test]
    fn test_registered_unit_skin_is_clean() {
        let (_temp_dir, mod_dir) = create_test_mod_dir();
        write_game_schema(&mod_dir, "unit-schema.json", &unit_schema());
        fs::write(mod_dir.join("trader_skin.unit_skin"), "{}").unwrap();
        fs::write(
            mod_dir.join("unit_skin.entity_manifest"),
            r#"{"ids": ["Trader_Skin"]}"#,
        )
        .unwrap();
        let context = test_context(&mod_dir);

        let diags = run(
            &context,
            "trader.unit",
            r#"{"skin_groups": [{"skins": ["trader_skin", null]}]}"#,
        );
        assert!(diags.is_empty(), "{:?}", diags);
    }

    #[test]
    fn test_missing_unit_skin_is_error_not_warning() {
        let (_temp_dir, mod_dir) = create_test_mod_dir();
        write_game_schema(&mod_dir, "unit-schema.json", &unit_schema());
        let context = test_context(&mod_dir);

        let diags = run(&context, "trader.unit", r#"{"skin_groups": [{"skins": ["ghost"]}]}"#);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].severity, Some(DiagnosticSeverity::ERROR));
        assert_eq!(diags[0].message, "[unit_skin]: \"ghost\" is missing.");
    }

    #[test]
    fn test_empty_unit_skin_description_is_info() {
        let (_temp_dir, mod_dir) = create_test_mod_dir();
        write_game_schema(
            &mod_dir,
            "unit-skin-schema.json",
            &json!({
                "type": "object",
                "properties": {
                    "name": { "$ref": "#/$defs/localized_text_ptr" },
                    "description": { "$ref": "#/$defs/localized_text_ptr" }
                },
                "$defs": { "localized_text_ptr": { "type": "string" } }
            }),
        );
        fs::write(mod_dir.join("en.localized_text"), r#"{"skin_name": "Skin"}"#).unwrap();
        let context = test_context(&mod_dir);

        let diags = run(
            &context,
            "trader_skin.unit_skin",
            r#"{"name": "skin_name", "description": ""}"#,
        );
        assert_eq!(diags.len(), 1, "{:?}", diags);
        assert_eq!(diags[0].severity, Some(DiagnosticSeverity::INFORMATION));
        assert_eq!(diags[0].message, Report::empty_description());

        // Outside unit skins the same empty key is a missing reference.
        let diags = run(&context, "laser.weapon", r#"{"name": ""}"#);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].severity, Some(DiagnosticSeverity::ERROR));
    }

    #[test]
    fn test_localized_text_is_case_sensitive() {
        let (_temp_dir, mod_dir) = create_test_mod_dir();
        fs::write(mod_dir.join("en.localized_text"), r#"{"Laser_Name": "Laser"}"#).unwrap();
        let context = test_context(&mod_dir);

        assert!(run(&context, "laser.weapon", r#"{"name": "Laser_Name"}"#).is_empty());
        assert_eq!(run(&context, "laser.weapon", r#"{"name": "laser_name"}"#).len(), 1);
    }

    #[test]
    fn test_unrelated_nested_key_is_not_checked() {
        let (_temp_dir, mod_dir) = create_test_mod_dir();
        write_game_schema(
            &mod_dir,
            "weapon-schema.json",
            &json!({
                "type": "object",
                "properties": {
                    "effects": {
                        "type": "object",
                        "properties": { "name": { "type": "string" } }
                    }
                }
            }),
        );
        let context = test_context(&mod_dir);

        // Only the top-level `name` is a localized_text reference.
        let diags = run(
            &context,
            "laser.weapon",
            r#"{"name": "missing_key", "effects": {"name": "free text"}}"#,
        );
        assert_eq!(diags.len(), 1, "{:?}", diags);
        assert!(diags[0].message.contains("missing_key"));
    }

    #[test]
    fn test_syntax_errors_are_errors() {
        let (_temp_dir, mod_dir) = create_test_mod_dir();
        let context = test_context(&mod_dir);

        let diags = run(&context, "laser.weapon", r#"{"tags": ["plasma",]}"#);
        assert!(diags
            .iter()
            .any(|d| d.severity == Some(DiagnosticSeverity::ERROR) && d.message == "Trailing comma"));
    }

    #[test]
    fn test_structural_errors_are_warnings() {
        let (_temp_dir, mod_dir) = create_test_mod_dir();
        fs::write(mod_dir.join("trader.unit"), "{}").unwrap();
        let context = test_context(&mod_dir);

        let diags = run(&context, "unit.entity_manifest", r#"{"ids": [3]}"#);
        assert!(diags
            .iter()
            .any(|d| d.severity == Some(DiagnosticSeverity::WARNING)));
    }

    #[test]
    fn test_families_can_be_disabled() {
        let (_temp_dir, mod_dir) = create_test_mod_dir();
        let mut context = test_context(&mod_dir);
        context.settings = Settings {
            reference_diagnostics: false,
            structural_diagnostics: false,
            ..context.settings.clone()
        };

        assert!(run(&context, "laser.weapon", r#"{"tags": ["nope"],"#).is_empty());
    }

    #[test]
    fn test_check_workspace_reports_only_failing_files() {
        let (_temp_dir, mod_dir) = create_test_mod_dir();
        fs::write(
            mod_dir.join("weapon.uniforms"),
            r#"{"weapon_tags": [{"name": "plasma"}]}"#,
        )
        .unwrap();
        fs::write(mod_dir.join("good.weapon"), r#"{"tags": ["plasma"]}"#).unwrap();
        fs::write(mod_dir.join("bad.weapon"), r#"{"tags": ["ion"]}"#).unwrap();
        fs::write(mod_dir.join("notes.txt"), "{").unwrap();
        let context = test_context(&mod_dir);

        let reports = check_workspace(&context);
        assert_eq!(reports.len(), 1, "{:?}", reports);
        assert!(reports[0].0.ends_with("bad.weapon"));
        assert_eq!(reports[0].1.len(), 1);
    }
}
