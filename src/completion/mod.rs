use tower_lsp::lsp_types::{CompletionItem, CompletionList, CompletionResponse, Position, Range};

use crate::{
    context,
    engine::EngineContext,
    json::{JsonDocument, NodeId},
    pointer::PointerType,
    schema::MatchingSchema,
};

use self::{
    enum_completer::EnumCompleter, icon_completer::IconCompleter,
    reference_completer::ReferenceCompleter,
};

mod enum_completer;
mod icon_completer;
mod reference_completer;

/// Everything a completer may look at for one request.
#[derive(Clone, Copy)]
pub struct Context<'a> {
    engine: &'a EngineContext,
    document: &'a JsonDocument,
    matches: &'a [MatchingSchema],
    /// Category of the document being edited
    entity: PointerType,
    /// Category resolved at the cursor
    pointer: PointerType,
    /// String value under the cursor
    node: Option<NodeId>,
    offset: usize,
}

impl<'a> Context<'a> {
    /// The string node under the cursor, when it sits in value position.
    fn string_value(&self) -> Option<(NodeId, &'a str)> {
        let node = self.node?;
        if !context::is_string_value(self.document, node) {
            return None;
        }
        Some((node, self.document.string_value(node)?))
    }

    /// Byte span of a string node without its quotes. An unterminated
    /// string keeps everything after the opening quote.
    fn inner_span(&self, node: NodeId) -> (usize, usize) {
        let ast = self.document.node(node);
        let start = ast.offset + 1;
        let closing = self.document.text().as_bytes().get(ast.end() - 1);
        let terminated = ast.length >= 2 && closing == Some(&b'"');
        let end = if terminated { ast.end() - 1 } else { ast.end() };
        (start.min(end), end)
    }

    fn range(&self, start: usize, end: usize) -> Range {
        self.document.range(start, end)
    }
}

pub trait Completer<'a>: Sized {
    fn construct(context: Context<'a>) -> Option<Self>;

    fn completions(&self) -> Vec<impl Completable<'a, Self>>;
}

pub trait Completable<'a, T: Completer<'a>>: Sized {
    fn completions(&self, completer: &T) -> Option<CompletionItem>;
}

pub fn get_completions(
    engine: &EngineContext,
    file_name: &str,
    document: &JsonDocument,
    position: Position,
) -> Option<CompletionResponse> {
    let offset = document.offset_at(position);
    let node = document.node_at_offset(offset);
    let matches = engine.matching_schemas(file_name, document);

    let completion_context = Context {
        engine,
        document,
        matches: &matches,
        entity: context::entity_category(file_name),
        pointer: context::resolve_with(document, &matches, node),
        node,
        offset,
    };

    run_completer::<IconCompleter>(completion_context)
        .or_else(|| run_completer::<ReferenceCompleter>(completion_context))
        .or_else(|| run_completer::<EnumCompleter>(completion_context))
}

fn run_completer<'a, T: Completer<'a>>(context: Context<'a>) -> Option<CompletionResponse> {
    let completer = T::construct(context)?;
    let items = completer
        .completions()
        .into_iter()
        .filter_map(|completable| completable.completions(&completer))
        .take(context.engine.settings.max_completions)
        .collect::<Vec<CompletionItem>>();

    Some(CompletionResponse::List(CompletionList {
        is_incomplete: false,
        items,
    }))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tower_lsp::lsp_types::{CompletionItemKind, CompletionTextEdit};

    use super::*;
    use crate::test_utils::{create_test_mod_dir, test_context};

    /// Completes at the `|` marker, which is removed from the text.
    pub(super) fn complete_at(
        engine: &EngineContext,
        file_name: &str,
        marked: &str,
    ) -> Option<Vec<CompletionItem>> {
        let offset = marked.find('|').unwrap();
        let text = marked.replacen('|', "", 1);
        let document = JsonDocument::parse(&text);
        let position = document.position_at(offset);
        match get_completions(engine, file_name, &document, position)? {
            CompletionResponse::List(list) => Some(list.items),
            CompletionResponse::Array(items) => Some(items),
        }
    }

    pub(super) fn labels(items: &[CompletionItem]) -> Vec<&str> {
        items.iter().map(|item| item.label.as_str()).collect()
    }

    #[test]
    fn test_weapon_tag_completion_is_prefix_filtered() {
        let (_temp_dir, mod_dir) = create_test_mod_dir();
        fs::write(mod_dir.join("laser_light.weapon"), "{}").unwrap();
        fs::write(mod_dir.join("laser_heavy.weapon"), "{}").unwrap();
        fs::write(mod_dir.join("missile.weapon"), "{}").unwrap();
        fs::write(
            mod_dir.join("weapon.uniforms"),
            r#"{"weapon_tags": [{"name": "plasma"}, {"name": "laser"}]}"#,
        )
        .unwrap();
        let engine = test_context(&mod_dir);

        let items = complete_at(&engine, "laser.weapon", r#"{"tags": ["pl|"]}"#).unwrap();
        assert_eq!(labels(&items), vec!["plasma"]);
        assert_eq!(items[0].kind, Some(CompletionItemKind::VARIABLE));

        let Some(CompletionTextEdit::Edit(edit)) = &items[0].text_edit else {
            panic!("expected a text edit");
        };
        assert_eq!(edit.new_text, "plasma");
        assert_eq!(edit.range.start.character, 11);
        assert_eq!(edit.range.end.character, 13);
    }

    #[test]
    fn test_results_are_capped() {
        let (_temp_dir, mod_dir) = create_test_mod_dir();
        for idx in 0..10 {
            fs::write(mod_dir.join(format!("tag_{idx}.png")), "").unwrap();
        }
        fs::write(mod_dir.join("en.localized_text"), "{}").unwrap();
        let mut engine = test_context(&mod_dir);
        engine.settings.max_completions = 3;

        let items = complete_at(&engine, "trader.exotic", r#"{"picture": "|"}"#).unwrap();
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn test_property_keys_get_no_reference_completion() {
        let (_temp_dir, mod_dir) = create_test_mod_dir();
        fs::write(mod_dir.join("en.localized_text"), r#"{"name_key": "x"}"#).unwrap();
        let engine = test_context(&mod_dir);

        assert!(complete_at(&engine, "laser.weapon", r#"{"na|me": "name_key"}"#).is_none());
    }
}
