//! Enum Completer
//!
//! Last in the chain: when the property under the cursor carries an `enum`
//! (or `const`) in its schema, its string members are offered.

use serde_json::Value;
use tower_lsp::lsp_types::{
    CompletionItem, CompletionItemKind, CompletionTextEdit, Documentation, Range, TextEdit,
};

use super::{Completable, Completer, Context};

pub struct EnumCompleter<'a> {
    members: &'a [Value],
    description: Option<&'a str>,
    prefix: &'a str,
    range: Range,
}

impl<'a> Completer<'a> for EnumCompleter<'a> {
    fn construct(context: Context<'a>) -> Option<Self> {
        let document = context.document;
        let (node, _) = context.string_value()?;
        let property = document.enclosing_property(node)?;
        let key = document.property_key(property)?;

        let (members, description) = context
            .matches
            .iter()
            .filter(|matching| matching.owns_property(document, property))
            .find_map(|matching| {
                let declared = matching.fragment().property(key)?;
                let members = matching.schema.effective_enum(declared);
                (!members.is_empty())
                    .then(|| (members, matching.schema.effective_description(declared)))
            })?;

        let (start, end) = context.inner_span(node);
        Some(EnumCompleter {
            members,
            description,
            prefix: document.text().get(start..end)?,
            range: context.range(start, end),
        })
    }

    fn completions(&self) -> Vec<impl Completable<'a, Self>> {
        self.members
            .iter()
            .filter_map(Value::as_str)
            .filter(|member| member.starts_with(self.prefix))
            .map(EnumMember)
            .collect()
    }
}

struct EnumMember<'a>(&'a str);

impl<'a> Completable<'a, EnumCompleter<'a>> for EnumMember<'a> {
    fn completions(&self, completer: &EnumCompleter<'a>) -> Option<CompletionItem> {
        Some(CompletionItem {
            label: self.0.to_string(),
            kind: Some(CompletionItemKind::ENUM_MEMBER),
            documentation: completer
                .description
                .map(|description| Documentation::String(description.to_string())),
            text_edit: Some(CompletionTextEdit::Edit(TextEdit {
                range: completer.range,
                new_text: self.0.to_string(),
            })),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::super::tests::{complete_at, labels};
    use crate::test_utils::{create_test_mod_dir, test_context, write_game_schema};

    #[test]
    fn test_enum_members_are_offered() {
        let (_temp_dir, mod_dir) = create_test_mod_dir();
        write_game_schema(
            &mod_dir,
            "formation-schema.json",
            &json!({
                "type": "object",
                "properties": {
                    "shape": {
                        "description": "Arrangement of the ships.",
                        "enum": ["line", "wedge", "wall", 3]
                    }
                }
            }),
        );
        let engine = test_context(&mod_dir);

        let items = complete_at(&engine, "escort.formation", r#"{"shape": "w|"}"#).unwrap();
        assert_eq!(labels(&items), vec!["wedge", "wall"]);
        assert!(items[0].documentation.is_some());
    }

    #[test]
    fn test_no_enum_no_completion() {
        let (_temp_dir, mod_dir) = create_test_mod_dir();
        let engine = test_context(&mod_dir);

        assert!(complete_at(&engine, "escort.formation", r#"{"shape": "|"}"#).is_none());
    }
}
