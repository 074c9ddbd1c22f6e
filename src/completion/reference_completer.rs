//! Reference Completer
//!
//! Offers identifiers of the category resolved at the cursor. The whole
//! string value is the prefix and is replaced by the chosen identifier.
//! Matching ignores case, except for localization keys.
//!
//! | Category | Kind | Detail |
//! |----------|------|--------|
//! | `localized_text`, `weapon_tag` | `Variable` | |
//! | `weapon` | `Variable` | `.weapon` |
//! | `mesh_material` | `Variable` | `.mesh_material` |
//! | `unit` | `Enum` | `.unit` |
//! | `unit_skin`, `unit_item` | `Enum` | |
//! | `mesh` | `File` | `.obj` |
//! | `ttf_font` | `File` | `.ttf` |
//! | `brush` | `File` | `.png`, png files only, extension stripped |
//! | other file-backed categories | `Reference` | |

use tower_lsp::lsp_types::{
    CompletionItem, CompletionItemKind, CompletionTextEdit, Range, TextEdit,
};

use super::icon_completer::{brush_names, BrushName};
use super::{Completable, Completer, Context};
use crate::{index::ExistenceCache, pointer::PointerType};

pub struct ReferenceCompleter<'a> {
    context: Context<'a>,
    prefix: &'a str,
    range: Range,
}

impl<'a> Completer<'a> for ReferenceCompleter<'a> {
    fn construct(context: Context<'a>) -> Option<Self> {
        let pointer = context.pointer;
        if pointer.is_none() {
            return None;
        }
        // Localized values are free text, see the icon completer.
        if pointer == PointerType::LocalizedText && context.entity == PointerType::LocalizedText {
            return None;
        }
        if pointer != PointerType::WeaponTag && !ExistenceCache::tracks(pointer) {
            return None;
        }

        let (node, _) = context.string_value()?;
        let (start, end) = context.inner_span(node);
        let prefix = context.document.text().get(start..end)?;

        Some(ReferenceCompleter {
            context,
            prefix,
            range: context.range(start, end),
        })
    }

    fn completions(&self) -> Vec<impl Completable<'a, Self>> {
        let index = &self.context.engine.index;
        let prefix = match self.context.pointer {
            PointerType::LocalizedText => self.prefix.to_string(),
            _ => self.prefix.to_lowercase(),
        };
        let prefix = prefix.as_str();

        match self.context.pointer {
            PointerType::Brush => brush_names(self.context, prefix)
                .into_iter()
                .map(Candidate::Brush)
                .collect::<Vec<_>>(),
            PointerType::WeaponTag => index
                .uniforms
                .members(PointerType::WeaponTag)
                .filter(|tag| tag.to_lowercase().starts_with(prefix))
                .map(Candidate::Identifier)
                .collect::<Vec<_>>(),
            category => index
                .existence
                .members(category)
                .filter(|identifier| identifier.starts_with(prefix))
                .map(Candidate::Identifier)
                .collect::<Vec<_>>(),
        }
    }
}

enum Candidate<'a> {
    Identifier(&'a str),
    Brush(BrushName<'a>),
}

fn presentation(category: PointerType) -> (CompletionItemKind, Option<&'static str>) {
    match category {
        PointerType::LocalizedText | PointerType::WeaponTag => (CompletionItemKind::VARIABLE, None),
        PointerType::Weapon => (CompletionItemKind::VARIABLE, Some(".weapon")),
        PointerType::MeshMaterial => (CompletionItemKind::VARIABLE, Some(".mesh_material")),
        PointerType::Unit => (CompletionItemKind::ENUM, Some(".unit")),
        PointerType::UnitSkin | PointerType::UnitItem => (CompletionItemKind::ENUM, None),
        PointerType::Mesh => (CompletionItemKind::FILE, Some(".obj")),
        PointerType::TtfFont => (CompletionItemKind::FILE, Some(".ttf")),
        PointerType::Brush => (CompletionItemKind::FILE, Some(".png")),
        _ => (CompletionItemKind::REFERENCE, None),
    }
}

impl<'a> Completable<'a, ReferenceCompleter<'a>> for Candidate<'a> {
    fn completions(&self, completer: &ReferenceCompleter<'a>) -> Option<CompletionItem> {
        match self {
            Candidate::Brush(brush) => Some(brush.item(completer.range)),
            Candidate::Identifier(identifier) => {
                let (kind, detail) = presentation(completer.context.pointer);
                let label = identifier.to_lowercase();
                Some(CompletionItem {
                    label: label.clone(),
                    kind: Some(kind),
                    detail: detail.map(str::to_string),
                    text_edit: Some(CompletionTextEdit::Edit(TextEdit {
                        range: completer.range,
                        new_text: label,
                    })),
                    ..Default::default()
                })
            }
        }
    }
}
