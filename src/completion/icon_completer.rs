//! Icon Completer
//!
//! Inside a localized string, `{icon:NAME` embeds a brush. While the cursor
//! follows such an unfinished token, brush names are offered for the
//! partial name only, not for the whole string.
//!
//! Only `.localized_text` files are handled here. Their values are free
//! text, so without an icon token before the cursor nothing is offered.

use once_cell::sync::Lazy;
use regex::Regex;
use tower_lsp::lsp_types::{
    CompletionItem, CompletionItemKind, CompletionTextEdit, Range, TextEdit,
};

use super::{Completable, Completer, Context};
use crate::pointer::PointerType;

static ICON_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{icon:(\w*)$").expect("valid icon regex"));

pub struct IconCompleter<'a> {
    context: Context<'a>,
    partial: String,
    range: Range,
}

impl<'a> Completer<'a> for IconCompleter<'a> {
    fn construct(context: Context<'a>) -> Option<Self> {
        if context.pointer != PointerType::LocalizedText
            || context.entity != PointerType::LocalizedText
        {
            return None;
        }

        let (node, _) = context.string_value()?;
        let (start, end) = context.inner_span(node);
        let cursor = context.offset.clamp(start, end);
        let before_cursor = context.document.text().get(start..cursor)?;

        let partial = ICON_TOKEN.captures(before_cursor)?.get(1)?.as_str().to_string();
        let range = context.range(cursor - partial.len(), cursor);

        Some(IconCompleter {
            context,
            partial,
            range,
        })
    }

    fn completions(&self) -> Vec<impl Completable<'a, Self>> {
        brush_names(self.context, &self.partial)
    }
}

/// A brush backed by a `.png` file, without the extension.
pub(super) struct BrushName<'a>(pub &'a str);

/// Brush entries starting with `prefix`, in any case, that name a png file.
pub(super) fn brush_names<'a>(context: Context<'a>, prefix: &str) -> Vec<BrushName<'a>> {
    let prefix = prefix.to_lowercase();
    context
        .engine
        .index
        .existence
        .members(PointerType::Brush)
        .filter(|brush| brush.starts_with(&prefix))
        .filter_map(|brush| brush.strip_suffix(".png"))
        .map(BrushName)
        .collect()
}

impl BrushName<'_> {
    pub(super) fn item(&self, range: Range) -> CompletionItem {
        let label = self.0.to_lowercase();
        CompletionItem {
            label: label.clone(),
            kind: Some(CompletionItemKind::FILE),
            detail: Some(".png".to_string()),
            text_edit: Some(CompletionTextEdit::Edit(TextEdit {
                range,
                new_text: label,
            })),
            ..Default::default()
        }
    }
}

impl<'a> Completable<'a, IconCompleter<'a>> for BrushName<'a> {
    fn completions(&self, completer: &IconCompleter<'a>) -> Option<CompletionItem> {
        Some(self.item(completer.range))
    }
}
