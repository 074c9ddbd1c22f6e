use std::path::{Path, PathBuf};

use anyhow::anyhow;
use config::{Config, File};
use serde::Deserialize;
use tower_lsp::lsp_types::{ClientCapabilities, MarkupKind};

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Settings {
    /// Language code of the `<language>.localized_text` file to index
    pub language: String,
    /// Directory of the game's JSON schemas; empty means next to the executable
    pub schema_dir: String,
    pub reference_diagnostics: bool,
    pub structural_diagnostics: bool,
    pub hover: bool,
    pub texture_preview: bool,
    pub max_completions: usize,
}

impl Settings {
    pub fn new(root_dir: &Path, capabilities: &ClientCapabilities) -> anyhow::Result<Settings> {
        let expanded = shellexpand::tilde("~/.config/jabberwocky/settings");
        let settings = Config::builder()
            .add_source(File::with_name(&expanded).required(false))
            .add_source(
                File::with_name(&format!(
                    "{}/.jabberwocky",
                    root_dir
                        .to_str()
                        .ok_or(anyhow!("Can't convert root_dir to str"))?
                ))
                .required(false),
            )
            .set_default("language", "en")?
            .set_default("schema_dir", "")?
            .set_default("reference_diagnostics", true)?
            .set_default("structural_diagnostics", true)?
            .set_default("hover", true)?
            .set_default("texture_preview", true)?
            .set_default("max_completions", 1000)?
            .set_override_option(
                "texture_preview",
                capabilities
                    .text_document
                    .as_ref()
                    .and_then(|it| it.hover.as_ref())
                    .and_then(|hover| hover.content_format.as_ref())
                    .and_then(|formats| {
                        match formats.contains(&MarkupKind::Markdown) {
                            true => None,
                            false => Some(false),
                        }
                    }),
            )?
            .build()
            .map_err(|err| anyhow!("Build err: {err}"))?;

        let settings = settings.try_deserialize::<Settings>()?;

        anyhow::Ok(settings)
    }

    /// The directory game schemas are loaded from.
    pub fn schema_dir(&self) -> PathBuf {
        if self.schema_dir.is_empty() {
            return std::env::current_exe()
                .ok()
                .and_then(|exe| exe.parent().map(Path::to_path_buf))
                .unwrap_or_default()
                .join("resources")
                .join("schemas");
        }
        PathBuf::from(shellexpand::tilde(&self.schema_dir).as_ref())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            language: "en".to_string(),
            schema_dir: "".to_string(),
            reference_diagnostics: true,
            structural_diagnostics: true,
            hover: true,
            texture_preview: true,
            max_completions: 1000,
        }
    }
}
