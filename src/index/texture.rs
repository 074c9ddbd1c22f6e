use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use super::files::{self, ModFiles};

/// Lower-cased png stem → first file found, for brush previews.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextureIndex(HashMap<String, PathBuf>);

impl TextureIndex {
    pub fn build(files: &ModFiles) -> TextureIndex {
        let mut textures = HashMap::new();
        for path in files.with_extension("png") {
            if let Some(stem) = files::stem(path) {
                textures.entry(stem).or_insert_with(|| path.to_path_buf());
            }
        }
        TextureIndex(textures)
    }

    /// Accepts the brush name with or without its `.png` extension.
    pub fn get(&self, brush: &str) -> Option<&Path> {
        let brush = brush.to_lowercase();
        let stem = brush.strip_suffix(".png").unwrap_or(&brush);
        self.0.get(stem).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
