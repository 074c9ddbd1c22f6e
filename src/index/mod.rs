//! Workspace identifier indices.
//!
//! All indices are derived from one scan of the mod folder and rebuilt
//! wholesale; nothing here is patched incrementally. The builders read
//! disjoint files and write disjoint tables, so they run in parallel.

pub mod existence;
pub mod files;
pub mod localization;
pub mod manifest;
pub mod paths;
pub mod texture;
pub mod uniform;

use std::{path::Path, time::Instant};

use tracing::info;

pub use existence::{CategorySets, ExistenceCache};
pub use files::ModFiles;
pub use localization::LocalizationTable;
pub use manifest::ManifestRoster;
pub use paths::PathIndex;
pub use texture::TextureIndex;
pub use uniform::UniformSet;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkspaceIndex {
    pub language: String,
    pub paths: PathIndex,
    pub existence: ExistenceCache,
    pub manifests: ManifestRoster,
    pub uniforms: UniformSet,
    pub localization: LocalizationTable,
    pub textures: TextureIndex,
}

impl WorkspaceIndex {
    pub fn build(root: &Path, language: &str) -> WorkspaceIndex {
        let start = Instant::now();
        let files = ModFiles::scan(root);

        let ((paths, existence), ((manifests, uniforms), (localization, textures))) = rayon::join(
            || {
                rayon::join(
                    || PathIndex::build(&files),
                    || ExistenceCache::build(&files, language),
                )
            },
            || {
                rayon::join(
                    || {
                        rayon::join(
                            || ManifestRoster::build(&files),
                            || UniformSet::build(&files),
                        )
                    },
                    || {
                        rayon::join(
                            || LocalizationTable::build(&files),
                            || TextureIndex::build(&files),
                        )
                    },
                )
            },
        );

        info!(
            root = %root.display(),
            language,
            files = files.len(),
            identifiers = paths.len(),
            existing = existence.sets().total(),
            registered = manifests.sets().total(),
            uniforms = uniforms.sets().total(),
            "indexed workspace in {:?}",
            start.elapsed()
        );

        WorkspaceIndex {
            language: language.to_string(),
            paths,
            existence,
            manifests,
            uniforms,
            localization,
            textures,
        }
    }
}
