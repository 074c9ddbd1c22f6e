//! Engine lifecycle.
//!
//! An [`EngineContext`] owns everything a request needs: settings, the
//! annotated schema set and the workspace indices. It is built once per
//! (re)index and shared read-only behind an `Arc`. [`EngineState`] tracks
//! whether such a context is available:
//!
//! ```text
//! Uninitialized ──start_indexing──▶ Indexing ──finish_indexing──▶ Ready
//!                                      ▲                           │
//!                                      └──────start_indexing───────┘
//! ```
//!
//! A `start_indexing` that arrives while a pass is running is remembered, and
//! [`Finished::rerun`] tells the caller to index again with fresh settings.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use tracing::info;

use crate::{
    config::Settings,
    error::{EngineError, Result},
    index::WorkspaceIndex,
    json::JsonDocument,
    schema::{MatchingSchema, SchemaAnnotator, SchemaSet},
};

#[derive(Debug)]
pub struct EngineContext {
    pub root_dir: PathBuf,
    pub settings: Settings,
    pub schemas: SchemaSet,
    pub index: WorkspaceIndex,
}

impl EngineContext {
    /// Configures the schemas and indexes `root_dir`. Blocking.
    pub fn build(root_dir: &Path, settings: Settings) -> EngineContext {
        let annotator = SchemaAnnotator::new(settings.schema_dir());
        let schemas = SchemaSet::new(annotator.configure());
        let index = WorkspaceIndex::build(root_dir, &settings.language);

        EngineContext {
            root_dir: root_dir.to_path_buf(),
            settings,
            schemas,
            index,
        }
    }

    pub fn language(&self) -> &str {
        &self.index.language
    }

    pub fn matching_schemas(&self, file_name: &str, document: &JsonDocument) -> Vec<MatchingSchema> {
        self.schemas.matching_schemas(file_name, document)
    }
}

#[derive(Debug, Default)]
pub enum EngineState {
    #[default]
    Uninitialized,
    /// `rerun` is set when another pass was requested meanwhile.
    Indexing { rerun: bool },
    Ready(Arc<EngineContext>),
}

/// Outcome of [`EngineState::finish_indexing`].
#[derive(Debug)]
pub struct Finished {
    pub context: Arc<EngineContext>,
    /// A rebuild was requested while this pass ran; its settings may be stale.
    pub rerun: bool,
}

impl EngineState {
    /// Moves to `Indexing`. If a pass is already running, the request is
    /// queued for when it finishes and `AlreadyIndexing` is returned.
    pub fn start_indexing(&mut self) -> Result<()> {
        if let EngineState::Indexing { rerun } = self {
            *rerun = true;
            return Err(EngineError::AlreadyIndexing);
        }
        info!(from = self.name(), "indexing started");
        *self = EngineState::Indexing { rerun: false };
        Ok(())
    }

    pub fn finish_indexing(&mut self, context: EngineContext) -> Finished {
        let rerun = matches!(self, EngineState::Indexing { rerun: true });
        let context = Arc::new(context);
        *self = EngineState::Ready(Arc::clone(&context));
        info!(rerun, "engine ready");
        Finished { context, rerun }
    }

    /// Drops back to `Uninitialized` after a failed indexing pass. Returns
    /// whether another pass was requested meanwhile.
    pub fn abort_indexing(&mut self) -> bool {
        let rerun = matches!(self, EngineState::Indexing { rerun: true });
        if matches!(self, EngineState::Indexing { .. }) {
            *self = EngineState::Uninitialized;
        }
        rerun
    }

    pub fn context(&self) -> Result<Arc<EngineContext>> {
        match self {
            EngineState::Ready(context) => Ok(Arc::clone(context)),
            EngineState::Indexing { .. } => Err(EngineError::NotReady("indexing in progress")),
            EngineState::Uninitialized => Err(EngineError::NotReady("workspace not indexed yet")),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, EngineState::Ready(_))
    }

    pub fn name(&self) -> &'static str {
        match self {
            EngineState::Uninitialized => "uninitialized",
            EngineState::Indexing { .. } => "indexing",
            EngineState::Ready(_) => "ready",
        }
    }
}
