//! The tower-lsp backend.
//!
//! Open documents are held in memory as parsed [`JsonDocument`]s. Feature
//! requests need a ready [`EngineContext`]; while the workspace is being
//! indexed they fail with `ContentModified` so the client retries.
//! Documents opened or edited during indexing are validated once the
//! engine becomes ready.

use std::{borrow::Cow, collections::HashMap, path::PathBuf, sync::Arc};

use tokio::sync::RwLock;
use tower_lsp::{
    jsonrpc::{Error, ErrorCode, Result},
    lsp_types::*,
    Client, LanguageServer, LspService, Server,
};
use tracing::{debug, error, info, warn};

use crate::{
    completion,
    config::Settings,
    context,
    diagnostics,
    engine::{EngineContext, EngineState},
    error::EngineError,
    gotodef, hover,
    json::JsonDocument,
    requests::{self, EntityPathParams, LocalizationParams},
    symbol,
};

/// Client setting holding the display language.
pub const LANGUAGE_SECTION: &str = "jabberwocky.language";

#[derive(Debug, Clone)]
struct Workspace {
    root: PathBuf,
    capabilities: ClientCapabilities,
}

#[derive(Clone)]
pub struct Backend {
    client: Client,
    workspace: Arc<RwLock<Option<Workspace>>>,
    engine: Arc<RwLock<EngineState>>,
    documents: Arc<RwLock<HashMap<Url, Arc<JsonDocument>>>>,
}

impl Backend {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            workspace: Arc::new(RwLock::new(None)),
            engine: Arc::new(RwLock::new(EngineState::default())),
            documents: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// The display language configured in the client, if any.
    async fn fetch_language(&self) -> Option<String> {
        let items = vec![ConfigurationItem {
            scope_uri: None,
            section: Some(LANGUAGE_SECTION.to_string()),
        }];
        match self.client.configuration(items).await {
            Ok(values) => values
                .into_iter()
                .next()
                .and_then(|value| value.as_str().map(str::to_string))
                .filter(|language| !language.is_empty()),
            Err(err) => {
                debug!("client did not answer configuration request: {}", err);
                None
            }
        }
    }

    /// Rebuilds the engine from scratch, then validates every open document.
    /// Indexes the workspace, again as long as rebuilds were requested
    /// while a pass was running.
    async fn rebuild(&self) {
        while self.index_workspace().await {
            info!("rebuild requested during indexing, indexing again");
        }
    }

    /// One indexing pass. Returns whether another pass is due.
    async fn index_workspace(&self) -> bool {
        let Some(workspace) = self.workspace.read().await.clone() else {
            warn!("no workspace root, nothing to index");
            return false;
        };

        if let Err(err) = self.engine.write().await.start_indexing() {
            info!("{}, rebuild queued", err);
            return false;
        }

        let mut settings = Settings::new(&workspace.root, &workspace.capabilities)
            .unwrap_or_else(|err| {
                error!("could not read settings, using defaults: {}", err);
                Settings::default()
            });
        if let Some(language) = self.fetch_language().await {
            settings.language = language;
        }

        self.client
            .log_message(
                MessageType::INFO,
                format!(
                    "Indexing {} ({})",
                    workspace.root.display(),
                    settings.language
                ),
            )
            .await;

        let root = workspace.root.clone();
        let built = tokio::task::spawn_blocking(move || EngineContext::build(&root, settings)).await;

        match built {
            Ok(context) => {
                let finished = self.engine.write().await.finish_indexing(context);
                self.client
                    .log_message(
                        MessageType::INFO,
                        format!("Indexed {} identifiers", finished.context.index.paths.len()),
                    )
                    .await;
                self.validate_all(&finished.context).await;
                finished.rerun
            }
            Err(err) => {
                let rerun = self.engine.write().await.abort_indexing();
                error!("indexing failed: {}", err);
                self.client
                    .log_message(MessageType::ERROR, format!("Indexing failed: {}", err))
                    .await;
                rerun
            }
        }
    }

    fn spawn_rebuild(&self) {
        let backend = self.clone();
        tokio::spawn(async move { backend.rebuild().await });
    }

    async fn validate_all(&self, engine: &EngineContext) {
        let uris = self.documents.read().await.keys().cloned().collect::<Vec<_>>();
        info!(documents = uris.len(), "validating open documents");
        for uri in uris {
            self.validate(engine, uri).await;
        }
    }

    async fn validate(&self, engine: &EngineContext, uri: Url) {
        let Some(document) = self.documents.read().await.get(&uri).cloned() else {
            return;
        };
        let file_name = context::document_file_name(&uri);
        let diagnostics = diagnostics::diagnostics(engine, &file_name, &document);
        self.client.publish_diagnostics(uri, diagnostics, None).await;
    }

    /// Stores the new text and validates it when the engine is ready.
    async fn update_document(&self, uri: Url, text: &str) {
        let document = Arc::new(JsonDocument::parse(text));
        self.documents.write().await.insert(uri.clone(), document);

        let engine = self.engine.read().await.context();
        match engine {
            Ok(engine) => self.validate(&engine, uri).await,
            Err(err) => debug!(%uri, "held until ready: {}", err),
        }
    }

    async fn ready(&self) -> Result<Arc<EngineContext>> {
        self.engine.read().await.context().map_err(not_ready)
    }

    /// The ready engine together with the document, `None` when the
    /// document is not open.
    async fn snapshot(&self, uri: &Url) -> Result<Option<(Arc<EngineContext>, Arc<JsonDocument>)>> {
        let engine = self.ready().await?;
        let document = self.documents.read().await.get(uri).cloned();
        Ok(document.map(|document| (engine, document)))
    }

    async fn player_ids(&self) -> Result<Vec<String>> {
        let engine = self.ready().await?;
        Ok(requests::player_ids(&engine))
    }

    async fn entity_path(&self, params: EntityPathParams) -> Result<Option<String>> {
        let engine = self.ready().await?;
        Ok(requests::entity_path(&engine, &params))
    }

    async fn localization(&self, params: LocalizationParams) -> Result<Option<String>> {
        let engine = self.ready().await?;
        Ok(requests::localization(&engine, &params))
    }
}

fn not_ready(err: EngineError) -> Error {
    Error {
        code: ErrorCode::ContentModified,
        message: Cow::Owned(err.to_string()),
        data: None,
    }
}

/// Letters plus the characters that continue an identifier or icon token.
pub fn trigger_characters() -> Vec<String> {
    ('a'..='z')
        .chain('A'..='Z')
        .chain([':', '_'])
        .map(String::from)
        .collect()
}

pub fn server_capabilities() -> ServerCapabilities {
    ServerCapabilities {
        text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::FULL)),
        completion_provider: Some(CompletionOptions {
            trigger_characters: Some(trigger_characters()),
            ..Default::default()
        }),
        hover_provider: Some(HoverProviderCapability::Simple(true)),
        definition_provider: Some(OneOf::Left(true)),
        document_symbol_provider: Some(OneOf::Left(true)),
        workspace_symbol_provider: Some(OneOf::Left(true)),
        ..Default::default()
    }
}

#[allow(deprecated)]
fn workspace_root(params: &InitializeParams) -> Option<PathBuf> {
    params
        .workspace_folders
        .as_ref()
        .and_then(|folders| folders.first())
        .and_then(|folder| folder.uri.to_file_path().ok())
        .or_else(|| params.root_uri.as_ref()?.to_file_path().ok())
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        match workspace_root(&params) {
            Some(root) => {
                info!(root = %root.display(), "initialize");
                *self.workspace.write().await = Some(Workspace {
                    root,
                    capabilities: params.capabilities,
                });
            }
            None => warn!("client sent no workspace root"),
        }

        Ok(InitializeResult {
            server_info: Some(ServerInfo {
                name: "jabberwocky".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
            capabilities: server_capabilities(),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        self.client
            .log_message(MessageType::INFO, "jabberwocky initialized")
            .await;
        self.spawn_rebuild();
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_change_configuration(&self, _: DidChangeConfigurationParams) {
        info!("configuration changed, rebuilding");
        self.spawn_rebuild();
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        self.update_document(params.text_document.uri, &params.text_document.text)
            .await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let Some(change) = params.content_changes.into_iter().last() else {
            return;
        };
        self.update_document(params.text_document.uri, &change.text)
            .await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        self.documents.write().await.remove(&uri);
        self.client.publish_diagnostics(uri, Vec::new(), None).await;
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let position = params.text_document_position;
        let Some((engine, document)) = self.snapshot(&position.text_document.uri).await? else {
            return Ok(None);
        };
        let file_name = context::document_file_name(&position.text_document.uri);
        Ok(completion::get_completions(
            &engine,
            &file_name,
            &document,
            position.position,
        ))
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let position = params.text_document_position_params;
        let Some((engine, document)) = self.snapshot(&position.text_document.uri).await? else {
            return Ok(None);
        };
        let file_name = context::document_file_name(&position.text_document.uri);
        Ok(hover::hover(&engine, &file_name, &document, position.position))
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let position = params.text_document_position_params;
        let Some((engine, document)) = self.snapshot(&position.text_document.uri).await? else {
            return Ok(None);
        };
        let file_name = context::document_file_name(&position.text_document.uri);
        Ok(
            gotodef::goto_definition(&engine, &file_name, &document, position.position)
                .map(GotoDefinitionResponse::Array),
        )
    }

    async fn document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> Result<Option<DocumentSymbolResponse>> {
        let document = self
            .documents
            .read()
            .await
            .get(&params.text_document.uri)
            .cloned();
        Ok(document.and_then(|document| symbol::document_symbol(&document)))
    }

    async fn symbol(
        &self,
        params: WorkspaceSymbolParams,
    ) -> Result<Option<Vec<SymbolInformation>>> {
        let engine = self.ready().await?;
        Ok(Some(symbol::workspace_symbol(
            &engine.index.paths,
            &params.query,
        )))
    }
}

/// Serves the language server over stdio until the client exits.
pub async fn run_server() {
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::build(Backend::new)
        .custom_method(requests::PLAYER_IDS, Backend::player_ids)
        .custom_method(requests::ENTITY_PATH, Backend::entity_path)
        .custom_method(requests::LOCALIZATION, Backend::localization)
        .finish();

    Server::new(stdin, stdout, socket)
        .concurrency_level(1)
        .serve(service)
        .await;
}
