use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde_json::json;
use tokio::sync::{Mutex, RwLock};
use tower_lsp::jsonrpc::{Error as RpcError, ErrorCode, Result as LspResult};
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};

use crate::engine::{EngineLoader, LoadError, NodeLoader};
use crate::lsp::client::Notifier;
use crate::lsp::document::DocumentState;
use crate::lsp::handlers::HandleValidation;
use crate::lsp::state::ServerState;
use crate::lsp::watcher::WorkspaceWatcher;
use crate::settings::Settings;
use crate::Config;

/// Error code used for every initialize failure
pub const INITIALIZE_ERROR_CODE: i64 = 99;

/// What the server learned about the workspace at initialize time
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    pub root: Option<PathBuf>,
    /// Client can register `workspace/didChangeWatchedFiles` dynamically
    pub dynamic_watch_registration: bool,
}

/// The main LSP backend that holds state and implements the Language Server Protocol
#[derive(Clone)]
pub struct Backend<N = Client> {
    pub client: N,
    pub loader: Arc<dyn EngineLoader>,
    pub state: Arc<RwLock<ServerState>>,
    pub settings: Arc<RwLock<Settings>>,
    pub documents: Arc<RwLock<HashMap<Url, DocumentState>>>,
    pub workspace: Arc<RwLock<Workspace>>,
    pub config: Config,
    watcher: Arc<Mutex<Option<WorkspaceWatcher>>>,
}

impl Backend<Client> {
    pub fn new(client: Client, config: Config) -> Self {
        let loader = Arc::new(NodeLoader::new(&config));
        Self::with_loader(client, config, loader)
    }
}

impl<N: Notifier> Backend<N> {
    pub fn with_loader(client: N, config: Config, loader: Arc<dyn EngineLoader>) -> Self {
        Self {
            client,
            loader,
            state: Arc::new(RwLock::new(ServerState::default())),
            settings: Arc::new(RwLock::new(Settings::default())),
            documents: Arc::new(RwLock::new(HashMap::new())),
            workspace: Arc::new(RwLock::new(Workspace::default())),
            config,
            watcher: Arc::new(Mutex::new(None)),
        }
    }

    pub fn initialize_result() -> InitializeResult {
        InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        }
    }

    /// Store the latest text of a document
    pub async fn open_document(&self, uri: Url, content: String, version: i32) {
        let mut docs = self.documents.write().await;
        docs.insert(uri, DocumentState { content, version });
    }

    /// Forget a document and clear what was shown for it
    pub async fn close_document(&self, uri: Url) {
        self.documents.write().await.remove(&uri);
        self.client.publish_diagnostics(uri, Vec::new()).await;
    }

    /// Validate one document in the background
    fn spawn_validate_single(&self, uri: Url) {
        let backend = self.clone();
        tokio::spawn(async move { backend.validate_single(uri).await });
    }

    /// Revalidate every open document in the background
    fn spawn_validate_many(&self) {
        let backend = self.clone();
        tokio::spawn(async move { backend.validate_many().await });
    }

    /// Watch the workspace ourselves when the client can't do it for us
    async fn start_workspace_watcher(&self) {
        let Some(root) = self.workspace.read().await.root.clone() else {
            return;
        };

        let (watcher, mut events) = match WorkspaceWatcher::start(&root, &self.config.watch_files) {
            Ok(started) => started,
            Err(e) => {
                self.client
                    .log_message(
                        MessageType::WARNING,
                        format!("Failed to watch {}: {}", root.display(), e),
                    )
                    .await;
                return;
            }
        };
        *self.watcher.lock().await = Some(watcher);

        let backend = self.clone();
        tokio::spawn(async move {
            while let Some(path) = events.recv().await {
                // One revalidation covers a burst of events
                while events.try_recv().is_ok() {}
                log::info!("{} changed, revalidating open documents", path.display());
                backend.validate_many().await;
            }
        });
    }
}

fn workspace_root(params: &InitializeParams) -> Option<PathBuf> {
    #[allow(deprecated)]
    let root_path = params.root_path.as_ref().map(PathBuf::from);

    #[allow(deprecated)]
    let root_uri = params.root_uri.as_ref();

    root_uri
        .or_else(|| {
            params
                .workspace_folders
                .as_ref()
                .and_then(|folders| folders.first())
                .map(|folder| &folder.uri)
        })
        .and_then(|uri| uri.to_file_path().ok())
        .or(root_path)
}

fn supports_dynamic_watch(params: &InitializeParams) -> bool {
    params
        .capabilities
        .workspace
        .as_ref()
        .and_then(|workspace| workspace.did_change_watched_files.as_ref())
        .and_then(|watched| watched.dynamic_registration)
        .unwrap_or(false)
}

/// The structured error returned from a failed initialize
pub fn initialize_error(error: &LoadError) -> RpcError {
    RpcError {
        code: ErrorCode::ServerError(INITIALIZE_ERROR_CODE),
        message: error.to_string().into(),
        data: Some(json!({ "retry": error.retry() })),
    }
}

#[tower_lsp::async_trait]
impl<N: Notifier> LanguageServer for Backend<N> {
    async fn initialize(&self, params: InitializeParams) -> LspResult<InitializeResult> {
        {
            let mut state = self.state.write().await;
            // The loaded engine belongs to the workspace it was loaded for
            if state.is_ready() {
                return Ok(Self::initialize_result());
            }
            *state = ServerState::Initializing;
        }

        let root = workspace_root(&params);
        *self.workspace.write().await = Workspace {
            root: root.clone(),
            dynamic_watch_registration: supports_dynamic_watch(&params),
        };

        match self.loader.load(root.as_deref()).await {
            Ok(engine) => {
                log::info!("Linting engine {} ready", engine.name());
                *self.state.write().await = ServerState::Ready(engine);
                Ok(Self::initialize_result())
            }
            Err(e) => {
                log::error!("{}", e);
                *self.state.write().await = ServerState::Failed { retry: e.retry() };
                Err(initialize_error(&e))
            }
        }
    }

    async fn initialized(&self, _: InitializedParams) {
        let dynamic = self.workspace.read().await.dynamic_watch_registration;
        let registered = dynamic
            && self
                .client
                .register_file_watchers(self.config.watch_globs())
                .await;

        if !registered {
            self.start_workspace_watcher().await;
        }

        self.client
            .log_message(MessageType::INFO, "standard-language-server initialized".to_string())
            .await;
    }

    async fn shutdown(&self) -> LspResult<()> {
        self.watcher.lock().await.take();
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let doc = params.text_document;
        self.open_document(doc.uri.clone(), doc.text, doc.version)
            .await;
        self.spawn_validate_single(doc.uri);
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        if let Some(change) = params.content_changes.into_iter().last() {
            self.open_document(uri.clone(), change.text, params.text_document.version)
                .await;
            self.spawn_validate_single(uri);
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        self.close_document(params.text_document.uri).await;
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        let generation = {
            let mut settings = self.settings.write().await;
            settings.apply(&params.settings);
            settings.generation
        };
        log::info!("Settings updated (generation {})", generation);
        self.spawn_validate_many();
    }

    async fn did_change_watched_files(&self, params: DidChangeWatchedFilesParams) {
        log::info!(
            "{} watched file(s) changed, revalidating open documents",
            params.changes.len()
        );
        self.spawn_validate_many();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_prefers_uri() {
        #[allow(deprecated)]
        let params = InitializeParams {
            root_uri: Some(Url::parse("file:///work/app").unwrap()),
            root_path: Some("/elsewhere".to_string()),
            ..Default::default()
        };
        assert_eq!(workspace_root(&params), Some(PathBuf::from("/work/app")));
    }

    #[test]
    fn test_root_falls_back_to_path() {
        #[allow(deprecated)]
        let params = InitializeParams {
            root_path: Some("/elsewhere".to_string()),
            ..Default::default()
        };
        assert_eq!(workspace_root(&params), Some(PathBuf::from("/elsewhere")));
        assert_eq!(workspace_root(&InitializeParams::default()), None);
    }

    #[test]
    fn test_initialize_error_shape() {
        let error = initialize_error(&LoadError::MissingLintText {
            module: "standard".to_string(),
        });
        assert_eq!(error.code, ErrorCode::ServerError(99));
        assert_eq!(error.data, Some(json!({ "retry": false })));
        assert!(error.message.contains("lintText"));
    }
}
