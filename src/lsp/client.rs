//! Outgoing messages to the editor.

use tower_lsp::lsp_types::{
    Diagnostic, DidChangeWatchedFilesRegistrationOptions, FileSystemWatcher, GlobPattern,
    MessageType, Registration, Url,
};
use tower_lsp::Client;

const WATCHED_FILES_REGISTRATION: &str = "standard-ls/watched-files";

/// Everything the server sends to the editor on its own initiative
#[tower_lsp::async_trait]
pub trait Notifier: Clone + Send + Sync + 'static {
    /// Replace the diagnostics shown for `uri`; an empty set clears them
    async fn publish_diagnostics(&self, uri: Url, diagnostics: Vec<Diagnostic>);

    /// Show an error message to the user
    async fn show_error(&self, message: String);

    async fn log_message(&self, typ: MessageType, message: String);

    /// Ask the client to send `workspace/didChangeWatchedFiles` for `globs`.
    /// Returns false when the client refused.
    async fn register_file_watchers(&self, globs: Vec<String>) -> bool;
}

#[tower_lsp::async_trait]
impl Notifier for Client {
    async fn publish_diagnostics(&self, uri: Url, diagnostics: Vec<Diagnostic>) {
        Client::publish_diagnostics(self, uri, diagnostics, None).await;
    }

    async fn show_error(&self, message: String) {
        Client::show_message(self, MessageType::ERROR, message).await;
    }

    async fn log_message(&self, typ: MessageType, message: String) {
        Client::log_message(self, typ, message).await;
    }

    async fn register_file_watchers(&self, globs: Vec<String>) -> bool {
        let options = DidChangeWatchedFilesRegistrationOptions {
            watchers: globs
                .into_iter()
                .map(|glob| FileSystemWatcher {
                    glob_pattern: GlobPattern::String(glob),
                    kind: None,
                })
                .collect(),
        };

        let registration = Registration {
            id: WATCHED_FILES_REGISTRATION.to_string(),
            method: "workspace/didChangeWatchedFiles".to_string(),
            register_options: serde_json::to_value(options).ok(),
        };

        match self.register_capability(vec![registration]).await {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Client refused watched file registration: {}", e);
                false
            }
        }
    }
}
