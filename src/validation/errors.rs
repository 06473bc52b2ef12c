//! User-facing validation errors.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use tower_lsp::lsp_types::Url;

use crate::engine::EngineError;

static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r?\n").expect("valid line break pattern"));

const INTERNAL_PREFIX: &str = "CLI: ";

/// Turn a validation failure into a single-line message for the user
pub fn user_message(error: &EngineError, uri: &Url) -> String {
    match error.message() {
        Some(message) => {
            let message = LINE_BREAK.replace_all(&message, " ");
            let message: &str = &message;
            message
                .strip_prefix(INTERNAL_PREFIX)
                .unwrap_or(message)
                .to_string()
        }
        None => {
            let path = uri
                .to_file_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|_| uri.to_string());
            format!(
                "An unknown error occurred while validating file: {}",
                path
            )
        }
    }
}

/// Collects batch failures so each distinct message is shown once
#[derive(Debug, Default)]
pub struct ErrorMessageTracker {
    messages: BTreeSet<String>,
}

impl ErrorMessageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, message: String) {
        self.messages.insert(message);
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Distinct messages, ready to be sent
    pub fn into_messages(self) -> impl Iterator<Item = String> {
        self.messages.into_iter()
    }
}
