//! Linting Engine
//!
//! The engine is an opaque capability: given text and options it produces a
//! report. This module defines that capability, the loader that obtains it
//! at initialize time, and the errors both can raise.

pub mod node;
pub mod resolve;

use std::path::Path;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use serde_json::Value;
use thiserror::Error;

pub use node::{NodeEngine, NodeLoader};
pub use resolve::{resolve_module, ResolvedModule};

/// A lint call that has been accepted by the engine and is still running
pub type PendingLint = BoxFuture<'static, Result<Value, EngineError>>;

/// Failures while linting a document
#[derive(Debug, Error)]
pub enum EngineError {
    /// Options must be an object (or null)
    #[error("Invalid options: expected an object but got {0}")]
    InvalidOptions(String),
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("I/O error while talking to the engine: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed engine reply: {0}")]
    Protocol(String),
    /// The engine reported a failure, with or without a message
    #[error("{}", .0.as_deref().unwrap_or("engine failure"))]
    Lint(Option<String>),
    /// The engine threw instead of accepting the text
    #[error("{}", .0.as_deref().unwrap_or("engine raised"))]
    Raised(Option<String>),
}

impl EngineError {
    /// The message to show the user, if the failure carries one
    pub fn message(&self) -> Option<String> {
        match self {
            EngineError::Lint(message) | EngineError::Raised(message) => message.clone(),
            other => Some(other.to_string()),
        }
    }

    /// Whether the failure happened before the engine took the text.
    ///
    /// Nothing is published for these; the previous diagnostics stay.
    pub fn is_raised(&self) -> bool {
        matches!(
            self,
            EngineError::InvalidOptions(_) | EngineError::Spawn { .. } | EngineError::Raised(_)
        )
    }
}

/// Failures while loading the engine
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(
        "Failed to load the {module} library. Please install {module} in your workspace folder using 'npm install {module}' and then press Retry."
    )]
    NotFound { module: String },
    #[error(
        "Failed to load the {module} library. Loading it with '{node}' failed: {reason}. Please check your installation and then press Retry."
    )]
    Unloadable {
        module: String,
        node: String,
        reason: String,
    },
    #[error("The {module} library doesn't export a lintText property.")]
    MissingLintText { module: String },
}

impl LoadError {
    /// Whether asking the user to retry initialization makes sense
    pub fn retry(&self) -> bool {
        !matches!(self, LoadError::MissingLintText { .. })
    }
}

/// The loaded linting capability.
///
/// `lint_text` returns synchronously once the engine has accepted the
/// text. An `Err` here means the call never started; failures after that
/// point are delivered through the returned future. An engine that can only
/// learn about a throw later reports it there as [`EngineError::Raised`].
pub trait LintEngine: Send + Sync {
    /// Name used as the `source` of published diagnostics
    fn name(&self) -> &str;

    fn lint_text(&self, text: String, options: Value) -> Result<PendingLint, EngineError>;
}

/// Obtains the engine once, at initialize time
#[tower_lsp::async_trait]
pub trait EngineLoader: Send + Sync {
    async fn load(&self, root: Option<&Path>) -> Result<Arc<dyn LintEngine>, LoadError>;
}
