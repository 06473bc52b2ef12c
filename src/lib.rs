//! Standard Language Server
//!
//! A Language Server Protocol bridge that runs open JavaScript documents
//! through a pluggable linting engine and publishes the findings as
//! diagnostics.
//!
//! This library provides:
//! - Engine resolution and the Node.js-backed engine
//! - Translation of engine reports into diagnostics
//! - LSP protocol implementation
//! - Configuration management

pub mod config;
pub mod engine;
mod lenient;
pub mod lsp;
pub mod settings;
pub mod validation;

// Re-exports for clean public API
pub use config::Config;
pub use engine::{EngineError, EngineLoader, LintEngine, LoadError, PendingLint};
pub use settings::Settings;
pub use validation::{translate, ErrorMessageTracker};
