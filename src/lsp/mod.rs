//! LSP Protocol Implementation
//!
//! Backend state, trigger handling and the messages sent back to the editor.

pub mod backend;
pub mod client;
pub mod document;
pub mod handlers;
pub mod server;
pub mod state;
pub mod watcher;

pub use backend::Backend;
pub use client::Notifier;
pub use handlers::HandleValidation;
pub use state::ServerState;
