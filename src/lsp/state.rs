//! Server lifecycle state.

use std::fmt;
use std::sync::Arc;

use crate::engine::LintEngine;

/// Where the server is in its lifecycle.
///
/// `Ready` holds the engine handle; once there it never changes.
#[derive(Clone, Default)]
pub enum ServerState {
    #[default]
    Uninitialized,
    Initializing,
    Ready(Arc<dyn LintEngine>),
    /// Loading the engine failed; only a new initialize leaves this state
    Failed { retry: bool },
}

impl ServerState {
    /// The engine, when validation is possible
    pub fn engine(&self) -> Option<Arc<dyn LintEngine>> {
        match self {
            ServerState::Ready(engine) => Some(engine.clone()),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ServerState::Ready(_))
    }
}

impl fmt::Debug for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerState::Uninitialized => f.write_str("Uninitialized"),
            ServerState::Initializing => f.write_str("Initializing"),
            ServerState::Ready(engine) => f.debug_tuple("Ready").field(&engine.name()).finish(),
            ServerState::Failed { retry } => {
                f.debug_struct("Failed").field("retry", retry).finish()
            }
        }
    }
}
