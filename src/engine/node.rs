//! Node Engine
//!
//! Runs the engine package inside a `node` child process through a small
//! bridge script. Every lint call gets its own process, so a hung call only
//! withholds diagnostics for the document it was started for.

use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::{EngineError, EngineLoader, LintEngine, LoadError, PendingLint, ResolvedModule};
use crate::config::Config;
use crate::lenient::lenient;

const BRIDGE_SCRIPT: &str = include_str!("../../resources/bridge.js");

const MODULE_ENV: &str = "STANDARD_LS_MODULE";
const MODE_ENV: &str = "STANDARD_LS_MODE";

#[derive(Debug, Clone, Copy)]
enum BridgeMode {
    Probe,
    Lint,
}

impl BridgeMode {
    fn as_str(self) -> &'static str {
        match self {
            BridgeMode::Probe => "probe",
            BridgeMode::Lint => "lint",
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProbeReply {
    #[serde(rename = "lintText")]
    lint_text: bool,
}

#[derive(Debug, Default, Deserialize)]
struct BridgeFailure {
    #[serde(default, deserialize_with = "lenient")]
    message: Option<String>,
}

/// What the bridge writes after a lint call
#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum BridgeReply {
    Report(Value),
    Error(BridgeFailure),
    /// `lintText` threw instead of taking the text
    Raised(BridgeFailure),
}

/// Linting engine backed by a Node package
#[derive(Debug, Clone)]
pub struct NodeEngine {
    node: String,
    module: ResolvedModule,
}

impl NodeEngine {
    pub fn new(node: impl Into<String>, module: ResolvedModule) -> Self {
        Self {
            node: node.into(),
            module,
        }
    }

    pub fn module(&self) -> &ResolvedModule {
        &self.module
    }

    fn command(&self, mode: BridgeMode) -> Command {
        let mut command = Command::new(&self.node);
        command
            .arg("-e")
            .arg(BRIDGE_SCRIPT)
            .env(MODULE_ENV, &self.module.path)
            .env(MODE_ENV, mode.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = self.module.path.parent() {
            command.current_dir(dir);
        }
        command
    }

    /// Check that the package loads and exports a `lintText` function
    pub async fn probe(&self) -> Result<(), LoadError> {
        let unloadable = |reason: String| LoadError::Unloadable {
            module: self.module.name.clone(),
            node: self.node.clone(),
            reason,
        };

        let output = self
            .command(BridgeMode::Probe)
            .output()
            .await
            .map_err(|e| unloadable(e.to_string()))?;

        if !output.status.success() {
            return Err(unloadable(failure_text(&output).unwrap_or_else(|| {
                format!("node exited with {}", output.status)
            })));
        }

        let reply: ProbeReply = serde_json::from_slice(&output.stdout)
            .map_err(|e| unloadable(format!("unexpected probe reply: {}", e)))?;

        if reply.lint_text {
            Ok(())
        } else {
            Err(LoadError::MissingLintText {
                module: self.module.name.clone(),
            })
        }
    }
}

impl LintEngine for NodeEngine {
    fn name(&self) -> &str {
        &self.module.name
    }

    fn lint_text(&self, text: String, options: Value) -> Result<PendingLint, EngineError> {
        let options = match options {
            Value::Null => Value::Object(Default::default()),
            Value::Object(_) => options,
            other => return Err(EngineError::InvalidOptions(json_kind(&other).to_string())),
        };

        let request = serde_json::to_vec(&json!({ "text": text, "options": options }))
            .map_err(|e| EngineError::Protocol(e.to_string()))?;

        let mut child = self
            .command(BridgeMode::Lint)
            .stdin(Stdio::piped())
            .spawn()
            .map_err(|source| EngineError::Spawn {
                program: self.node.clone(),
                source,
            })?;

        Ok(Box::pin(async move {
            let mut stdin = child
                .stdin
                .take()
                .ok_or_else(|| EngineError::Protocol("engine stdin unavailable".to_string()))?;
            stdin.write_all(&request).await?;
            drop(stdin);

            let output = child.wait_with_output().await?;
            parse_lint_output(&output)
        }))
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn failure_text(output: &Output) -> Option<String> {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    (!stderr.is_empty()).then(|| stderr.to_string())
}

fn parse_lint_output(output: &Output) -> Result<Value, EngineError> {
    if output.stdout.is_empty() {
        return Err(EngineError::Lint(failure_text(output)));
    }

    match serde_json::from_slice::<BridgeReply>(&output.stdout) {
        Ok(BridgeReply::Report(report)) => Ok(report),
        Ok(BridgeReply::Error(failure)) => Err(EngineError::Lint(failure.message)),
        Ok(BridgeReply::Raised(failure)) => Err(EngineError::Raised(failure.message)),
        Err(e) => Err(EngineError::Protocol(e.to_string())),
    }
}

/// Resolves the configured package and probes it with `node`
#[derive(Debug, Clone)]
pub struct NodeLoader {
    node: String,
    module: String,
    module_dirs: Vec<PathBuf>,
}

impl NodeLoader {
    pub fn new(config: &Config) -> Self {
        Self {
            node: config.node_binary.clone(),
            module: config.engine_module.clone(),
            module_dirs: config.module_dirs.clone(),
        }
    }
}

#[tower_lsp::async_trait]
impl EngineLoader for NodeLoader {
    async fn load(&self, root: Option<&Path>) -> Result<Arc<dyn LintEngine>, LoadError> {
        let module = super::resolve_module(&self.module, root, &self.module_dirs).ok_or_else(
            || LoadError::NotFound {
                module: self.module.clone(),
            },
        )?;

        let engine = NodeEngine::new(self.node.clone(), module);
        engine.probe().await?;

        log::info!(
            "loaded {} {} from {}",
            engine.module().name,
            engine.module().version.as_deref().unwrap_or("(unknown version)"),
            engine.module().path.display()
        );

        Ok(Arc::new(engine))
    }
}
