//! Shared fakes for driving the backend without an editor or Node.js
#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde_json::{json, Value};
use standard_language_server::lsp::{Backend, Notifier};
use standard_language_server::{
    Config, EngineError, EngineLoader, LintEngine, LoadError, PendingLint,
};
use tokio::sync::Notify;
use tower_lsp::lsp_types::{Diagnostic, MessageType, Url};

/// Engine whose findings are derived from the text:
/// - `sync-fail: <msg>` fails before starting,
/// - `async-fail: <msg>` fails once running,
/// - `raise: <msg>` throws, which only surfaces once running,
/// - otherwise every `;` is an error and every `warn` a warning.
#[derive(Default)]
pub struct FakeEngine {
    calls: Mutex<Vec<(String, Value)>>,
    gate: Option<Arc<Notify>>,
}

impl FakeEngine {
    /// An engine whose calls only finish once `gate` is notified
    pub fn gated(gate: Arc<Notify>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            gate: Some(gate),
        }
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }
}

fn report_for(text: &str) -> Value {
    let mut messages = Vec::new();
    for (index, line) in text.lines().enumerate() {
        if let Some(column) = line.find(';') {
            messages.push(json!({
                "line": index + 1,
                "column": column + 1,
                "severity": 2,
                "ruleId": "semi",
                "message": "Extra semicolon.",
            }));
        }
        if let Some(column) = line.find("warn") {
            messages.push(json!({
                "line": index + 1,
                "column": column + 1,
                "severity": 1,
                "ruleId": "no-console",
                "message": "Unexpected console statement.",
            }));
        }
    }

    json!({
        "errorCount": messages.len(),
        "warningCount": 0,
        "results": [{ "filePath": "<text>", "messages": messages }],
    })
}

impl LintEngine for FakeEngine {
    fn name(&self) -> &str {
        "standard"
    }

    fn lint_text(&self, text: String, options: Value) -> Result<PendingLint, EngineError> {
        self.calls.lock().unwrap().push((text.clone(), options));

        if let Some(message) = text.strip_prefix("sync-fail: ") {
            return Err(EngineError::Lint(Some(message.to_string())));
        }

        let gate = self.gate.clone();
        Ok(Box::pin(async move {
            if let Some(gate) = gate {
                gate.notified().await;
            }
            if let Some(message) = text.strip_prefix("async-fail: ") {
                return Err(EngineError::Lint(Some(message.to_string())));
            }
            if let Some(message) = text.strip_prefix("raise: ") {
                return Err(EngineError::Raised(Some(message.to_string())));
            }
            Ok(report_for(&text))
        }))
    }
}

pub enum LoadOutcome {
    Ready(Arc<FakeEngine>),
    NotFound,
    MissingLintText,
}

pub struct FakeLoader {
    outcome: LoadOutcome,
    loads: AtomicUsize,
}

impl FakeLoader {
    pub fn new(outcome: LoadOutcome) -> Self {
        Self {
            outcome,
            loads: AtomicUsize::new(0),
        }
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[tower_lsp::async_trait]
impl EngineLoader for FakeLoader {
    async fn load(&self, _root: Option<&Path>) -> Result<Arc<dyn LintEngine>, LoadError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        match &self.outcome {
            LoadOutcome::Ready(engine) => {
                let engine: Arc<dyn LintEngine> = engine.clone();
                Ok(engine)
            }
            LoadOutcome::NotFound => Err(LoadError::NotFound {
                module: "standard".to_string(),
            }),
            LoadOutcome::MissingLintText => Err(LoadError::MissingLintText {
                module: "standard".to_string(),
            }),
        }
    }
}

#[derive(Debug, Default)]
struct Recorded {
    published: Vec<(Url, Vec<Diagnostic>)>,
    errors: Vec<String>,
    logs: Vec<String>,
    registrations: Vec<Vec<String>>,
    refuse_registration: bool,
}

/// Notifier that remembers everything sent to the editor
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    recorded: Arc<Mutex<Recorded>>,
}

impl RecordingNotifier {
    /// A notifier whose client turns down watcher registration
    pub fn refusing_registration() -> Self {
        let notifier = Self::default();
        notifier.recorded.lock().unwrap().refuse_registration = true;
        notifier
    }

    pub fn logs(&self) -> Vec<String> {
        self.recorded.lock().unwrap().logs.clone()
    }

    pub fn published(&self) -> Vec<(Url, Vec<Diagnostic>)> {
        self.recorded.lock().unwrap().published.clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.recorded.lock().unwrap().errors.clone()
    }

    pub fn registrations(&self) -> Vec<Vec<String>> {
        self.recorded.lock().unwrap().registrations.clone()
    }

    /// Wait until at least `count` diagnostic sets were published
    pub async fn wait_for_published(&self, count: usize) -> Vec<(Url, Vec<Diagnostic>)> {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let published = self.published();
            if published.len() >= count || Instant::now() > deadline {
                return published;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

#[tower_lsp::async_trait]
impl Notifier for RecordingNotifier {
    async fn publish_diagnostics(&self, uri: Url, diagnostics: Vec<Diagnostic>) {
        self.recorded
            .lock()
            .unwrap()
            .published
            .push((uri, diagnostics));
    }

    async fn show_error(&self, message: String) {
        self.recorded.lock().unwrap().errors.push(message);
    }

    async fn log_message(&self, _typ: MessageType, message: String) {
        self.recorded.lock().unwrap().logs.push(message);
    }

    async fn register_file_watchers(&self, globs: Vec<String>) -> bool {
        let mut recorded = self.recorded.lock().unwrap();
        recorded.registrations.push(globs);
        !recorded.refuse_registration
    }
}

pub fn uri(name: &str) -> Url {
    Url::parse(&format!("file:///work/{}", name)).unwrap()
}

pub fn backend(loader: Arc<FakeLoader>) -> (Backend<RecordingNotifier>, RecordingNotifier) {
    let notifier = RecordingNotifier::default();
    let backend = Backend::with_loader(notifier.clone(), Config::default(), loader);
    (backend, notifier)
}

/// A backend that already went through a successful initialize
pub async fn ready_backend(
    engine: Arc<FakeEngine>,
) -> (Backend<RecordingNotifier>, RecordingNotifier) {
    use tower_lsp::LanguageServer;

    let (backend, notifier) = backend(Arc::new(FakeLoader::new(LoadOutcome::Ready(engine))));
    backend
        .initialize(Default::default())
        .await
        .expect("initialize succeeds");
    (backend, notifier)
}
