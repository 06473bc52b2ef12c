use futures_util::future::join_all;
use tower_lsp::lsp_types::Url;

use crate::engine::{EngineError, PendingLint};
use crate::lsp::backend::Backend;
use crate::lsp::client::Notifier;
use crate::validation::{translate, user_message, ErrorMessageTracker};

/// Trait for handling document validation
#[tower_lsp::async_trait]
pub trait HandleValidation {
    /// Validate one document and publish its diagnostics.
    ///
    /// Failures are returned, not shown.
    async fn validate(&self, uri: &Url) -> Result<(), EngineError>;

    /// Validate one document, showing any failure right away
    async fn validate_single(&self, uri: Url);

    /// Validate every open document, showing each distinct failure once at the end
    async fn validate_many(&self);
}

/// A validation handed to the engine and not yet published
pub struct InFlight {
    uri: Url,
    source: String,
    generation: u64,
    /// `None` when validation is disabled
    pending: Option<PendingLint>,
}

impl<N: Notifier> Backend<N> {
    /// Snapshot the document and settings, then start the engine.
    ///
    /// Returns `Ok(None)` when there is nothing to do: the engine is not
    /// loaded or the document is not open.
    async fn dispatch(&self, uri: &Url) -> Result<Option<InFlight>, EngineError> {
        let Some(engine) = self.state.read().await.engine() else {
            log::debug!("Skipping validation of {}: engine not loaded", uri);
            return Ok(None);
        };

        let Some(content) = self
            .documents
            .read()
            .await
            .get(uri)
            .map(|doc| doc.content.clone())
        else {
            return Ok(None);
        };

        let settings = self.settings.read().await.clone();

        let pending = if settings.enabled {
            Some(engine.lint_text(content, settings.options)?)
        } else {
            None
        };

        Ok(Some(InFlight {
            uri: uri.clone(),
            source: engine.name().to_string(),
            generation: settings.generation,
            pending,
        }))
    }

    /// Wait for the engine and publish the outcome, even when empty
    async fn complete(&self, in_flight: InFlight) -> Result<(), EngineError> {
        let InFlight {
            uri,
            source,
            generation,
            pending,
        } = in_flight;

        let outcome = match pending {
            Some(pending) => pending.await.map(Some),
            None => Ok(None),
        };

        // A throw surfaces like a dispatch failure: nothing is published
        let outcome = match outcome {
            Err(e) if e.is_raised() => return Err(e),
            other => other,
        };

        if self.settings.read().await.generation != generation {
            log::debug!("Dropping result for {}: settings changed meanwhile", uri);
            return Ok(());
        }

        let (report, result) = match outcome {
            Ok(report) => (report, Ok(())),
            Err(e) => (None, Err(e)),
        };

        let diagnostics = translate(report.as_ref(), &source);
        log::debug!("Publishing {} diagnostic(s) for {}", diagnostics.len(), uri);
        self.client.publish_diagnostics(uri, diagnostics).await;

        result
    }
}

#[tower_lsp::async_trait]
impl<N: Notifier> HandleValidation for Backend<N> {
    async fn validate(&self, uri: &Url) -> Result<(), EngineError> {
        match self.dispatch(uri).await? {
            Some(in_flight) => self.complete(in_flight).await,
            None => Ok(()),
        }
    }

    async fn validate_single(&self, uri: Url) {
        if let Err(e) = self.validate(&uri).await {
            log::warn!("Validation of {} failed: {}", uri, e);
            self.client.show_error(user_message(&e, &uri)).await;
        }
    }

    async fn validate_many(&self) {
        let uris: Vec<Url> = self.documents.read().await.keys().cloned().collect();
        let mut tracker = ErrorMessageTracker::new();

        // Start everything before waiting on anything
        let mut in_flight = Vec::with_capacity(uris.len());
        for uri in uris {
            match self.dispatch(&uri).await {
                Ok(Some(validation)) => in_flight.push(validation),
                Ok(None) => {}
                Err(e) => {
                    log::warn!("Validation of {} failed: {}", uri, e);
                    tracker.add(user_message(&e, &uri));
                }
            }
        }

        let outcomes = join_all(in_flight.into_iter().map(|validation| async move {
            let uri = validation.uri.clone();
            (uri, self.complete(validation).await)
        }))
        .await;

        for (uri, outcome) in outcomes {
            if let Err(e) = outcome {
                log::warn!("Validation of {} failed: {}", uri, e);
                tracker.add(user_message(&e, &uri));
            }
        }

        for message in tracker.into_messages() {
            self.client.show_error(message).await;
        }
    }
}
