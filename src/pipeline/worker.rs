//! Background adapter around [`run_import`].

use super::{ImportRequest, ProgressSink, run_import};
use crate::error::EaipError;
use crate::models::{ImportEvent, ImportOutcome};
use crate::pdf::PdfEngine;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Runs at most one import at a time in the background
#[derive(Clone, Default)]
pub struct ImportWorker {
    active: Arc<AtomicBool>,
    engine: Option<Arc<dyn PdfEngine>>,
}

impl std::fmt::Debug for ImportWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImportWorker")
            .field("active", &self.is_active())
            .field("engine", &self.engine.is_some())
            .finish()
    }
}

/// Event stream and task of one started import
#[derive(Debug)]
pub struct ImportHandle {
    events: UnboundedReceiver<ImportEvent>,
    task: JoinHandle<()>,
}

impl ImportHandle {
    /// Next event; `None` once the `Finished` event has been received
    pub async fn recv(&mut self) -> Option<ImportEvent> {
        self.events.recv().await
    }

    /// Skip remaining progress and return the outcome once the worker is idle
    pub async fn wait(mut self) -> ImportOutcome {
        let mut outcome = None;
        while let Some(event) = self.events.recv().await {
            if let ImportEvent::Finished(finished) = event {
                outcome = Some(finished);
                break;
            }
        }
        if let Err(e) = self.task.await {
            warn!("Import task did not shut down cleanly: {}", e);
        }
        outcome.unwrap_or_else(|| ImportOutcome::failed("Import ended without reporting a result"))
    }

    /// Collect every event up to and including `Finished`
    pub async fn collect(mut self) -> Vec<ImportEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.events.recv().await {
            events.push(event);
        }
        if let Err(e) = self.task.await {
            warn!("Import task did not shut down cleanly: {}", e);
        }
        events
    }
}

impl ImportWorker {
    /// Worker without a PDF engine; merging is disabled
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_engine(mut self, engine: Arc<dyn PdfEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Start an import in the background.
    ///
    /// Returns `None` without doing anything when an import is already
    /// running. Must be called from within a tokio runtime. The handle
    /// yields progress events followed by exactly one `Finished` event.
    pub fn start(&self, request: ImportRequest) -> Option<ImportHandle> {
        if self
            .active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!(
                "Import already in progress, ignoring {}",
                request.archive_path.display()
            );
            return None;
        }

        let (sender, events) = mpsc::unbounded_channel();
        let sink = ProgressSink::new(sender);
        let active = self.active.clone();
        let engine = self.engine.clone();

        let task = tokio::spawn(async move {
            let archive = request.archive_path.clone();
            let import_sink = sink.clone();
            let import =
                tokio::spawn(async move { run_import(request, engine, &import_sink).await });

            let outcome = match import.await {
                Ok(Ok(summary)) => summary.to_outcome(),
                Ok(Err(e)) => {
                    error!(
                        "Import of {} failed ({:?}): {}",
                        archive.display(),
                        e.class(),
                        e
                    );
                    ImportOutcome::failed(e.user_message())
                }
                Err(e) => {
                    let e = EaipError::TaskFailed {
                        reason: e.to_string(),
                    };
                    error!("Import of {} aborted: {}", archive.display(), e);
                    ImportOutcome::failed(e.user_message())
                }
            };

            info!("{}", outcome.message);
            // a new import may only start once this one has reported
            sink.finish(outcome);
            active.store(false, Ordering::SeqCst);
        });

        Some(ImportHandle { events, task })
    }
}
