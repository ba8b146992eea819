//! Progress event delivery for a running import.

use crate::models::{ImportEvent, ImportOutcome, ImportProgress, ImportStage};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, trace};

/// Sends [`ImportEvent`]s for one import.
///
/// Progress is forwarded only when `(step, percent)` strictly increases, so
/// consumers never see a stage go backwards or repeat itself. Cloning shares
/// the same ordering state.
#[derive(Debug, Clone)]
pub struct ProgressSink {
    sender: UnboundedSender<ImportEvent>,
    last: Arc<Mutex<Option<(u8, u8)>>>,
}

impl ProgressSink {
    pub fn new(sender: UnboundedSender<ImportEvent>) -> Self {
        Self {
            sender,
            last: Arc::new(Mutex::new(None)),
        }
    }

    /// Report progress within a stage; returns whether the event was sent
    pub fn report(&self, stage: ImportStage, percent: u8, detail: impl Into<String>) -> bool {
        let progress = ImportProgress::new(stage, percent, detail);
        let key = (progress.step, progress.percent);

        {
            let mut last = match self.last.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if last.is_some_and(|previous| key <= previous) {
                trace!("Dropping non-increasing progress {:?}", key);
                return false;
            }
            *last = Some(key);
        }

        debug!(
            "[{}/{}] {} {}% {}",
            progress.step, progress.total_steps, progress.step_name, progress.percent, progress.detail
        );
        self.send(ImportEvent::Progress(progress))
    }

    /// Report a stage as complete
    pub fn complete(&self, stage: ImportStage, detail: impl Into<String>) -> bool {
        self.report(stage, 100, detail)
    }

    /// Report `done` of `total` units within a stage
    pub fn report_fraction(
        &self,
        stage: ImportStage,
        done: usize,
        total: usize,
        detail: impl Into<String>,
    ) -> bool {
        self.report(stage, fraction_percent(done, total), detail)
    }

    /// Deliver the terminal event
    pub fn finish(&self, outcome: ImportOutcome) {
        self.send(ImportEvent::Finished(outcome));
    }

    fn send(&self, event: ImportEvent) -> bool {
        if self.sender.send(event).is_err() {
            debug!("Import event receiver dropped");
            return false;
        }
        true
    }
}

/// Percentage of `done` out of `total`; an empty total counts as complete
pub fn fraction_percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done.min(total) * 100) / total) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn drain(receiver: &mut mpsc::UnboundedReceiver<ImportEvent>) -> Vec<(u8, u8)> {
        let mut keys = Vec::new();
        while let Ok(event) = receiver.try_recv() {
            if let ImportEvent::Progress(p) = event {
                keys.push((p.step, p.percent));
            }
        }
        keys
    }

    #[test]
    fn test_non_increasing_progress_is_dropped() {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let sink = ProgressSink::new(sender);

        assert!(sink.report(ImportStage::Extracting, 10, "a"));
        assert!(!sink.report(ImportStage::Extracting, 10, "dup"));
        assert!(!sink.report(ImportStage::Extracting, 5, "back"));
        assert!(sink.complete(ImportStage::Extracting, "done"));
        assert!(sink.report(ImportStage::DetectingStructure, 0, "next"));

        assert_eq!(drain(&mut receiver), vec![(1, 10), (1, 100), (2, 0)]);
    }

    #[test]
    fn test_clones_share_ordering() {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let sink = ProgressSink::new(sender);
        let other = sink.clone();

        sink.report(ImportStage::Indexing, 50, "");
        other.report(ImportStage::Indexing, 40, "");

        assert_eq!(drain(&mut receiver), vec![(5, 50)]);
    }

    #[test]
    fn test_fraction_percent() {
        assert_eq!(fraction_percent(0, 10), 0);
        assert_eq!(fraction_percent(5, 10), 50);
        assert_eq!(fraction_percent(12, 10), 100);
        assert_eq!(fraction_percent(0, 0), 100);
    }
}
