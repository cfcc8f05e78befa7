use log::{debug, error, warn};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;

/// Outcome of handing a request to an [`OutputChannel`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Admission {
    Accepted,
    /// A job was already queued or running; the new request was discarded.
    Dropped,
    /// The channel is switched off.
    Muted,
}

impl Admission {
    pub fn accepted(&self) -> bool {
        matches!(self, Admission::Accepted)
    }
}

/// Fire-and-forget output lane with a single slot.
///
/// At most one job exists at any time, counting both the queued and the
/// running one. Submitting while the slot is taken drops the new request;
/// stale alerts are worth less than nothing, so nothing is ever queued
/// behind a running job. Jobs always run to completion.
pub struct OutputChannel<R: Send + 'static> {
    name: &'static str,
    sender: mpsc::Sender<R>,
    slot_taken: Arc<AtomicBool>,
    dropped: AtomicU64,
    worker: JoinHandle<()>,
}

impl<R: Send + 'static> OutputChannel<R> {
    /// Spawns the worker on the current tokio runtime. `handler` runs on the
    /// blocking pool, one request at a time.
    pub fn spawn<F>(name: &'static str, handler: F) -> Self
    where
        F: Fn(R) + Send + Sync + 'static,
    {
        let (sender, mut receiver) = mpsc::channel::<R>(1);
        let slot_taken = Arc::new(AtomicBool::new(false));
        let handler = Arc::new(handler);

        let worker = {
            let slot_taken = slot_taken.clone();
            tokio::spawn(async move {
                while let Some(request) = receiver.recv().await {
                    let handler = handler.clone();
                    if let Err(e) = tokio::task::spawn_blocking(move || handler(request)).await {
                        error!("{} output job failed to complete: {}", name, e);
                    }
                    slot_taken.store(false, Ordering::Release);
                }
                debug!("{} output worker stopped", name);
            })
        };

        Self {
            name,
            sender,
            slot_taken,
            dropped: AtomicU64::new(0),
            worker,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Never blocks.
    pub fn submit(&self, request: R) -> Admission {
        if self
            .slot_taken
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            debug!("{} channel busy, dropping request", self.name);
            return Admission::Dropped;
        }

        match self.sender.try_send(request) {
            Ok(()) => Admission::Accepted,
            Err(TrySendError::Full(_)) | Err(TrySendError::Closed(_)) => {
                self.slot_taken.store(false, Ordering::Release);
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!("{} channel refused a request", self.name);
                Admission::Dropped
            }
        }
    }

    pub fn is_busy(&self) -> bool {
        self.slot_taken.load(Ordering::Acquire)
    }

    /// Number of requests discarded since the channel was spawned.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Lets the in-flight job finish, then stops the worker.
    pub async fn shutdown(self) -> anyhow::Result<()> {
        let Self { sender, worker, .. } = self;
        drop(sender);
        worker.await?;
        Ok(())
    }
}
