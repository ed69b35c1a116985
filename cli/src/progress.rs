//! Best-effort progress fan-out from the orchestrator to one consumer.
//!
//! Publishing never blocks: when the bounded queue is full the update is
//! dropped. Progress is advisory; the ledger is authoritative.
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};

use crate::config::{Mechanism, Package};
use crate::tasks::ledger::InstallStatus;

/// Queue capacity between producers and the consumer loop.
pub const PROGRESS_CAPACITY: usize = 128;

/// A transient notification about one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    /// Step the update is about.
    pub package: Package,
    /// New lifecycle state.
    pub status: InstallStatus,
    /// Short outcome text.
    pub message: String,
    /// Classified error; empty unless failed.
    pub error: String,
}

/// Producer half of the progress channel.
///
/// Cloned into every worker; the channel closes when the last clone drops.
#[derive(Debug, Clone)]
pub struct ProgressSender {
    tx: SyncSender<ProgressUpdate>,
    dropped: Arc<AtomicUsize>,
}

/// Create a channel with [`PROGRESS_CAPACITY`] slots.
#[must_use]
pub fn channel() -> (ProgressSender, Receiver<ProgressUpdate>) {
    with_capacity(PROGRESS_CAPACITY)
}

/// Create a channel with an explicit capacity.
#[must_use]
pub fn with_capacity(capacity: usize) -> (ProgressSender, Receiver<ProgressUpdate>) {
    let (tx, rx) = mpsc::sync_channel(capacity);
    (
        ProgressSender {
            tx,
            dropped: Arc::new(AtomicUsize::new(0)),
        },
        rx,
    )
}

impl ProgressSender {
    /// Publish without blocking. Full queue: dropped. No consumer: ignored.
    pub fn publish(&self, update: ProgressUpdate) {
        match self.tx.try_send(update) {
            Ok(()) | Err(TrySendError::Disconnected(_)) => {}
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Publish a status change for `package`.
    pub fn emit(&self, package: &Package, status: InstallStatus, message: &str, error: &str) {
        self.publish(ProgressUpdate {
            package: package.clone(),
            status,
            message: message.to_string(),
            error: error.to_string(),
        });
    }

    /// Updates dropped because the queue was full.
    #[must_use]
    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Render an update as a single line:
/// `<name> [(<mechanism>)] [[<category>]]: <status>[ - <message-or-error>]`.
///
/// The mechanism suffix is omitted for system and task entries; the
/// category only appears when `verbose`.
#[must_use]
pub fn format_progress(update: &ProgressUpdate, verbose: bool) -> String {
    let status = match update.status {
        InstallStatus::Running => "...",
        other => other.as_str(),
    };

    let pkg = &update.package;
    let mut name = pkg.name.clone();
    if !matches!(pkg.mechanism, Mechanism::System | Mechanism::Task) {
        name = format!("{name} ({})", pkg.mechanism);
    }
    if verbose && !pkg.category.is_empty() {
        name = format!("{name} [{}]", pkg.category);
    }

    if !update.message.is_empty() {
        format!("{name}: {status} - {}", update.message)
    } else if !update.error.is_empty() {
        format!("{name}: {status} - {}", update.error)
    } else {
        format!("{name}: {status}")
    }
}
