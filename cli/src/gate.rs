//! Mutual exclusion around package-manager invocations.
//!
//! Homebrew keeps its own exclusive file lock and fails outright when a
//! second process runs concurrently. Every `brew` call made by the
//! provisioner runs inside [`BrewGate::with`], turning that contention into
//! queuing. The gate is owned by the run and handed to components by
//! reference; it is held for exactly one command, never across status
//! checks, filesystem probes, or retry sleeps.
use std::sync::{Mutex, PoisonError};

/// Serializes package-manager calls within one run.
#[derive(Debug, Default)]
pub struct BrewGate {
    lock: Mutex<()>,
}

impl BrewGate {
    /// Create an unlocked gate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the gate.
    ///
    /// A poisoned gate (a previous holder panicked) is recovered, since the
    /// guarded resource is external and carries no in-process state.
    pub fn with<T>(&self, f: impl FnOnce() -> T) -> T {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }

    /// Whether some caller currently holds the gate.
    #[cfg(test)]
    pub(crate) fn is_held(&self) -> bool {
        self.lock.try_lock().is_err()
    }
}
