//! Idempotent primitives over the outside world (check + apply pattern).
//!
//! Filesystem targets (directories, rendered dotfiles, symlinks, git
//! checkouts) implement [`Resource`]; the package manager is driven through
//! the [`brew::Brew`] client.
pub mod apps;
pub mod brew;
pub mod download;
pub mod fs;
pub mod git;

use std::path::PathBuf;

use anyhow::Result;

/// State of a resource (directory, file, checkout, ...).
///
/// # Examples
///
/// ```
/// use macsetup_cli::resources::ResourceState;
///
/// let missing = ResourceState::Missing;
/// let correct = ResourceState::Correct;
/// let wrong = ResourceState::Incorrect { current: "old contents".into() };
///
/// assert_ne!(missing, correct);
/// assert_eq!(correct, ResourceState::Correct);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceState {
    /// Resource does not exist.
    Missing,
    /// Resource exists and matches the desired state.
    Correct,
    /// Resource exists but does not match the desired state.
    Incorrect {
        /// Short description of what is there now.
        current: String,
    },
    /// Resource cannot be applied (e.g., a file sits where a directory belongs).
    Invalid {
        /// Reason why the resource cannot be applied.
        reason: String,
    },
}

/// Result of applying a resource change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceChange {
    /// Resource was created.
    Applied,
    /// Resource was replaced; the previous version was moved aside.
    Replaced {
        /// Where the previous version now lives.
        backup: PathBuf,
    },
    /// Resource was already correct (no change needed).
    AlreadyCorrect,
    /// Resource was skipped.
    Skipped {
        /// Reason why the resource was skipped.
        reason: String,
    },
}

/// A target that can report its state and converge to the desired one.
pub trait Resource {
    /// Human-readable description of this resource.
    fn description(&self) -> String;

    /// Check the current state of the resource.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be determined (I/O failure).
    fn current_state(&self) -> Result<ResourceState>;

    /// Converge the resource to its desired state.
    ///
    /// # Errors
    ///
    /// Returns an error if the change cannot be made.
    fn apply(&self) -> Result<ResourceChange>;

    /// Apply only if [`current_state`](Self::current_state) is not correct.
    ///
    /// # Errors
    ///
    /// Propagates errors from the state check or the apply.
    fn ensure(&self) -> Result<ResourceChange> {
        match self.current_state()? {
            ResourceState::Correct => Ok(ResourceChange::AlreadyCorrect),
            ResourceState::Invalid { reason } => Ok(ResourceChange::Skipped { reason }),
            ResourceState::Missing | ResourceState::Incorrect { .. } => self.apply(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Probe {
        state: ResourceState,
        applied: Cell<bool>,
    }

    impl Resource for Probe {
        fn description(&self) -> String {
            "probe".to_string()
        }
        fn current_state(&self) -> Result<ResourceState> {
            Ok(self.state.clone())
        }
        fn apply(&self) -> Result<ResourceChange> {
            self.applied.set(true);
            Ok(ResourceChange::Applied)
        }
    }

    fn probe(state: ResourceState) -> Probe {
        Probe {
            state,
            applied: Cell::new(false),
        }
    }

    #[test]
    fn ensure_skips_correct_resources() {
        let p = probe(ResourceState::Correct);
        assert_eq!(p.ensure().unwrap(), ResourceChange::AlreadyCorrect);
        assert!(!p.applied.get());
    }

    #[test]
    fn ensure_applies_missing_and_incorrect() {
        let p = probe(ResourceState::Missing);
        assert_eq!(p.ensure().unwrap(), ResourceChange::Applied);
        assert!(p.applied.get());

        let p = probe(ResourceState::Incorrect {
            current: "x".to_string(),
        });
        assert_eq!(p.ensure().unwrap(), ResourceChange::Applied);
    }

    #[test]
    fn ensure_reports_invalid_as_skipped() {
        let p = probe(ResourceState::Invalid {
            reason: "is a file".to_string(),
        });
        assert_eq!(
            p.ensure().unwrap(),
            ResourceChange::Skipped {
                reason: "is a file".to_string()
            }
        );
        assert!(!p.applied.get());
    }
}
