//! Domain-specific error types for the provisioner.
//!
//! Internal modules return typed errors (e.g., [`ExecError`], [`CatalogError`])
//! while steps and command handlers convert them to [`anyhow::Error`] via the
//! standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! ExecError             subprocess spawn, exit status, timeout, cancellation
//! ├── Cancelled         the run's cancellation signal fired
//! CatalogError          catalog validation at load time
//! InstallError          classified per-package failure (see `classify`)
//! Interrupted           a run stopped by cancellation, with its partial ledger
//! ```

use thiserror::Error;

use crate::tasks::ledger::Summary;

/// The run's cancellation signal fired.
///
/// Returned by cancellation-aware waits (retry sleeps, polling loops) and
/// carried inside [`ExecError::Cancelled`] when a subprocess is killed.
#[derive(Error, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[error("operation cancelled")]
pub struct Cancelled;

/// Errors produced by the command runner.
#[derive(Error, Debug)]
pub enum ExecError {
    /// The program could not be started at all.
    #[error("failed to execute {program}: {source}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The program ran and exited non-zero.
    #[error("{command} failed (exit {code}): {output}")]
    Failed {
        /// Rendered command line.
        command: String,
        /// Exit code, or `-1` when terminated by a signal.
        code: i32,
        /// Trimmed stderr, falling back to stdout when stderr was empty.
        output: String,
    },

    /// The program exceeded its deadline and was killed.
    #[error("command timed out: {command}")]
    Timeout {
        /// Rendered command line.
        command: String,
    },

    /// The run was cancelled while the program was running.
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

impl ExecError {
    /// Whether this error is the cancellation condition.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }

    /// Captured output of a failed command, if any.
    #[must_use]
    pub fn output(&self) -> Option<&str> {
        match self {
            Self::Failed { output, .. } => Some(output),
            _ => None,
        }
    }
}

/// Return `true` if any error in the chain is a cancellation.
#[must_use]
pub fn is_cancellation(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause.downcast_ref::<Cancelled>().is_some()
            || cause
                .downcast_ref::<ExecError>()
                .is_some_and(ExecError::is_cancelled)
    })
}

/// Errors that arise from catalog loading and validation.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CatalogError {
    /// Two catalog entries share a name. Packages are looked up by name
    /// alone during a run, so names must be unique across mechanisms.
    #[error("duplicate package name '{name}' ({first} and {second})")]
    DuplicateName {
        /// The colliding name.
        name: String,
        /// Mechanism of the first entry.
        first: String,
        /// Mechanism of the second entry.
        second: String,
    },

    /// A package references a category that is not declared.
    #[error("package '{package}' references unknown category '{category}'")]
    UnknownCategory {
        /// Package name.
        package: String,
        /// Undeclared category key.
        category: String,
    },

    /// A tap entry does not name the tap it registers.
    #[error("tap package '{0}' has no tap name")]
    MissingTap(String),
}

/// A run that was cancelled before it finished.
///
/// Carries whatever ledger entries were recorded before the signal fired;
/// undispatched work never appears in it.
#[derive(Error, Debug)]
#[error("installation cancelled")]
pub struct Interrupted {
    /// Results recorded before cancellation.
    pub partial: Summary,
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io;

    // -----------------------------------------------------------------------
    // ExecError
    // -----------------------------------------------------------------------

    #[test]
    fn exec_error_failed_display_includes_output() {
        let e = ExecError::Failed {
            command: "brew install jq".to_string(),
            code: 1,
            output: "Error: No available formula with the name \"jq\"".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "brew install jq failed (exit 1): Error: No available formula with the name \"jq\""
        );
    }

    #[test]
    fn exec_error_timeout_display() {
        let e = ExecError::Timeout {
            command: "xcode-select -p".to_string(),
        };
        assert_eq!(e.to_string(), "command timed out: xcode-select -p");
    }

    #[test]
    fn exec_error_spawn_has_source() {
        use std::error::Error as StdError;
        let e = ExecError::Spawn {
            program: "brew".to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
        };
        assert!(e.source().is_some());
        assert!(e.to_string().contains("failed to execute brew"));
    }

    #[test]
    fn exec_error_cancelled_is_transparent() {
        let e = ExecError::from(Cancelled);
        assert!(e.is_cancelled());
        assert_eq!(e.to_string(), "operation cancelled");
    }

    #[test]
    fn output_only_for_failed() {
        let failed = ExecError::Failed {
            command: "git clone".to_string(),
            code: 128,
            output: "fatal: repository not found".to_string(),
        };
        assert_eq!(failed.output(), Some("fatal: repository not found"));
        assert_eq!(ExecError::from(Cancelled).output(), None);
    }

    // -----------------------------------------------------------------------
    // Cancellation detection
    // -----------------------------------------------------------------------

    #[test]
    fn is_cancellation_finds_bare_cancelled() {
        let err = anyhow::Error::new(Cancelled);
        assert!(is_cancellation(&err));
    }

    #[test]
    fn is_cancellation_finds_wrapped_exec_error() {
        let err = anyhow::Error::new(ExecError::from(Cancelled)).context("installing jq");
        assert!(is_cancellation(&err));
    }

    #[test]
    fn is_cancellation_ignores_other_errors() {
        let err = anyhow::anyhow!("boom");
        assert!(!is_cancellation(&err));
    }

    // -----------------------------------------------------------------------
    // CatalogError
    // -----------------------------------------------------------------------

    #[test]
    fn catalog_error_duplicate_display() {
        let e = CatalogError::DuplicateName {
            name: "docker".to_string(),
            first: "formula".to_string(),
            second: "cask".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "duplicate package name 'docker' (formula and cask)"
        );
    }

    #[test]
    fn catalog_error_unknown_category_display() {
        let e = CatalogError::UnknownCategory {
            package: "jq".to_string(),
            category: "misc".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "package 'jq' references unknown category 'misc'"
        );
    }

    // -----------------------------------------------------------------------
    // Trait bounds
    // -----------------------------------------------------------------------

    #[test]
    fn errors_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Cancelled>();
        assert_send_sync::<ExecError>();
        assert_send_sync::<CatalogError>();
        assert_send_sync::<Interrupted>();
    }

    #[test]
    fn interrupted_display() {
        let e = Interrupted {
            partial: Summary::default(),
        };
        assert_eq!(e.to_string(), "installation cancelled");
    }

    #[test]
    fn exec_error_converts_to_anyhow() {
        let e = ExecError::Timeout {
            command: "brew --version".to_string(),
        };
        let any: anyhow::Error = e.into();
        assert!(any.downcast_ref::<ExecError>().is_some());
    }
}
