//! Failure taxonomy for per-package install errors.
//!
//! Classification inspects the rendered error chain (which carries the
//! captured stderr of the failing command) for recognisable phrases.
use std::fmt;

use thiserror::Error;

use crate::error::ExecError;

/// Broad category of an install failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Host resolution or connectivity failure.
    Network,
    /// Filesystem or sandbox permission failure.
    Permission,
    /// The package manager does not know the package.
    NotFound,
    /// Dependency conflict reported by the package manager.
    Dependency,
    /// Another package manager process holds its lock.
    Lock,
    /// The command exceeded its deadline.
    Timeout,
    /// Anything else.
    Unknown,
}

impl ErrorKind {
    /// Stable lowercase identifier used in rendered errors.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Permission => "permission",
            Self::NotFound => "not_found",
            Self::Dependency => "dependency",
            Self::Lock => "lock",
            Self::Timeout => "timeout",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified failure for one package.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("[{kind}] {package}: {message}")]
pub struct InstallError {
    /// Package the failure belongs to.
    pub package: String,
    /// Classified category.
    pub kind: ErrorKind,
    /// Human-readable summary.
    pub message: String,
    /// The raw error text the classification was derived from.
    pub detail: String,
}

/// Classify `err` raised while working on `package`.
#[must_use]
pub fn classify_error(package: &str, err: &anyhow::Error) -> InstallError {
    let detail = format!("{err:#}");
    let timed_out = err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<ExecError>(),
            Some(ExecError::Timeout { .. })
        )
    });
    classify_text(package, &detail, timed_out)
}

/// Classify raw error text. `timed_out` marks a deadline expiry detected
/// structurally by the caller.
#[must_use]
pub fn classify_text(package: &str, text: &str, timed_out: bool) -> InstallError {
    let (kind, message) = if text.contains("Could not resolve host") {
        (
            ErrorKind::Network,
            "Network error - check your internet connection",
        )
    } else if text.contains("Permission denied") || text.contains("Operation not permitted") {
        (
            ErrorKind::Permission,
            "Permission denied - check file permissions or try running with sudo",
        )
    } else if text.contains("No available formula") {
        (ErrorKind::NotFound, "Package not found in Homebrew")
    } else if text.to_lowercase().contains("dependency") {
        (ErrorKind::Dependency, "Dependency conflict")
    } else if text.contains("Another active Homebrew process is already in progress")
        || text.contains("waiting for lock")
    {
        (ErrorKind::Lock, "Homebrew is locked by another process")
    } else if timed_out {
        (ErrorKind::Timeout, "Command timed out")
    } else {
        (ErrorKind::Unknown, text)
    };

    InstallError {
        package: package.to_string(),
        kind,
        message: message.to_string(),
        detail: text.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    fn failed(output: &str) -> anyhow::Error {
        ExecError::Failed {
            command: "brew install pkg".to_string(),
            code: 1,
            output: output.to_string(),
        }
        .into()
    }

    #[test]
    fn host_resolution_is_network() {
        let e = classify_error("jq", &failed("curl: (6) Could not resolve host: github.com"));
        assert_eq!(e.kind, ErrorKind::Network);
        assert_eq!(
            e.to_string(),
            "[network] jq: Network error - check your internet connection"
        );
    }

    #[test]
    fn permission_phrases_are_permission() {
        let e = classify_error("jq", &failed("mkdir: /usr/local/bin: Permission denied"));
        assert_eq!(e.kind, ErrorKind::Permission);
        let e = classify_error("jq", &failed("rm: Operation not permitted"));
        assert_eq!(e.kind, ErrorKind::Permission);
    }

    #[test]
    fn unknown_formula_is_not_found() {
        let e = classify_error(
            "nope",
            &failed("Error: No available formula with the name \"nope\"."),
        );
        assert_eq!(e.kind, ErrorKind::NotFound);
        assert_eq!(e.message, "Package not found in Homebrew");
    }

    #[test]
    fn dependency_match_is_case_insensitive() {
        let e = classify_error("ruff", &failed("Error: Unsatisfied DEPENDENCY: python@3.12"));
        assert_eq!(e.kind, ErrorKind::Dependency);
    }

    #[test]
    fn lock_contention_is_lock() {
        let e = classify_error(
            "jq",
            &failed("Error: Another active Homebrew process is already in progress."),
        );
        assert_eq!(e.kind, ErrorKind::Lock);
        let e = classify_error("jq", &failed("==> waiting for lock"));
        assert_eq!(e.kind, ErrorKind::Lock);
    }

    #[test]
    fn network_wins_over_later_matches() {
        let e = classify_error(
            "jq",
            &failed("Could not resolve host while fetching dependency"),
        );
        assert_eq!(e.kind, ErrorKind::Network);
    }

    #[test]
    fn deadline_expiry_is_timeout() {
        let err: anyhow::Error = ExecError::Timeout {
            command: "brew install jq".to_string(),
        }
        .into();
        let e = classify_error("jq", &err.context("installing jq"));
        assert_eq!(e.kind, ErrorKind::Timeout);
    }

    #[test]
    fn unmatched_keeps_raw_message() {
        let err = anyhow::anyhow!("something odd happened");
        let e = classify_error("jq", &err);
        assert_eq!(e.kind, ErrorKind::Unknown);
        assert_eq!(e.message, "something odd happened");
        assert_eq!(e.to_string(), "[unknown] jq: something odd happened");
    }

    #[test]
    fn detail_preserves_full_chain() {
        let err = failed("boom").context("installing jq");
        let e = classify_error("jq", &err);
        assert!(e.detail.starts_with("installing jq: "));
        assert!(e.detail.contains("boom"));
    }
}
