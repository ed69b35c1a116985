//! Console logger with a live progress line and run summary.
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use super::subscriber::{DRY_RUN, PLAIN, STAGE};
use super::types::Log;
use super::utils::terminal_columns;
use crate::tasks::ledger::{InstallStatus, Summary};

/// Implement the methods of [`Log`] by delegating to inherent methods of the
/// same name on the implementing type.
macro_rules! forward_log_methods {
    ($($method:ident),+ $(,)?) => {
        $(
            fn $method(&self, msg: &str) {
                self.$method(msg);
            }
        )+
    };
}

/// Structured logger writing through `tracing`.
///
/// Every message also reaches the log file installed by
/// [`init_subscriber`](super::subscriber::init_subscriber), with timestamps
/// and ANSI codes stripped, regardless of the verbose flag.
#[derive(Debug)]
pub struct Logger {
    log_file: Option<PathBuf>,
    /// Serializes console output between the progress line and result lines.
    flush_lock: Mutex<()>,
    /// Names of steps currently running.
    active_tasks: Mutex<Vec<String>>,
    /// Whether a progress line is currently displayed (`0` = no, `1` = yes).
    ///
    /// The progress line is always truncated to fit within a single terminal
    /// row, so the only valid values are `0` and `1`.
    progress_rows: Mutex<u16>,
}

impl Logger {
    /// Create a logger. `log_file` is only shown in the summary; the file
    /// itself is owned by the subscriber.
    #[must_use]
    pub const fn new(log_file: Option<PathBuf>) -> Self {
        Self {
            log_file,
            flush_lock: Mutex::new(()),
            active_tasks: Mutex::new(Vec::new()),
            progress_rows: Mutex::new(0),
        }
    }

    /// Return the log file path, if available.
    #[must_use]
    pub fn log_path(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }

    /// Log an error message.
    pub fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    /// Log a warning message.
    pub fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    /// Log a stage header (major section).
    pub fn stage(&self, msg: &str) {
        tracing::info!(target: STAGE, "{msg}");
    }

    /// Log an informational message.
    pub fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    /// Log a debug message (suppressed on console unless verbose; always
    /// written to the log file).
    pub fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    /// Log a dry-run plan message.
    pub fn dry_run(&self, msg: &str) {
        tracing::info!(target: DRY_RUN, "{msg}");
    }

    /// Emit a line exactly as given (no indent, no decoration).
    pub fn plain(&self, msg: &str) {
        tracing::info!(target: PLAIN, "{msg}");
    }

    /// Print one line per ledger entry followed by status counts.
    #[allow(clippy::print_stdout)]
    pub fn print_summary(&self, summary: &Summary) {
        if summary.results.is_empty() {
            return;
        }

        println!();
        self.stage("Summary");

        for result in &summary.results {
            let (icon, color) = match result.status {
                InstallStatus::Installed => ("✓", "\x1b[32m"),
                InstallStatus::Skipped => ("○", "\x1b[33m"),
                InstallStatus::Failed => ("✗", "\x1b[31m"),
                InstallStatus::Pending | InstallStatus::Running => ("·", "\x1b[2m"),
            };
            let detail = if result.message.is_empty() {
                &result.error
            } else {
                &result.message
            };
            let suffix = if detail.is_empty() {
                String::new()
            } else {
                format!(" ({detail})")
            };
            self.info(&format!(
                "{color}{icon} {}{suffix}\x1b[0m",
                result.package.name
            ));
        }

        println!();
        let installed = summary.count(InstallStatus::Installed);
        let skipped = summary.count(InstallStatus::Skipped);
        let failed = summary.failed_count();
        self.info(&format!(
            "{} steps: \x1b[32m{installed} installed\x1b[0m, \x1b[33m{skipped} skipped\x1b[0m, \x1b[31m{failed} failed\x1b[0m",
            summary.results.len()
        ));

        if let Some(path) = &self.log_file {
            self.info(&format!("\x1b[2mlog: {}\x1b[0m", path.display()));
        }
    }

    /// Erase the progress line from the console.
    ///
    /// No-op if no progress line is currently shown.
    /// Must be called while holding `flush_lock`.
    #[allow(clippy::print_stdout)]
    fn clear_progress(&self) {
        let mut guard = self
            .progress_rows
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if *guard > 0 {
            print!("\r\x1b[K");
            std::io::stdout().flush().ok();
            *guard = 0;
        }
    }

    /// Print a progress line listing running steps and mark it as shown.
    ///
    /// Truncated to a single terminal row so [`clear_progress`](Self::clear_progress)
    /// never needs cursor-up movement.
    ///
    /// Must be called while holding `flush_lock`.
    #[allow(clippy::print_stdout)]
    fn draw_progress(&self, names: &str) {
        let cols = terminal_columns();
        let prefix_width = 4;
        let max_name_chars = cols.saturating_sub(prefix_width);
        let display_names = if names.chars().count() > max_name_chars {
            let truncated: String = names
                .chars()
                .take(max_name_chars.saturating_sub(1))
                .collect();
            format!("{truncated}…")
        } else {
            names.to_string()
        };
        print!("  \x1b[2m▹ {display_names}\x1b[0m");
        std::io::stdout().flush().ok();
        let mut guard = self
            .progress_rows
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = 1;
    }

    /// Record that a step has started and redraw the progress line.
    pub fn notify_task_start(&self, name: &str) {
        let _guard = self.flush_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.clear_progress();
        let names = {
            let mut active = self
                .active_tasks
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if !active.iter().any(|n| n == name) {
                active.push(name.to_string());
            }
            active.join(", ")
        };
        self.draw_progress(&names);
    }

    /// Print a step's result line, drop it from the running set, and redraw
    /// the progress line for whatever is still running.
    pub fn notify_task_done(&self, name: &str, line: &str) {
        let _guard = self.flush_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.clear_progress();
        self.info(line);
        let remaining = {
            let mut active = self
                .active_tasks
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            active.retain(|n| n != name);
            (!active.is_empty()).then(|| active.join(", "))
        };
        if let Some(names) = remaining {
            self.draw_progress(&names);
        }
    }

    /// Erase the progress line and forget running steps.
    pub fn finish_progress(&self) {
        let _guard = self.flush_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.clear_progress();
        self.active_tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    #[cfg(test)]
    fn progress_rows_count(&self) -> u16 {
        *self
            .progress_rows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    fn active(&self) -> Vec<String> {
        self.active_tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Log for Logger {
    forward_log_methods!(stage, info, debug, warn, error, dry_run);
}
