//! Git checkouts that are cloned once and then left alone.
use anyhow::{Context as _, Result};
use std::path::PathBuf;

use super::fs::ensure_parent_dir;
use super::{Resource, ResourceChange, ResourceState};
use crate::cancel::CancelToken;
use crate::exec::{CommandSpec, Executor};
use crate::retry::{RetryOptions, retry};

/// A repository cloned to `dest` when nothing is there yet.
///
/// Any existing directory at `dest` counts as present; its contents are
/// never inspected or updated.
#[derive(Debug)]
pub struct GitCloneResource<'a> {
    /// Repository to clone.
    pub url: String,
    /// Checkout directory.
    pub dest: PathBuf,
    executor: &'a dyn Executor,
    cancel: &'a CancelToken,
}

impl<'a> GitCloneResource<'a> {
    /// Clone of `url` into `dest`, run through `executor`.
    #[must_use]
    pub fn new(
        url: impl Into<String>,
        dest: PathBuf,
        executor: &'a dyn Executor,
        cancel: &'a CancelToken,
    ) -> Self {
        Self {
            url: url.into(),
            dest,
            executor,
            cancel,
        }
    }
}

impl Resource for GitCloneResource<'_> {
    fn description(&self) -> String {
        format!("{} -> {}", self.url, self.dest.display())
    }

    fn current_state(&self) -> Result<ResourceState> {
        if self.dest.is_dir() {
            Ok(ResourceState::Correct)
        } else if self.dest.symlink_metadata().is_ok() {
            Ok(ResourceState::Invalid {
                reason: format!("{} exists and is not a directory", self.dest.display()),
            })
        } else {
            Ok(ResourceState::Missing)
        }
    }

    fn apply(&self) -> Result<ResourceChange> {
        ensure_parent_dir(&self.dest)?;
        let spec = CommandSpec::new("git").args([
            "clone".to_string(),
            self.url.clone(),
            self.dest.display().to_string(),
        ]);
        retry(self.cancel, RetryOptions::network(), |attempt| {
            // A failed clone can leave a partial checkout behind.
            if attempt > 1 && self.dest.is_dir() {
                std::fs::remove_dir_all(&self.dest).with_context(|| {
                    format!("removing partial clone {}", self.dest.display())
                })?;
            }
            self.executor
                .run(&spec, self.cancel)
                .map_err(anyhow::Error::from)
        })
        .with_context(|| format!("cloning {}", self.url))?;
        Ok(ResourceChange::Applied)
    }
}
