//! Filesystem resources: directories, rendered files, symlinks.
use anyhow::{Context as _, Result};
use std::io::Write as _;
use std::path::{Path, PathBuf};

use super::{Resource, ResourceChange, ResourceState};

/// Ensure the parent directory of `path` exists, creating it (and any
/// ancestors) if necessary.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create parent: {}", parent.display()))?;
    }
    Ok(())
}

/// Sibling path an existing file is moved to before being replaced:
/// `<path>.bak.<YYYYmmdd_HHMMSS.mmm>.<8 hex>`.
#[must_use]
pub fn backup_path_for(path: &Path) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S%.3f");
    let mut suffix = uuid::Uuid::new_v4().simple().to_string();
    suffix.truncate(8);
    let mut name = path.as_os_str().to_os_string();
    name.push(format!(".bak.{stamp}.{suffix}"));
    PathBuf::from(name)
}

/// Write `content` to `path`, moving any existing file aside first.
///
/// The content is staged in a temp file in the destination directory and
/// renamed into place. If that final rename fails the backup is moved back.
/// Returns the backup path when a previous file existed.
///
/// # Errors
///
/// Returns an error if staging, backing up, or the final rename fails.
pub fn write_with_backup(path: &Path, content: &[u8]) -> Result<Option<PathBuf>> {
    ensure_parent_dir(path)?;
    let dir = path.parent().unwrap_or_else(|| Path::new("."));

    let mut staged = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("create temp file in {}", dir.display()))?;
    staged
        .write_all(content)
        .with_context(|| format!("write temp file for {}", path.display()))?;
    staged
        .as_file()
        .sync_all()
        .with_context(|| format!("sync temp file for {}", path.display()))?;

    let backup = if path.symlink_metadata().is_ok() {
        let backup = backup_path_for(path);
        std::fs::rename(path, &backup)
            .with_context(|| format!("back up {} to {}", path.display(), backup.display()))?;
        Some(backup)
    } else {
        None
    };

    if let Err(e) = staged.persist(path) {
        if let Some(backup) = &backup
            && let Err(restore) = std::fs::rename(backup, path)
        {
            tracing::warn!(
                "failed to restore {} from {}: {restore}",
                path.display(),
                backup.display()
            );
        }
        return Err(e.error).with_context(|| format!("rename into {}", path.display()));
    }

    Ok(backup)
}

/// Create a symlink at `link` pointing to `target` unless something already
/// occupies `link` (including a dangling symlink).
///
/// Returns `true` if the link was created.
///
/// # Errors
///
/// Returns an error if the parent cannot be created or the link fails.
pub fn symlink_if_missing(target: &Path, link: &Path) -> Result<bool> {
    if link.symlink_metadata().is_ok() {
        return Ok(false);
    }
    ensure_parent_dir(link)?;
    create_symlink(target, link)
        .with_context(|| format!("create link: {} -> {}", link.display(), target.display()))?;
    Ok(true)
}

#[cfg(unix)]
fn create_symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(not(unix))]
fn create_symlink(_target: &Path, _link: &Path) -> std::io::Result<()> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "symlinks require a unix host",
    ))
}

/// A directory that must exist.
#[derive(Debug, Clone)]
pub struct DirectoryResource {
    /// Directory to create.
    pub path: PathBuf,
}

impl DirectoryResource {
    /// Resource for `path`.
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl Resource for DirectoryResource {
    fn description(&self) -> String {
        self.path.display().to_string()
    }

    fn current_state(&self) -> Result<ResourceState> {
        match self.path.metadata() {
            Ok(meta) if meta.is_dir() => Ok(ResourceState::Correct),
            Ok(_) => Ok(ResourceState::Invalid {
                reason: format!("{} exists and is not a directory", self.path.display()),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ResourceState::Missing),
            Err(e) => Err(e).with_context(|| format!("stat {}", self.path.display())),
        }
    }

    fn apply(&self) -> Result<ResourceChange> {
        std::fs::create_dir_all(&self.path)
            .with_context(|| format!("create directory: {}", self.path.display()))?;
        Ok(ResourceChange::Applied)
    }
}

/// A file whose content is fully determined by the provisioner.
///
/// Existing files with different content are moved aside, never deleted.
#[derive(Debug, Clone)]
pub struct FileResource {
    /// Destination file.
    pub path: PathBuf,
    /// Exact desired content.
    pub content: String,
}

impl FileResource {
    /// Resource writing `content` to `path`.
    #[must_use]
    pub const fn new(path: PathBuf, content: String) -> Self {
        Self { path, content }
    }
}

impl Resource for FileResource {
    fn description(&self) -> String {
        self.path.display().to_string()
    }

    fn current_state(&self) -> Result<ResourceState> {
        if self.path.is_dir() {
            return Ok(ResourceState::Invalid {
                reason: format!("{} is a directory", self.path.display()),
            });
        }
        match std::fs::read(&self.path) {
            Ok(existing) if existing == self.content.as_bytes() => Ok(ResourceState::Correct),
            Ok(_) => Ok(ResourceState::Incorrect {
                current: "content differs".to_string(),
            }),
            // Dangling symlinks read as NotFound but still occupy the path.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if self.path.symlink_metadata().is_ok() {
                    Ok(ResourceState::Incorrect {
                        current: "dangling symlink".to_string(),
                    })
                } else {
                    Ok(ResourceState::Missing)
                }
            }
            Err(e) => Err(e).with_context(|| format!("read {}", self.path.display())),
        }
    }

    fn apply(&self) -> Result<ResourceChange> {
        match write_with_backup(&self.path, self.content.as_bytes())? {
            Some(backup) => Ok(ResourceChange::Replaced { backup }),
            None => Ok(ResourceChange::Applied),
        }
    }
}

/// A symlink that is created only when nothing occupies its path.
///
/// Unlike a managed link, an existing entry is left alone whatever it
/// points to.
#[derive(Debug, Clone)]
pub struct SymlinkResource {
    /// What the link points to.
    pub source: PathBuf,
    /// Where the link lives.
    pub target: PathBuf,
}

impl SymlinkResource {
    /// Link at `target` pointing to `source`.
    #[must_use]
    pub const fn new(source: PathBuf, target: PathBuf) -> Self {
        Self { source, target }
    }
}

impl Resource for SymlinkResource {
    fn description(&self) -> String {
        format!("{} -> {}", self.target.display(), self.source.display())
    }

    fn current_state(&self) -> Result<ResourceState> {
        if self.target.symlink_metadata().is_ok() {
            Ok(ResourceState::Correct)
        } else {
            Ok(ResourceState::Missing)
        }
    }

    fn apply(&self) -> Result<ResourceChange> {
        if symlink_if_missing(&self.source, &self.target)? {
            Ok(ResourceChange::Applied)
        } else {
            Ok(ResourceChange::AlreadyCorrect)
        }
    }
}
