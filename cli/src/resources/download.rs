//! Install-script downloads.
use anyhow::{Context as _, Result};
use tempfile::TempPath;

use crate::cancel::CancelToken;
use crate::exec::{CommandSpec, Executor};
use crate::retry::{RetryOptions, retry};

/// Official Homebrew installer.
pub const HOMEBREW_INSTALL_URL: &str =
    "https://raw.githubusercontent.com/Homebrew/install/HEAD/install.sh";

/// Oh My Zsh installer.
pub const OH_MY_ZSH_INSTALL_URL: &str =
    "https://raw.githubusercontent.com/ohmyzsh/ohmyzsh/master/tools/install.sh";

/// Fetch `url` with `curl -fsSL` into a temporary file.
///
/// The file is removed when the returned [`TempPath`] is dropped.
///
/// # Errors
///
/// Returns an error if the temp file cannot be created or every download
/// attempt fails (the last curl error is kept for classification).
pub fn download_script(
    executor: &dyn Executor,
    cancel: &CancelToken,
    url: &str,
) -> Result<TempPath> {
    let script = tempfile::Builder::new()
        .prefix("macsetup-")
        .suffix(".sh")
        .tempfile()
        .context("creating temp file for installer")?
        .into_temp_path();
    let spec = CommandSpec::new("curl").args([
        "-fsSL".to_string(),
        "-o".to_string(),
        script.display().to_string(),
        url.to_string(),
    ]);
    retry(cancel, RetryOptions::network(), |_| executor.run(&spec, cancel))
        .with_context(|| format!("downloading {url}"))?;
    Ok(script)
}
