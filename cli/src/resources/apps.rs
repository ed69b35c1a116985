//! Detection of application bundles installed outside the package manager.
use std::path::{Path, PathBuf};

/// Casks whose bundle name does not follow from the cask name.
const KNOWN_BUNDLES: &[(&str, &str)] = &[
    ("1password", "1Password.app"),
    ("alacritty", "Alacritty.app"),
    ("brave-browser", "Brave Browser.app"),
    ("chatgpt", "ChatGPT.app"),
    ("docker", "Docker.app"),
    ("ghostty", "Ghostty.app"),
    ("google-chrome", "Google Chrome.app"),
    ("iterm2", "iTerm.app"),
    ("jetbrains-toolbox", "JetBrains Toolbox.app"),
    ("microsoft-teams", "Microsoft Teams.app"),
    ("orbstack", "OrbStack.app"),
    ("postman", "Postman.app"),
    ("visual-studio-code", "Visual Studio Code.app"),
    ("zoom", "zoom.us.app"),
];

/// Default locations searched for bundles: `/Applications` and
/// `~/Applications`.
#[must_use]
pub fn default_app_dirs(home: &Path) -> Vec<PathBuf> {
    vec![PathBuf::from("/Applications"), home.join("Applications")]
}

/// Bundle names a cask may have installed, most specific first.
///
/// The table entry (if any) comes first, followed by a title-cased guess
/// built from the cask name (`sublime-text` → `Sublime Text.app`).
#[must_use]
pub fn bundle_candidates(cask: &str) -> Vec<String> {
    let mut candidates = Vec::with_capacity(2);
    if let Some((_, bundle)) = KNOWN_BUNDLES.iter().find(|(name, _)| *name == cask) {
        candidates.push((*bundle).to_string());
    }
    let guess = format!("{}.app", title_case(cask));
    if !candidates.contains(&guess) {
        candidates.push(guess);
    }
    candidates
}

fn title_case(cask: &str) -> String {
    cask.split('-')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// First existing bundle for `cask` across `dirs`.
#[must_use]
pub fn find_app_bundle(cask: &str, dirs: &[PathBuf]) -> Option<PathBuf> {
    let candidates = bundle_candidates(cask);
    dirs.iter()
        .flat_map(|dir| candidates.iter().map(move |name| dir.join(name)))
        .find(|path| path.is_dir())
}
