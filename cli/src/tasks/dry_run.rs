//! Side-effect-free plan rendering.
//!
//! Only read-only probes run: `xcode-select -p`, `brew --version`, `brew tap`
//! and `brew list`.
use super::plan::ExecutionPlan;
use super::prereqs::xcode_installed;
use super::Context;
use crate::config::Package;

/// Postinstall work, as described in a dry run.
pub const POSTINSTALL_SUMMARY: &[&str] = &[
    "Create config directories",
    "Oh My Zsh + plugins",
    "Neovim config (skip if ~/.config/nvim exists)",
    "TPM (tmux plugins)",
    "Mise runtimes (node/python/go)",
    "Write dotfiles (with backups)",
    "Configure fzf (skip if already configured)",
];

/// Describe what a run of `plan` would do, one line per item.
#[must_use]
pub fn dry_run_lines(ctx: &Context, plan: &ExecutionPlan) -> Vec<String> {
    let mut lines = Vec::new();

    if xcode_installed(ctx) {
        lines.push("Xcode CLI Tools: already installed (skip)".to_string());
    } else {
        lines.push("Xcode CLI Tools: would install (GUI prompt)".to_string());
    }

    let brew_present = ctx.brew.is_present();
    if brew_present {
        lines.push(
            "Homebrew: already installed (skip install, would run brew update/upgrade)".to_string(),
        );
    } else {
        lines.push("Homebrew: would install, then run brew update/upgrade".to_string());
    }

    if !plan.taps.is_empty() {
        lines.push(format!("Homebrew taps: {}", plan.taps.len()));
        let tapped = if brew_present {
            Some(ctx.brew.taps().map_err(|e| e.to_string()))
        } else {
            None
        };
        for tap in &plan.taps {
            let name = tap.tap_name().unwrap_or(&tap.name);
            let state = match &tapped {
                None => "would tap (brew not installed yet)".to_string(),
                Some(Err(e)) => format!("would tap (status unknown: {e})"),
                Some(Ok(taps)) if taps.contains(name) => "already tapped (skip)".to_string(),
                Some(Ok(_)) => "would tap".to_string(),
            };
            lines.push(format!("  - {name}: {state}"));
        }
    }

    if !plan.formulas.is_empty() {
        lines.push(format!("Formulas (parallel): {}", plan.formulas.len()));
        for pkg in &plan.formulas {
            lines.push(format!("  - {}", package_line(ctx, brew_present, pkg)));
        }
    }

    if !plan.casks.is_empty() {
        lines.push(format!("Casks (sequential): {}", plan.casks.len()));
        for pkg in &plan.casks {
            lines.push(format!("  - {}", package_line(ctx, brew_present, pkg)));
        }
    }

    lines.push("Post-install tasks:".to_string());
    lines.extend(POSTINSTALL_SUMMARY.iter().map(|s| format!("  - {s}")));
    lines
}

fn package_line(ctx: &Context, brew_present: bool, pkg: &Package) -> String {
    let state = if brew_present {
        match ctx.brew.is_installed(pkg) {
            Ok(true) => "already installed (skip)".to_string(),
            Ok(false) => "would install".to_string(),
            Err(e) => format!("would install (status unknown: {e})"),
        }
    } else {
        "would install (brew not installed yet)".to_string()
    };
    format!("{} ({}): {state}", pkg.name, pkg.mechanism)
}
