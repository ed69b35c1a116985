//! Bulk installed-state scan over a catalog.
use std::collections::BTreeSet;

use super::Context;
use super::prereqs::xcode_installed;
use crate::config::{Catalog, Mechanism};

/// Names of catalog packages already present on this machine.
///
/// Formulas and casks come from one `brew list` each; system entries are
/// probed individually. Failed queries count as "nothing installed".
#[must_use]
pub fn scan_installed(ctx: &Context, catalog: &Catalog) -> BTreeSet<String> {
    let brew_present = ctx.brew.is_present();
    let listed = |mechanism: Mechanism| {
        if !brew_present {
            return BTreeSet::new();
        }
        ctx.brew.list(mechanism).unwrap_or_else(|e| {
            ctx.log.debug(&format!("brew list {mechanism}: {e}"));
            BTreeSet::new()
        })
    };
    let formulas = listed(Mechanism::Formula);
    let casks = listed(Mechanism::Cask);

    catalog
        .packages
        .iter()
        .filter(|pkg| match pkg.mechanism {
            Mechanism::Formula => formulas.contains(&pkg.name),
            Mechanism::Cask => casks.contains(&pkg.name),
            Mechanism::System => match pkg.name.as_str() {
                "Xcode CLI Tools" => xcode_installed(ctx),
                "Homebrew" => brew_present,
                _ => false,
            },
            Mechanism::Tap | Mechanism::Task => false,
        })
        .map(|pkg| pkg.name.clone())
        .collect()
}
