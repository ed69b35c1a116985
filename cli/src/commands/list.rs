//! Command: show the catalog with selection and installed markers.
use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::Result;

use super::CommandSetup;
use crate::cli::GlobalOpts;
use crate::config::{Catalog, Mechanism, Selection};
use crate::logging::Logger;
use crate::tasks::scan::scan_installed;

/// Run the list command.
///
/// # Errors
///
/// Returns an error if the catalog or selection cannot be resolved.
pub fn run(global: &GlobalOpts, verbose: bool, log: &Arc<Logger>) -> Result<()> {
    let mut setup = CommandSetup::init(global, verbose, log)?;
    let ctx = setup.probe_context(log);

    log.stage("Scanning installed packages");
    let installed = scan_installed(&ctx, &setup.catalog);
    log.info(&format!("{} catalog packages present", installed.len()));
    if global.skip_installed {
        setup.selection.deselect_installed(&setup.catalog, &installed);
    }

    for line in list_lines(&setup.catalog, &setup.selection, &installed) {
        log.plain(&line);
    }
    Ok(())
}

/// One header per category followed by its packages:
/// `  [x] <name> [(<mechanism>)][ (installed)][ - <description>]`.
///
/// `[x]` marks selected packages, `[*]` required ones.
#[must_use]
pub fn list_lines(
    catalog: &Catalog,
    selection: &Selection,
    installed: &BTreeSet<String>,
) -> Vec<String> {
    let mut lines = Vec::new();
    for category in &catalog.categories {
        let mut packages: Vec<_> = catalog.in_category(&category.key).collect();
        if packages.is_empty() {
            continue;
        }
        packages.sort_by(|a, b| a.name.cmp(&b.name));
        lines.push(format!("{}:", category.name));
        for pkg in packages {
            let mark = if pkg.required {
                '*'
            } else if selection.contains(&pkg.name) {
                'x'
            } else {
                ' '
            };
            let mut line = format!("  [{mark}] {}", pkg.name);
            if !matches!(pkg.mechanism, Mechanism::System | Mechanism::Task) {
                line.push_str(&format!(" ({})", pkg.mechanism));
            }
            if installed.contains(&pkg.name) {
                line.push_str(" (installed)");
            }
            if !pkg.description.is_empty() {
                line.push_str(&format!(" - {}", pkg.description));
            }
            lines.push(line);
        }
    }
    lines
}
