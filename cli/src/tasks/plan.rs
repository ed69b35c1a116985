//! Turns a catalog and a selection into an ordered execution plan.
//!
//! Pure: no I/O, no probing. Installed-state checks happen later, per step.
use std::collections::BTreeMap;

use crate::config::{Catalog, Mechanism, Package, Selection};

/// Packages to install, partitioned by mechanism and sorted by name.
///
/// System and task entries are not part of the plan; the core and
/// postinstall steps cover them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionPlan {
    /// Taps to register, one per distinct tap name, ordered by package name
    /// rather than tap name.
    pub taps: Vec<Package>,
    /// Formulas, installed by the worker pool.
    pub formulas: Vec<Package>,
    /// Casks, installed one at a time.
    pub casks: Vec<Package>,
}

impl ExecutionPlan {
    /// Total number of planned packages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.taps.len() + self.formulas.len() + self.casks.len()
    }

    /// Whether nothing is planned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Catalog entries that are required or selected, in catalog order.
#[must_use]
pub fn selected_packages<'a>(catalog: &'a Catalog, selection: &Selection) -> Vec<&'a Package> {
    catalog
        .packages
        .iter()
        .filter(|p| p.required || selection.contains(&p.name))
        .collect()
}

/// Build the plan for `selection`.
///
/// Every required package is included whether or not it is selected.
/// Formulas and casks that name a tap contribute a tap entry unless one
/// with that tap name is already planned.
///
/// # Examples
///
/// ```
/// use macsetup_cli::config::{Catalog, Mechanism, Package, Selection};
/// use macsetup_cli::tasks::plan::build_plan;
///
/// let catalog = Catalog::from_packages(vec![
///     Package::new("ripgrep", Mechanism::Formula, "shell_cli").required(),
///     Package::new("fd", Mechanism::Formula, "shell_cli"),
///     Package::new("bat", Mechanism::Formula, "shell_cli"),
/// ])
/// .unwrap();
/// let selection: Selection = ["bat"].into_iter().collect();
///
/// let plan = build_plan(&catalog, &selection);
/// let names: Vec<_> = plan.formulas.iter().map(|p| p.name.as_str()).collect();
/// assert_eq!(names, ["bat", "ripgrep"]);
/// ```
#[must_use]
pub fn build_plan(catalog: &Catalog, selection: &Selection) -> ExecutionPlan {
    let mut taps: BTreeMap<String, Package> = BTreeMap::new();
    let mut formulas = Vec::new();
    let mut casks = Vec::new();

    let selected = selected_packages(catalog, selection);

    for pkg in &selected {
        if pkg.mechanism == Mechanism::Tap
            && let Some(tap) = pkg.tap_name()
        {
            taps.entry(tap.to_string()).or_insert_with(|| (*pkg).clone());
        }
    }

    for pkg in selected {
        match pkg.mechanism {
            Mechanism::Formula => formulas.push(pkg.clone()),
            Mechanism::Cask => casks.push(pkg.clone()),
            Mechanism::Tap | Mechanism::System | Mechanism::Task => continue,
        }
        if let Some(tap) = pkg.tap_name() {
            taps.entry(tap.to_string()).or_insert_with(|| {
                Package::new(tap, Mechanism::Tap, pkg.category.clone()).with_tap(tap)
            });
        }
    }

    let mut taps: Vec<Package> = taps.into_values().collect();
    sort_by_name(&mut taps);
    sort_by_name(&mut formulas);
    sort_by_name(&mut casks);

    ExecutionPlan {
        taps,
        formulas,
        casks,
    }
}

fn sort_by_name(packages: &mut [Package]) {
    packages.sort_by(|a, b| a.name.cmp(&b.name));
}
