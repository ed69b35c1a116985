//! The set of package names a user opted into.
use std::collections::BTreeSet;

use anyhow::{Result, bail};

use super::catalog::Catalog;

/// Package names selected for installation.
///
/// Required packages are implicitly part of every plan whether or not they
/// appear here; the set only records opt-ins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    names: BTreeSet<String>,
}

impl Selection {
    /// An empty selection (only required packages will be planned).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every required or default-selected package.
    #[must_use]
    pub fn defaults(catalog: &Catalog) -> Self {
        catalog
            .packages
            .iter()
            .filter(|p| p.required || p.default_selected)
            .map(|p| p.name.clone())
            .collect()
    }

    /// Whether `name` is selected.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Add `name`.
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.names.insert(name.into())
    }

    /// Remove `name`.
    pub fn remove(&mut self, name: &str) -> bool {
        self.names.remove(name)
    }

    /// Number of selected names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Selected names in lexicographic order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Apply `--with` / `--without` overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if a name is not in `catalog` or if `without`
    /// names a required package.
    pub fn apply_overrides(
        &mut self,
        catalog: &Catalog,
        with: &[String],
        without: &[String],
    ) -> Result<()> {
        for name in with {
            if catalog.get(name).is_none() {
                bail!("unknown package '{name}'");
            }
            self.insert(name.clone());
        }
        for name in without {
            match catalog.get(name) {
                None => bail!("unknown package '{name}'"),
                Some(pkg) if pkg.required => bail!("cannot deselect required package '{name}'"),
                Some(_) => {
                    self.remove(name);
                }
            }
        }
        Ok(())
    }

    /// Drop non-required packages that are already present on the system.
    ///
    /// Returns the names that were removed.
    pub fn deselect_installed(
        &mut self,
        catalog: &Catalog,
        installed: &BTreeSet<String>,
    ) -> Vec<String> {
        let removed: Vec<String> = catalog
            .packages
            .iter()
            .filter(|p| !p.required && installed.contains(&p.name) && self.contains(&p.name))
            .map(|p| p.name.clone())
            .collect();
        for name in &removed {
            self.names.remove(name);
        }
        removed
    }
}

impl<S: Into<String>> FromIterator<S> for Selection {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::catalog::{Mechanism, Package};

    fn catalog() -> Catalog {
        Catalog::from_packages(vec![
            Package::new("jq", Mechanism::Formula, "shell_cli").required(),
            Package::new("iterm2", Mechanism::Cask, "terminals").default_selected(),
            Package::new("zed", Mechanism::Cask, "editors"),
        ])
        .unwrap()
    }

    #[test]
    fn defaults_include_required_and_default() {
        let sel = Selection::defaults(&catalog());
        assert_eq!(sel.iter().collect::<Vec<_>>(), vec!["iterm2", "jq"]);
    }

    #[test]
    fn overrides_add_and_remove() {
        let catalog = catalog();
        let mut sel = Selection::defaults(&catalog);
        sel.apply_overrides(&catalog, &["zed".to_string()], &["iterm2".to_string()])
            .unwrap();
        assert!(sel.contains("zed"));
        assert!(!sel.contains("iterm2"));
    }

    #[test]
    fn overrides_reject_unknown_names() {
        let catalog = catalog();
        let mut sel = Selection::new();
        let err = sel
            .apply_overrides(&catalog, &["nope".to_string()], &[])
            .unwrap_err();
        assert_eq!(err.to_string(), "unknown package 'nope'");
    }

    #[test]
    fn overrides_refuse_to_drop_required() {
        let catalog = catalog();
        let mut sel = Selection::defaults(&catalog);
        let err = sel
            .apply_overrides(&catalog, &[], &["jq".to_string()])
            .unwrap_err();
        assert!(err.to_string().contains("required"));
    }

    #[test]
    fn deselect_installed_keeps_required() {
        let catalog = catalog();
        let mut sel = Selection::defaults(&catalog);
        let installed: BTreeSet<String> = ["jq", "iterm2"].into_iter().map(String::from).collect();
        let removed = sel.deselect_installed(&catalog, &installed);
        assert_eq!(removed, vec!["iterm2".to_string()]);
        assert!(sel.contains("jq"));
        assert!(!sel.contains("iterm2"));
    }
}
