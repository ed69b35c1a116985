//! Package catalog: installable artifacts and their category metadata.
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};

use super::toml_loader::{load_config, parse_config};
use crate::error::CatalogError;

/// Catalog shipped with the binary.
const EMBEDDED_CATALOG: &str = include_str!("../../../conf/packages.toml");

/// How a package is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mechanism {
    /// A system prerequisite handled by a dedicated core step.
    System,
    /// A Homebrew tap (third-party formula repository).
    Tap,
    /// A Homebrew formula (command-line tool).
    Formula,
    /// A Homebrew cask (GUI application bundle).
    Cask,
    /// A synthetic step with no package behind it.
    Task,
}

impl Mechanism {
    /// Lowercase identifier, as written in the catalog.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Tap => "tap",
            Self::Formula => "formula",
            Self::Cask => "cask",
            Self::Task => "task",
        }
    }

    /// The `brew list` / `brew install` selector flag, for installable kinds.
    #[must_use]
    pub const fn brew_flag(self) -> Option<&'static str> {
        match self {
            Self::Formula => Some("--formula"),
            Self::Cask => Some("--cask"),
            _ => None,
        }
    }
}

impl fmt::Display for Mechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    /// Unique name; also the package-manager identifier.
    pub name: String,
    /// How the package is installed.
    #[serde(rename = "type")]
    pub mechanism: Mechanism,
    /// Key of the owning [`Category`].
    pub category: String,
    /// Optional grouping inside the category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    /// Always installed, regardless of selection.
    #[serde(default)]
    pub required: bool,
    /// Part of the default selection.
    #[serde(default, rename = "default")]
    pub default_selected: bool,
    /// One-line summary shown by `list`.
    #[serde(default)]
    pub description: String,
    /// Tap the package comes from (formulas) or registers (taps).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tap: Option<String>,
}

impl Package {
    /// A non-required, non-default package.
    #[must_use]
    pub fn new(name: impl Into<String>, mechanism: Mechanism, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mechanism,
            category: category.into(),
            subcategory: None,
            required: false,
            default_selected: false,
            description: String::new(),
            tap: None,
        }
    }

    /// A synthetic step entry for the ledger.
    #[must_use]
    pub fn task(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self::new(name, Mechanism::Task, category)
    }

    /// Mark as required (and therefore default-selected).
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self.default_selected = true;
        self
    }

    /// Mark as part of the default selection.
    #[must_use]
    pub fn default_selected(mut self) -> Self {
        self.default_selected = true;
        self
    }

    /// Attach a tap.
    #[must_use]
    pub fn with_tap(mut self, tap: impl Into<String>) -> Self {
        self.tap = Some(tap.into());
        self
    }

    /// Tap this entry registers or depends on.
    ///
    /// For tap entries without an explicit `tap` the name is the tap.
    #[must_use]
    pub fn tap_name(&self) -> Option<&str> {
        match (&self.tap, self.mechanism) {
            (Some(tap), _) if !tap.is_empty() => Some(tap),
            (_, Mechanism::Tap) => Some(&self.name),
            _ => None,
        }
    }
}

/// Grouping metadata for packages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Identifier referenced by [`Package::category`].
    pub key: String,
    /// Display name.
    pub name: String,
    /// One-line summary.
    #[serde(default)]
    pub description: String,
    /// Every package in the category is installed.
    #[serde(default)]
    pub required: bool,
    /// Whether packages may be toggled individually.
    #[serde(default = "default_true")]
    pub selectable: bool,
}

const fn default_true() -> bool {
    true
}

/// The immutable list of packages and categories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    /// Declared categories, in display order.
    #[serde(default)]
    pub categories: Vec<Category>,
    /// Every entry, names unique.
    #[serde(default)]
    pub packages: Vec<Package>,
}

impl Catalog {
    /// Parse and validate the catalog embedded at build time.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded TOML is malformed or fails validation.
    pub fn embedded() -> Result<Self> {
        Self::from_toml(EMBEDDED_CATALOG, "embedded catalog")
    }

    /// Load and validate a catalog from `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn load(path: &Path) -> Result<Self> {
        let catalog: Self = load_config(path)?;
        catalog
            .validate()
            .with_context(|| format!("validating {}", path.display()))?;
        Ok(catalog)
    }

    /// Parse and validate a catalog from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if `content` is malformed or fails validation.
    pub fn from_toml(content: &str, origin: &str) -> Result<Self> {
        let catalog: Self = parse_config(content, origin)?;
        catalog
            .validate()
            .with_context(|| format!("validating {origin}"))?;
        Ok(catalog)
    }

    /// Build a catalog from packages alone, deriving one category per
    /// distinct package category. Validates names.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if two packages share a name.
    pub fn from_packages(packages: Vec<Package>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        let categories = packages
            .iter()
            .filter(|p| seen.insert(p.category.clone()))
            .map(|p| Category {
                key: p.category.clone(),
                name: p.category.clone(),
                description: String::new(),
                required: false,
                selectable: true,
            })
            .collect();
        let catalog = Self {
            categories,
            packages,
        };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Check structural invariants.
    ///
    /// # Errors
    ///
    /// Returns the first [`CatalogError`] found: a duplicated package name,
    /// a package in an undeclared category, or a tap entry without a tap.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let categories: HashSet<&str> = self.categories.iter().map(|c| c.key.as_str()).collect();
        let mut names: HashMap<&str, Mechanism> = HashMap::new();
        for pkg in &self.packages {
            if let Some(first) = names.insert(&pkg.name, pkg.mechanism) {
                return Err(CatalogError::DuplicateName {
                    name: pkg.name.clone(),
                    first: first.to_string(),
                    second: pkg.mechanism.to_string(),
                });
            }
            if !categories.contains(pkg.category.as_str()) {
                return Err(CatalogError::UnknownCategory {
                    package: pkg.name.clone(),
                    category: pkg.category.clone(),
                });
            }
            if pkg.mechanism == Mechanism::Tap && pkg.tap.as_deref().is_none_or(str::is_empty) {
                return Err(CatalogError::MissingTap(pkg.name.clone()));
            }
        }
        Ok(())
    }

    /// Look up a package by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Package> {
        self.packages.iter().find(|p| p.name == name)
    }

    /// Look up a category by key.
    #[must_use]
    pub fn category(&self, key: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.key == key)
    }

    /// Packages belonging to `category`, in catalog order.
    pub fn in_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Package> {
        self.packages.iter().filter(move |p| p.category == category)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    const SMALL: &str = r#"
[[categories]]
key = "shell_cli"
name = "Shell & CLI"
required = true
selectable = false

[[categories]]
key = "devops"
name = "DevOps"

[[packages]]
name = "jq"
type = "formula"
category = "shell_cli"
required = true
default = true
description = "JSON processor"

[[packages]]
name = "terraform"
type = "formula"
category = "devops"
tap = "hashicorp/tap"
"#;

    #[test]
    fn embedded_catalog_is_valid() {
        let catalog = Catalog::embedded().unwrap();
        assert!(catalog.packages.len() > 60);
        assert!(catalog.get("Homebrew").is_some());
        assert_eq!(catalog.get("bun").unwrap().tap.as_deref(), Some("oven-sh/bun"));
    }

    #[test]
    fn embedded_required_packages_are_default_selected() {
        let catalog = Catalog::embedded().unwrap();
        for pkg in catalog.packages.iter().filter(|p| p.required) {
            assert!(pkg.default_selected, "{} is required but not default", pkg.name);
        }
    }

    #[test]
    fn parses_fields_and_defaults() {
        let catalog = Catalog::from_toml(SMALL, "test").unwrap();
        let jq = catalog.get("jq").unwrap();
        assert_eq!(jq.mechanism, Mechanism::Formula);
        assert!(jq.required);
        assert!(jq.default_selected);
        let tf = catalog.get("terraform").unwrap();
        assert!(!tf.required);
        assert!(!tf.default_selected);
        assert_eq!(tf.tap_name(), Some("hashicorp/tap"));
        assert!(catalog.category("devops").unwrap().selectable);
        assert!(!catalog.category("shell_cli").unwrap().selectable);
    }

    #[test]
    fn duplicate_names_across_mechanisms_are_rejected() {
        let packages = vec![
            Package::new("docker", Mechanism::Formula, "devops"),
            Package::new("docker", Mechanism::Cask, "devops"),
        ];
        let err = Catalog::from_packages(packages).unwrap_err();
        assert_eq!(
            err,
            CatalogError::DuplicateName {
                name: "docker".to_string(),
                first: "formula".to_string(),
                second: "cask".to_string(),
            }
        );
    }

    #[test]
    fn unknown_category_is_rejected() {
        let catalog = Catalog {
            categories: vec![],
            packages: vec![Package::new("jq", Mechanism::Formula, "misc")],
        };
        assert!(matches!(
            catalog.validate(),
            Err(CatalogError::UnknownCategory { .. })
        ));
    }

    #[test]
    fn tap_without_tap_name_is_rejected() {
        let err = Catalog::from_packages(vec![Package::new("x/y", Mechanism::Tap, "devops")])
            .unwrap_err();
        assert_eq!(err, CatalogError::MissingTap("x/y".to_string()));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("packages.toml");
        std::fs::write(&path, SMALL).unwrap();
        let catalog = Catalog::load(&path).unwrap();
        assert_eq!(catalog.packages.len(), 2);
    }

    #[test]
    fn load_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Catalog::load(&dir.path().join("nope.toml")).is_err());
    }

    #[test]
    fn mechanism_display_and_flags() {
        assert_eq!(Mechanism::Cask.to_string(), "cask");
        assert_eq!(Mechanism::Formula.brew_flag(), Some("--formula"));
        assert_eq!(Mechanism::Cask.brew_flag(), Some("--cask"));
        assert_eq!(Mechanism::Tap.brew_flag(), None);
    }

    #[test]
    fn in_category_filters() {
        let catalog = Catalog::embedded().unwrap();
        let fonts: Vec<&str> = catalog.in_category("fonts").map(|p| p.name.as_str()).collect();
        assert_eq!(fonts, vec!["font-sf-mono", "font-sf-pro"]);
    }
}
