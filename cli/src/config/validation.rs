//! Non-fatal catalog checks reported as warnings at startup.
use super::catalog::{Catalog, Mechanism};

/// A validation warning detected during catalog loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// The specific package or category that triggered the warning.
    pub item: String,
    /// Human-readable warning message.
    pub message: String,
}

impl ValidationWarning {
    /// Build a warning about `item`.
    #[must_use]
    pub fn new(item: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            message: message.into(),
        }
    }
}

/// Check `catalog` for entries that load but are probably mistakes.
#[must_use]
pub fn validate(catalog: &Catalog) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    for pkg in &catalog.packages {
        if pkg.required && !pkg.default_selected {
            warnings.push(ValidationWarning::new(
                &pkg.name,
                "required package is not marked default",
            ));
        }
        if matches!(pkg.mechanism, Mechanism::System | Mechanism::Task)
            && pkg.category != "core"
        {
            warnings.push(ValidationWarning::new(
                &pkg.name,
                format!("{} entries are handled by core steps", pkg.mechanism),
            ));
        }
        if pkg.mechanism == Mechanism::Cask && pkg.tap.is_some() {
            warnings.push(ValidationWarning::new(&pkg.name, "tap is ignored for casks"));
        }
        let unreachable = catalog
            .category(&pkg.category)
            .is_some_and(|c| !c.selectable && !c.required);
        if unreachable && !pkg.default_selected && !pkg.required {
            warnings.push(ValidationWarning::new(
                &pkg.name,
                "not default in a non-selectable category; install only via --with",
            ));
        }
    }

    for category in &catalog.categories {
        if category.required && catalog.in_category(&category.key).any(|p| !p.required) {
            warnings.push(ValidationWarning::new(
                &category.key,
                "required category contains optional packages",
            ));
        }
    }

    warnings
}
