//! Static configuration: the package catalog and user selections.
pub mod catalog;
pub mod selection;
pub mod toml_loader;
pub mod validation;

pub use catalog::{Catalog, Category, Mechanism, Package};
pub use selection::Selection;
