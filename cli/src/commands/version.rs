//! Command: print version information.

/// The release version, or the crate version for local builds.
#[must_use]
pub fn version() -> &'static str {
    option_env!("MACSETUP_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}

/// Print the macsetup version to stdout.
#[allow(clippy::print_stdout)]
pub fn run() {
    println!("macsetup {}", version());
}
