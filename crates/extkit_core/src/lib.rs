//! Core logic for extkit: declarative extension manifests and the executor
//! that installs or removes them as file-set overlays.

pub mod executor;
pub mod extension;
pub mod logging;

pub use executor::result::{ExecutionResult, OpError, OpReport, OpStatus};
pub use executor::{
    apply, apply_with, ApplyError, ApplyOptions, ExtensionManager, MissingPathPolicy,
};
pub use extension::catalog::{
    CatalogError, CatalogResult, ManifestCatalog, CATALOG_FORMAT_VERSION,
};
pub use extension::manifest::{Action, ExtensionManifest, FileOp, ManifestValidationError};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
