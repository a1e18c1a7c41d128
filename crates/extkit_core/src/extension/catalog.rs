//! Versioned manifest catalog loading.
//!
//! # Responsibility
//! - Load the JSON table mapping extension names to manifests.
//! - Validate every manifest once, at load time.
//!
//! # Invariants
//! - A loaded catalog is immutable and every manifest in it is valid.
//! - Extension names are unique.
//! - Relative manifest paths resolve against the catalog file's directory.

use crate::extension::manifest::{ExtensionManifest, ManifestValidationError};
use log::{error, info};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Catalog document version understood by this build.
pub const CATALOG_FORMAT_VERSION: u32 = 1;

pub type CatalogResult<T> = Result<T, CatalogError>;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogDocument {
    version: u32,
    #[serde(default)]
    extensions: Vec<ExtensionManifest>,
}

/// Loaded, validated set of extension manifests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestCatalog {
    base_dir: PathBuf,
    manifests: Vec<ExtensionManifest>,
}

impl ManifestCatalog {
    /// Reads and validates a catalog file.
    ///
    /// # Side effects
    /// - Emits `catalog_load` logging events with duration and status.
    pub fn load(path: impl AsRef<Path>) -> CatalogResult<Self> {
        let path = path.as_ref();
        let started_at = Instant::now();
        info!(
            "event=catalog_load module=catalog status=start path={}",
            path.display()
        );

        let result = std::fs::read_to_string(path)
            .map_err(|source| CatalogError::Read {
                path: path.to_path_buf(),
                source,
            })
            .and_then(|raw| Self::from_json_str(&raw, catalog_base_dir(path)));

        match &result {
            Ok(catalog) => info!(
                "event=catalog_load module=catalog status=ok extensions={} duration_ms={}",
                catalog.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=catalog_load module=catalog status=error duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }

    /// Parses and validates a catalog document held in memory.
    pub fn from_json_str(raw: &str, base_dir: impl Into<PathBuf>) -> CatalogResult<Self> {
        let document: CatalogDocument = serde_json::from_str(raw)?;
        if document.version != CATALOG_FORMAT_VERSION {
            return Err(CatalogError::UnsupportedVersion {
                found: document.version,
                supported: CATALOG_FORMAT_VERSION,
            });
        }
        Self::from_manifests(base_dir, document.extensions)
    }

    /// Builds a catalog from already-constructed manifests.
    pub fn from_manifests(
        base_dir: impl Into<PathBuf>,
        manifests: Vec<ExtensionManifest>,
    ) -> CatalogResult<Self> {
        let mut seen = BTreeSet::<&str>::new();
        for manifest in &manifests {
            manifest
                .validate()
                .map_err(|error| CatalogError::InvalidManifest {
                    name: manifest.name.clone(),
                    error,
                })?;
            if !seen.insert(manifest.name.as_str()) {
                return Err(CatalogError::DuplicateName(manifest.name.clone()));
            }
        }

        Ok(Self {
            base_dir: base_dir.into(),
            manifests,
        })
    }

    /// Directory relative manifest paths are resolved against.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn get(&self, name: &str) -> Option<&ExtensionManifest> {
        self.manifests.iter().find(|manifest| manifest.name == name)
    }

    /// Extension names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.manifests.iter().map(|manifest| manifest.name.as_str())
    }

    pub fn manifests(&self) -> &[ExtensionManifest] {
        &self.manifests
    }

    pub fn len(&self) -> usize {
        self.manifests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.manifests.is_empty()
    }
}

fn catalog_base_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Catalog loading errors.
#[derive(Debug)]
pub enum CatalogError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(serde_json::Error),
    UnsupportedVersion {
        found: u32,
        supported: u32,
    },
    InvalidManifest {
        name: String,
        error: ManifestValidationError,
    },
    DuplicateName(String),
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "failed to read catalog `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "catalog is not valid JSON: {err}"),
            Self::UnsupportedVersion { found, supported } => write!(
                f,
                "catalog version {found} is not supported (expected {supported})"
            ),
            Self::InvalidManifest { name, error } => {
                write!(f, "extension `{name}` is invalid: {error}")
            }
            Self::DuplicateName(name) => write!(f, "extension `{name}` is declared twice"),
        }
    }
}

impl Error for CatalogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::InvalidManifest { error, .. } => Some(error),
            Self::UnsupportedVersion { .. } | Self::DuplicateName(_) => None,
        }
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}
