//! Extension manifest declaration and validation.
//!
//! # Responsibility
//! - Describe one extension as two ordered file-operation lists.
//! - Reject manifests whose install and remove lists do not cover the same
//!   destination set.
//!
//! # Invariants
//! - Every destination written by `install` is touched again by `remove`,
//!   and `remove` touches nothing `install` did not.
//! - Operation order is the declaration order and is never changed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Component, Path, PathBuf};

/// The two supported actions for one extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Install,
    Remove,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Remove => "remove",
        }
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One declared file operation.
///
/// Serialized with an `op` tag: `{"op": "copy", "source": .., "destination": ..}`
/// or `{"op": "delete", "destination": ..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum FileOp {
    Copy {
        source: PathBuf,
        destination: PathBuf,
    },
    Delete {
        #[serde(rename = "destination")]
        path: PathBuf,
    },
}

impl FileOp {
    pub fn copy(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self::Copy {
            source: source.into(),
            destination: destination.into(),
        }
    }

    pub fn delete(path: impl Into<PathBuf>) -> Self {
        Self::Delete { path: path.into() }
    }

    /// Path this operation mutates.
    pub fn destination(&self) -> &Path {
        match self {
            Self::Copy { destination, .. } => destination,
            Self::Delete { path } => path,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Copy { .. } => "copy",
            Self::Delete { .. } => "delete",
        }
    }
}

impl Display for FileOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Copy {
                source,
                destination,
            } => write!(f, "copy {} -> {}", source.display(), destination.display()),
            Self::Delete { path } => write!(f, "delete {}", path.display()),
        }
    }
}

/// Declarative manifest for one extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtensionManifest {
    /// Stable extension name used on the command line, e.g. `imgui`.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Directory relative `copy` sources are resolved against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_root: Option<PathBuf>,
    /// Directory relative destinations are resolved against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_root: Option<PathBuf>,
    /// Lines shown to the user after an action completes successfully.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    #[serde(default)]
    pub install: Vec<FileOp>,
    #[serde(default)]
    pub remove: Vec<FileOp>,
}

impl ExtensionManifest {
    /// Creates a manifest with no roots, notes or operations.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            source_root: None,
            target_root: None,
            notes: Vec::new(),
            install: Vec::new(),
            remove: Vec::new(),
        }
    }

    /// Returns the declared operations for `action`.
    pub fn ops(&self, action: Action) -> &[FileOp] {
        match action {
            Action::Install => &self.install,
            Action::Remove => &self.remove,
        }
    }

    /// Resolves `op` against `base_dir` and this manifest's roots.
    ///
    /// Absolute paths in the manifest are returned unchanged.
    pub fn resolve_op(&self, op: &FileOp, base_dir: &Path) -> FileOp {
        let source_base = join_root(base_dir, self.source_root.as_deref());
        let target_base = join_root(base_dir, self.target_root.as_deref());
        match op {
            FileOp::Copy {
                source,
                destination,
            } => FileOp::Copy {
                source: source_base.join(source),
                destination: target_base.join(destination),
            },
            FileOp::Delete { path } => FileOp::Delete {
                path: target_base.join(path),
            },
        }
    }

    /// Validates declaration-level manifest invariants.
    pub fn validate(&self) -> Result<(), ManifestValidationError> {
        if self.name.is_empty() {
            return Err(ManifestValidationError::EmptyName);
        }
        if !is_valid_extension_name(&self.name) {
            return Err(ManifestValidationError::InvalidName(self.name.clone()));
        }

        for action in [Action::Install, Action::Remove] {
            let ops = self.ops(action);
            if ops.is_empty() {
                return Err(ManifestValidationError::MissingOps(action));
            }
            for (index, op) in ops.iter().enumerate() {
                if has_empty_path(op) {
                    return Err(ManifestValidationError::EmptyPath { action, index });
                }
            }
        }

        let installed = destination_set(&self.install);
        let removed = destination_set(&self.remove);
        if let Some(path) = installed.difference(&removed).next() {
            return Err(ManifestValidationError::NotInverse {
                destination: path.clone(),
                missing_from: Action::Remove,
            });
        }
        if let Some(path) = removed.difference(&installed).next() {
            return Err(ManifestValidationError::NotInverse {
                destination: path.clone(),
                missing_from: Action::Install,
            });
        }
        Ok(())
    }
}

fn join_root(base_dir: &Path, root: Option<&Path>) -> PathBuf {
    match root {
        Some(root) => base_dir.join(root),
        None => base_dir.to_path_buf(),
    }
}

/// Destinations with `.` components dropped, so `./Core/x` and `Core/x` match.
fn destination_set(ops: &[FileOp]) -> BTreeSet<PathBuf> {
    ops.iter()
        .map(|op| {
            op.destination()
                .components()
                .filter(|component| !matches!(component, Component::CurDir))
                .collect::<PathBuf>()
        })
        .collect()
}

fn has_empty_path(op: &FileOp) -> bool {
    match op {
        FileOp::Copy {
            source,
            destination,
        } => source.as_os_str().is_empty() || destination.as_os_str().is_empty(),
        FileOp::Delete { path } => path.as_os_str().is_empty(),
    }
}

fn is_valid_extension_name(value: &str) -> bool {
    let mut chars = value.chars();
    let first = match chars.next() {
        Some(c) => c,
        None => return false,
    };
    if !first.is_ascii_lowercase() && !first.is_ascii_digit() {
        return false;
    }

    let mut prev_separator = false;
    for c in chars {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            prev_separator = false;
            continue;
        }
        if c == '.' || c == '_' || c == '-' {
            if prev_separator {
                return false;
            }
            prev_separator = true;
            continue;
        }
        return false;
    }
    !prev_separator
}

/// Manifest validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestValidationError {
    EmptyName,
    InvalidName(String),
    MissingOps(Action),
    EmptyPath {
        action: Action,
        index: usize,
    },
    /// A destination is touched by one action but not by its inverse.
    NotInverse {
        destination: PathBuf,
        missing_from: Action,
    },
}

impl Display for ManifestValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "manifest name must not be empty"),
            Self::InvalidName(value) => write!(
                f,
                "manifest name is invalid: {value} (expected lowercase letters, digits and . _ -)"
            ),
            Self::MissingOps(action) => {
                write!(f, "manifest must declare at least one {action} operation")
            }
            Self::EmptyPath { action, index } => {
                write!(f, "{action} operation #{} has an empty path", index + 1)
            }
            Self::NotInverse {
                destination,
                missing_from,
            } => write!(
                f,
                "destination {} is not covered by the {missing_from} operations",
                destination.display()
            ),
        }
    }
}

impl Error for ManifestValidationError {}
