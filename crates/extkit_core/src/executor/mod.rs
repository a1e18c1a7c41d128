//! Manifest executor.
//!
//! # Responsibility
//! - Apply one action of one manifest, operation by operation, in declared
//!   order.
//! - Capture every outcome in an `ExecutionResult` instead of unwinding.
//!
//! # Invariants
//! - Operations are never reordered or run concurrently.
//! - The first failing operation stops the pass; the rest are `Skipped`.
//! - Each call is stateless; the filesystem is the only thing mutated.

mod fs_ops;
pub mod result;

use crate::extension::catalog::ManifestCatalog;
use crate::extension::manifest::{Action, ExtensionManifest, FileOp};
use fs_ops::DeleteOutcome;
use log::{error, info};
use result::{ExecutionResult, OpError, OpReport, OpStatus};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Instant;

/// How a `delete` of a path that does not exist is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingPathPolicy {
    /// Record `AlreadyAbsent` and continue.
    #[default]
    Ignore,
    /// Record `PathMissing` and stop.
    Fail,
}

/// Options for one `apply` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyOptions {
    /// Directory relative manifest paths resolve against. Empty means the
    /// process working directory.
    pub base_dir: PathBuf,
    pub missing_path: MissingPathPolicy,
}

/// Errors raised before any operation runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    UnknownExtension(String),
    EmptyAction { extension: String, action: Action },
}

impl Display for ApplyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownExtension(name) => write!(f, "unknown extension: {name}"),
            Self::EmptyAction { extension, action } => {
                write!(f, "extension `{extension}` declares no {action} operations")
            }
        }
    }
}

impl Error for ApplyError {}

/// Applies `action` of `manifest` with default options.
pub fn apply(manifest: &ExtensionManifest, action: Action) -> Result<ExecutionResult, ApplyError> {
    apply_with(manifest, action, &ApplyOptions::default())
}

/// Applies `action` of `manifest`.
///
/// Operation failures are returned inside the `ExecutionResult`; `Err` is
/// reserved for a manifest that declares nothing to do for `action`.
///
/// # Side effects
/// - Mutates the filesystem.
/// - Emits `apply` and `file_op` logging events.
pub fn apply_with(
    manifest: &ExtensionManifest,
    action: Action,
    options: &ApplyOptions,
) -> Result<ExecutionResult, ApplyError> {
    let ops = manifest.ops(action);
    if ops.is_empty() {
        return Err(ApplyError::EmptyAction {
            extension: manifest.name.clone(),
            action,
        });
    }

    let started_at = Instant::now();
    info!(
        "event=apply module=executor status=start extension={} action={} ops={}",
        manifest.name,
        action,
        ops.len()
    );

    let mut reports = Vec::with_capacity(ops.len());
    let mut halted = false;
    for (index, op) in ops.iter().enumerate() {
        let resolved = manifest.resolve_op(op, &options.base_dir);
        let status = if halted {
            OpStatus::Skipped
        } else {
            run_op(&resolved, options.missing_path)
        };

        match &status {
            OpStatus::Failed(err) => {
                halted = true;
                error!(
                    "event=file_op module=executor status=error index={} kind={} error_code={} error={}",
                    index,
                    resolved.kind(),
                    err.code(),
                    err
                );
            }
            OpStatus::AlreadyAbsent => info!(
                "event=file_op module=executor status=absent index={} path={}",
                index,
                resolved.destination().display()
            ),
            OpStatus::Succeeded => info!(
                "event=file_op module=executor status=ok index={} kind={} path={}",
                index,
                resolved.kind(),
                resolved.destination().display()
            ),
            OpStatus::Skipped => {}
        }

        reports.push(OpReport {
            index,
            op: resolved,
            status,
        });
    }

    let result = ExecutionResult {
        extension: manifest.name.clone(),
        action,
        reports,
    };
    info!(
        "event=apply module=executor status={} extension={} action={} succeeded={} failed={} skipped={} duration_ms={}",
        if result.success() { "ok" } else { "error" },
        result.extension,
        action,
        result.succeeded_count(),
        result.failed_count(),
        result.skipped_count(),
        started_at.elapsed().as_millis()
    );
    Ok(result)
}

fn run_op(op: &FileOp, missing_path: MissingPathPolicy) -> OpStatus {
    let outcome = match op {
        FileOp::Copy {
            source,
            destination,
        } => fs_ops::copy_file(source, destination).map(|()| OpStatus::Succeeded),
        FileOp::Delete { path } => fs_ops::delete_file(path).and_then(|outcome| match outcome {
            DeleteOutcome::Removed => Ok(OpStatus::Succeeded),
            DeleteOutcome::Absent => match missing_path {
                MissingPathPolicy::Ignore => Ok(OpStatus::AlreadyAbsent),
                MissingPathPolicy::Fail => Err(OpError::PathMissing { path: path.clone() }),
            },
        }),
    };
    outcome.unwrap_or_else(OpStatus::Failed)
}

/// Applies catalog manifests by name.
#[derive(Debug)]
pub struct ExtensionManager<'a> {
    catalog: &'a ManifestCatalog,
    options: ApplyOptions,
}

impl<'a> ExtensionManager<'a> {
    /// Resolves relative paths against the catalog's directory.
    pub fn new(catalog: &'a ManifestCatalog) -> Self {
        Self {
            catalog,
            options: ApplyOptions {
                base_dir: catalog.base_dir().to_path_buf(),
                missing_path: MissingPathPolicy::default(),
            },
        }
    }

    pub fn with_missing_path_policy(mut self, policy: MissingPathPolicy) -> Self {
        self.options.missing_path = policy;
        self
    }

    pub fn apply(&self, extension: &str, action: Action) -> Result<ExecutionResult, ApplyError> {
        let manifest = self
            .catalog
            .get(extension)
            .ok_or_else(|| ApplyError::UnknownExtension(extension.to_string()))?;
        apply_with(manifest, action, &self.options)
    }
}
