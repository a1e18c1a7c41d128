//! Per-operation outcomes and the aggregated execution result.

use crate::extension::manifest::{Action, FileOp};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// Failure of one file operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpError {
    SourceMissing { path: PathBuf },
    DestinationUnwritable { path: PathBuf, reason: String },
    /// Only produced under `MissingPathPolicy::Fail`.
    PathMissing { path: PathBuf },
    PermissionDenied { path: PathBuf },
    Io { path: PathBuf, reason: String },
}

impl OpError {
    /// Stable identifier used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::SourceMissing { .. } => "source_missing",
            Self::DestinationUnwritable { .. } => "destination_unwritable",
            Self::PathMissing { .. } => "path_missing",
            Self::PermissionDenied { .. } => "permission_denied",
            Self::Io { .. } => "io",
        }
    }

    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::SourceMissing { path }
            | Self::DestinationUnwritable { path, .. }
            | Self::PathMissing { path }
            | Self::PermissionDenied { path }
            | Self::Io { path, .. } => path,
        }
    }

    pub(crate) fn from_io(path: &std::path::Path, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => Self::Io {
                path: path.to_path_buf(),
                reason: err.to_string(),
            },
        }
    }
}

impl Display for OpError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SourceMissing { path } => write!(f, "source file is missing: {}", path.display()),
            Self::DestinationUnwritable { path, reason } => {
                write!(f, "cannot write {}: {reason}", path.display())
            }
            Self::PathMissing { path } => write!(f, "path does not exist: {}", path.display()),
            Self::PermissionDenied { path } => {
                write!(f, "permission denied: {}", path.display())
            }
            Self::Io { path, reason } => write!(f, "i/o error on {}: {reason}", path.display()),
        }
    }
}

impl Error for OpError {}

/// What happened to one declared operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpStatus {
    Succeeded,
    /// Delete target was already gone; counts as success.
    AlreadyAbsent,
    Failed(OpError),
    /// Not attempted because an earlier operation failed.
    Skipped,
}

impl OpStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded | Self::AlreadyAbsent)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Succeeded => "ok",
            Self::AlreadyAbsent => "absent",
            Self::Failed(_) => "failed",
            Self::Skipped => "skipped",
        }
    }
}

/// One row of an execution report. `op` carries resolved paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpReport {
    pub index: usize,
    pub op: FileOp,
    pub status: OpStatus,
}

/// Ordered outcome of one `apply` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub extension: String,
    pub action: Action,
    pub reports: Vec<OpReport>,
}

impl ExecutionResult {
    /// True when every declared operation succeeded.
    pub fn success(&self) -> bool {
        self.reports.iter().all(|report| report.status.is_success())
    }

    pub fn succeeded_count(&self) -> usize {
        self.reports
            .iter()
            .filter(|report| report.status.is_success())
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.reports
            .iter()
            .filter(|report| matches!(report.status, OpStatus::Failed(_)))
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.reports
            .iter()
            .filter(|report| report.status == OpStatus::Skipped)
            .count()
    }

    /// Returns the failing report and its error, if any.
    pub fn first_failure(&self) -> Option<(&OpReport, &OpError)> {
        self.reports.iter().find_map(|report| match &report.status {
            OpStatus::Failed(err) => Some((report, err)),
            _ => None,
        })
    }
}
