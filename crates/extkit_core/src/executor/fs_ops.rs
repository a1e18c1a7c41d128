//! Filesystem primitives behind `copy` and `delete` operations.
//!
//! # Invariants
//! - A copy never exposes a partially written destination: bytes are staged in
//!   a temporary file next to the destination and renamed over it.
//! - A failed copy leaves the destination exactly as it was and removes the
//!   staged file.

use super::result::OpError;
use std::fs::{self, Permissions};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

const STAGING_PREFIX: &str = ".extkit-";
const STAGING_SUFFIX: &str = ".partial";

/// Outcome of a delete that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DeleteOutcome {
    Removed,
    Absent,
}

/// Metadata carried from the copy source onto the destination.
#[derive(Debug, Clone)]
pub(crate) struct CopiedMetadata {
    pub permissions: Permissions,
    pub modified: Option<SystemTime>,
}

/// Copies `source` over `destination`, duplicating content, permissions and
/// modification time.
pub(crate) fn copy_file(source: &Path, destination: &Path) -> Result<(), OpError> {
    let metadata = match fs::metadata(source) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(OpError::SourceMissing {
                path: source.to_path_buf(),
            })
        }
        Err(err) => return Err(OpError::from_io(source, err)),
    };
    if !metadata.is_file() {
        return Err(OpError::Io {
            path: source.to_path_buf(),
            reason: "source is not a regular file".to_string(),
        });
    }

    ensure_writable_destination(destination)?;

    let reader = fs::File::open(source).map_err(|err| OpError::from_io(source, err))?;
    replace_from_reader(
        reader,
        destination,
        &CopiedMetadata {
            permissions: metadata.permissions(),
            modified: metadata.modified().ok(),
        },
    )
}

/// Streams `reader` into a staged file and atomically renames it onto
/// `destination`.
pub(crate) fn replace_from_reader<R: Read>(
    mut reader: R,
    destination: &Path,
    metadata: &CopiedMetadata,
) -> Result<(), OpError> {
    let parent = parent_dir(destination);
    let mut staged = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .suffix(STAGING_SUFFIX)
        .tempfile_in(&parent)
        .map_err(|err| match err.kind() {
            io::ErrorKind::PermissionDenied => OpError::DestinationUnwritable {
                path: destination.to_path_buf(),
                reason: "parent directory is not writable".to_string(),
            },
            _ => OpError::from_io(destination, err),
        })?;

    io::copy(&mut reader, staged.as_file_mut())
        .map_err(|err| OpError::from_io(destination, err))?;

    let file = staged.as_file();
    file.sync_all()
        .map_err(|err| OpError::from_io(destination, err))?;
    if let Some(modified) = metadata.modified {
        file.set_modified(modified)
            .map_err(|err| OpError::from_io(destination, err))?;
    }
    file.set_permissions(metadata.permissions.clone())
        .map_err(|err| OpError::from_io(destination, err))?;

    staged
        .persist(destination)
        .map_err(|err| OpError::from_io(destination, err.error))?;
    Ok(())
}

/// Removes the file at `path`. A missing path is reported, not failed.
pub(crate) fn delete_file(path: &Path) -> Result<DeleteOutcome, OpError> {
    match fs::symlink_metadata(path) {
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(DeleteOutcome::Absent),
        Err(err) => return Err(OpError::from_io(path, err)),
        Ok(metadata) if metadata.is_dir() => {
            return Err(OpError::DestinationUnwritable {
                path: path.to_path_buf(),
                reason: "path is a directory".to_string(),
            })
        }
        Ok(_) => {}
    }

    match fs::remove_file(path) {
        Ok(()) => Ok(DeleteOutcome::Removed),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(DeleteOutcome::Absent),
        Err(err) => Err(OpError::from_io(path, err)),
    }
}

fn ensure_writable_destination(destination: &Path) -> Result<(), OpError> {
    let unwritable = |reason: &str| OpError::DestinationUnwritable {
        path: destination.to_path_buf(),
        reason: reason.to_string(),
    };

    let parent = parent_dir(destination);
    match fs::metadata(&parent) {
        Ok(metadata) if !metadata.is_dir() => {
            return Err(unwritable("parent path is not a directory"))
        }
        Ok(metadata) if metadata.permissions().readonly() => {
            return Err(unwritable("parent directory is read-only"))
        }
        Ok(_) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(unwritable("parent directory does not exist"))
        }
        Err(err) => return Err(OpError::from_io(&parent, err)),
    }

    if destination.is_dir() {
        return Err(unwritable("destination is a directory"));
    }
    Ok(())
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::{copy_file, delete_file, replace_from_reader, CopiedMetadata, DeleteOutcome};
    use crate::executor::result::OpError;
    use std::fs;
    use std::io::{self, Read};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};
    use tempfile::TempDir;

    /// Yields `limit` bytes of `data`, then fails.
    struct FaultyReader<'a> {
        data: &'a [u8],
        limit: usize,
        offset: usize,
    }

    impl Read for FaultyReader<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.offset >= self.limit {
                return Err(io::Error::other("injected fault"));
            }
            let end = self.limit.min(self.data.len()).min(self.offset + buf.len());
            let chunk = &self.data[self.offset..end];
            buf[..chunk.len()].copy_from_slice(chunk);
            self.offset = end;
            Ok(chunk.len())
        }
    }

    #[test]
    fn copy_preserves_content_and_modification_time() {
        let dir = TempDir::new().expect("temp dir");
        let source = dir.path().join("Mesh.cpp");
        let destination = dir.path().join("Mesh.out.cpp");
        fs::write(&source, b"#include \"Mesh.hpp\"\n\x00\xff").expect("write source");
        let stamp = UNIX_EPOCH + Duration::from_secs(1_600_000_000);
        fs::File::options()
            .write(true)
            .open(&source)
            .and_then(|file| file.set_modified(stamp))
            .expect("stamp source");

        copy_file(&source, &destination).expect("copy should succeed");

        assert_eq!(
            fs::read(&destination).expect("read destination"),
            fs::read(&source).expect("read source")
        );
        let copied = fs::metadata(&destination)
            .and_then(|metadata| metadata.modified())
            .expect("destination mtime");
        assert_eq!(copied, stamp);
    }

    #[test]
    fn copy_overwrites_existing_destination() {
        let dir = TempDir::new().expect("temp dir");
        let source = dir.path().join("new.hpp");
        let destination = dir.path().join("Layer.hpp");
        fs::write(&source, "new").expect("write source");
        fs::write(&destination, "old").expect("write destination");

        copy_file(&source, &destination).expect("copy should succeed");
        assert_eq!(fs::read_to_string(&destination).expect("read"), "new");
    }

    #[test]
    fn copy_reports_missing_source() {
        let dir = TempDir::new().expect("temp dir");
        let err = copy_file(&dir.path().join("absent.cpp"), &dir.path().join("x.cpp"))
            .expect_err("missing source must fail");
        assert!(matches!(err, OpError::SourceMissing { .. }));
    }

    #[test]
    fn copy_reports_missing_parent_directory() {
        let dir = TempDir::new().expect("temp dir");
        let source = dir.path().join("a.cpp");
        fs::write(&source, "a").expect("write source");

        let err = copy_file(&source, &dir.path().join("Core/src/a.cpp"))
            .expect_err("missing parent must fail");
        assert!(matches!(err, OpError::DestinationUnwritable { .. }));
    }

    #[test]
    fn interrupted_write_keeps_old_destination_and_cleans_staging() {
        let dir = TempDir::new().expect("temp dir");
        let destination = dir.path().join("Renderer.cpp");
        fs::write(&destination, "old renderer").expect("write destination");

        let replacement = b"new renderer with much longer content";
        let reader = FaultyReader {
            data: replacement,
            limit: 7,
            offset: 0,
        };
        let metadata = CopiedMetadata {
            permissions: fs::metadata(&destination).expect("metadata").permissions(),
            modified: Some(SystemTime::now()),
        };

        let err = replace_from_reader(reader, &destination, &metadata)
            .expect_err("injected fault must surface");
        assert!(matches!(err, OpError::Io { .. }));

        assert_eq!(
            fs::read_to_string(&destination).expect("read destination"),
            "old renderer"
        );
        let entries = fs::read_dir(dir.path()).expect("list dir").count();
        assert_eq!(entries, 1, "staged file must be cleaned up");
    }

    #[test]
    fn delete_distinguishes_removed_and_absent() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("ImGuiBuild.cpp");
        fs::write(&path, "x").expect("write file");

        assert_eq!(delete_file(&path).expect("delete"), DeleteOutcome::Removed);
        assert!(!path.exists());
        assert_eq!(delete_file(&path).expect("delete again"), DeleteOutcome::Absent);
    }

    #[test]
    fn delete_refuses_directories() {
        let dir = TempDir::new().expect("temp dir");
        let err = delete_file(dir.path()).expect_err("directories are not managed");
        assert!(matches!(err, OpError::DestinationUnwritable { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn copy_into_read_only_directory_is_unwritable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().expect("temp dir");
        let source = dir.path().join("Layer.hpp");
        let locked = dir.path().join("locked");
        fs::write(&source, "layer").expect("write source");
        fs::create_dir(&locked).expect("create locked dir");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).expect("lock dir");

        let destination = locked.join("Layer.hpp");
        let result = copy_file(&source, &destination);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).expect("unlock dir");

        match result.expect_err("read-only parent must fail") {
            OpError::DestinationUnwritable { path, .. } => assert_eq!(path, destination),
            other => panic!("unexpected error: {other}"),
        }
        assert!(!destination.exists());
    }

    #[cfg(unix)]
    #[test]
    fn copy_from_unreadable_source_is_permission_denied() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().expect("temp dir");
        let source = dir.path().join("Renderer.cpp");
        let destination = dir.path().join("Renderer.out.cpp");
        fs::write(&source, "renderer").expect("write source");
        fs::set_permissions(&source, fs::Permissions::from_mode(0o000)).expect("lock source");

        // Privileged users can read the file anyway.
        if fs::File::open(&source).is_ok() {
            fs::set_permissions(&source, fs::Permissions::from_mode(0o644))
                .expect("unlock source");
            return;
        }

        let result = copy_file(&source, &destination);
        fs::set_permissions(&source, fs::Permissions::from_mode(0o644)).expect("unlock source");

        assert_eq!(
            result.expect_err("unreadable source must fail"),
            OpError::PermissionDenied { path: source }
        );
        assert!(!destination.exists());
    }
}
