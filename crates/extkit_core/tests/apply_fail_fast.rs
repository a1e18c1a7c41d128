use extkit_core::{apply, Action, ExtensionManifest, FileOp, OpError, OpStatus};
use std::fs;
use tempfile::TempDir;

#[test]
fn stops_at_first_failure_and_skips_the_rest() {
    let dir = TempDir::new().expect("temp dir");
    let src = dir.path().join("src");
    let dst = dir.path().join("dst");
    fs::create_dir_all(&src).expect("src dir");
    fs::create_dir_all(&dst).expect("dst dir");
    fs::write(src.join("one.cpp"), "1").expect("write one");
    fs::write(src.join("three.cpp"), "3").expect("write three");

    let mut manifest = ExtensionManifest::new("partial");
    manifest.install = vec![
        FileOp::copy(src.join("one.cpp"), dst.join("one.cpp")),
        FileOp::copy(src.join("two.cpp"), dst.join("two.cpp")),
        FileOp::copy(src.join("three.cpp"), dst.join("three.cpp")),
    ];

    let result = apply(&manifest, Action::Install).expect("apply should run");

    assert!(!result.success());
    assert_eq!(result.succeeded_count(), 1);
    assert_eq!(result.failed_count(), 1);
    assert_eq!(result.skipped_count(), 1);
    assert_eq!(result.reports[0].status, OpStatus::Succeeded);
    assert_eq!(
        result.reports[1].status,
        OpStatus::Failed(OpError::SourceMissing {
            path: src.join("two.cpp")
        })
    );
    assert_eq!(result.reports[2].status, OpStatus::Skipped);

    assert!(dst.join("one.cpp").exists());
    assert!(!dst.join("two.cpp").exists());
    assert!(!dst.join("three.cpp").exists());
}

#[test]
fn reports_keep_declared_order_and_resolved_paths() {
    let dir = TempDir::new().expect("temp dir");
    fs::write(dir.path().join("a"), "a").expect("write a");

    let mut manifest = ExtensionManifest::new("ordered");
    manifest.remove = vec![
        FileOp::delete(dir.path().join("missing")),
        FileOp::copy(dir.path().join("a"), dir.path().join("b")),
        FileOp::delete(dir.path().join("a")),
    ];

    let result = apply(&manifest, Action::Remove).expect("apply should run");
    assert!(result.success());
    let indexes: Vec<usize> = result.reports.iter().map(|report| report.index).collect();
    assert_eq!(indexes, vec![0, 1, 2]);
    assert_eq!(result.reports[0].status, OpStatus::AlreadyAbsent);
    assert_eq!(result.reports[2].op, FileOp::delete(dir.path().join("a")));
    assert_eq!(fs::read_to_string(dir.path().join("b")).expect("b"), "a");
    assert!(!dir.path().join("a").exists());
}

#[test]
fn missing_destination_directory_is_reported_as_unwritable() {
    let dir = TempDir::new().expect("temp dir");
    fs::write(dir.path().join("Mesh.hpp"), "hpp").expect("write source");

    let mut manifest = ExtensionManifest::new("assimp");
    manifest.install = vec![FileOp::copy(
        dir.path().join("Mesh.hpp"),
        dir.path().join("Core/src/Utils/Mesh.hpp"),
    )];

    let result = apply(&manifest, Action::Install).expect("apply should run");
    let (report, err) = result.first_failure().expect("failure recorded");
    assert_eq!(report.index, 0);
    assert!(matches!(err, OpError::DestinationUnwritable { .. }));
}
