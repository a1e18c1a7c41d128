//! `extkit` command-line entry point.
//!
//! # Responsibility
//! - Parse arguments, load the catalog and apply one action.
//! - Translate results into console output and process exit codes.
//!
//! # Exit codes
//! - `0` every operation succeeded (or `list`/`check` completed).
//! - `1` an operation failed; the partial state is printed.
//! - `2` the catalog could not be loaded or the extension is unknown.

mod cli;
mod report;

use cli::{Invocation, Settings};
use extkit_core::{init_logging, ExtensionManager, LogTarget, ManifestCatalog};
use log::debug;
use std::io::{self, Write};
use std::process::ExitCode;

const EXIT_OK: u8 = 0;
const EXIT_OP_FAILED: u8 = 1;
const EXIT_CONFIG_ERROR: u8 = 2;

fn main() -> ExitCode {
    let matches = cli::cli().get_matches();
    let Some(settings) = Settings::from_matches(&matches) else {
        eprintln!("error: no command given; see `extkit --help`");
        return ExitCode::from(EXIT_CONFIG_ERROR);
    };

    let target = match &settings.log_dir {
        Some(dir) => LogTarget::Directory(dir.clone()),
        None => LogTarget::Stderr,
    };
    if let Err(err) = init_logging(&settings.log_level, target) {
        eprintln!("warning: logging disabled: {err}");
    }
    debug!(
        "event=cli_start module=cli status=ok manifest={} command={:?}",
        settings.manifest.display(),
        settings.invocation
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match run(&settings, &mut out, &mut io::stderr()) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("error: failed to write output: {err}");
            ExitCode::from(EXIT_OP_FAILED)
        }
    }
}

fn run(settings: &Settings, out: &mut impl Write, err_out: &mut impl Write) -> io::Result<u8> {
    let catalog = match ManifestCatalog::load(&settings.manifest) {
        Ok(catalog) => catalog,
        Err(err) => {
            writeln!(err_out, "error: {err}")?;
            return Ok(EXIT_CONFIG_ERROR);
        }
    };

    match &settings.invocation {
        Invocation::List => {
            report::write_listing(out, &catalog)?;
            Ok(EXIT_OK)
        }
        Invocation::Check => {
            report::write_check(out, &catalog, &settings.manifest)?;
            Ok(EXIT_OK)
        }
        Invocation::Apply { action, extension } => {
            let Some(manifest) = catalog.get(extension) else {
                let known = catalog.names().collect::<Vec<_>>().join(", ");
                writeln!(
                    err_out,
                    "error: unknown extension `{extension}` (available: {known})"
                )?;
                return Ok(EXIT_CONFIG_ERROR);
            };

            report::write_header(out, manifest, *action, catalog.base_dir())?;
            let manager =
                ExtensionManager::new(&catalog).with_missing_path_policy(settings.missing_path);
            match manager.apply(extension, *action) {
                Ok(result) => {
                    report::write_result(out, manifest, &result)?;
                    Ok(if result.success() {
                        EXIT_OK
                    } else {
                        EXIT_OP_FAILED
                    })
                }
                Err(err) => {
                    writeln!(err_out, "error: {err}")?;
                    Ok(EXIT_CONFIG_ERROR)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{run, EXIT_CONFIG_ERROR, EXIT_OK, EXIT_OP_FAILED};
    use crate::cli::{Invocation, Settings};
    use extkit_core::{Action, MissingPathPolicy};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const CATALOG: &str = r#"{
        "version": 1,
        "extensions": [{
            "name": "assimp",
            "source_root": "bundle",
            "target_root": "engine",
            "notes": ["Don't forget to reload/regenerate the project."],
            "install": [
                {"op": "copy", "source": "Mesh.cpp", "destination": "Mesh.cpp"},
                {"op": "copy", "source": "Mesh.hpp", "destination": "Mesh.hpp"}
            ],
            "remove": [
                {"op": "delete", "destination": "Mesh.cpp"},
                {"op": "delete", "destination": "Mesh.hpp"}
            ]
        }]
    }"#;

    fn workspace() -> TempDir {
        let dir = TempDir::new().expect("temp dir");
        fs::create_dir_all(dir.path().join("bundle")).expect("bundle dir");
        fs::create_dir_all(dir.path().join("engine")).expect("engine dir");
        fs::write(dir.path().join("bundle/Mesh.cpp"), "cpp").expect("write cpp");
        fs::write(dir.path().join("extensions.json"), CATALOG).expect("write catalog");
        dir
    }

    fn settings(root: &Path, invocation: Invocation) -> Settings {
        Settings {
            manifest: root.join("extensions.json"),
            log_level: "warn".to_string(),
            log_dir: None,
            missing_path: MissingPathPolicy::Ignore,
            invocation,
        }
    }

    fn apply(extension: &str, action: Action) -> Invocation {
        Invocation::Apply {
            action,
            extension: extension.to_string(),
        }
    }

    #[test]
    fn failing_install_exits_with_operation_failure() {
        let dir = workspace();
        let mut out = Vec::new();
        let mut err_out = Vec::new();

        let code = run(
            &settings(dir.path(), apply("assimp", Action::Install)),
            &mut out,
            &mut err_out,
        )
        .expect("io");

        assert_eq!(code, EXIT_OP_FAILED);
        let text = String::from_utf8(out).expect("utf-8");
        assert!(text.contains("Installing assimp..."));
        assert!(text.contains("Failed installing assimp at step 2"));
        assert!(dir.path().join("engine/Mesh.cpp").exists());
    }

    #[test]
    fn full_install_then_remove_succeeds() {
        let dir = workspace();
        fs::write(dir.path().join("bundle/Mesh.hpp"), "hpp").expect("write hpp");

        for action in [Action::Install, Action::Remove, Action::Remove] {
            let mut out = Vec::new();
            let mut err_out = Vec::new();
            let code = run(
                &settings(dir.path(), apply("assimp", action)),
                &mut out,
                &mut err_out,
            )
            .expect("io");
            assert_eq!(code, EXIT_OK, "{action} should succeed");
        }
        assert!(!dir.path().join("engine/Mesh.cpp").exists());
        assert!(!dir.path().join("engine/Mesh.hpp").exists());
    }

    #[test]
    fn unknown_extension_is_a_configuration_error() {
        let dir = workspace();
        let mut out = Vec::new();
        let mut err_out = Vec::new();

        let code = run(
            &settings(dir.path(), apply("imgui", Action::Install)),
            &mut out,
            &mut err_out,
        )
        .expect("io");

        assert_eq!(code, EXIT_CONFIG_ERROR);
        let text = String::from_utf8(err_out).expect("utf-8");
        assert!(text.contains("unknown extension `imgui` (available: assimp)"));
    }

    #[test]
    fn missing_catalog_is_a_configuration_error() {
        let dir = TempDir::new().expect("temp dir");
        let mut out = Vec::new();
        let mut err_out = Vec::new();

        let code = run(&settings(dir.path(), Invocation::List), &mut out, &mut err_out)
            .expect("io");
        assert_eq!(code, EXIT_CONFIG_ERROR);
        assert!(out.is_empty());
    }
}
