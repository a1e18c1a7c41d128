//! Human-readable console output.

use extkit_core::{Action, ExecutionResult, ExtensionManifest, ManifestCatalog, OpStatus};
use std::io::{self, Write};
use std::path::Path;

const BANNER: &str = "-----------------------------";

fn heading_verb(action: Action) -> &'static str {
    match action {
        Action::Install => "Installing",
        Action::Remove => "Removing",
    }
}

fn summary_verb(action: Action) -> &'static str {
    match action {
        Action::Install => "installing",
        Action::Remove => "removing",
    }
}

pub fn write_header(
    out: &mut impl Write,
    manifest: &ExtensionManifest,
    action: Action,
    base_dir: &Path,
) -> io::Result<()> {
    writeln!(out, "{BANNER}")?;
    writeln!(out, "{} {}...", heading_verb(action), manifest.name)?;
    writeln!(out, "{BANNER}")?;
    writeln!(out)?;
    writeln!(out, "Catalog directory: {}", base_dir.display())?;
    writeln!(out)
}

/// One line per operation, then the summary banner and, on success, notes.
pub fn write_result(
    out: &mut impl Write,
    manifest: &ExtensionManifest,
    result: &ExecutionResult,
) -> io::Result<()> {
    let total = result.reports.len();
    for report in &result.reports {
        write!(
            out,
            "[{}/{}] {:<8} {}",
            report.index + 1,
            total,
            report.status.label(),
            report.op
        )?;
        if let OpStatus::Failed(err) = &report.status {
            write!(out, ": {err}")?;
        }
        writeln!(out)?;
    }

    writeln!(out)?;
    writeln!(out, "{BANNER}")?;
    match result.first_failure() {
        None => writeln!(
            out,
            "Finished {} {}: {} operations succeeded.",
            summary_verb(result.action),
            result.extension,
            result.succeeded_count()
        )?,
        Some((report, err)) => {
            writeln!(
                out,
                "Failed {} {} at step {}: {err}",
                summary_verb(result.action),
                result.extension,
                report.index + 1
            )?;
            writeln!(out, "Affected path: {}", err.path().display())?;
            writeln!(
                out,
                "{} succeeded, {} failed, {} skipped.",
                result.succeeded_count(),
                result.failed_count(),
                result.skipped_count()
            )?;
        }
    }
    writeln!(out, "{BANNER}")?;

    if result.success() && !manifest.notes.is_empty() {
        writeln!(out)?;
        for note in &manifest.notes {
            writeln!(out, "{note}")?;
        }
    }
    Ok(())
}

pub fn write_listing(out: &mut impl Write, catalog: &ManifestCatalog) -> io::Result<()> {
    if catalog.is_empty() {
        return writeln!(out, "No extensions declared.");
    }
    for manifest in catalog.manifests() {
        match &manifest.description {
            Some(description) => writeln!(out, "{:<16} {description}", manifest.name)?,
            None => writeln!(out, "{}", manifest.name)?,
        }
    }
    Ok(())
}

pub fn write_check(
    out: &mut impl Write,
    catalog: &ManifestCatalog,
    catalog_path: &Path,
) -> io::Result<()> {
    writeln!(
        out,
        "{}: {} extension(s), all valid",
        catalog_path.display(),
        catalog.len()
    )?;
    for manifest in catalog.manifests() {
        writeln!(
            out,
            "  {:<16} install={} remove={}",
            manifest.name,
            manifest.install.len(),
            manifest.remove.len()
        )?;
    }
    Ok(())
}
