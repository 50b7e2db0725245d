//! Writing generated units to an output directory.
//!
//! Output is full-replace: every unit is rewritten atomically on every run.
//! Files in the directory that start with the generated header but were not
//! produced by this run are stale and get removed. Files without the header
//! are never touched.

use std::collections::HashSet;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use vmbridge_manifest::store::write_atomic;

use crate::swift::GeneratedUnit;
use crate::GenerateError;

/// What [`write_units`] changed on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputReport {
    pub written: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
}

/// Write `units` into `out_dir` and prune stale generated files.
pub fn write_units(
    out_dir: &Path,
    units: &[GeneratedUnit],
    header: &str,
) -> Result<OutputReport, GenerateError> {
    let io_error = |path: &Path| {
        let path = path.to_path_buf();
        move |source| GenerateError::Io { path, source }
    };

    fs::create_dir_all(out_dir).map_err(io_error(out_dir))?;

    let mut report = OutputReport::default();
    let mut produced = HashSet::new();
    for unit in units {
        let path = out_dir.join(&unit.file_name);
        write_atomic(&path, unit.source.as_bytes()).map_err(io_error(&path))?;
        tracing::debug!(path = %path.display(), view_model = %unit.qualified_name, "unit written");
        produced.insert(unit.file_name.clone());
        report.written.push(path);
    }

    let first_header_line = header.lines().next().unwrap_or_default().trim_end();
    if !first_header_line.is_empty() {
        for dir_entry in fs::read_dir(out_dir).map_err(io_error(out_dir))? {
            let path = dir_entry.map_err(io_error(out_dir))?.path();
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if produced.contains(file_name) || !path.is_file() {
                continue;
            }
            if starts_with_header(&path, first_header_line) {
                fs::remove_file(&path).map_err(io_error(&path))?;
                tracing::info!(path = %path.display(), "stale unit removed");
                report.removed.push(path);
            }
        }
    }

    report.removed.sort();
    tracing::info!(
        dir = %out_dir.display(),
        written = report.written.len(),
        removed = report.removed.len(),
        "output updated"
    );
    Ok(report)
}

fn starts_with_header(path: &Path, header_line: &str) -> bool {
    let Ok(file) = fs::File::open(path) else {
        return false;
    };
    let mut first = String::new();
    match BufReader::new(file).read_line(&mut first) {
        Ok(_) => first.trim_end() == header_line,
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "could not inspect file; left in place"
            );
            false
        }
    }
}
