//! Project-wide import scanning.

use crate::extract::extract_imports;
use crate::resolve::{ImportResolver, Resolution, SOURCE_EXTENSION};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Aggregated result of scanning one project tree.
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Full dotted paths that matched no resolution tier.
    pub unresolved: BTreeSet<String>,
    pub files_scanned: usize,
    /// Files skipped because they could not be read or parsed.
    pub files_skipped: usize,
}

/// Scan every `.py` file under `root`, classifying each import and
/// collecting the unresolved dotted paths.
///
/// Unreadable or unparseable files are logged and skipped; a single bad
/// file never aborts the scan.
pub fn scan_project(root: &Path) -> ScanReport {
    let resolver = ImportResolver::new(root);
    let mut report = ScanReport::default();

    for entry in WalkDir::new(root).into_iter().filter_map(Result::ok) {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(SOURCE_EXTENSION) {
            continue;
        }
        scan_file(path, &resolver, &mut report);
    }

    report
}

/// Scan a single source file into `report`.
pub fn scan_file(file: &Path, resolver: &ImportResolver, report: &mut ScanReport) {
    let source = match std::fs::read_to_string(file) {
        Ok(source) => source,
        Err(err) => {
            warn!(file = %file.display(), %err, "skipping unreadable file");
            report.files_skipped += 1;
            return;
        }
    };

    let imports = match extract_imports(&source) {
        Ok(imports) => imports,
        Err(err) => {
            warn!(file = %file.display(), %err, "skipping unparseable file");
            report.files_skipped += 1;
            return;
        }
    };

    report.files_scanned += 1;
    for import in imports {
        let site = resolver.site(import.path, file);
        if let Resolution::Unresolved = resolver.resolve_site(&site) {
            debug!(file = %file.display(), path = %site.path, "unresolved import");
            report.unresolved.insert(site.path.to_string());
        }
    }
}

/// Derive the guessed external package names: the first segment of every
/// unresolved dotted path.
pub fn guessed_package_names(unresolved: &BTreeSet<String>) -> BTreeSet<String> {
    unresolved
        .iter()
        .filter_map(|path| path.split('.').next())
        .filter(|head| !head.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(path: &Path, contents: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn aggregates_unresolved_names_across_files() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write(&root.join("app.py"), "import os\nimport flask\nfrom helpers import x\n");
        write(&root.join("helpers.py"), "import numpy.linalg\n");

        let report = scan_project(root);
        assert_eq!(report.files_scanned, 2);
        let unresolved: Vec<_> = report.unresolved.iter().cloned().collect();
        assert_eq!(unresolved, ["flask", "numpy.linalg"]);
    }

    #[test]
    fn bad_files_are_skipped_not_fatal() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write(&root.join("ok.py"), "import requests\n");
        write(&root.join("broken.py"), "def f(:\n");

        let report = scan_project(root);
        assert_eq!(report.files_scanned, 1);
        assert_eq!(report.files_skipped, 1);
        assert!(report.unresolved.contains("requests"));
    }

    #[test]
    fn guessed_names_take_first_segments() {
        let unresolved: BTreeSet<String> = ["numpy.linalg", "numpy.fft", "yaml"]
            .into_iter()
            .map(String::from)
            .collect();
        let guesses: Vec<_> = guessed_package_names(&unresolved).into_iter().collect();
        assert_eq!(guesses, ["numpy", "yaml"]);
    }
}
