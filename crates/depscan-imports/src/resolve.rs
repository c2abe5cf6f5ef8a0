//! Four-tier classification of dotted import paths.
//!
//! Tier order is fixed and first-match-wins: standard library, then the
//! importing file's directory, then the project root, then each ancestor
//! directory strictly between the two.

use crate::name_path::DottedName;
use crate::stdlib::is_stdlib_module;
use std::path::{Path, PathBuf};

/// Extension of the source files the resolver descends to.
pub const SOURCE_EXTENSION: &str = "py";

/// One import statement occurrence: the dotted path, the file it appeared
/// in, and the project root it was scanned under. Created per statement and
/// consumed straight into resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSite {
    pub path: DottedName,
    pub file: PathBuf,
    pub project_root: PathBuf,
}

/// Outcome of resolving one dotted import path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Matched the standard-library catalog.
    Stdlib,
    /// Resolved to a module file or package directory inside the project.
    Local(PathBuf),
    /// No tier matched: a likely external dependency.
    Unresolved,
}

/// Resolver for one project tree.
pub struct ImportResolver {
    project_root: PathBuf,
}

impl ImportResolver {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        let project_root: PathBuf = project_root.into();
        let project_root = project_root
            .canonicalize()
            .unwrap_or_else(|_| project_root.clone());
        Self { project_root }
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Build an [`ImportSite`] for a path encountered in `file`.
    pub fn site(&self, path: DottedName, file: &Path) -> ImportSite {
        ImportSite {
            path,
            file: file.to_path_buf(),
            project_root: self.project_root.clone(),
        }
    }

    /// Classify one import site.
    pub fn resolve_site(&self, site: &ImportSite) -> Resolution {
        self.resolve(&site.path, &site.file)
    }

    /// Classify `name` as imported from `importing_file`.
    pub fn resolve(&self, name: &DottedName, importing_file: &Path) -> Resolution {
        if is_stdlib_module(&name.to_string()) {
            return Resolution::Stdlib;
        }

        let file_dir = importing_file
            .parent()
            .map(|dir| dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf()))
            .unwrap_or_else(|| self.project_root.clone());

        if let Some(path) = resolve_under(&file_dir, name.segments()) {
            return Resolution::Local(path);
        }

        if let Some(path) = resolve_under(&self.project_root, name.segments()) {
            return Resolution::Local(path);
        }

        // Ancestors strictly between the file's directory and the project
        // root; both endpoints were tried above.
        if file_dir != self.project_root && file_dir.starts_with(&self.project_root) {
            let mut current = file_dir.parent();
            while let Some(dir) = current {
                if dir == self.project_root {
                    break;
                }
                if let Some(path) = resolve_under(dir, name.segments()) {
                    return Resolution::Local(path);
                }
                current = dir.parent();
            }
        }

        Resolution::Unresolved
    }
}

/// Consume path segments from `root`, descending into same-named
/// subdirectories; the final segment may instead be a `<segment>.py` file.
/// Iterative rather than recursive: directory nesting depth is unbounded
/// input.
fn resolve_under(root: &Path, segments: &[String]) -> Option<PathBuf> {
    let mut dir = root.to_path_buf();
    for (i, segment) in segments.iter().enumerate() {
        let subdir = dir.join(segment);
        if subdir.is_dir() {
            dir = subdir;
            continue;
        }
        if i + 1 == segments.len() {
            let file = dir.join(format!("{}.{}", segment, SOURCE_EXTENSION));
            if file.is_file() {
                return Some(file);
            }
        }
        return None;
    }
    Some(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "").unwrap();
    }

    fn name(path: &str) -> DottedName {
        DottedName::parse(path).unwrap()
    }

    #[test]
    fn stdlib_wins_over_project_local() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        // A local os.py must not shadow the standard library.
        touch(&root.join("os.py"));
        touch(&root.join("main.py"));

        let resolver = ImportResolver::new(root);
        assert_eq!(resolver.resolve(&name("os"), &root.join("main.py")), Resolution::Stdlib);
    }

    #[test]
    fn relative_tier_resolves_sibling_module() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        touch(&root.join("a/helper.py"));
        touch(&root.join("a/b.py"));

        let resolver = ImportResolver::new(root);
        match resolver.resolve(&name("helper"), &root.join("a/b.py")) {
            Resolution::Local(path) => assert!(path.ends_with("a/helper.py")),
            other => panic!("expected local resolution, got {:?}", other),
        }
    }

    #[test]
    fn project_root_tier_resolves_when_relative_fails() {
        // from pkg.sub import X in proj/a/b.py, with proj/pkg/sub.py present
        // but no proj/a/pkg: the project-root tier must resolve it.
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        touch(&root.join("pkg/sub.py"));
        touch(&root.join("a/b.py"));

        let resolver = ImportResolver::new(root);
        match resolver.resolve(&name("pkg.sub"), &root.join("a/b.py")) {
            Resolution::Local(path) => assert!(path.ends_with("pkg/sub.py")),
            other => panic!("expected local resolution, got {:?}", other),
        }
    }

    #[test]
    fn ancestor_tier_searches_between_file_and_root() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        touch(&root.join("x/shared/util.py"));
        touch(&root.join("x/y/z/deep.py"));

        let resolver = ImportResolver::new(root);
        // Not under x/y/z (relative) nor under the root directly; found
        // under the intermediate ancestor x/.
        match resolver.resolve(&name("shared.util"), &root.join("x/y/z/deep.py")) {
            Resolution::Local(path) => assert!(path.ends_with("x/shared/util.py")),
            other => panic!("expected local resolution, got {:?}", other),
        }
    }

    #[test]
    fn package_directory_resolves_without_file() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("pkg/inner")).unwrap();
        touch(&root.join("main.py"));

        let resolver = ImportResolver::new(root);
        match resolver.resolve(&name("pkg.inner"), &root.join("main.py")) {
            Resolution::Local(path) => assert!(path.ends_with("pkg/inner")),
            other => panic!("expected local resolution, got {:?}", other),
        }
    }

    #[test]
    fn unresolved_external_name() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        touch(&root.join("main.py"));

        let resolver = ImportResolver::new(root);
        assert_eq!(
            resolver.resolve(&name("requests"), &root.join("main.py")),
            Resolution::Unresolved
        );
    }

    #[test]
    fn classification_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        touch(&root.join("pkg/sub.py"));
        touch(&root.join("main.py"));

        let resolver = ImportResolver::new(root);
        let first = resolver.resolve(&name("pkg.sub"), &root.join("main.py"));
        let second = resolver.resolve(&name("pkg.sub"), &root.join("main.py"));
        assert_eq!(first, second);
    }

    #[test]
    fn file_at_project_root_has_no_ancestor_tier() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        touch(&root.join("main.py"));

        let resolver = ImportResolver::new(root);
        assert_eq!(
            resolver.resolve(&name("missing"), &root.join("main.py")),
            Resolution::Unresolved
        );
    }
}
