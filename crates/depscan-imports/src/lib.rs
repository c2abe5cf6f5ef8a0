//! Import discovery for Python projects.
//!
//! This crate covers the static half of dependency scanning: parsing each
//! source file's import statements with tree-sitter, and classifying every
//! dotted import path as standard-library, project-local, or unresolved via
//! a fixed four-tier filesystem search.
//!
//! Unresolved names are the input to registry resolution (`depscan-pypi`,
//! `depscan-resolve`); this crate never touches the network.

pub mod extract;
pub mod name_path;
pub mod resolve;
pub mod stdlib;
pub mod walker;

pub use extract::{ExtractError, ExtractedImport, MAX_IMPORT_DEPTH, extract_imports};
pub use name_path::DottedName;
pub use resolve::{ImportResolver, ImportSite, Resolution, SOURCE_EXTENSION};
pub use stdlib::is_stdlib_module;
pub use walker::{ScanReport, guessed_package_names, scan_project};
