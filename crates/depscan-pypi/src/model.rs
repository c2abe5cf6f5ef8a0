//! Serde model of the PyPI package document.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One package's registry record: `/pypi/{name}/json`.
///
/// Unknown fields in the document are ignored. Treated as immutable once
/// fetched; identity is the canonical `info.name`, case-insensitive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageMetadata {
    pub info: PackageInfo,
    #[serde(default)]
    pub releases: BTreeMap<String, Vec<Release>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageInfo {
    #[serde(default)]
    pub author: Option<String>,
    /// Canonical registry name, possibly differing from the import name.
    pub name: String,
    /// Latest declared version label.
    pub version: String,
    /// Raw PEP 508 requirement specifiers, environment markers included.
    #[serde(default)]
    pub requires_dist: Option<Vec<String>>,
}

/// One uploaded artifact of one version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Release {
    /// Naive ISO-8601 upload timestamp, as PyPI reports it.
    pub upload_time: NaiveDateTime,
    /// Platform-compatibility tag: "py3", "cp38", "source", "3.6", …
    #[serde(default)]
    pub python_version: Option<String>,
}

impl PackageMetadata {
    /// Candidate names from the unconditional requirement specifiers:
    /// specifiers carrying an environment marker (`;`) are discarded, and
    /// the first whitespace-delimited token of each survivor is taken
    /// verbatim — `numpy (>=1.14)` yields `numpy`, while a spaceless
    /// `idna>=2.5,<4` yields the whole token and will simply miss in the
    /// registry.
    pub fn declared_requirements(&self) -> BTreeSet<String> {
        self.info
            .requires_dist
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter(|spec| !spec.contains(';'))
            .filter_map(|spec| spec.split_whitespace().next())
            .map(str::to_string)
            .collect()
    }
}
