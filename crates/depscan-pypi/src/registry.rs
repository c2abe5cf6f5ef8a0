//! Registry lookup: trait, PyPI client, import-name aliases.

use crate::model::PackageMetadata;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Import names whose registry package is spelled differently. Applied
/// before lookup; a failed lookup is still recorded under the original
/// import guess.
pub const IMPORT_ALIASES: &[(&str, &str)] = &[
    ("attr", "attrs"),
    ("skimage", "scikit-image"),
    ("sklearn", "scikit-learn"),
    ("cv2", "opencv-python"),
    ("OpenSSL", "pyOpenSSL"),
    ("pydispatch", "PyDispatcher"),
    ("pil", "Pillow"),
    ("dotenv", "python-dotenv"),
    ("docx", "python-docx"),
];

/// Registry name to query for an import guess. Alias keys match
/// case-insensitively (`PIL` and `pil` both map to `Pillow`).
pub fn registry_name(import_name: &str) -> &str {
    IMPORT_ALIASES
        .iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(import_name))
        .map(|(_, package)| *package)
        .unwrap_or(import_name)
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("package {0} not found in registry")]
    NotFound(String),
    #[error("registry request failed: {0}")]
    Http(String),
    #[error("malformed registry response: {0}")]
    Decode(String),
}

/// Fetch package metadata by name. Network-backed implementations may fail
/// transiently; every failure is non-fatal to a resolution run.
pub trait Registry: Send + Sync {
    fn fetch(&self, name: &str) -> Result<PackageMetadata, RegistryError>;
}

/// PyPI JSON API client.
pub struct PyPiRegistry {
    base_url: String,
    agent: ureq::Agent,
}

impl PyPiRegistry {
    pub const DEFAULT_BASE_URL: &'static str = "https://pypi.org/pypi";

    pub fn new() -> Self {
        Self::with_base_url(Self::DEFAULT_BASE_URL)
    }

    /// Point the client at a different index (tests, mirrors).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(30))
            .build();
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            agent,
        }
    }
}

impl Default for PyPiRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry for PyPiRegistry {
    fn fetch(&self, name: &str) -> Result<PackageMetadata, RegistryError> {
        let url = format!("{}/{}/json", self.base_url, name);
        debug!(%url, "registry lookup");
        match self.agent.get(&url).call() {
            Ok(response) => response
                .into_json()
                .map_err(|err| RegistryError::Decode(err.to_string())),
            Err(ureq::Error::Status(404, _)) => Err(RegistryError::NotFound(name.to_string())),
            Err(err) => Err(RegistryError::Http(err.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_table_rewrites_known_imports() {
        assert_eq!(registry_name("cv2"), "opencv-python");
        assert_eq!(registry_name("sklearn"), "scikit-learn");
        assert_eq!(registry_name("OpenSSL"), "pyOpenSSL");
    }

    #[test]
    fn alias_lookup_is_case_insensitive() {
        assert_eq!(registry_name("PIL"), "Pillow");
        assert_eq!(registry_name("CV2"), "opencv-python");
    }

    #[test]
    fn unknown_names_pass_through() {
        assert_eq!(registry_name("requests"), "requests");
        assert_eq!(registry_name("numpy"), "numpy");
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let registry = PyPiRegistry::with_base_url("http://127.0.0.1:9/pypi/");
        assert_eq!(registry.base_url, "http://127.0.0.1:9/pypi");
    }
}
