//! Dotted import paths.

use std::fmt;

/// A dotted module path (`a.b.c`) as an ordered, non-empty list of
/// identifier segments.
///
/// Equality, ordering and hashing are on the full joined path. The first
/// segment doubles as the guessed package name when the import cannot be
/// resolved inside the project tree.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DottedName {
    segments: Vec<String>,
}

impl DottedName {
    /// Build from pre-split segments. Returns `None` when the list is empty
    /// or any segment is empty.
    pub fn new<I, S>(segments: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() || segments.iter().any(|s| s.is_empty()) {
            return None;
        }
        Some(Self { segments })
    }

    /// Parse a `a.b.c` path. Returns `None` for the empty string and for
    /// paths with empty segments (leading/trailing/double dots).
    pub fn parse(path: &str) -> Option<Self> {
        Self::new(path.split('.'))
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// First segment: the guessed top-level package name.
    pub fn head(&self) -> &str {
        &self.segments[0]
    }

}

impl fmt::Display for DottedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}
