//! Cutoff timestamp from version-control history.

use chrono::{DateTime, NaiveDateTime};
use std::path::Path;

/// Timestamp of the repository's latest commit, if `root` is inside a git
/// work tree. Any failure (no git, not a repository, no commits) yields
/// `None` and the caller falls back to the current time.
pub fn latest_commit_time(root: &Path) -> Option<NaiveDateTime> {
    let output = std::process::Command::new("git")
        .args(["log", "-1", "--pretty=format:%ct"])
        .current_dir(root)
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let seconds: i64 = String::from_utf8_lossy(&output.stdout).trim().parse().ok()?;
    DateTime::from_timestamp(seconds, 0).map(|dt| dt.naive_utc())
}
