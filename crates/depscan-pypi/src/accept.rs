//! Release acceptability against a target Python version and time window.

use crate::model::{PackageMetadata, Release};
use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

/// Default historical floor: releases older than this are rejected.
pub fn default_historical_floor() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2017, 1, 1)
        .unwrap_or_default()
        .and_hms_opt(0, 0, 0)
        .unwrap_or_default()
}

/// Which releases the historical floor applies to. The source history is
/// inconsistent on this point, so it is explicit configuration here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FloorScope {
    /// Every release must be at or after the floor.
    #[default]
    AllReleases,
    /// Only `source`-tagged releases are floored.
    SourceOnly,
}

/// Target runtime version, e.g. `3` or `3.9`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PythonTarget {
    major: String,
    minor: Option<String>,
}

impl PythonTarget {
    /// Parse `"3"` or `"3.9"`. Components must be digits.
    pub fn parse(version: &str) -> Option<Self> {
        let mut parts = version.split('.');
        let major = parts.next()?;
        let minor = parts.next();
        if parts.next().is_some() {
            return None;
        }
        if major.is_empty() || !major.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        if let Some(minor) = minor
            && (minor.is_empty() || !minor.chars().all(|c| c.is_ascii_digit()))
        {
            return None;
        }
        Some(Self {
            major: major.to_string(),
            minor: minor.map(str::to_string),
        })
    }

    pub fn major(&self) -> &str {
        &self.major
    }

    pub fn minor(&self) -> Option<&str> {
        self.minor.as_deref()
    }
}

/// Compatibility classifications of one release tag. Not mutually
/// exclusive: `cp39` against target `3.9` is both MAJOR- and
/// MINOR-compatible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Compat {
    pub major: bool,
    pub minor: bool,
    pub source: bool,
}

impl Compat {
    pub fn any(&self) -> bool {
        self.major || self.minor || self.source
    }

    /// Selection rank: MINOR over MAJOR over source-only.
    fn rank(&self) -> u8 {
        if self.minor {
            2
        } else if self.major {
            1
        } else {
            0
        }
    }
}

#[derive(Debug, Error)]
pub enum AcceptError {
    #[error("no release found for package {package} version {version}")]
    MissingLatestRelease { package: String, version: String },
    #[error("{package} is not acceptable. Latest version: {latest_version}.\n{rejected_tags}")]
    NoAcceptableRelease {
        package: String,
        latest_version: String,
        rejected_tags: String,
    },
}

/// Acceptability configuration for one resolution run.
#[derive(Debug, Clone)]
pub struct AcceptancePolicy {
    pub target: PythonTarget,
    /// Releases uploaded after this instant are rejected (project's latest
    /// commit time, or "now").
    pub cutoff: NaiveDateTime,
    pub historical_floor: NaiveDateTime,
    pub floor_scope: FloorScope,
}

impl AcceptancePolicy {
    pub fn new(target: PythonTarget, cutoff: NaiveDateTime) -> Self {
        Self {
            target,
            cutoff,
            historical_floor: default_historical_floor(),
            floor_scope: FloorScope::default(),
        }
    }

    /// Classify a release tag against the target version.
    pub fn classify(&self, release: &Release) -> Compat {
        let mut compat = Compat::default();
        let Some(tag) = release.python_version.as_deref() else {
            return compat;
        };
        let tag = tag.to_ascii_lowercase();
        if tag == "source" {
            compat.source = true;
            return compat;
        }

        // Bare digit forms ("3", "36", "3.6") and prefixed forms ("py3",
        // "cp38", and compound tags like "py2.py3").
        let major = self.target.major();
        if tag.starts_with(major)
            || tag.contains(&format!("py{}", major))
            || tag.contains(&format!("cp{}", major))
        {
            compat.major = true;
        }
        if let Some(minor) = self.target.minor() {
            for pair in [format!("{}.{}", major, minor), format!("{}{}", major, minor)] {
                if tag == pair
                    || tag.contains(&format!("py{}", pair))
                    || tag.contains(&format!("cp{}", pair))
                {
                    compat.minor = true;
                }
            }
        }
        compat
    }

    /// One release's acceptability: inside the time window and carrying a
    /// compatible tag.
    pub fn is_acceptable(&self, release: &Release) -> bool {
        if release.upload_time > self.cutoff {
            return false;
        }
        let compat = self.classify(release);
        if !compat.any() {
            return false;
        }
        match self.floor_scope {
            FloorScope::AllReleases => release.upload_time >= self.historical_floor,
            FloorScope::SourceOnly => {
                !compat.source || release.upload_time >= self.historical_floor
            }
        }
    }

    /// Acceptable releases of one version, most preferred first: MINOR over
    /// MAJOR over source-only, ties broken by earlier upload.
    pub fn accepted_releases(&self, releases: &[Release]) -> Vec<Release> {
        let mut accepted: Vec<Release> = releases
            .iter()
            .filter(|r| self.is_acceptable(r))
            .cloned()
            .collect();
        accepted.sort_by(|a, b| {
            self.classify(b)
                .rank()
                .cmp(&self.classify(a).rank())
                .then(a.upload_time.cmp(&b.upload_time))
        });
        accepted
    }

    /// Package-level gate: the latest declared version must have at least
    /// one acceptable release. The failure lists every rejected tag.
    pub fn check_package(&self, meta: &PackageMetadata) -> Result<(), AcceptError> {
        let latest = &meta.info.version;
        let Some(releases) = meta.releases.get(latest) else {
            return Err(AcceptError::MissingLatestRelease {
                package: meta.info.name.clone(),
                version: latest.clone(),
            });
        };

        if releases.iter().any(|r| self.is_acceptable(r)) {
            return Ok(());
        }

        let rejected_tags = releases
            .iter()
            .map(|r| match r.python_version.as_deref() {
                Some(tag) if tag.eq_ignore_ascii_case("source") => {
                    format!("source release {}", r.upload_time)
                }
                Some(tag) => tag.to_string(),
                None => "(no tag)".to_string(),
            })
            .collect::<Vec<_>>()
            .join("\n");

        Err(AcceptError::NoAcceptableRelease {
            package: meta.info.name.clone(),
            latest_version: latest.clone(),
            rejected_tags,
        })
    }

    /// Rewrite one package's release map to acceptable releases only,
    /// dropping versions left empty.
    pub fn accepted_package(&self, meta: &PackageMetadata) -> PackageMetadata {
        let mut filtered = PackageMetadata {
            info: meta.info.clone(),
            releases: Default::default(),
        };
        for (version, releases) in &meta.releases {
            if releases.is_empty() {
                continue;
            }
            let accepted = self.accepted_releases(releases);
            if !accepted.is_empty() {
                filtered.releases.insert(version.clone(), accepted);
            }
        }
        filtered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PackageInfo;
    use std::collections::BTreeMap;

    fn dt(y: i32, mo: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn release(y: i32, mo: u32, d: u32, tag: Option<&str>) -> Release {
        Release {
            upload_time: dt(y, mo, d),
            python_version: tag.map(str::to_string),
        }
    }

    fn policy(target: &str, cutoff: NaiveDateTime) -> AcceptancePolicy {
        AcceptancePolicy::new(PythonTarget::parse(target).unwrap(), cutoff)
    }

    fn package(name: &str, version: &str, releases: &[(&str, Vec<Release>)]) -> PackageMetadata {
        PackageMetadata {
            info: PackageInfo {
                author: None,
                name: name.to_string(),
                version: version.to_string(),
                requires_dist: None,
            },
            releases: releases
                .iter()
                .map(|(v, r)| (v.to_string(), r.clone()))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    #[test]
    fn target_parsing() {
        let target = PythonTarget::parse("3.9").unwrap();
        assert_eq!(target.major(), "3");
        assert_eq!(target.minor(), Some("9"));

        let target = PythonTarget::parse("3").unwrap();
        assert_eq!(target.minor(), None);

        assert!(PythonTarget::parse("").is_none());
        assert!(PythonTarget::parse("3.x").is_none());
        assert!(PythonTarget::parse("3.9.1").is_none());
    }

    #[test]
    fn tag_classification() {
        let policy = policy("3.9", dt(2022, 1, 1));

        let compat = policy.classify(&release(2020, 1, 1, Some("cp39")));
        assert!(compat.major && compat.minor && !compat.source);

        let compat = policy.classify(&release(2020, 1, 1, Some("py3")));
        assert!(compat.major && !compat.minor);

        let compat = policy.classify(&release(2020, 1, 1, Some("3.9")));
        assert!(compat.major && compat.minor);

        let compat = policy.classify(&release(2020, 1, 1, Some("source")));
        assert!(compat.source && !compat.major);

        // Universal wheels carry a compound tag; the py3 half matches.
        let compat = policy.classify(&release(2020, 1, 1, Some("py2.py3")));
        assert!(compat.major && !compat.minor);

        let compat = policy.classify(&release(2020, 1, 1, Some("py2")));
        assert!(!compat.any());

        let compat = policy.classify(&release(2020, 1, 1, None));
        assert!(!compat.any());
    }

    #[test]
    fn floor_rejects_old_releases_regardless_of_tag() {
        // 2016-06-01 cp37: tag-compatible, but below the 2017-01-01 floor.
        let policy = policy("3.7", dt(2022, 1, 1));
        assert!(!policy.is_acceptable(&release(2016, 6, 1, Some("cp37"))));
        assert!(policy.is_acceptable(&release(2017, 6, 1, Some("cp37"))));
    }

    #[test]
    fn source_only_floor_scope() {
        let mut policy = policy("3.7", dt(2022, 1, 1));
        policy.floor_scope = FloorScope::SourceOnly;
        // Binary tags escape the floor under this scope; source does not.
        assert!(policy.is_acceptable(&release(2016, 6, 1, Some("cp37"))));
        assert!(!policy.is_acceptable(&release(2016, 6, 1, Some("source"))));
        assert!(policy.is_acceptable(&release(2017, 6, 1, Some("source"))));
    }

    #[test]
    fn cutoff_rejects_later_uploads() {
        let policy = policy("3", dt(2019, 1, 1));
        assert!(!policy.is_acceptable(&release(2019, 6, 1, Some("py3"))));
        assert!(policy.is_acceptable(&release(2018, 6, 1, Some("py3"))));
    }

    #[test]
    fn tightening_cutoff_never_grows_accepted_set() {
        let releases = vec![
            release(2017, 3, 1, Some("py3")),
            release(2018, 3, 1, Some("cp36")),
            release(2019, 3, 1, Some("source")),
            release(2020, 3, 1, Some("py3")),
        ];
        let loose = policy("3.6", dt(2021, 1, 1));
        let tight = policy("3.6", dt(2018, 6, 1));

        let loose_accepted = loose.accepted_releases(&releases);
        let tight_accepted = tight.accepted_releases(&releases);

        assert!(tight_accepted.len() <= loose_accepted.len());
        for r in &tight_accepted {
            assert!(loose_accepted.iter().any(|l| l.upload_time == r.upload_time));
        }
    }

    #[test]
    fn selection_prefers_minor_then_major_then_chronology() {
        let releases = vec![
            release(2018, 1, 1, Some("source")),
            release(2018, 2, 1, Some("py3")),
            release(2018, 3, 1, Some("cp36")),
            release(2018, 4, 1, Some("cp36")),
        ];
        let policy = policy("3.6", dt(2021, 1, 1));
        let ranked = policy.accepted_releases(&releases);

        let tags: Vec<_> = ranked
            .iter()
            .map(|r| (r.python_version.clone().unwrap(), r.upload_time))
            .collect();
        assert_eq!(tags[0], ("cp36".to_string(), dt(2018, 3, 1)));
        assert_eq!(tags[1], ("cp36".to_string(), dt(2018, 4, 1)));
        assert_eq!(tags[2], ("py3".to_string(), dt(2018, 2, 1)));
        assert_eq!(tags[3], ("source".to_string(), dt(2018, 1, 1)));
    }

    #[test]
    fn package_gate_is_on_latest_version() {
        let policy = policy("3", dt(2021, 1, 1));

        // Old version acceptable, latest py2-only: whole package rejected.
        let meta = package(
            "legacy",
            "2.0",
            &[
                ("1.0", vec![release(2018, 1, 1, Some("py3"))]),
                ("2.0", vec![release(2019, 1, 1, Some("py2"))]),
            ],
        );
        let err = policy.check_package(&meta).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("legacy is not acceptable"));
        assert!(message.contains("Latest version: 2.0"));
        assert!(message.contains("py2"));

        let meta = package("ok", "1.0", &[("1.0", vec![release(2018, 1, 1, Some("py3"))])]);
        assert!(policy.check_package(&meta).is_ok());
    }

    #[test]
    fn package_gate_requires_release_list_for_latest() {
        let policy = policy("3", dt(2021, 1, 1));
        let meta = package("ghost", "9.9", &[("1.0", vec![release(2018, 1, 1, Some("py3"))])]);
        let err = policy.check_package(&meta).unwrap_err();
        assert!(matches!(err, AcceptError::MissingLatestRelease { .. }));
    }

    #[test]
    fn rewrite_drops_versions_left_empty() {
        let policy = policy("3", dt(2021, 1, 1));
        let meta = package(
            "mixed",
            "2.0",
            &[
                ("1.0", vec![release(2016, 1, 1, Some("py3"))]),
                ("1.5", vec![]),
                (
                    "2.0",
                    vec![
                        release(2019, 1, 1, Some("py2")),
                        release(2019, 1, 2, Some("py3")),
                    ],
                ),
            ],
        );
        let filtered = policy.accepted_package(&meta);
        assert_eq!(filtered.releases.len(), 1);
        assert_eq!(filtered.releases["2.0"].len(), 1);
        assert_eq!(filtered.releases["2.0"][0].python_version.as_deref(), Some("py3"));
    }
}
