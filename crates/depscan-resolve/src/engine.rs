//! Fixpoint resolution of guessed package names against a registry.

use crate::native::augmented_requirements;
use depscan_pypi::{AcceptancePolicy, PackageMetadata, Registry, registry_name};
use rayon::prelude::*;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Resolved packages, keyed case-insensitively by canonical registry name.
#[derive(Debug, Default, Clone)]
pub struct DependencySet {
    packages: BTreeMap<String, PackageMetadata>,
}

impl DependencySet {
    /// Insert under the package's canonical name. Returns false when a
    /// package with that name (case-insensitively) is already present.
    pub fn insert(&mut self, meta: PackageMetadata) -> bool {
        let key = meta.info.name.to_lowercase();
        if self.packages.contains_key(&key) {
            return false;
        }
        self.packages.insert(key, meta);
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.packages.contains_key(&name.to_lowercase())
    }

    pub fn get(&self, name: &str) -> Option<&PackageMetadata> {
        self.packages.get(&name.to_lowercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = &PackageMetadata> {
        self.packages.values()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Apply the acceptability rewrite to every package: each release map
    /// keeps acceptable releases only, versions left empty are dropped.
    pub fn accepted(&self, policy: &AcceptancePolicy) -> DependencySet {
        DependencySet {
            packages: self
                .packages
                .iter()
                .map(|(key, meta)| (key.clone(), policy.accepted_package(meta)))
                .collect(),
        }
    }
}

impl Serialize for DependencySet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.packages.len()))?;
        for meta in self.packages.values() {
            map.serialize_entry(&meta.info.name, meta)?;
        }
        map.end()
    }
}

/// Names known not to resolve, recorded under the originally-guessed
/// spelling with case-insensitive identity. Grows monotonically; exists to
/// avoid repeat lookups within one run.
#[derive(Debug, Default, Clone)]
pub struct FailedSet {
    names: BTreeMap<String, String>,
}

impl FailedSet {
    pub fn insert(&mut self, name: &str) -> bool {
        self.names
            .insert(name.to_lowercase(), name.to_string())
            .is_none()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(&name.to_lowercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.values().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Result of one resolution run. `dependencies` and `failed` are disjoint.
#[derive(Debug, Default)]
pub struct ResolutionOutcome {
    pub dependencies: DependencySet,
    pub failed: FailedSet,
    /// Canonical names resolved directly from the seed guesses.
    pub seeded: BTreeSet<String>,
}

/// Resolve the guessed top-level names into a closed dependency set.
///
/// Seed lookups fan out in parallel — distinct names have no ordering
/// dependency and set insertion is idempotent per key. The expansion loop
/// snapshots the set at the start of each pass and restarts the outer pass
/// after any pass that added a package; it halts when a full pass over the
/// current set discovers nothing new.
pub fn resolve_dependencies<R>(
    seeds: &BTreeSet<String>,
    registry: &R,
    policy: &AcceptancePolicy,
) -> ResolutionOutcome
where
    R: Registry + ?Sized,
{
    let mut outcome = ResolutionOutcome::default();

    let seed_results: Vec<(String, Result<PackageMetadata, String>)> = seeds
        .par_iter()
        .map(|seed| (seed.clone(), lookup(registry, policy, seed)))
        .collect();

    for (seed, result) in seed_results {
        match result {
            Ok(meta) => {
                outcome.seeded.insert(meta.info.name.clone());
                outcome.dependencies.insert(meta);
            }
            Err(err) => {
                warn!(name = %seed, err, "failed to find package in registry");
                outcome.failed.insert(&seed);
            }
        }
    }

    loop {
        let mut added = false;
        // Observe the set as of the start of this pass.
        let pending_lists: Vec<BTreeSet<String>> = outcome
            .dependencies
            .iter()
            .map(augmented_requirements)
            .collect();

        for pending in pending_lists {
            for candidate in &pending {
                if outcome.dependencies.contains(candidate) || outcome.failed.contains(candidate)
                {
                    continue;
                }
                match lookup(registry, policy, candidate) {
                    Ok(meta) => {
                        debug!(name = %meta.info.name, "resolved transitive dependency");
                        added |= outcome.dependencies.insert(meta);
                    }
                    Err(err) => {
                        warn!(name = %candidate, err, "failed to find package in registry");
                        outcome.failed.insert(candidate);
                    }
                }
            }
            if added {
                break;
            }
        }

        if !added {
            break;
        }
    }

    outcome
}

/// One registry lookup: alias the import guess, fetch, gate on
/// acceptability. Any failure is reported as a string reason; the caller
/// records it and continues.
fn lookup<R>(
    registry: &R,
    policy: &AcceptancePolicy,
    import_guess: &str,
) -> Result<PackageMetadata, String>
where
    R: Registry + ?Sized,
{
    let query = registry_name(import_guess);
    let meta = registry.fetch(query).map_err(|err| err.to_string())?;
    policy.check_package(&meta).map_err(|err| err.to_string())?;
    Ok(meta)
}
