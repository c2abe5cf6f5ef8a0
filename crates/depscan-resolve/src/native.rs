//! Native-extension build quirks.
//!
//! A few packages need build-time dependencies the registry does not
//! declare: pyarrow builds against numpy and cython, and numpy itself needs
//! cython available first. These pairs are hardcoded — they are the known
//! exceptions, not a general build-system model.

use crate::engine::DependencySet;
use depscan_pypi::PackageMetadata;
use std::collections::{BTreeMap, BTreeSet};

const PYARROW: &str = "pyarrow";
const NUMPY: &str = "numpy";
const CYTHON: &str = "cython";

/// A package's unconditional requirement names, with the undeclared
/// native-build requirements of pyarrow added in.
pub fn augmented_requirements(meta: &PackageMetadata) -> BTreeSet<String> {
    let mut requirements = meta.declared_requirements();
    if meta.info.name.eq_ignore_ascii_case(PYARROW) {
        requirements.insert(CYTHON.to_string());
        requirements.insert(NUMPY.to_string());
    }
    requirements
}

/// Build-time ordering of the resolved set: every package's prerequisites
/// precede it. Forced native pairs apply — cython before numpy, and both
/// before pyarrow — with cython inserted into the list even when it never
/// resolved. Deterministic (name-ordered) and cycle-safe.
pub fn build_order(deps: &DependencySet) -> Vec<String> {
    let mut prerequisites: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for meta in deps.iter() {
        let name = meta.info.name.clone();
        let mut pre: BTreeSet<String> = augmented_requirements(meta)
            .iter()
            .filter_map(|req| deps.get(req).map(|m| m.info.name.clone()))
            .collect();

        if name.eq_ignore_ascii_case(PYARROW) {
            pre.insert(canonical_or(deps, NUMPY));
            pre.insert(canonical_or(deps, CYTHON));
        }
        if name.eq_ignore_ascii_case(NUMPY) {
            pre.insert(canonical_or(deps, CYTHON));
        }

        prerequisites.insert(name, pre);
    }

    // Forced prerequisites may name packages outside the resolved set;
    // give them nodes so they still appear ahead of their dependents.
    let forced: Vec<String> = prerequisites.values().flatten().cloned().collect();
    for name in forced {
        prerequisites.entry(name).or_default();
    }

    let mut order = Vec::new();
    let mut visited = BTreeSet::new();
    let mut in_progress = BTreeSet::new();
    let names: Vec<String> = prerequisites.keys().cloned().collect();
    for name in &names {
        visit(name, &prerequisites, &mut visited, &mut in_progress, &mut order);
    }
    order
}

fn canonical_or(deps: &DependencySet, name: &str) -> String {
    deps.get(name)
        .map(|meta| meta.info.name.clone())
        .unwrap_or_else(|| name.to_string())
}

fn visit(
    name: &str,
    prerequisites: &BTreeMap<String, BTreeSet<String>>,
    visited: &mut BTreeSet<String>,
    in_progress: &mut BTreeSet<String>,
    order: &mut Vec<String>,
) {
    if visited.contains(name) || in_progress.contains(name) {
        return;
    }
    in_progress.insert(name.to_string());
    if let Some(pre) = prerequisites.get(name) {
        for prerequisite in pre {
            visit(prerequisite, prerequisites, visited, in_progress, order);
        }
    }
    in_progress.remove(name);
    visited.insert(name.to_string());
    order.push(name.to_string());
}
