//! DAG view of a resolved dependency set.
//!
//! Nodes live in an arena pool addressed by index; successor lists are
//! built once and the precursor (in-degree) counts are the only field
//! mutated during construction. Edges to names outside the resolved set are
//! dropped, never left dangling.

use crate::engine::DependencySet;
use crate::native::augmented_requirements;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone)]
pub struct DagNode {
    pub name: String,
    successors: Vec<usize>,
    pub precursor_count: usize,
}

impl DagNode {
    pub fn successors(&self) -> &[usize] {
        &self.successors
    }
}

/// Arena of [`DagNode`]s over one resolved dependency set.
#[derive(Debug, Clone)]
pub struct DepGraph {
    nodes: Vec<DagNode>,
    index: BTreeMap<String, usize>,
}

impl DepGraph {
    /// One node per resolved package; an edge per (native-augmented)
    /// requirement that is itself in the set.
    pub fn build(deps: &DependencySet) -> Self {
        let mut nodes = Vec::new();
        let mut index = BTreeMap::new();

        for meta in deps.iter() {
            index.insert(meta.info.name.to_lowercase(), nodes.len());
            nodes.push(DagNode {
                name: meta.info.name.clone(),
                successors: Vec::new(),
                precursor_count: 0,
            });
        }

        for meta in deps.iter() {
            let from = index[&meta.info.name.to_lowercase()];
            for requirement in augmented_requirements(meta) {
                let Some(&to) = index.get(&requirement.to_lowercase()) else {
                    continue;
                };
                nodes[from].successors.push(to);
                nodes[to].precursor_count += 1;
            }
        }

        Self { nodes, index }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, index: usize) -> &DagNode {
        &self.nodes[index]
    }

    pub fn get(&self, name: &str) -> Option<&DagNode> {
        self.index.get(&name.to_lowercase()).map(|&i| &self.nodes[i])
    }

    pub fn nodes(&self) -> impl Iterator<Item = &DagNode> {
        self.nodes.iter()
    }

    /// The root forest: nodes nothing depends on, in name order.
    pub fn roots(&self) -> Vec<usize> {
        self.index
            .values()
            .copied()
            .filter(|&i| self.nodes[i].precursor_count == 0)
            .collect()
    }

    /// Indented depth-first render of the root forest. A node already
    /// printed renders as `*name` and is not expanded again, keeping the
    /// output bounded for shared subgraphs and cycles.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let mut printed = BTreeSet::new();
        for root in self.roots() {
            out.push_str(&self.nodes[root].name);
            out.push('\n');
            self.render_successors(root, 0, &mut printed, &mut out);
        }
        out
    }

    fn render_successors(
        &self,
        index: usize,
        layer: usize,
        printed: &mut BTreeSet<usize>,
        out: &mut String,
    ) {
        for &successor in &self.nodes[index].successors {
            out.push_str(&"|  ".repeat(layer));
            out.push_str("+- ");
            let repeat = !printed.insert(successor);
            if repeat {
                out.push('*');
            }
            out.push_str(&self.nodes[successor].name);
            out.push('\n');
            if !repeat {
                self.render_successors(successor, layer + 1, printed, out);
            }
        }
    }
}
