//! Whole-graph ingestion: load a set of proof nodes and the links between
//! them from JSON, order them topologically, and verify every node in that
//! order.
//!
//! The single-node verifier (`crate::verify`) only knows how to check one
//! node against already-verified premises; this module is what actually
//! builds the `NodeId` arena and premise lists that `verify` needs, the way
//! the original source's `newProofGraph` builds a `ProofGraph` from parsed
//! JSON before recursively verifying it node by node.

use fnv::{FnvHashMap, FnvHashSet};
use log::{debug, info, warn};
use serde::Deserialize;

use crate::diag::Diag;
use crate::formula::Formula;
use crate::sexpr;
use crate::verify::{self, NodeId, Premise, ProofNode, Rule};

/// The schema this crate accepts: a flat node list plus a list of
/// premise-to-conclusion edges, mirroring the external JSON interface.
#[derive(Debug, Deserialize)]
pub struct ProofGraphJson {
    pub nodes: Vec<NodeJson>,
    pub links: Vec<LinkJson>,
}

#[derive(Debug, Deserialize)]
pub struct NodeJson {
    pub id: u64,
    pub formula: String,
    pub justification: String,
}

#[derive(Debug, Deserialize)]
pub struct LinkJson {
    pub from: u64,
    pub to: u64,
}

/// An in-memory proof DAG: every node's formula and justification, its
/// premises (in link-insertion order) and children, and the set of nodes
/// with no premises at all (the graph's free assumptions).
#[derive(Debug, Default)]
pub struct ProofGraph {
    nodes: Vec<ProofNode>,
    children: Vec<Vec<NodeId>>,
    assumptions: FnvHashSet<NodeId>,
}

impl ProofGraph {
    #[must_use]
    pub fn node(&self, id: NodeId) -> &ProofNode {
        &self.nodes[id]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        &self.children[id]
    }

    /// Nodes with no premises — the free assumptions of the proof.
    #[must_use]
    pub fn assumptions(&self) -> &FnvHashSet<NodeId> {
        &self.assumptions
    }

    /// Parses the JSON whole-graph schema, builds one [`ProofNode`] per
    /// record, and wires `links` into premise/children adjacency. The
    /// `from`/`to` fields of `links` refer to the `id` field of `nodes`,
    /// not positional indices, so `id`s need not be contiguous; internally
    /// every node is renumbered to a dense `NodeId` in input order.
    pub fn from_json(input: &str) -> Result<Self, Diag> {
        let parsed: ProofGraphJson = serde_json::from_str(input)
            .map_err(|e| Diag::syntax(format!("malformed proof graph JSON: {e}"), 0, 0))?;

        let mut index_of: FnvHashMap<u64, NodeId> = FnvHashMap::default();
        let mut nodes = Vec::with_capacity(parsed.nodes.len());
        for (i, raw) in parsed.nodes.iter().enumerate() {
            if index_of.insert(raw.id, i).is_some() {
                return Err(Diag::syntax(format!("duplicate node id {}", raw.id), 0, 0));
            }
            let formula = sexpr::parse_formula(&raw.formula)?;
            let justification: Rule = raw.justification.parse()?;
            nodes.push(ProofNode::new(formula, justification, Vec::new()));
        }

        let mut children: Vec<Vec<NodeId>> = vec![Vec::new(); nodes.len()];
        for link in &parsed.links {
            let from = *index_of
                .get(&link.from)
                .ok_or_else(|| Diag::syntax(format!("link refers to unknown node id {}", link.from), 0, 0))?;
            let to = *index_of
                .get(&link.to)
                .ok_or_else(|| Diag::syntax(format!("link refers to unknown node id {}", link.to), 0, 0))?;
            nodes[to].parents.push(from);
            children[from].push(to);
        }

        let assumptions = nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.parents.is_empty())
            .map(|(i, _)| i)
            .collect();

        Ok(ProofGraph { nodes, children, assumptions })
    }

    /// A topological order over the premise/children edges (Kahn's
    /// algorithm). Returns `Err` if the graph has a cycle — `verify` can
    /// never succeed on a node before every one of its premises has, so a
    /// cyclic graph has no node it could start from.
    pub fn topo_order(&self) -> Result<Vec<NodeId>, Diag> {
        let mut in_degree: Vec<usize> = self.nodes.iter().map(|n| n.parents.len()).collect();
        let mut ready: Vec<NodeId> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, &d)| d == 0)
            .map(|(i, _)| i)
            .collect();
        ready.sort_unstable();
        let mut queue = std::collections::VecDeque::from(ready);
        let mut order = Vec::with_capacity(self.nodes.len());

        while let Some(id) = queue.pop_front() {
            order.push(id);
            let mut newly_ready = Vec::new();
            for &child in &self.children[id] {
                in_degree[child] -= 1;
                if in_degree[child] == 0 {
                    newly_ready.push(child);
                }
            }
            newly_ready.sort_unstable();
            queue.extend(newly_ready);
        }

        if order.len() != self.nodes.len() {
            return Err(Diag::verification("proof graph contains a cycle".to_string()));
        }
        Ok(order)
    }

    /// Verifies every node in topological order, returning the assumption
    /// set computed for each successfully-verified node and the first
    /// diagnostic hit for every node that failed.
    pub fn verify_all(&self) -> Vec<(NodeId, Result<FnvHashSet<NodeId>, Diag>)> {
        let order = match self.topo_order() {
            Ok(order) => order,
            Err(diag) => return self.nodes.iter().enumerate().map(|(id, _)| (id, Err(diag.clone()))).collect(),
        };

        let mut assumptions: FnvHashMap<NodeId, FnvHashSet<NodeId>> = FnvHashMap::default();
        let formula_of = |id: NodeId| -> &Formula { &self.nodes[id].formula };
        let mut results = Vec::with_capacity(self.nodes.len());
        let mut failures = 0usize;

        for id in order {
            let node = &self.nodes[id];
            let premises: Vec<Premise> = node
                .parents
                .iter()
                .map(|&pid| Premise {
                    id: pid,
                    formula: &self.nodes[pid].formula,
                    assumptions: assumptions.get(&pid).expect("premises verify before their dependents"),
                })
                .collect();
            let outcome = verify::verify(id, node, &premises, &formula_of);
            match &outcome {
                Ok(set) => {
                    debug!("node {id} ({}) verified via {}", sexpr::render(&node.formula), node.justification);
                    assumptions.insert(id, set.clone());
                }
                Err(diag) => {
                    warn!("node {id} ({}) failed every permutation: {diag}", sexpr::render(&node.formula));
                    failures += 1;
                    assumptions.insert(id, FnvHashSet::default());
                }
            }
            results.push((id, outcome));
        }

        info!("verified {}/{} nodes, {failures} failing", results.len() - failures, results.len());
        results
    }
}

#[cfg(feature = "dot")]
mod dot {
    use dot_writer::{Attributes, DotWriter};

    use super::ProofGraph;
    use crate::sexpr;

    impl ProofGraph {
        /// Renders the proof DAG as Graphviz DOT source: one node per proof
        /// step labelled with its rule and rendered formula, an edge from
        /// every premise to each node that cites it.
        #[must_use]
        pub fn write_dot(&self) -> String {
            let mut output = Vec::new();
            {
                let mut writer = DotWriter::from(&mut output);
                writer.set_pretty_print(true);
                let mut digraph = writer.digraph();
                for (id, node) in self.nodes.iter().enumerate() {
                    let label = format!("{}: {}", node.justification, sexpr::render(&node.formula));
                    digraph.node_named(id.to_string()).set_label(&label);
                }
                for (id, node) in self.nodes.iter().enumerate() {
                    for &parent in &node.parents {
                        digraph.edge(parent.to_string(), id.to_string());
                    }
                }
            }
            String::from_utf8(output).expect("dot-writer only emits ASCII/UTF-8 output")
        }
    }
}
