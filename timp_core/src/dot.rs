//! Optional DOT-format export, for visual debugging only. Not part of the
//! verification contract: no `model_check_*` function calls into this
//! module.

use std::collections::{HashSet, VecDeque};

use crate::automaton::Gba;
use crate::graph::Graph;
use crate::kripke::KripkeStructure;

/// Render the subgraph reachable from `seeds` as a `digraph G { ... }`
/// string, labeling each node with `label`.
pub fn graph_to_dot<G: Graph>(graph: &G, seeds: impl IntoIterator<Item = G::Node>, label: impl Fn(&G::Node) -> String) -> String {
    let mut nodes: HashSet<G::Node> = HashSet::new();
    let mut edges: Vec<(G::Node, G::Node)> = Vec::new();
    let mut queue: VecDeque<G::Node> = VecDeque::new();

    for seed in seeds {
        if nodes.insert(seed) {
            queue.push_back(seed);
        }
    }

    while let Some(current) = queue.pop_front() {
        for succ in graph.successors(&current) {
            edges.push((current, succ));
            if nodes.insert(succ) {
                queue.push_back(succ);
            }
        }
    }

    let mut out = String::from("digraph G {\n");
    for node in &nodes {
        out.push_str(&format!("  \"{node:?}\" [label=\"{}\"]\n", label(node)));
    }
    for (source, target) in &edges {
        out.push_str(&format!("  \"{source:?}\" -> \"{target:?}\"\n"));
    }
    out.push('}');
    out
}

/// DOT rendering of a [`KripkeStructure`], labeling each state with its
/// atomic propositions.
pub fn kripke_to_dot(kripke: &KripkeStructure) -> String {
    graph_to_dot(kripke, [kripke.initial()], |state| {
        kripke
            .labels(*state)
            .iter()
            .map(|ap| ap.0.clone())
            .collect::<Vec<_>>()
            .join(", ")
    })
}

/// DOT rendering of a [`Gba`], labeling each state with its `Debug` payload.
pub fn gba_to_dot<S: std::fmt::Debug>(gba: &Gba<S>) -> String {
    graph_to_dot(gba, gba.initial_states().iter().copied(), |state| {
        format!("{:?}", gba.payload(*state))
    })
}
