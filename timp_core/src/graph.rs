//! Generic directed-graph algorithms shared by the Kripke structure, the
//! Büchi automata, and the DTMC transition graph.
//!
//! Every algorithm here is iterative: recursive DFS/Tarjan formulations
//! overflow the call stack on the large configuration graphs a TIMP program
//! can unfold into, so each traversal keeps its own explicit work stack.

use std::collections::{HashMap, HashSet, VecDeque};
use std::hash::Hash;

use crate::error::{Error, Result};

/// A directed graph a node can query locally: its successors, and
/// (for backward search) its predecessors.
pub trait Graph {
    /// The node type. Cheaply copyable identifiers (`usize` newtypes) are
    /// the expected instantiation, matching the rest of the crate.
    type Node: Copy + Eq + Hash + std::fmt::Debug;

    /// Outgoing neighbors of `node`.
    fn successors(&self, node: &Self::Node) -> Vec<Self::Node>;

    /// Incoming neighbors of `node`.
    fn predecessors(&self, node: &Self::Node) -> Vec<Self::Node>;
}

/// Nodes reachable from `seeds`, following successor edges.
pub fn forward_reachable<G: Graph>(
    graph: &G,
    seeds: impl IntoIterator<Item = G::Node>,
) -> HashSet<G::Node> {
    reachable(graph, seeds, true)
}

/// Nodes that can reach `seeds`, following predecessor edges (i.e. `Pre*`).
pub fn backward_reachable<G: Graph>(
    graph: &G,
    seeds: impl IntoIterator<Item = G::Node>,
) -> HashSet<G::Node> {
    reachable(graph, seeds, false)
}

fn reachable<G: Graph>(
    graph: &G,
    seeds: impl IntoIterator<Item = G::Node>,
    forward: bool,
) -> HashSet<G::Node> {
    let mut stack: Vec<G::Node> = seeds.into_iter().collect();
    let mut explored: HashSet<G::Node> = stack.iter().copied().collect();
    while let Some(current) = stack.pop() {
        let neighbors = if forward {
            graph.successors(&current)
        } else {
            graph.predecessors(&current)
        };
        for next in neighbors {
            if explored.insert(next) {
                stack.push(next);
            }
        }
    }
    explored
}

/// Shortest (fewest-edges) path from `source` to the first member of
/// `targets` encountered by a breadth-first search. Fails with
/// [`Error::NoPath`] if no target is reachable.
pub fn shortest_path<G: Graph>(
    graph: &G,
    source: G::Node,
    targets: &HashSet<G::Node>,
) -> Result<Vec<G::Node>> {
    if targets.contains(&source) {
        return Ok(vec![source]);
    }

    let mut pred: HashMap<G::Node, G::Node> = HashMap::new();
    let mut explored: HashSet<G::Node> = HashSet::from([source]);
    let mut queue: VecDeque<G::Node> = VecDeque::from([source]);
    let mut found = None;

    'search: while let Some(current) = queue.pop_front() {
        for succ in graph.successors(&current) {
            if explored.insert(succ) {
                pred.insert(succ, current);
                if targets.contains(&succ) {
                    found = Some(succ);
                    break 'search;
                }
                queue.push_back(succ);
            }
        }
    }

    let target = found.ok_or(Error::NoPath)?;
    let mut path = vec![target];
    let mut current = target;
    while current != source {
        current = pred[&current];
        path.push(current);
    }
    path.reverse();
    Ok(path)
}

/// Strongly connected components reachable from `seed`, computed with the
/// iterative "necklace" variant of Tarjan's algorithm: a stack of
/// `(representative, members)` beads is coalesced whenever a back-edge to an
/// active node is found. Trivial SCCs (a single node without a self-loop)
/// are dropped, since LTL acceptance requires a genuine cycle.
///
/// Returns the SCCs in the order they finish (reverse topological order)
/// together with the DFS-tree predecessor map (the node each node was first
/// discovered from), which callers use to reconstruct a path into an SCC.
pub fn tarjan<G: Graph>(graph: &G, seed: G::Node) -> (Vec<Vec<G::Node>>, HashMap<G::Node, G::Node>) {
    struct Frame<N> {
        node: N,
        succs: Vec<N>,
        idx: usize,
    }

    let mut dfs_num: HashMap<G::Node, usize> = HashMap::new();
    let mut counter = 0usize;
    let mut active: HashSet<G::Node> = HashSet::new();
    // Each bead is (representative node, members in discovery order).
    let mut necklace: Vec<(G::Node, Vec<G::Node>)> = Vec::new();
    let mut sccs: Vec<Vec<G::Node>> = Vec::new();
    let mut pred: HashMap<G::Node, G::Node> = HashMap::new();

    let mut stack: Vec<Frame<G::Node>> = Vec::new();

    dfs_num.insert(seed, counter);
    counter += 1;
    active.insert(seed);
    necklace.push((seed, vec![seed]));
    stack.push(Frame {
        node: seed,
        succs: graph.successors(&seed),
        idx: 0,
    });

    while let Some(frame) = stack.last_mut() {
        if frame.idx < frame.succs.len() {
            let succ = frame.succs[frame.idx];
            frame.idx += 1;
            if active.contains(&succ) {
                let succ_num = dfs_num[&succ];
                let (mut root, mut members) = necklace.pop().expect("necklace non-empty while active nodes exist");
                while dfs_num[&root] > succ_num {
                    let (r, m) = necklace.pop().expect("necklace covers every active node");
                    members.extend(m);
                    root = r;
                }
                necklace.push((root, members));
            } else if !dfs_num.contains_key(&succ) {
                pred.insert(succ, frame.node);
                dfs_num.insert(succ, counter);
                counter += 1;
                active.insert(succ);
                necklace.push((succ, vec![succ]));
                let succ_succs = graph.successors(&succ);
                stack.push(Frame {
                    node: succ,
                    succs: succ_succs,
                    idx: 0,
                });
            }
        } else {
            let finished = stack.pop().expect("frame just matched by last_mut");
            let is_root = necklace
                .last()
                .map(|(root, _)| *root == finished.node)
                .unwrap_or(false);
            if is_root {
                let (_, members) = necklace.pop().expect("checked above");
                for node in &members {
                    active.remove(node);
                }
                sccs.push(members);
            }
        }
    }

    let sccs = sccs
        .into_iter()
        .filter(|scc| scc.len() > 1 || graph.successors(&scc[0]).contains(&scc[0]))
        .collect();

    (sccs, pred)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap as Map;

    struct AdjGraph(Map<usize, Vec<usize>>);

    impl Graph for AdjGraph {
        type Node = usize;

        fn successors(&self, node: &usize) -> Vec<usize> {
            self.0.get(node).cloned().unwrap_or_default()
        }

        fn predecessors(&self, node: &usize) -> Vec<usize> {
            self.0
                .iter()
                .filter(|(_, succs)| succs.contains(node))
                .map(|(n, _)| *n)
                .collect()
        }
    }

    #[test]
    fn dag_has_no_nontrivial_sccs() {
        let g = AdjGraph(Map::from([(0, vec![1]), (1, vec![2]), (2, vec![])]));
        let (sccs, _) = tarjan(&g, 0);
        assert!(sccs.is_empty());
    }

    #[test]
    fn self_loop_is_a_trivial_but_valid_scc() {
        let g = AdjGraph(Map::from([(0, vec![0])]));
        let (sccs, _) = tarjan(&g, 0);
        assert_eq!(sccs, vec![vec![0]]);
    }

    #[test]
    fn three_cycle_is_one_scc() {
        let g = AdjGraph(Map::from([(0, vec![1]), (1, vec![2]), (2, vec![0])]));
        let (sccs, _) = tarjan(&g, 0);
        assert_eq!(sccs.len(), 1);
        let mut members = sccs[0].clone();
        members.sort();
        assert_eq!(members, vec![0, 1, 2]);
    }

    #[test]
    fn tail_leading_into_a_cycle() {
        // 0 -> 1 -> 2 -> 1  (cycle between 1 and 2, 0 is a trivial tail)
        let g = AdjGraph(Map::from([(0, vec![1]), (1, vec![2]), (2, vec![1])]));
        let (sccs, pred) = tarjan(&g, 0);
        assert_eq!(sccs.len(), 1);
        let mut members = sccs[0].clone();
        members.sort();
        assert_eq!(members, vec![1, 2]);
        assert_eq!(pred[&1], 0);
    }

    #[test]
    fn bfs_finds_shortest_path() {
        let g = AdjGraph(Map::from([(0, vec![1, 2]), (1, vec![3]), (2, vec![3])]));
        let path = shortest_path(&g, 0, &HashSet::from([3])).unwrap();
        assert_eq!(path.len(), 3);
        assert_eq!(*path.first().unwrap(), 0);
        assert_eq!(*path.last().unwrap(), 3);
    }

    #[test]
    fn bfs_reports_no_path() {
        let g = AdjGraph(Map::from([(0, vec![1]), (1, vec![])]));
        assert!(matches!(
            shortest_path(&g, 0, &HashSet::from([2])),
            Err(Error::NoPath)
        ));
    }

    #[test]
    fn backward_reachable_follows_predecessors() {
        let g = AdjGraph(Map::from([(0, vec![1]), (1, vec![2]), (2, vec![])]));
        let back = backward_reachable(&g, [2]);
        assert_eq!(back, HashSet::from([0, 1, 2]));
    }
}
