//! Builds a [`KripkeStructure`] by breadth-first exploration of a TIMP
//! program's reachable configurations.

use std::collections::{BTreeSet, HashMap, VecDeque};

use crate::error::Result;
use crate::graph::Graph;
use crate::timp::Configuration;

/// Newtype index into a [`KripkeStructure`]'s state arena.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct KripkeState(usize);

/// An atomic proposition label. Equality is by symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AtomicProposition(pub String);

impl AtomicProposition {
    /// Build an AP from anything string-like.
    pub fn new(name: impl Into<String>) -> Self {
        AtomicProposition(name.into())
    }
}

/// A labeled, total, finite transition system explored from a TIMP module's
/// initial configuration. One state per distinct `Configuration` reached.
#[derive(Debug, Clone)]
pub struct KripkeStructure {
    configurations: Vec<Configuration>,
    labels: Vec<BTreeSet<AtomicProposition>>,
    successors: Vec<Vec<KripkeState>>,
    predecessors: Vec<Vec<KripkeState>>,
    initial: KripkeState,
}

impl KripkeStructure {
    /// Explore the reachable configurations from `initial`, labeling each
    /// discovered state with the true-valued variables and the active
    /// annotations at its head command.
    pub fn build(initial: Configuration) -> Result<KripkeStructure> {
        let mut builder = Builder {
            configurations: Vec::new(),
            labels: Vec::new(),
            successors: Vec::new(),
            predecessors: Vec::new(),
            index: HashMap::new(),
        };

        let initial_id = builder.intern(initial)?;
        let mut queue: VecDeque<KripkeState> = VecDeque::from([initial_id]);
        let mut explored = BTreeSet::from([initial_id]);

        while let Some(id) = queue.pop_front() {
            let config = builder.configurations[id.0].clone();
            for succ_config in config.successors()? {
                let succ_id = builder.intern(succ_config)?;
                builder.successors[id.0].push(succ_id);
                builder.predecessors[succ_id.0].push(id);
                if explored.insert(succ_id) {
                    queue.push_back(succ_id);
                }
            }
        }

        Ok(KripkeStructure {
            configurations: builder.configurations,
            labels: builder.labels,
            successors: builder.successors,
            predecessors: builder.predecessors,
            initial: initial_id,
        })
    }

    /// The state reached by exploration's starting configuration.
    pub fn initial(&self) -> KripkeState {
        self.initial
    }

    /// Every discovered state, in discovery order.
    pub fn states(&self) -> impl Iterator<Item = KripkeState> {
        (0..self.configurations.len()).map(KripkeState)
    }

    /// The atomic propositions true at `state`.
    pub fn labels(&self, state: KripkeState) -> &BTreeSet<AtomicProposition> {
        &self.labels[state.0]
    }

    /// The TIMP configuration a state was built from.
    pub fn configuration(&self, state: KripkeState) -> &Configuration {
        &self.configurations[state.0]
    }
}

impl Graph for KripkeStructure {
    type Node = KripkeState;

    fn successors(&self, node: &KripkeState) -> Vec<KripkeState> {
        self.successors[node.0].clone()
    }

    fn predecessors(&self, node: &KripkeState) -> Vec<KripkeState> {
        self.predecessors[node.0].clone()
    }
}

struct Builder {
    configurations: Vec<Configuration>,
    labels: Vec<BTreeSet<AtomicProposition>>,
    successors: Vec<Vec<KripkeState>>,
    predecessors: Vec<Vec<KripkeState>>,
    index: HashMap<Configuration, KripkeState>,
}

impl Builder {
    fn intern(&mut self, config: Configuration) -> Result<KripkeState> {
        if let Some(&id) = self.index.get(&config) {
            return Ok(id);
        }
        let id = KripkeState(self.configurations.len());
        let label = labeling(&config)?;
        self.configurations.push(config.clone());
        self.labels.push(label);
        self.successors.push(Vec::new());
        self.predecessors.push(Vec::new());
        self.index.insert(config, id);
        Ok(id)
    }
}

fn labeling(config: &Configuration) -> Result<BTreeSet<AtomicProposition>> {
    let mut labels = BTreeSet::new();
    for (var, value) in &config.state {
        if *value {
            labels.insert(AtomicProposition::new(var.0.clone()));
        }
    }
    for annotation in config.active_annotations()? {
        labels.insert(AtomicProposition::new(annotation));
    }
    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timp::{BooleanExpression, Command, Module, Variable};

    #[test]
    fn single_assign_program_has_two_states() {
        let x = Variable::new("x");
        let command = Command::assign(x.clone(), BooleanExpression::Constant(true)).annotate("a");
        let module = Module::new("m", command);
        let initial = module.initial_configuration(crate::timp::State::new());
        let kripke = KripkeStructure::build(initial).unwrap();

        // two distinct configurations: pre-step (x=false) and post-step (x=true, Skip)
        assert_eq!(kripke.states().count(), 2);
        let initial_labels = kripke.labels(kripke.initial());
        assert!(initial_labels.is_empty());
    }

    #[test]
    fn repeat_toggle_explores_exactly_two_states() {
        let x = Variable::new("x");
        let toggle = Command::assign(x.clone(), BooleanExpression::Not(Box::new(BooleanExpression::var("x"))))
            .annotate("tick");
        let command = Command::repeat(toggle);
        let module = Module::new("m", command);
        let initial = module.initial_configuration(crate::timp::State::new());
        let kripke = KripkeStructure::build(initial.clone()).unwrap();

        // repeat(toggle) with x=false and repeat(toggle) with x=true: a 2-cycle
        assert_eq!(kripke.states().count(), 2);
        let succs = Graph::successors(&kripke, &kripke.initial());
        assert_eq!(succs.len(), 1);
        assert_ne!(succs[0], kripke.initial());
        let back = Graph::successors(&kripke, &succs[0]);
        assert_eq!(back, vec![kripke.initial()]);
    }
}
