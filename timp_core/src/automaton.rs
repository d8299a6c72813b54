//! Generic (generalized) Büchi automaton: an arena of states (each carrying
//! an arbitrary payload — an elementary set, an annotation set, or a pair of
//! component-automaton references) plus `Vec`-indexed transitions, and the
//! synchronous product construction used by LTL model checking.

use std::collections::BTreeSet;

use crate::error::Result;
use crate::graph::Graph;
use crate::kripke::AtomicProposition;

/// Newtype index into a [`Gba`]'s state arena.
#[derive(Debug, Clone, Copy, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct AutomatonState(usize);

/// A letter of the automaton's alphabet: a subset of atomic propositions.
pub type Letter = BTreeSet<AtomicProposition>;

/// A generalized Büchi automaton over payload type `S`. `S` is the
/// "property bag" §3 describes: the elementary set that labels an LTL
/// tableau state, the annotation set labeling a program-GBA state, or (for
/// a product automaton) a pair of component state references.
#[derive(Debug, Clone)]
pub struct Gba<S> {
    alphabet: BTreeSet<AtomicProposition>,
    payloads: Vec<S>,
    outgoing: Vec<Vec<(Letter, AutomatonState)>>,
    incoming: Vec<Vec<AutomatonState>>,
    initial: Vec<AutomatonState>,
    accepting: Vec<BTreeSet<AutomatonState>>,
}

impl<S> Gba<S> {
    /// An automaton with no states yet, over `alphabet`.
    pub fn new(alphabet: BTreeSet<AtomicProposition>) -> Self {
        Gba {
            alphabet,
            payloads: Vec::new(),
            outgoing: Vec::new(),
            incoming: Vec::new(),
            initial: Vec::new(),
            accepting: Vec::new(),
        }
    }

    /// This automaton's alphabet.
    pub fn alphabet(&self) -> &BTreeSet<AtomicProposition> {
        &self.alphabet
    }

    /// Add a fresh state carrying `payload`, returning its id.
    pub fn add_state(&mut self, payload: S) -> AutomatonState {
        let id = AutomatonState(self.payloads.len());
        self.payloads.push(payload);
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        id
    }

    /// Add a transition `source --letter--> target`.
    pub fn add_transition(&mut self, source: AutomatonState, letter: Letter, target: AutomatonState) {
        self.outgoing[source.0].push((letter, target));
        self.incoming[target.0].push(source);
    }

    /// Replace the initial-state set.
    pub fn set_initial(&mut self, initial: Vec<AutomatonState>) {
        self.initial = initial;
    }

    /// Append an accepting state set (generalized Büchi acceptance: an
    /// infinite run accepts iff it visits every accepting set infinitely
    /// often).
    pub fn add_accepting_set(&mut self, set: BTreeSet<AutomatonState>) {
        self.accepting.push(set);
    }

    /// The automaton's initial states.
    pub fn initial_states(&self) -> &[AutomatonState] {
        &self.initial
    }

    /// The automaton's accepting state sets.
    pub fn accepting_sets(&self) -> &[BTreeSet<AutomatonState>] {
        &self.accepting
    }

    /// This state's payload.
    pub fn payload(&self, state: AutomatonState) -> &S {
        &self.payloads[state.0]
    }

    /// Every state in the automaton, in creation order.
    pub fn states(&self) -> impl Iterator<Item = AutomatonState> {
        (0..self.payloads.len()).map(AutomatonState)
    }

    /// Transitions leaving `state`, as `(letter, target)` pairs, in
    /// insertion order.
    pub fn transitions_from(&self, state: AutomatonState) -> &[(Letter, AutomatonState)] {
        &self.outgoing[state.0]
    }

    /// Replace a multi-initial-state automaton with a single fresh initial
    /// state whose outgoing edges are the union of the originals'. Tarjan
    /// and the product construction both want a single root to search
    /// from. No-op if there is already exactly one initial state.
    pub fn create_single_initial_state(&mut self)
    where
        S: Default,
    {
        if self.initial.len() <= 1 {
            return;
        }
        let fresh = self.add_state(S::default());
        let merged: Vec<(Letter, AutomatonState)> = self
            .initial
            .iter()
            .flat_map(|&old| self.outgoing[old.0].clone())
            .collect();
        self.outgoing[fresh.0] = merged.clone();
        for (_, target) in &merged {
            self.incoming[target.0].push(fresh);
        }
        self.initial = vec![fresh];
    }
}

impl<S> Graph for Gba<S> {
    type Node = AutomatonState;

    fn successors(&self, node: &AutomatonState) -> Vec<AutomatonState> {
        self.outgoing[node.0]
            .iter()
            .map(|(_, t)| *t)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    fn predecessors(&self, node: &AutomatonState) -> Vec<AutomatonState> {
        self.incoming[node.0].clone()
    }
}

/// Build the synchronous product of `a` and `b`, requiring equal alphabets.
/// States are pairs `(qa, qb)` reached by simultaneous transitions on equal
/// letters, explored breadth-first from the product of the two initial-state
/// sets. The product's accepting sets are derived from `b`'s alone: `a` is
/// assumed to be a safety automaton (every state trivially accepting), the
/// role the program-GBA plays in LTL model checking (§4.5/§4.7).
pub fn product<A, B>(a: &Gba<A>, b: &Gba<B>) -> Result<Gba<(AutomatonState, AutomatonState)>>
where
    A: Clone,
    B: Clone,
{
    if a.alphabet() != b.alphabet() {
        return Err(crate::error::Error::InvalidArgument(
            "product automata must share an alphabet".to_string(),
        ));
    }

    let mut product = Gba::new(a.alphabet().clone());
    let mut index: std::collections::HashMap<(AutomatonState, AutomatonState), AutomatonState> =
        std::collections::HashMap::new();
    let mut queue: std::collections::VecDeque<(AutomatonState, AutomatonState)> = std::collections::VecDeque::new();

    let mut initial = Vec::new();
    for &qa in a.initial_states() {
        for &qb in b.initial_states() {
            let id = product.add_state((qa, qb));
            index.insert((qa, qb), id);
            queue.push_back((qa, qb));
            initial.push(id);
        }
    }
    product.set_initial(initial);

    while let Some((qa, qb)) = queue.pop_front() {
        let source = index[&(qa, qb)];
        for (letter_a, qa_next) in a.transitions_from(qa) {
            for (letter_b, qb_next) in b.transitions_from(qb) {
                if letter_a != letter_b {
                    continue;
                }
                let key = (*qa_next, *qb_next);
                let target = *index.entry(key).or_insert_with(|| {
                    let id = product.add_state(key);
                    queue.push_back(key);
                    id
                });
                product.add_transition(source, letter_a.clone(), target);
            }
        }
    }

    for b_accepting in b.accepting_sets() {
        let projected = product
            .states()
            .filter(|&s| b_accepting.contains(&product.payload(s).1))
            .collect();
        product.add_accepting_set(projected);
    }

    Ok(product)
}
