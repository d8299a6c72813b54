//! Top-level verification entry points: builds the program automaton for a
//! TIMP module, runs the LTL product/Tarjan pipeline and extracts a
//! counterexample lasso, and wires CTL/PCTL model checking to their own
//! engines (§4.7, §4.8).

use std::collections::{BTreeSet, HashSet, VecDeque};

use log::info;

use crate::automaton::{AutomatonState, Gba};
use crate::ctl::CtlFormula;
use crate::error::{Error, Result};
use crate::graph::{tarjan, Graph};
use crate::kripke::{AtomicProposition, KripkeStructure};
use crate::ltl::LtlFormula;
use crate::timp::{Configuration, Module};

/// A finite witness that `phi` fails to hold: a stem leading into a cycle
/// that is replayed forever, each entry a pretty-printed configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Counterexample {
    /// Configurations from the initial one up to (not including) the cycle.
    pub stem: Vec<String>,
    /// Configurations of the cycle, starting and ending at the same one.
    pub cycle: Vec<String>,
}

/// BFS-explore `module`'s configuration graph into a safety GBA: one state
/// per reachable configuration, transitions labeled by the active
/// annotation set at the *source* configuration, and a single accepting set
/// containing every state (§4.7).
pub fn timp_to_gba(module: &Module, initial: Configuration) -> Result<Gba<Configuration>> {
    let alphabet: BTreeSet<AtomicProposition> = module
        .annotations()
        .iter()
        .map(|label| AtomicProposition::new(label.clone()))
        .collect();

    let mut gba: Gba<Configuration> = Gba::new(alphabet);
    let mut index: std::collections::HashMap<Configuration, AutomatonState> = std::collections::HashMap::new();

    let initial_id = gba.add_state(initial.clone());
    index.insert(initial, initial_id);
    gba.set_initial(vec![initial_id]);

    let mut queue: VecDeque<AutomatonState> = VecDeque::from([initial_id]);
    let mut explored: BTreeSet<AutomatonState> = BTreeSet::from([initial_id]);

    while let Some(id) = queue.pop_front() {
        let config = gba.payload(id).clone();
        let letter: crate::automaton::Letter = config
            .active_annotations()?
            .into_iter()
            .map(|label| AtomicProposition::new(label))
            .collect();
        for succ_config in config.successors()? {
            let succ_id = match index.get(&succ_config) {
                Some(&id) => id,
                None => {
                    let id = gba.add_state(succ_config.clone());
                    index.insert(succ_config, id);
                    id
                }
            };
            gba.add_transition(id, letter.clone(), succ_id);
            if explored.insert(succ_id) {
                queue.push_back(succ_id);
            }
        }
    }

    gba.add_accepting_set(gba.states().collect());
    info!("program automaton: {} states explored", explored.len());
    Ok(gba)
}

fn ltl_atomic_propositions(phi: &LtlFormula) -> BTreeSet<AtomicProposition> {
    let mut out = BTreeSet::new();
    collect_aps(phi, &mut out);
    out
}

fn collect_aps(phi: &LtlFormula, out: &mut BTreeSet<AtomicProposition>) {
    match phi {
        LtlFormula::True | LtlFormula::False => {}
        LtlFormula::Ap(ap) => {
            out.insert(ap.clone());
        }
        LtlFormula::And(a, b) | LtlFormula::Or(a, b) | LtlFormula::Until(a, b) => {
            collect_aps(a, out);
            collect_aps(b, out);
        }
        LtlFormula::Not(a) | LtlFormula::Next(a) => collect_aps(a, out),
    }
}

fn ctl_atomic_propositions(phi: &CtlFormula) -> BTreeSet<AtomicProposition> {
    let mut out = BTreeSet::new();
    collect_ctl_aps(phi, &mut out);
    out
}

fn collect_ctl_aps(phi: &CtlFormula, out: &mut BTreeSet<AtomicProposition>) {
    match phi {
        CtlFormula::True | CtlFormula::False => {}
        CtlFormula::Ap(ap) => {
            out.insert(ap.clone());
        }
        CtlFormula::And(a, b) | CtlFormula::Or(a, b) | CtlFormula::Eu(a, b) => {
            collect_ctl_aps(a, out);
            collect_ctl_aps(b, out);
        }
        CtlFormula::Not(a) | CtlFormula::Ex(a) | CtlFormula::Eg(a) => collect_ctl_aps(a, out),
    }
}

/// Verify `phi` against `module` starting from `initial`: `true` if every
/// behavior of the program satisfies `phi`, together with a lasso
/// counterexample when it does not (§4.7).
pub fn model_check_ltl(
    module: &Module,
    initial: Configuration,
    phi: &LtlFormula,
) -> Result<(bool, Option<Counterexample>)> {
    let module_aps: BTreeSet<AtomicProposition> = module
        .annotations()
        .iter()
        .map(|label| AtomicProposition::new(label.clone()))
        .collect();
    let formula_aps = ltl_atomic_propositions(phi);
    if !formula_aps.is_subset(&module_aps) {
        return Err(Error::WellFormedness(
            "formula references an atomic proposition outside the module's annotations".to_string(),
        ));
    }

    let program_gba = timp_to_gba(module, initial)?;
    let negation_gba = crate::ltl::to_gba(&phi.negate(), &module_aps);

    let mut product = crate::automaton::product(&program_gba, &negation_gba)?;
    product.create_single_initial_state();
    let init = product.initial_states()[0];

    let (sccs, _pred) = tarjan(&product, init);
    let accepting_sets = product.accepting_sets();

    let witness = sccs
        .into_iter()
        .find(|scc| accepting_sets.iter().all(|set| scc.iter().any(|s| set.contains(s))));

    let Some(scc) = witness else {
        info!("no accepting cycle in the product automaton: formula holds");
        return Ok((true, None));
    };
    info!("accepting cycle of {} states found: formula violated", scc.len());

    let scc_members: BTreeSet<AutomatonState> = scc.iter().copied().collect();
    let entry_targets: HashSet<AutomatonState> = scc_members.iter().copied().collect();
    let stem_path = crate::graph::shortest_path(&product, init, &entry_targets)?;
    let entry = *stem_path.last().expect("shortest_path returns a non-empty path");

    let restricted = SccView {
        graph: &product,
        members: &scc_members,
    };

    // Generalized Büchi acceptance requires the cycle to intersect *every*
    // accepting set, not just some successor of `entry` — chain a shortest
    // hop through one representative of each set before closing back.
    let mut cycle_path = vec![entry];
    let mut current = entry;
    for set in accepting_sets {
        let waypoint = *scc_members
            .iter()
            .find(|s| set.contains(s))
            .expect("witness SCC intersects every accepting set");
        let hop = crate::graph::shortest_path(&restricted, current, &HashSet::from([waypoint]))?;
        cycle_path.extend(hop.into_iter().skip(1));
        current = waypoint;
    }
    let closing_hop = crate::graph::shortest_path(&restricted, current, &HashSet::from([entry]))?;
    cycle_path.extend(closing_hop.into_iter().skip(1));

    if cycle_path.len() == 1 {
        // No accepting sets routed any movement (e.g. an empty accepting-set
        // list): fall back to an arbitrary edge within the SCC, guaranteed
        // to exist by `tarjan`'s trivial-SCC filter.
        let next = *restricted.successors(&entry).first().ok_or(Error::NoPath)?;
        let mut hop = crate::graph::shortest_path(&restricted, next, &HashSet::from([entry]))?;
        cycle_path.push(next);
        cycle_path.extend(hop.drain(1..));
    }

    let pretty = |s: &AutomatonState| program_gba.payload(product.payload(*s).0).pretty();
    let stem: Vec<String> = stem_path.iter().map(pretty).collect();
    let cycle: Vec<String> = cycle_path.iter().map(pretty).collect();

    Ok((false, Some(Counterexample { stem, cycle })))
}

struct SccView<'a> {
    graph: &'a Gba<(AutomatonState, AutomatonState)>,
    members: &'a BTreeSet<AutomatonState>,
}

impl Graph for SccView<'_> {
    type Node = AutomatonState;

    fn successors(&self, node: &AutomatonState) -> Vec<AutomatonState> {
        self.graph
            .successors(node)
            .into_iter()
            .filter(|s| self.members.contains(s))
            .collect()
    }

    fn predecessors(&self, node: &AutomatonState) -> Vec<AutomatonState> {
        self.graph
            .predecessors(node)
            .into_iter()
            .filter(|s| self.members.contains(s))
            .collect()
    }
}

/// Verify `phi` against the Kripke structure explored from `module`'s
/// `initial` configuration: `true` iff the initial state satisfies `phi`.
pub fn model_check_ctl(module: &Module, initial: Configuration, phi: &CtlFormula) -> Result<bool> {
    let module_aps: BTreeSet<AtomicProposition> = module
        .annotations()
        .iter()
        .map(|label| AtomicProposition::new(label.clone()))
        .collect();
    if !ctl_atomic_propositions(phi).is_subset(&module_aps) {
        return Err(Error::WellFormedness(
            "formula references an atomic proposition outside the module's annotations".to_string(),
        ));
    }

    let kripke: KripkeStructure = KripkeStructure::build(initial)?;
    Ok(crate::ctl::model_check(&kripke, phi))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timp::{BooleanExpression, Command, State, Variable};

    fn labeled_assign() -> (Module, Configuration) {
        let x = Variable::new("x");
        let cmd = Command::assign(x, BooleanExpression::Constant(true)).annotate("a");
        let module = Module::new("m", cmd);
        let initial = module.initial_configuration(State::new());
        (module, initial)
    }

    #[test]
    fn safety_formula_holds_with_no_counterexample() {
        let (module, initial) = labeled_assign();
        let phi = LtlFormula::globally(LtlFormula::implies(
            LtlFormula::ap("a"),
            LtlFormula::next(LtlFormula::not(LtlFormula::ap("a"))),
        ));
        let (holds, counterexample) = model_check_ltl(&module, initial, &phi).unwrap();
        assert!(holds);
        assert!(counterexample.is_none());
    }

    #[test]
    fn globally_annotation_fails_once_it_stops_holding() {
        let (module, initial) = labeled_assign();
        let phi = LtlFormula::globally(LtlFormula::ap("a"));
        let (holds, counterexample) = model_check_ltl(&module, initial, &phi).unwrap();
        assert!(!holds);
        assert!(counterexample.is_some());
    }

    #[test]
    fn rejects_formula_aps_outside_the_module() {
        let (module, initial) = labeled_assign();
        let phi = LtlFormula::ap("nonexistent");
        assert!(matches!(
            model_check_ltl(&module, initial, &phi),
            Err(Error::WellFormedness(_))
        ));
    }

    #[test]
    fn toggle_loop_satisfies_globally_finally_tick() {
        let x = Variable::new("x");
        let toggle = Command::assign(x, BooleanExpression::Not(Box::new(BooleanExpression::var("x")))).annotate("tick");
        let cmd = Command::repeat(toggle);
        let module = Module::new("m", cmd);
        let initial = module.initial_configuration(State::new());
        let phi = LtlFormula::globally(LtlFormula::finally(LtlFormula::ap("tick")));
        let (holds, _) = model_check_ltl(&module, initial, &phi).unwrap();
        assert!(holds);
    }

    #[test]
    fn ctl_ag_implies_ax_fails_on_a_single_annotated_assignment() {
        let (module, initial) = labeled_assign();
        let phi = CtlFormula::ag(CtlFormula::implies(CtlFormula::ap("a"), CtlFormula::ax(CtlFormula::ap("a"))));
        assert!(!model_check_ctl(&module, initial, &phi).unwrap());
    }

    #[test]
    fn violation_with_two_accepting_sets_yields_a_well_formed_lasso() {
        // `¬(F(a) ∧ F(b))` negates (no De Morgan push-through, just an outer
        // `Not` collapse) to `F(a) ∧ F(b)`, whose closure carries two
        // distinct `Until` nodes — two accepting sets in the negation GBA,
        // exercising the multi-set cycle chaining rather than the
        // single-accepting-set case the other tests cover.
        let single_state = Command::skip().annotate("a").annotate("b");
        let module = Module::new("m", single_state);
        let initial = module.initial_configuration(State::new());

        let phi = LtlFormula::not(LtlFormula::and(
            LtlFormula::finally(LtlFormula::ap("a")),
            LtlFormula::finally(LtlFormula::ap("b")),
        ));
        let (holds, counterexample) = model_check_ltl(&module, initial, &phi).unwrap();
        assert!(!holds);
        let counterexample = counterexample.expect("a violated formula reports a counterexample");
        assert!(!counterexample.cycle.is_empty());
        assert_eq!(counterexample.cycle.first(), counterexample.cycle.last());
    }
}
