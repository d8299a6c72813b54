//! Ported from `examples/knuth_die.py`: the Knuth–Yao six-sided die built
//! out of fair coin flips, as a `Dtmc` built directly via `DtmcBuilder` (no
//! text grammar or external DTMC description format — §6).

use std::collections::BTreeSet;

use timp_core::dtmc::{DtmcBuilder, DtmcEngine};
use timp_core::kripke::AtomicProposition;

fn main() {
    env_logger::init();

    let mut builder = DtmcBuilder::new();
    let s0 = builder.create_state(BTreeSet::new());
    let s123 = builder.create_state(BTreeSet::new());
    let s23 = builder.create_state(BTreeSet::new());
    let s123_prime = builder.create_state(BTreeSet::new());
    let s456 = builder.create_state(BTreeSet::new());
    let s456_prime = builder.create_state(BTreeSet::new());
    let s45 = builder.create_state(BTreeSet::new());
    let outcomes: Vec<_> = (1..=6)
        .map(|n| builder.create_state(BTreeSet::from([AtomicProposition::new(format!("s{n}"))])))
        .collect();

    builder.add_transition(s0, 0.5, s123);
    builder.add_transition(s0, 0.5, s456);
    builder.add_transition(s123, 0.5, s123_prime);
    builder.add_transition(s123, 0.5, s23);
    builder.add_transition(s456, 0.5, s456_prime);
    builder.add_transition(s456, 0.5, s45);
    builder.add_transition(s123_prime, 0.5, s123);
    builder.add_transition(s123_prime, 0.5, outcomes[0]);
    builder.add_transition(s456_prime, 0.5, s456);
    builder.add_transition(s456_prime, 0.5, outcomes[5]);
    builder.add_transition(s23, 0.5, outcomes[1]);
    builder.add_transition(s23, 0.5, outcomes[2]);
    builder.add_transition(s45, 0.5, outcomes[3]);
    builder.add_transition(s45, 0.5, outcomes[4]);
    for &outcome in &outcomes {
        builder.add_transition(outcome, 1.0, outcome);
        builder.set_reward(outcome, 0.0);
    }
    builder.set_reward(s123, 1.0);
    builder.set_reward(s456, 1.0);

    let dtmc = builder.build(DtmcEngine::Dense);

    let target: BTreeSet<_> = outcomes.iter().copied().collect();
    let reachability = dtmc.unbounded_reachability(&BTreeSet::new(), &target).expect("disjoint bad/target");
    println!("P(reach an outcome) from s0 = {}", reachability[&s0]);

    let distribution = dtmc
        .transient_distribution(&std::collections::BTreeMap::from([(s0, 1.0)]), 30)
        .expect("dense engine");
    println!("distribution after 30 steps: {distribution:?}");

    let reward = dtmc.expected_reward(&target).expect("almost-surely reaches target");
    println!("expected number of coin flips from s0 = {}", reward[&s0]);
}
