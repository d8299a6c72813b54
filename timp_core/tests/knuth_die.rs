//! The Knuth–Yao six-sided die as a hand-built `Dtmc`, checked against the
//! PCTL scenarios of the verification engine's own probabilistic model
//! (reachability and expected reward).

use std::collections::BTreeSet;

use timp_core::dtmc::{Dtmc, DtmcBuilder, DtmcEngine, DtmcState};
use timp_core::kripke::AtomicProposition;
use timp_core::pctl::{model_check, PctlPathFormula, PctlStateFormula};

struct Die {
    dtmc: Dtmc,
    s0: DtmcState,
    outcomes: Vec<DtmcState>,
}

fn knuth_die() -> Die {
    let mut builder = DtmcBuilder::new();
    let s0 = builder.create_state(BTreeSet::new());
    let s123 = builder.create_state(BTreeSet::new());
    let s23 = builder.create_state(BTreeSet::new());
    let s123_prime = builder.create_state(BTreeSet::new());
    let s456 = builder.create_state(BTreeSet::new());
    let s456_prime = builder.create_state(BTreeSet::new());
    let s45 = builder.create_state(BTreeSet::new());
    let outcomes: Vec<DtmcState> = (1..=6)
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
    }
    builder.set_reward(s123, 1.0);
    builder.set_reward(s456, 1.0);

    Die {
        dtmc: builder.build(DtmcEngine::Dense),
        s0,
        outcomes,
    }
}

fn any_outcome() -> PctlStateFormula {
    let mut phi = PctlStateFormula::ap("s1");
    for n in 2..=6 {
        phi = PctlStateFormula::or(phi, PctlStateFormula::ap(format!("s{n}")));
    }
    phi
}

#[test]
fn the_die_almost_surely_produces_an_outcome() {
    let die = knuth_die();
    let path = PctlPathFormula::until(PctlStateFormula::tt(), any_outcome());
    let phi = PctlStateFormula::probability(0.5, 1.0, path).unwrap();
    assert!(model_check(&die.dtmc, &phi, die.s0).unwrap());
}

#[test]
fn expected_number_of_coin_flips_is_eleven_thirds() {
    let die = knuth_die();
    let target: BTreeSet<DtmcState> = die.outcomes.iter().copied().collect();
    let reward = die.dtmc.expected_reward(&target).unwrap();
    assert!((reward[&die.s0] - 11.0 / 3.0).abs() < 1e-9);
}
