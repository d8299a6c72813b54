//! CTL formula algebra and the predecessor-based fixpoint model checker over
//! a [`KripkeStructure`].

use std::collections::BTreeSet;

use log::trace;

use crate::graph::Graph;
use crate::kripke::{AtomicProposition, KripkeState, KripkeStructure};

/// CTL formula tree: {True, False, AP, And, Or, Not, EX, EU, EG}. Derived
/// operators (`AX`, `AG`, `EF`, `AU`, `EW`) are rewritten into this core set
/// at construction time rather than kept as distinct variants.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CtlFormula {
    /// `true`.
    True,
    /// `false`.
    False,
    /// An atomic proposition.
    Ap(AtomicProposition),
    /// Conjunction.
    And(Box<CtlFormula>, Box<CtlFormula>),
    /// Disjunction.
    Or(Box<CtlFormula>, Box<CtlFormula>),
    /// Negation.
    Not(Box<CtlFormula>),
    /// Exists-next: some successor satisfies the argument.
    Ex(Box<CtlFormula>),
    /// Exists-until: some path satisfies `a U b`.
    Eu(Box<CtlFormula>, Box<CtlFormula>),
    /// Exists-globally: some path satisfies `G a`.
    Eg(Box<CtlFormula>),
}

impl CtlFormula {
    /// `true`.
    pub fn tt() -> CtlFormula {
        CtlFormula::True
    }

    /// An atomic proposition.
    pub fn ap(symbol: impl Into<String>) -> CtlFormula {
        CtlFormula::Ap(AtomicProposition::new(symbol))
    }

    /// `a ∧ b`.
    pub fn and(a: CtlFormula, b: CtlFormula) -> CtlFormula {
        CtlFormula::And(Box::new(a), Box::new(b))
    }

    /// `a ∨ b`.
    pub fn or(a: CtlFormula, b: CtlFormula) -> CtlFormula {
        CtlFormula::Or(Box::new(a), Box::new(b))
    }

    /// `¬a`.
    pub fn not(a: CtlFormula) -> CtlFormula {
        CtlFormula::Not(Box::new(a))
    }

    /// `a → b ≡ ¬a ∨ b`.
    pub fn implies(a: CtlFormula, b: CtlFormula) -> CtlFormula {
        CtlFormula::or(CtlFormula::not(a), b)
    }

    /// `EX a`.
    pub fn ex(a: CtlFormula) -> CtlFormula {
        CtlFormula::Ex(Box::new(a))
    }

    /// `AX a ≡ ¬EX¬a`.
    pub fn ax(a: CtlFormula) -> CtlFormula {
        CtlFormula::not(CtlFormula::ex(CtlFormula::not(a)))
    }

    /// `EU(a,b)`.
    pub fn eu(a: CtlFormula, b: CtlFormula) -> CtlFormula {
        CtlFormula::Eu(Box::new(a), Box::new(b))
    }

    /// `EF a ≡ E(true U a)`.
    pub fn ef(a: CtlFormula) -> CtlFormula {
        CtlFormula::eu(CtlFormula::tt(), a)
    }

    /// `EG a`.
    pub fn eg(a: CtlFormula) -> CtlFormula {
        CtlFormula::Eg(Box::new(a))
    }

    /// `AG a ≡ ¬EF¬a`.
    pub fn ag(a: CtlFormula) -> CtlFormula {
        CtlFormula::not(CtlFormula::ef(CtlFormula::not(a)))
    }

    /// `EW(a,b) ≡ EG a ∨ E(a U b)`.
    pub fn ew(a: CtlFormula, b: CtlFormula) -> CtlFormula {
        CtlFormula::or(CtlFormula::eg(a.clone()), CtlFormula::eu(a, b))
    }

    /// `AU(a,b) ≡ ¬EW(¬b, ¬a∧¬b)`. A non-standard encoding carried exactly
    /// as given rather than the more familiar
    /// `AU(a,b) = ¬(EG¬b ∨ E(¬b U (¬a∧¬b)))`-equivalent expansion — both are
    /// in fact the same expansion once `EW` is unfolded, so this is simply
    /// `EW`'s definition applied directly.
    pub fn au(a: CtlFormula, b: CtlFormula) -> CtlFormula {
        CtlFormula::not(CtlFormula::ew(
            CtlFormula::not(b.clone()),
            CtlFormula::and(CtlFormula::not(a), CtlFormula::not(b)),
        ))
    }
}

/// Evaluate `phi` over `kripke`, bottom-up, returning the set of states
/// satisfying it.
fn eval(kripke: &KripkeStructure, phi: &CtlFormula) -> BTreeSet<KripkeState> {
    match phi {
        CtlFormula::True => kripke.states().collect(),
        CtlFormula::False => BTreeSet::new(),
        CtlFormula::Ap(ap) => kripke
            .states()
            .filter(|&s| kripke.labels(s).contains(ap))
            .collect(),
        CtlFormula::And(a, b) => eval(kripke, a).intersection(&eval(kripke, b)).copied().collect(),
        CtlFormula::Or(a, b) => eval(kripke, a).union(&eval(kripke, b)).copied().collect(),
        CtlFormula::Not(a) => {
            let sat = eval(kripke, a);
            kripke.states().filter(|s| !sat.contains(s)).collect()
        }
        CtlFormula::Ex(a) => {
            let sat = eval(kripke, a);
            predecessors_of(kripke, &sat)
        }
        CtlFormula::Eu(a, b) => {
            let phi1 = eval(kripke, a);
            let phi2 = eval(kripke, b);
            let mut satisfying: BTreeSet<KripkeState> = BTreeSet::new();
            let mut updated = phi2.clone();
            let mut iteration = 0;
            while satisfying != updated {
                satisfying = updated.clone();
                let pre = predecessors_of(kripke, &satisfying);
                updated = phi1.intersection(&pre).copied().collect::<BTreeSet<_>>();
                updated = updated.union(&phi2).copied().collect();
                iteration += 1;
                trace!("EU fixpoint pass {iteration}: {} states satisfying", updated.len());
            }
            satisfying
        }
        CtlFormula::Eg(a) => {
            let phi = eval(kripke, a);
            let mut satisfying: BTreeSet<KripkeState> = BTreeSet::new();
            let mut updated = phi.clone();
            let mut iteration = 0;
            while satisfying != updated {
                satisfying = updated.clone();
                let pre = predecessors_of(kripke, &satisfying);
                updated = phi.intersection(&pre).copied().collect();
                iteration += 1;
                trace!("EG fixpoint pass {iteration}: {} states satisfying", updated.len());
            }
            satisfying
        }
    }
}

fn predecessors_of(kripke: &KripkeStructure, states: &BTreeSet<KripkeState>) -> BTreeSet<KripkeState> {
    states
        .iter()
        .flat_map(|s| kripke.predecessors(s))
        .collect()
}

/// `φ` holds for `kripke` iff its initial state satisfies it.
pub fn model_check(kripke: &KripkeStructure, phi: &CtlFormula) -> bool {
    eval(kripke, phi).contains(&kripke.initial())
}
