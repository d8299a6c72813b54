//! LTL formula algebra and the elementary-set tableau construction of a GBA
//! recognizing exactly the models of a formula.

use std::collections::BTreeSet;

use crate::automaton::{AutomatonState, Gba, Letter};
use crate::kripke::AtomicProposition;

/// LTL formula tree: {True, False, AP, And, Or, Not, Next, Until}.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LtlFormula {
    /// `true`.
    True,
    /// `false`.
    False,
    /// An atomic proposition.
    Ap(AtomicProposition),
    /// Conjunction.
    And(Box<LtlFormula>, Box<LtlFormula>),
    /// Disjunction.
    Or(Box<LtlFormula>, Box<LtlFormula>),
    /// Negation.
    Not(Box<LtlFormula>),
    /// "Next" — holds in the very next state.
    Next(Box<LtlFormula>),
    /// "Until" — the left operand holds until the right one does.
    Until(Box<LtlFormula>, Box<LtlFormula>),
}

impl LtlFormula {
    /// `true`.
    pub fn tt() -> LtlFormula {
        LtlFormula::True
    }

    /// `false`.
    pub fn ff() -> LtlFormula {
        LtlFormula::False
    }

    /// An atomic proposition.
    pub fn ap(symbol: impl Into<String>) -> LtlFormula {
        LtlFormula::Ap(AtomicProposition::new(symbol))
    }

    /// `a ∧ b`.
    pub fn and(a: LtlFormula, b: LtlFormula) -> LtlFormula {
        LtlFormula::And(Box::new(a), Box::new(b))
    }

    /// `a ∨ b`.
    pub fn or(a: LtlFormula, b: LtlFormula) -> LtlFormula {
        LtlFormula::Or(Box::new(a), Box::new(b))
    }

    /// `¬a`.
    pub fn not(a: LtlFormula) -> LtlFormula {
        LtlFormula::Not(Box::new(a))
    }

    /// `X a`.
    pub fn next(a: LtlFormula) -> LtlFormula {
        LtlFormula::Next(Box::new(a))
    }

    /// `a U b`.
    pub fn until(a: LtlFormula, b: LtlFormula) -> LtlFormula {
        LtlFormula::Until(Box::new(a), Box::new(b))
    }

    /// `F a ≡ true U a`.
    pub fn finally(a: LtlFormula) -> LtlFormula {
        LtlFormula::until(LtlFormula::tt(), a)
    }

    /// `G a ≡ ¬F¬a`.
    pub fn globally(a: LtlFormula) -> LtlFormula {
        LtlFormula::not(LtlFormula::finally(LtlFormula::not(a)))
    }

    /// `a → b ≡ ¬a ∨ b`.
    pub fn implies(a: LtlFormula, b: LtlFormula) -> LtlFormula {
        LtlFormula::or(LtlFormula::not(a), b)
    }

    /// The negation of this formula: `Not` wraps once (no De Morgan
    /// push-through), double negation collapses, `True`/`False` swap.
    pub fn negate(&self) -> LtlFormula {
        match self {
            LtlFormula::True => LtlFormula::False,
            LtlFormula::False => LtlFormula::True,
            LtlFormula::Not(inner) => (**inner).clone(),
            other => LtlFormula::Not(Box::new(other.clone())),
        }
    }

    /// Every subformula of `self`, including `self`.
    pub fn subformulae(&self) -> BTreeSet<LtlFormula> {
        let mut out = BTreeSet::new();
        self.collect_subformulae(&mut out);
        out
    }

    fn collect_subformulae(&self, out: &mut BTreeSet<LtlFormula>) {
        out.insert(self.clone());
        match self {
            LtlFormula::True | LtlFormula::False | LtlFormula::Ap(_) => {}
            LtlFormula::And(a, b) | LtlFormula::Or(a, b) | LtlFormula::Until(a, b) => {
                a.collect_subformulae(out);
                b.collect_subformulae(out);
            }
            LtlFormula::Not(a) | LtlFormula::Next(a) => a.collect_subformulae(out),
        }
    }

    /// cl(φ): the smallest set of formulas containing every subformula of
    /// `self` and the negation of each of them.
    pub fn closure(&self) -> BTreeSet<LtlFormula> {
        let subs = self.subformulae();
        let mut cl = subs.clone();
        for f in &subs {
            cl.insert(f.negate());
        }
        cl
    }
}

/// Every maximal, closure-consistent subset of `cl(phi)` (extended with
/// `atomic_propositions` and their negations, when supplied) — the tableau
/// states of the GBA `phi` compiles into. Exhaustive over `2^|cl(phi)|`
/// subsets, acceptable since LTL formulae used here are small (§4.6).
pub fn elementary_sets(
    phi: &LtlFormula,
    atomic_propositions: Option<&BTreeSet<AtomicProposition>>,
) -> Vec<BTreeSet<LtlFormula>> {
    let mut closure = phi.closure();
    if let Some(aps) = atomic_propositions {
        for ap in aps {
            let f = LtlFormula::Ap(ap.clone());
            closure.insert(f.negate());
            closure.insert(f);
        }
    }
    let closure_vec: Vec<LtlFormula> = closure.iter().cloned().collect();
    let n = closure_vec.len();

    let mut sets = Vec::new();
    for mask in 0u64..(1u64 << n) {
        let subset: BTreeSet<LtlFormula> = closure_vec
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << i) != 0)
            .map(|(_, f)| f.clone())
            .collect();
        if is_consistent(&subset, &closure) {
            sets.push(subset);
        }
    }
    sets
}

fn is_consistent(subset: &BTreeSet<LtlFormula>, closure: &BTreeSet<LtlFormula>) -> bool {
    if subset.contains(&LtlFormula::False) {
        return false;
    }
    for phi in subset {
        if subset.contains(&phi.negate()) {
            return false;
        }
    }
    for phi in closure {
        if let LtlFormula::And(a, b) = phi {
            let conjuncts_present = subset.contains(a.as_ref()) && subset.contains(b.as_ref());
            let conjunction_present = subset.contains(phi);
            if conjuncts_present != conjunction_present {
                return false;
            }
        }
    }
    for phi in closure {
        if let LtlFormula::Until(a, b) = phi {
            let b_present = subset.contains(b.as_ref());
            let until_present = subset.contains(phi);
            if b_present && !until_present {
                return false;
            }
            if until_present && !b_present && !subset.contains(a.as_ref()) {
                return false;
            }
        }
    }
    for phi in closure {
        if !subset.contains(phi) && !subset.contains(&phi.negate()) {
            return false;
        }
    }
    if closure.contains(&LtlFormula::True) && !subset.contains(&LtlFormula::True) {
        return false;
    }
    true
}

/// Compile `phi` into a GBA over `atomic_propositions` whose accepted
/// infinite words are exactly the models of `phi` (§4.6). Each GBA state's
/// payload is the elementary set that labels it.
pub fn to_gba(phi: &LtlFormula, atomic_propositions: &BTreeSet<AtomicProposition>) -> Gba<BTreeSet<LtlFormula>> {
    let sets = elementary_sets(phi, Some(atomic_propositions));
    let n = sets.len();

    let closure = phi.closure();
    let closure: BTreeSet<LtlFormula> = closure
        .into_iter()
        .chain(atomic_propositions.iter().map(|ap| LtlFormula::Ap(ap.clone())))
        .collect();
    let nexts: Vec<LtlFormula> = closure
        .iter()
        .filter(|f| matches!(f, LtlFormula::Next(_)))
        .cloned()
        .collect();
    let untils: Vec<LtlFormula> = closure
        .iter()
        .filter(|f| matches!(f, LtlFormula::Until(..)))
        .cloned()
        .collect();

    let mut gba = Gba::new(atomic_propositions.clone());
    let mut states = Vec::with_capacity(n);
    let mut initial = Vec::new();
    for set in &sets {
        let id = gba.add_state(set.clone());
        if set.contains(phi) {
            initial.push(id);
        }
        states.push(id);
    }
    gba.set_initial(initial);

    for until in &untils {
        let (_, b) = match until {
            LtlFormula::Until(a, b) => (a.as_ref(), b.as_ref()),
            _ => unreachable!(),
        };
        let accepting: BTreeSet<AutomatonState> = (0..n)
            .filter(|&idx| !sets[idx].contains(until) || sets[idx].contains(b))
            .map(|idx| states[idx])
            .collect();
        gba.add_accepting_set(accepting);
    }

    for i in 0..n {
        for j in 0..n {
            if !transition_allowed(&sets[i], &sets[j], &nexts, &untils) {
                continue;
            }
            let letter: Letter = sets[i]
                .iter()
                .filter(|f| matches!(f, LtlFormula::Ap(_)))
                .filter(|f| match f {
                    LtlFormula::Ap(ap) => atomic_propositions.contains(ap),
                    _ => false,
                })
                .filter_map(|f| match f {
                    LtlFormula::Ap(ap) => Some(ap.clone()),
                    _ => None,
                })
                .collect();
            gba.add_transition(states[i], letter, states[j]);
        }
    }

    gba
}

fn transition_allowed(
    set_i: &BTreeSet<LtlFormula>,
    set_j: &BTreeSet<LtlFormula>,
    nexts: &[LtlFormula],
    untils: &[LtlFormula],
) -> bool {
    for psi in set_i {
        if let LtlFormula::Next(inner) = psi {
            if !set_j.contains(inner.as_ref()) {
                return false;
            }
        }
        if let LtlFormula::Until(a, b) = psi {
            if !set_i.contains(b.as_ref()) && !(set_i.contains(a.as_ref()) && set_j.contains(psi)) {
                return false;
            }
        }
    }
    for psi in nexts {
        if let LtlFormula::Next(inner) = psi {
            if set_j.contains(inner.as_ref()) && !set_i.contains(psi) {
                return false;
            }
        }
    }
    for psi in set_j {
        if let LtlFormula::Until(a, _) = psi {
            if set_i.contains(a.as_ref()) && !set_i.contains(psi) {
                return false;
            }
        }
    }
    let _ = untils;
    true
}
