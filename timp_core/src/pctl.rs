//! PCTL formula algebra, split at the type level into state and path
//! formulas (§4.2; §3), and the DTMC-based model checker.

use std::collections::{BTreeMap, BTreeSet};

use ordered_float::NotNan;

use crate::dtmc::{Dtmc, DtmcState};
use crate::error::{Error, Result};
use crate::kripke::AtomicProposition;

/// A PCTL state formula: {True, False, AP, And, Or, Not, Probability}.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PctlStateFormula {
    /// `true`.
    True,
    /// `false`.
    False,
    /// An atomic proposition.
    Ap(AtomicProposition),
    /// Conjunction.
    And(Box<PctlStateFormula>, Box<PctlStateFormula>),
    /// Disjunction.
    Or(Box<PctlStateFormula>, Box<PctlStateFormula>),
    /// Negation.
    Not(Box<PctlStateFormula>),
    /// `P[lb,ub](path)`: the probability of `path` holding lies in `[lb,ub]`.
    Probability {
        /// Inclusive lower bound, in `[0,1]`.
        lb: NotNan<f64>,
        /// Inclusive upper bound, in `[0,1]`, `>= lb`.
        ub: NotNan<f64>,
        /// The path formula whose probability is bounded.
        path: Box<PctlPathFormula>,
    },
}

/// A PCTL path formula: {Next, Until, BoundedUntil}. Only meaningful as the
/// argument of a [`PctlStateFormula::Probability`] operator — the state/path
/// split is a distinct Rust type, so a path formula can never be misused
/// where a state formula is expected (the type system subsumes the runtime
/// `state_formulae_arguments` check the original performs).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PctlPathFormula {
    /// Holds if the argument holds in the very next state.
    Next(Box<PctlStateFormula>),
    /// `a U b`, unbounded.
    Until(Box<PctlStateFormula>, Box<PctlStateFormula>),
    /// `a U(<=k) b`.
    BoundedUntil(Box<PctlStateFormula>, Box<PctlStateFormula>, usize),
}

impl PctlStateFormula {
    /// `true`.
    pub fn tt() -> PctlStateFormula {
        PctlStateFormula::True
    }

    /// An atomic proposition.
    pub fn ap(symbol: impl Into<String>) -> PctlStateFormula {
        PctlStateFormula::Ap(AtomicProposition::new(symbol))
    }

    /// `a ∧ b`.
    pub fn and(a: PctlStateFormula, b: PctlStateFormula) -> PctlStateFormula {
        PctlStateFormula::And(Box::new(a), Box::new(b))
    }

    /// `a ∨ b`.
    pub fn or(a: PctlStateFormula, b: PctlStateFormula) -> PctlStateFormula {
        PctlStateFormula::Or(Box::new(a), Box::new(b))
    }

    /// `¬a`.
    pub fn not(a: PctlStateFormula) -> PctlStateFormula {
        PctlStateFormula::Not(Box::new(a))
    }

    /// `P[lb,ub](path)`. Fails with [`Error::WellFormedness`] if either
    /// bound is outside `[0,1]` or `lb > ub`.
    pub fn probability(lb: f64, ub: f64, path: PctlPathFormula) -> Result<PctlStateFormula> {
        if !(0.0..=1.0).contains(&lb) || !(0.0..=1.0).contains(&ub) {
            return Err(Error::WellFormedness(format!(
                "probability bounds [{lb}, {ub}] must lie within [0, 1]"
            )));
        }
        if lb > ub {
            return Err(Error::WellFormedness(format!(
                "probability lower bound {lb} exceeds upper bound {ub}"
            )));
        }
        let lb = NotNan::new(lb).map_err(|_| Error::WellFormedness("probability bound is NaN".to_string()))?;
        let ub = NotNan::new(ub).map_err(|_| Error::WellFormedness("probability bound is NaN".to_string()))?;
        Ok(PctlStateFormula::Probability {
            lb,
            ub,
            path: Box::new(path),
        })
    }
}

impl PctlPathFormula {
    /// `X a`.
    pub fn next(a: PctlStateFormula) -> PctlPathFormula {
        PctlPathFormula::Next(Box::new(a))
    }

    /// `a U b`.
    pub fn until(a: PctlStateFormula, b: PctlStateFormula) -> PctlPathFormula {
        PctlPathFormula::Until(Box::new(a), Box::new(b))
    }

    /// `a U(<=k) b`.
    pub fn bounded_until(a: PctlStateFormula, b: PctlStateFormula, k: usize) -> PctlPathFormula {
        PctlPathFormula::BoundedUntil(Box::new(a), Box::new(b), k)
    }
}

fn eval_state(dtmc: &Dtmc, phi: &PctlStateFormula) -> Result<BTreeSet<DtmcState>> {
    Ok(match phi {
        PctlStateFormula::True => dtmc.states().collect(),
        PctlStateFormula::False => BTreeSet::new(),
        PctlStateFormula::Ap(ap) => dtmc.states().filter(|&s| dtmc.labels(s).contains(ap)).collect(),
        PctlStateFormula::And(a, b) => eval_state(dtmc, a)?
            .intersection(&eval_state(dtmc, b)?)
            .copied()
            .collect(),
        PctlStateFormula::Or(a, b) => eval_state(dtmc, a)?.union(&eval_state(dtmc, b)?).copied().collect(),
        PctlStateFormula::Not(a) => {
            let sat = eval_state(dtmc, a)?;
            dtmc.states().filter(|s| !sat.contains(s)).collect()
        }
        PctlStateFormula::Probability { lb, ub, path } => {
            let probabilities = eval_path(dtmc, path)?;
            dtmc.states()
                .filter(|s| {
                    let p = probabilities.get(s).copied().unwrap_or(0.0);
                    *lb.as_ref() <= p && p <= *ub.as_ref()
                })
                .collect()
        }
    })
}

fn eval_path(dtmc: &Dtmc, phi: &PctlPathFormula) -> Result<BTreeMap<DtmcState, f64>> {
    match phi {
        PctlPathFormula::Next(a) => {
            let sat = eval_state(dtmc, a)?;
            Ok(dtmc
                .states()
                .map(|s| {
                    let mass: f64 = dtmc
                        .outgoing(s)
                        .iter()
                        .filter(|(t, _)| sat.contains(t))
                        .map(|(_, p)| p)
                        .sum();
                    (s, mass)
                })
                .collect())
        }
        PctlPathFormula::Until(a, b) => {
            let phi1 = eval_state(dtmc, a)?;
            let phi2 = eval_state(dtmc, b)?;
            let bad: BTreeSet<DtmcState> = dtmc
                .states()
                .filter(|s| !phi1.contains(s) && !phi2.contains(s))
                .collect();
            let mut result = dtmc.unbounded_reachability(&bad, &phi2)?;
            for &s in &bad {
                result.insert(s, 0.0);
            }
            for &s in &phi2 {
                result.insert(s, 1.0);
            }
            Ok(result)
        }
        PctlPathFormula::BoundedUntil(a, b, k) => {
            let phi1 = eval_state(dtmc, a)?;
            let phi2 = eval_state(dtmc, b)?;
            let bad: BTreeSet<DtmcState> = dtmc
                .states()
                .filter(|s| !phi1.contains(s) && !phi2.contains(s))
                .collect();
            let mut result = dtmc.bounded_reachability(&bad, &phi2, *k)?;
            for &s in &bad {
                result.insert(s, 0.0);
            }
            for &s in &phi2 {
                result.insert(s, 1.0);
            }
            Ok(result)
        }
    }
}

/// `phi` holds at `state` in `dtmc`.
pub fn model_check(dtmc: &Dtmc, phi: &PctlStateFormula, state: DtmcState) -> Result<bool> {
    Ok(eval_state(dtmc, phi)?.contains(&state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtmc::DtmcBuilder;
    use crate::dtmc::DtmcEngine;

    fn coin_flip() -> (Dtmc, DtmcState, DtmcState, DtmcState) {
        let mut builder = DtmcBuilder::new();
        let s0 = builder.create_state(BTreeSet::new());
        let heads = builder.create_state(BTreeSet::from([AtomicProposition::new("heads")]));
        let tails = builder.create_state(BTreeSet::from([AtomicProposition::new("tails")]));
        builder.add_transition(s0, 0.5, heads);
        builder.add_transition(s0, 0.5, tails);
        builder.add_transition(heads, 1.0, heads);
        builder.add_transition(tails, 1.0, tails);
        (builder.build(DtmcEngine::Dense), s0, heads, tails)
    }

    #[test]
    fn probability_of_reaching_heads_or_tails_is_one() {
        let (dtmc, s0, _heads, _tails) = coin_flip();
        let path = PctlPathFormula::until(
            PctlStateFormula::tt(),
            PctlStateFormula::or(PctlStateFormula::ap("heads"), PctlStateFormula::ap("tails")),
        );
        let phi = PctlStateFormula::probability(1.0, 1.0, path).unwrap();
        assert!(model_check(&dtmc, &phi, s0).unwrap());
    }

    #[test]
    fn invalid_bounds_are_rejected_at_construction() {
        let path = PctlPathFormula::next(PctlStateFormula::ap("heads"));
        assert!(matches!(
            PctlStateFormula::probability(0.9, 0.1, path),
            Err(Error::WellFormedness(_))
        ));
    }

    #[test]
    fn next_heads_has_probability_one_half_from_s0() {
        let (dtmc, s0, _heads, _tails) = coin_flip();
        let path = PctlPathFormula::next(PctlStateFormula::ap("heads"));
        let phi = PctlStateFormula::probability(0.5, 0.5, path).unwrap();
        assert!(model_check(&dtmc, &phi, s0).unwrap());
    }
}
