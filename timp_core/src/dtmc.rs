//! Discrete-Time Markov Chains and their dense numerical engine: transient
//! distribution, bounded/unbounded reachability, and expected reward, via
//! `nalgebra` linear algebra (§4.9).

use std::collections::{BTreeMap, BTreeSet};

use nalgebra::{DMatrix, DVector};

use crate::error::{Error, Result};
use crate::graph::{backward_reachable, Graph};
use crate::kripke::AtomicProposition;

/// Newtype index into a [`Dtmc`]'s state arena.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct DtmcState(usize);

/// Which numerical backend a [`Dtmc`] answers queries with. Only `Dense`
/// has full semantics in scope; `Sparse` is a documented stub mirroring the
/// original's all-`pass` `DTMCSparseEngine` (Open Question (a)).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DtmcEngine {
    /// `nalgebra`-backed dense linear algebra; fully implemented.
    Dense,
    /// Unimplemented; every operation returns [`Error::Unsupported`].
    Sparse,
}

/// Builds a [`Dtmc`] incrementally: states first (each with an AP set and an
/// optional reward), then transitions between them.
#[derive(Debug, Clone, Default)]
pub struct DtmcBuilder {
    labels: Vec<BTreeSet<AtomicProposition>>,
    rewards: Vec<f64>,
    outgoing: Vec<Vec<(DtmcState, f64)>>,
}

impl DtmcBuilder {
    /// An empty builder.
    pub fn new() -> Self {
        DtmcBuilder::default()
    }

    /// Add a fresh state labeled with `labels` and reward `0`, returning its id.
    pub fn create_state(&mut self, labels: BTreeSet<AtomicProposition>) -> DtmcState {
        let id = DtmcState(self.labels.len());
        self.labels.push(labels);
        self.rewards.push(0.0);
        self.outgoing.push(Vec::new());
        id
    }

    /// Set `state`'s reward (used by [`Dtmc::expected_reward`]).
    pub fn set_reward(&mut self, state: DtmcState, reward: f64) {
        self.rewards[state.0] = reward;
    }

    /// Add a transition `source --probability--> target`. Does not validate
    /// row-stochasticity; callers are expected to supply a well-formed chain
    /// per §3's invariant.
    pub fn add_transition(&mut self, source: DtmcState, probability: f64, target: DtmcState) {
        self.outgoing[source.0].push((target, probability));
    }

    /// Finalize the chain with the given numerical `engine`.
    pub fn build(self, engine: DtmcEngine) -> Dtmc {
        let n = self.labels.len();
        let mut incoming = vec![Vec::new(); n];
        for (source, targets) in self.outgoing.iter().enumerate() {
            for &(target, _) in targets {
                incoming[target.0].push(DtmcState(source));
            }
        }
        Dtmc {
            labels: self.labels,
            rewards: self.rewards,
            outgoing: self.outgoing,
            incoming,
            engine,
        }
    }
}

/// A built, immutable Discrete-Time Markov Chain.
#[derive(Debug, Clone)]
pub struct Dtmc {
    labels: Vec<BTreeSet<AtomicProposition>>,
    rewards: Vec<f64>,
    outgoing: Vec<Vec<(DtmcState, f64)>>,
    incoming: Vec<Vec<DtmcState>>,
    engine: DtmcEngine,
}

impl Graph for Dtmc {
    type Node = DtmcState;

    fn successors(&self, node: &DtmcState) -> Vec<DtmcState> {
        self.outgoing[node.0].iter().map(|(t, _)| *t).collect()
    }

    fn predecessors(&self, node: &DtmcState) -> Vec<DtmcState> {
        self.incoming[node.0].clone()
    }
}

impl Dtmc {
    /// Every state, in creation order.
    pub fn states(&self) -> impl Iterator<Item = DtmcState> {
        (0..self.labels.len()).map(DtmcState)
    }

    /// The atomic propositions labeling `state`.
    pub fn labels(&self, state: DtmcState) -> &BTreeSet<AtomicProposition> {
        &self.labels[state.0]
    }

    /// The reward assigned to `state` (`0` if unset).
    pub fn reward(&self, state: DtmcState) -> f64 {
        self.rewards[state.0]
    }

    /// `state`'s outgoing transitions as `(target, probability)` pairs.
    /// Unlike [`Graph::successors`], this keeps the probability half of each
    /// transition, which callers computing a probability mass need.
    pub fn outgoing(&self, state: DtmcState) -> &[(DtmcState, f64)] {
        &self.outgoing[state.0]
    }

    fn dense_matrix(&self) -> DMatrix<f64> {
        let n = self.labels.len();
        let mut matrix = DMatrix::zeros(n, n);
        for (i, targets) in self.outgoing.iter().enumerate() {
            for &(target, probability) in targets {
                matrix[(i, target.0)] = probability;
            }
        }
        matrix
    }

    fn require_dense(&self) -> Result<()> {
        match self.engine {
            DtmcEngine::Dense => Ok(()),
            DtmcEngine::Sparse => Err(Error::Unsupported("sparse DTMC engine".to_string())),
        }
    }

    /// `μ·P^t`, as the non-zero-mass entries of the distribution reached
    /// after `t` steps from `initial_distribution`.
    pub fn transient_distribution(
        &self,
        initial_distribution: &BTreeMap<DtmcState, f64>,
        t: usize,
    ) -> Result<BTreeMap<DtmcState, f64>> {
        self.require_dense()?;
        let n = self.labels.len();
        let matrix_transpose = self.dense_matrix().transpose();
        let mut distribution = DVector::zeros(n);
        for (state, mass) in initial_distribution {
            distribution[state.0] = *mass;
        }
        for _ in 0..t {
            distribution = &matrix_transpose * &distribution;
        }
        Ok(self
            .states()
            .filter(|s| distribution[s.0] > 0.0)
            .map(|s| (s, distribution[s.0]))
            .collect())
    }

    /// `P(reach target within t steps)` per undetermined state, computed by
    /// iterating `x ← Q·x + b` `t` times from `x = 0`.
    pub fn bounded_reachability(
        &self,
        bad: &BTreeSet<DtmcState>,
        target: &BTreeSet<DtmcState>,
        t: usize,
    ) -> Result<BTreeMap<DtmcState, f64>> {
        self.require_dense()?;
        self.reachability(bad, target, Horizon::Bounded(t))
    }

    /// `P(reach target)` per undetermined state, solved exactly via
    /// `(Q − I)·x = −b`.
    pub fn unbounded_reachability(
        &self,
        bad: &BTreeSet<DtmcState>,
        target: &BTreeSet<DtmcState>,
    ) -> Result<BTreeMap<DtmcState, f64>> {
        self.require_dense()?;
        self.reachability(bad, target, Horizon::Unbounded)
    }

    fn reachability(
        &self,
        bad: &BTreeSet<DtmcState>,
        target: &BTreeSet<DtmcState>,
        horizon: Horizon,
    ) -> Result<BTreeMap<DtmcState, f64>> {
        if bad.intersection(target).next().is_some() {
            return Err(Error::InvalidArgument(
                "bad and target states must be disjoint".to_string(),
            ));
        }

        let reach_target = backward_reachable(self, target.iter().copied());
        let undetermined: Vec<DtmcState> = reach_target
            .into_iter()
            .filter(|s| !bad.contains(s) && !target.contains(s))
            .collect();

        let matrix = self.dense_matrix();
        let m = undetermined.len();
        let mut q = DMatrix::zeros(m, m);
        for (i, &si) in undetermined.iter().enumerate() {
            for (j, &sj) in undetermined.iter().enumerate() {
                q[(i, j)] = matrix[(si.0, sj.0)];
            }
        }
        let mut b = DVector::zeros(m);
        for (i, &si) in undetermined.iter().enumerate() {
            let mass: f64 = target.iter().map(|&t| matrix[(si.0, t.0)]).sum();
            b[i] = mass;
        }

        let x = match horizon {
            Horizon::Bounded(t) => {
                let mut x = DVector::zeros(m);
                for _ in 0..t {
                    x = &q * &x + &b;
                }
                x
            }
            Horizon::Unbounded => solve_linear_system(&q, &b)?,
        };

        let mut result: BTreeMap<DtmcState, f64> = undetermined
            .iter()
            .enumerate()
            .map(|(idx, &s)| (s, x[idx]))
            .collect();
        for &s in bad {
            result.insert(s, 0.0);
        }
        for &s in target {
            result.insert(s, 1.0);
        }
        Ok(result)
    }

    /// Expected accumulated reward before reaching `target`, assuming
    /// `target` is almost-surely reachable from every undetermined state
    /// (enforced by a three-stage backward-DFS filter, Open Question (c)).
    pub fn expected_reward(&self, target: &BTreeSet<DtmcState>) -> Result<BTreeMap<DtmcState, f64>> {
        self.require_dense()?;
        let can_reach_target = backward_reachable(self, target.iter().copied());
        let unreachable: BTreeSet<DtmcState> = self.states().filter(|s| !can_reach_target.contains(s)).collect();
        let leads_to_unreachable = backward_reachable(self, unreachable.iter().copied());
        let undetermined: Vec<DtmcState> = self
            .states()
            .filter(|s| !leads_to_unreachable.contains(s) && !target.contains(s))
            .collect();

        let matrix = self.dense_matrix();
        let m = undetermined.len();
        let mut q = DMatrix::zeros(m, m);
        for (i, &si) in undetermined.iter().enumerate() {
            for (j, &sj) in undetermined.iter().enumerate() {
                q[(i, j)] = matrix[(si.0, sj.0)];
            }
        }
        let r = DVector::from_iterator(m, undetermined.iter().map(|&s| self.reward(s)));
        let x = solve_linear_system(&q, &r)?;

        let mut result: BTreeMap<DtmcState, f64> = undetermined
            .iter()
            .enumerate()
            .map(|(idx, &s)| (s, x[idx]))
            .collect();
        for &s in target {
            result.insert(s, 0.0);
        }
        Ok(result)
    }
}

enum Horizon {
    Bounded(usize),
    Unbounded,
}

/// Solve `(Q − I)·x = −r` via LU decomposition.
fn solve_linear_system(q: &DMatrix<f64>, r: &DVector<f64>) -> Result<DVector<f64>> {
    let n = q.nrows();
    let a = q - DMatrix::identity(n, n);
    let b = -r;
    a.lu()
        .solve(&b)
        .ok_or_else(|| Error::NumericError("singular system in DTMC reachability/reward solve".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A two-step fair coin: s0 flips to heads (absorbing, reward 0) or
    /// tails (absorbing, reward 1) with probability 1/2 each.
    fn coin_flip() -> (Dtmc, DtmcState, DtmcState, DtmcState) {
        let mut builder = DtmcBuilder::new();
        let s0 = builder.create_state(BTreeSet::new());
        let heads = builder.create_state(BTreeSet::from([AtomicProposition::new("heads")]));
        let tails = builder.create_state(BTreeSet::from([AtomicProposition::new("tails")]));
        builder.add_transition(s0, 0.5, heads);
        builder.add_transition(s0, 0.5, tails);
        builder.add_transition(heads, 1.0, heads);
        builder.add_transition(tails, 1.0, tails);
        builder.set_reward(tails, 1.0);
        builder.set_reward(s0, 1.0);
        (builder.build(DtmcEngine::Dense), s0, heads, tails)
    }

    #[test]
    fn unbounded_reachability_of_tails_is_one_half() {
        let (dtmc, s0, heads, tails) = coin_flip();
        let result = dtmc
            .unbounded_reachability(&BTreeSet::new(), &BTreeSet::from([tails]))
            .unwrap();
        assert!((result[&s0] - 0.5).abs() < 1e-9);
        assert_eq!(result[&heads], 0.0);
        assert_eq!(result[&tails], 1.0);
    }

    #[test]
    fn expected_reward_of_one_step_to_an_absorbing_state_is_one() {
        let (dtmc, s0, heads, tails) = coin_flip();
        let target = BTreeSet::from([heads, tails]);
        let result = dtmc.expected_reward(&target).unwrap();
        assert!((result[&s0] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn sparse_engine_is_an_explicit_stub() {
        let mut builder = DtmcBuilder::new();
        let s0 = builder.create_state(BTreeSet::new());
        builder.add_transition(s0, 1.0, s0);
        let dtmc = builder.build(DtmcEngine::Sparse);
        assert!(matches!(
            dtmc.unbounded_reachability(&BTreeSet::new(), &BTreeSet::from([s0])),
            Err(Error::Unsupported(_))
        ));
    }

    #[test]
    fn bad_and_target_overlap_is_rejected() {
        let (dtmc, s0, heads, _tails) = coin_flip();
        assert!(matches!(
            dtmc.unbounded_reachability(&BTreeSet::from([heads]), &BTreeSet::from([heads, s0])),
            Err(Error::InvalidArgument(_))
        ));
    }
}
