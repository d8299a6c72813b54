//! Boolean expressions over program variables.

use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// A named boolean program variable. Equality is by name, mirroring the
/// source's `Variable.__eq__`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable(pub String);

impl Variable {
    /// Build a variable from anything string-like.
    pub fn new(name: impl Into<String>) -> Self {
        Variable(name.into())
    }
}

impl std::fmt::Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A total valuation of program variables. Backed by a `BTreeMap` so two
/// states built in different orders are `Eq`/`Hash`-equal whenever their
/// contents match, and iteration is always in a deterministic (name) order.
pub type State = BTreeMap<Variable, bool>;

/// Boolean expression tree: {Variable, Constant, And, Or, Not, Parens}.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BooleanExpression {
    /// A variable reference.
    Variable(Variable),
    /// A boolean literal.
    Constant(bool),
    /// Conjunction.
    And(Box<BooleanExpression>, Box<BooleanExpression>),
    /// Disjunction.
    Or(Box<BooleanExpression>, Box<BooleanExpression>),
    /// Negation.
    Not(Box<BooleanExpression>),
    /// A parenthesized subexpression, kept distinct from its child purely
    /// for pretty-printing fidelity (as in the source).
    Parens(Box<BooleanExpression>),
}

impl BooleanExpression {
    /// Smart constructor for [`BooleanExpression::Variable`].
    pub fn var(name: impl Into<String>) -> Self {
        BooleanExpression::Variable(Variable::new(name))
    }

    /// Evaluate the expression against `state`. Every variable referenced
    /// must be bound in `state`; an unbound variable is a [`Error::SemanticError`].
    pub fn eval(&self, state: &State) -> Result<bool> {
        match self {
            BooleanExpression::Variable(v) => state.get(v).copied().ok_or_else(|| {
                Error::SemanticError(format!("variable {v} is not bound in the current state"))
            }),
            BooleanExpression::Constant(b) => Ok(*b),
            BooleanExpression::And(lhs, rhs) => Ok(lhs.eval(state)? && rhs.eval(state)?),
            BooleanExpression::Or(lhs, rhs) => Ok(lhs.eval(state)? || rhs.eval(state)?),
            BooleanExpression::Not(e) => Ok(!e.eval(state)?),
            BooleanExpression::Parens(e) => e.eval(state),
        }
    }

    /// Pretty-print, matching the source's infix rendering.
    pub fn pretty(&self) -> String {
        match self {
            BooleanExpression::Variable(v) => v.0.clone(),
            BooleanExpression::Constant(true) => "true".to_string(),
            BooleanExpression::Constant(false) => "false".to_string(),
            BooleanExpression::And(a, b) => format!("{} and {}", a.pretty(), b.pretty()),
            BooleanExpression::Or(a, b) => format!("{} or {}", a.pretty(), b.pretty()),
            BooleanExpression::Not(e) => format!("!{}", e.pretty()),
            BooleanExpression::Parens(e) => format!("({})", e.pretty()),
        }
    }

    /// Every variable referenced anywhere in the expression.
    pub fn variables(&self) -> std::collections::BTreeSet<Variable> {
        let mut vars = std::collections::BTreeSet::new();
        self.collect_variables(&mut vars);
        vars
    }

    fn collect_variables(&self, out: &mut std::collections::BTreeSet<Variable>) {
        match self {
            BooleanExpression::Variable(v) => {
                out.insert(v.clone());
            }
            BooleanExpression::Constant(_) => {}
            BooleanExpression::And(a, b) | BooleanExpression::Or(a, b) => {
                a.collect_variables(out);
                b.collect_variables(out);
            }
            BooleanExpression::Not(e) | BooleanExpression::Parens(e) => e.collect_variables(out),
        }
    }

    /// Constant-fold this expression: literal `And`/`Or`/`Not` over
    /// `Constant` collapse, and `Parens` around anything that isn't needed
    /// for a re-print is unwrapped. Grounded in `Simplifier`/`_ExprSimplifier`.
    pub fn simplify(&self) -> BooleanExpression {
        match self {
            BooleanExpression::Variable(_) | BooleanExpression::Constant(_) => self.clone(),
            BooleanExpression::Parens(e) => e.simplify(),
            BooleanExpression::Not(e) => match e.simplify() {
                BooleanExpression::Constant(b) => BooleanExpression::Constant(!b),
                simplified => BooleanExpression::Not(Box::new(simplified)),
            },
            BooleanExpression::And(a, b) => {
                match (a.simplify(), b.simplify()) {
                    (a, b) if a == b => a,
                    (BooleanExpression::Constant(false), _) | (_, BooleanExpression::Constant(false)) => {
                        BooleanExpression::Constant(false)
                    }
                    (BooleanExpression::Constant(true), other) | (other, BooleanExpression::Constant(true)) => other,
                    (a, b) => BooleanExpression::And(Box::new(a), Box::new(b)),
                }
            }
            BooleanExpression::Or(a, b) => {
                match (a.simplify(), b.simplify()) {
                    (a, b) if a == b => a,
                    (BooleanExpression::Constant(true), _) | (_, BooleanExpression::Constant(true)) => {
                        BooleanExpression::Constant(true)
                    }
                    (BooleanExpression::Constant(false), other) | (other, BooleanExpression::Constant(false)) => other,
                    (a, b) => BooleanExpression::Or(Box::new(a), Box::new(b)),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(pairs: &[(&str, bool)]) -> State {
        pairs
            .iter()
            .map(|(name, val)| (Variable::new(*name), *val))
            .collect()
    }

    #[test]
    fn eval_conjunction() {
        let e = BooleanExpression::And(
            Box::new(BooleanExpression::var("a")),
            Box::new(BooleanExpression::Not(Box::new(BooleanExpression::var("b")))),
        );
        let s = state(&[("a", true), ("b", false)]);
        assert_eq!(e.eval(&s).unwrap(), true);
    }

    #[test]
    fn eval_missing_variable_is_semantic_error() {
        let e = BooleanExpression::var("missing");
        assert!(matches!(e.eval(&State::new()), Err(Error::SemanticError(_))));
    }

    #[test]
    fn simplify_folds_constants() {
        let e = BooleanExpression::And(
            Box::new(BooleanExpression::Constant(true)),
            Box::new(BooleanExpression::var("a")),
        );
        assert_eq!(e.simplify(), BooleanExpression::var("a"));

        let e = BooleanExpression::Or(
            Box::new(BooleanExpression::Constant(true)),
            Box::new(BooleanExpression::var("a")),
        );
        assert_eq!(e.simplify(), BooleanExpression::Constant(true));
    }

    #[test]
    fn simplify_unwraps_parens() {
        let e = BooleanExpression::Parens(Box::new(BooleanExpression::var("a")));
        assert_eq!(e.simplify(), BooleanExpression::var("a"));
    }
}
