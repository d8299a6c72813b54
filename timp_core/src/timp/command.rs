//! TIMP commands and their small-step operational semantics.

use std::collections::BTreeSet;
use std::rc::Rc;

use crate::error::Result;

use super::expr::{BooleanExpression, State, Variable};

/// Free-form labels a programmer may attach to any atomic command with
/// `@LABEL`.
pub type Annotations = BTreeSet<String>;

/// A TIMP command: {Skip, Assign, Seq, IfElse, Repeat}. Each node carries
/// its own annotation set. Commands are acyclic trees shared by value —
/// children are `Rc`-linked so that e.g. unfolding `Repeat(c)` into
/// `Seq(c, Repeat(c))` reuses the existing subtree rather than deep-copying.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Command {
    /// Terminal command; steps to itself.
    Skip {
        /// Labels attached to this node.
        annotations: Annotations,
    },
    /// `var = expr`.
    Assign {
        /// The assigned variable.
        var: Variable,
        /// The right-hand-side expression.
        expr: BooleanExpression,
        /// Labels attached to this node.
        annotations: Annotations,
    },
    /// `first; second`.
    Seq {
        /// The first command to execute.
        first: Rc<Command>,
        /// The command to execute once `first` has reduced to `Skip`.
        second: Rc<Command>,
        /// Labels attached to this node (not `first`/`second`'s own).
        annotations: Annotations,
    },
    /// `if cond then then_branch else else_branch endif`.
    IfElse {
        /// The branch condition.
        cond: BooleanExpression,
        /// Taken when `cond` evaluates to `true`.
        then_branch: Rc<Command>,
        /// Taken when `cond` evaluates to `false`.
        else_branch: Rc<Command>,
        /// Labels attached to this node.
        annotations: Annotations,
    },
    /// `repeat body endrepeat`, unconditionally re-entered forever.
    Repeat {
        /// The loop body.
        body: Rc<Command>,
        /// Labels attached to this node.
        annotations: Annotations,
    },
}

impl Command {
    /// A fresh `Skip` node with no annotations.
    pub fn skip() -> Rc<Command> {
        Rc::new(Command::Skip {
            annotations: Annotations::new(),
        })
    }

    /// `var = expr`.
    pub fn assign(var: Variable, expr: BooleanExpression) -> Rc<Command> {
        Rc::new(Command::Assign {
            var,
            expr,
            annotations: Annotations::new(),
        })
    }

    /// `first; second`.
    pub fn seq(first: Rc<Command>, second: Rc<Command>) -> Rc<Command> {
        Rc::new(Command::Seq {
            first,
            second,
            annotations: Annotations::new(),
        })
    }

    /// `if cond then then_branch else else_branch endif`.
    pub fn if_else(cond: BooleanExpression, then_branch: Rc<Command>, else_branch: Rc<Command>) -> Rc<Command> {
        Rc::new(Command::IfElse {
            cond,
            then_branch,
            else_branch,
            annotations: Annotations::new(),
        })
    }

    /// `repeat body endrepeat`.
    pub fn repeat(body: Rc<Command>) -> Rc<Command> {
        Rc::new(Command::Repeat {
            body,
            annotations: Annotations::new(),
        })
    }

    /// Return a copy of this node (not its children) with `label` added to
    /// its own annotation set. Commands are value-like, so this returns a
    /// new node rather than mutating in place.
    pub fn annotate(self: &Rc<Self>, label: impl Into<String>) -> Rc<Command> {
        let mut node = (**self).clone();
        node.own_annotations_mut().insert(label.into());
        Rc::new(node)
    }

    fn own_annotations_mut(&mut self) -> &mut Annotations {
        match self {
            Command::Skip { annotations }
            | Command::Assign { annotations, .. }
            | Command::Seq { annotations, .. }
            | Command::IfElse { annotations, .. }
            | Command::Repeat { annotations, .. } => annotations,
        }
    }

    /// This node's own annotation set (not its children's).
    pub fn own_annotations(&self) -> &Annotations {
        match self {
            Command::Skip { annotations }
            | Command::Assign { annotations, .. }
            | Command::Seq { annotations, .. }
            | Command::IfElse { annotations, .. }
            | Command::Repeat { annotations, .. } => annotations,
        }
    }

    /// The small-step successor configurations of `(self, state)`.
    ///
    /// - `Skip` has exactly one successor, itself, making the relation
    ///   total (required so LTL's infinite-path semantics applies).
    /// - `Assign` evaluates its expression and steps to `Skip` in the
    ///   updated state.
    /// - `Seq(c1, c2)` steps `c1` unless it is already `Skip`, in which case
    ///   it steps directly to `c2`; a `Skip` result from stepping `c1`
    ///   collapses `(Skip, c2)` to just `c2`.
    /// - `IfElse` evaluates its guard and steps directly into a branch (no
    ///   intermediate configuration).
    /// - `Repeat(c)` steps as `Seq(c, Repeat(c))`.
    pub fn successors(self: &Rc<Self>, state: &State) -> Result<Vec<Configuration>> {
        match self.as_ref() {
            Command::Skip { .. } => Ok(vec![Configuration {
                command: Rc::clone(self),
                state: state.clone(),
            }]),
            Command::Assign { var, expr, .. } => {
                let value = expr.eval(state)?;
                let mut next_state = state.clone();
                next_state.insert(var.clone(), value);
                Ok(vec![Configuration {
                    command: Command::skip(),
                    state: next_state,
                }])
            }
            Command::Seq { first, second, .. } => {
                if matches!(first.as_ref(), Command::Skip { .. }) {
                    second.successors(state)
                } else {
                    let first_successors = first.successors(state)?;
                    Ok(first_successors
                        .into_iter()
                        .map(|config| {
                            let command = if matches!(config.command.as_ref(), Command::Skip { .. }) {
                                Rc::clone(second)
                            } else {
                                Command::seq(config.command, Rc::clone(second))
                            };
                            Configuration {
                                command,
                                state: config.state,
                            }
                        })
                        .collect())
                }
            }
            Command::IfElse {
                cond,
                then_branch,
                else_branch,
                ..
            } => {
                if cond.eval(state)? {
                    then_branch.successors(state)
                } else {
                    else_branch.successors(state)
                }
            }
            Command::Repeat { body, .. } => {
                let unfolding = Command::seq(Rc::clone(body), Rc::clone(self));
                unfolding.successors(state)
            }
        }
    }

    /// The annotations "active" at the head of this command in `state`:
    /// for `IfElse` this descends into the taken branch only (the
    /// `IfElse` node's own annotations are not included, matching the
    /// source); for `Seq` it is the union of `first`'s active annotations
    /// and this node's own; `Repeat` likewise unions with `body`'s.
    pub fn active_annotations(&self, state: &State) -> Result<Annotations> {
        match self {
            Command::Skip { annotations } | Command::Assign { annotations, .. } => Ok(annotations.clone()),
            Command::Seq {
                first, annotations, ..
            } => {
                let mut active = first.active_annotations(state)?;
                active.extend(annotations.iter().cloned());
                Ok(active)
            }
            Command::IfElse {
                cond,
                then_branch,
                else_branch,
                ..
            } => {
                if cond.eval(state)? {
                    then_branch.active_annotations(state)
                } else {
                    else_branch.active_annotations(state)
                }
            }
            Command::Repeat { body, annotations } => {
                let mut active = body.active_annotations(state)?;
                active.extend(annotations.iter().cloned());
                Ok(active)
            }
        }
    }

    /// Every variable referenced anywhere in the command, regardless of
    /// reachability (the `VariableCollector` analysis).
    pub fn variables(&self) -> BTreeSet<Variable> {
        let mut out = BTreeSet::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables(&self, out: &mut BTreeSet<Variable>) {
        match self {
            Command::Skip { .. } => {}
            Command::Assign { var, expr, .. } => {
                out.insert(var.clone());
                out.extend(expr.variables());
            }
            Command::Seq { first, second, .. } => {
                first.collect_variables(out);
                second.collect_variables(out);
            }
            Command::IfElse {
                cond,
                then_branch,
                else_branch,
                ..
            } => {
                out.extend(cond.variables());
                then_branch.collect_variables(out);
                else_branch.collect_variables(out);
            }
            Command::Repeat { body, .. } => body.collect_variables(out),
        }
    }

    /// Every annotation string attached anywhere in the command tree,
    /// regardless of reachability (the `AnnotationCollector` analysis: not
    /// present verbatim in the retrieved original source, reconstructed
    /// from the spec's prose by analogy with [`Command::variables`]).
    pub fn all_annotations(&self) -> Annotations {
        let mut out = Annotations::new();
        self.collect_annotations(&mut out);
        out
    }

    fn collect_annotations(&self, out: &mut Annotations) {
        match self {
            Command::Skip { annotations } | Command::Assign { annotations, .. } => {
                out.extend(annotations.iter().cloned());
            }
            Command::Seq {
                first,
                second,
                annotations,
            } => {
                out.extend(annotations.iter().cloned());
                first.collect_annotations(out);
                second.collect_annotations(out);
            }
            Command::IfElse {
                then_branch,
                else_branch,
                annotations,
                ..
            } => {
                out.extend(annotations.iter().cloned());
                then_branch.collect_annotations(out);
                else_branch.collect_annotations(out);
            }
            Command::Repeat { body, annotations } => {
                out.extend(annotations.iter().cloned());
                body.collect_annotations(out);
            }
        }
    }

    /// Constant-fold expressions and drop `Skip;c`/`c;Skip`/`if true/false`
    /// redundancies. An unannotated `Skip` is the only kind eligible to be
    /// dropped from a `Seq` — an annotated one still contributes a label.
    pub fn simplify(self: &Rc<Self>) -> Rc<Command> {
        match self.as_ref() {
            Command::Skip { annotations } => Rc::new(Command::Skip {
                annotations: annotations.clone(),
            }),
            Command::Assign { var, expr, annotations } => Rc::new(Command::Assign {
                var: var.clone(),
                expr: expr.simplify(),
                annotations: annotations.clone(),
            }),
            Command::Seq {
                first,
                second,
                annotations,
            } => {
                let first = first.simplify();
                let second = second.simplify();
                if is_bare_skip(&first) {
                    second
                } else if is_bare_skip(&second) {
                    first
                } else {
                    Rc::new(Command::Seq {
                        first,
                        second,
                        annotations: annotations.clone(),
                    })
                }
            }
            Command::IfElse {
                cond,
                then_branch,
                else_branch,
                annotations,
            } => {
                let cond = cond.simplify();
                let then_branch = then_branch.simplify();
                let else_branch = else_branch.simplify();
                match cond {
                    BooleanExpression::Constant(true) => then_branch,
                    BooleanExpression::Constant(false) => else_branch,
                    cond => Rc::new(Command::IfElse {
                        cond,
                        then_branch,
                        else_branch,
                        annotations: annotations.clone(),
                    }),
                }
            }
            Command::Repeat { body, annotations } => Rc::new(Command::Repeat {
                body: body.simplify(),
                annotations: annotations.clone(),
            }),
        }
    }

    /// Split a right-associated `Seq` into its top-level sequence of
    /// commands; any other command is a single-element sequence.
    pub fn linearize(self: &Rc<Self>) -> Vec<Rc<Command>> {
        match self.as_ref() {
            Command::Seq { first, second, .. } => {
                let mut out = first.linearize();
                out.extend(second.linearize());
                out
            }
            _ => vec![Rc::clone(self)],
        }
    }

    /// Structural pretty-printer, matching the source's indentation scheme.
    pub fn pretty(&self, depth: usize) -> String {
        let indent = "  ".repeat(depth);
        match self {
            Command::Skip { .. } => format!("{indent}skip"),
            Command::Assign { var, expr, .. } => format!("{indent}{var} = {}", expr.pretty()),
            Command::Seq { first, second, .. } => {
                format!("{}\n{}", first.pretty(depth), second.pretty(depth))
            }
            Command::IfElse {
                cond,
                then_branch,
                else_branch,
                ..
            } => format!(
                "{indent}if {} then\n{}\n{indent}else\n{}\n{indent}endif",
                cond.pretty(),
                then_branch.pretty(depth + 1),
                else_branch.pretty(depth + 1)
            ),
            Command::Repeat { body, .. } => {
                format!("{indent}repeat\n{}\n{indent}endrepeat", body.pretty(depth + 1))
            }
        }
    }
}

fn is_bare_skip(command: &Rc<Command>) -> bool {
    matches!(command.as_ref(), Command::Skip { annotations } if annotations.is_empty())
}

/// A pair `(command, state)`: a state of the program's labeled transition
/// system. Equality and hashing are structural over both components.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Configuration {
    /// The command remaining to execute.
    pub command: Rc<Command>,
    /// The current variable valuation.
    pub state: State,
}

impl Configuration {
    /// Build the initial configuration `(command, state)`.
    pub fn new(command: Rc<Command>, state: State) -> Self {
        Configuration { command, state }
    }

    /// The successor configurations of this one (delegates to
    /// [`Command::successors`]).
    pub fn successors(&self) -> Result<Vec<Configuration>> {
        self.command.successors(&self.state)
    }

    /// The annotations active at this configuration's head command.
    pub fn active_annotations(&self) -> Result<Annotations> {
        self.command.active_annotations(&self.state)
    }

    /// A structural pretty-print of command and state together, matching
    /// the source's `Configuration.pretty()` banner format.
    pub fn pretty(&self) -> String {
        let state = self
            .state
            .iter()
            .map(|(var, val)| format!("{var}={val}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "{}\n{}\n{}\n{{{state}}}\n{}",
            "=".repeat(30),
            self.command.pretty(0),
            "-".repeat(30),
            "=".repeat(30)
        )
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
    fn skip_self_loops() {
        let skip = Command::skip();
        let s = State::new();
        let succs = skip.successors(&s).unwrap();
        assert_eq!(succs, vec![Configuration::new(Rc::clone(&skip), s)]);
    }

    #[test]
    fn assign_updates_state_and_becomes_skip() {
        let cmd = Command::assign(Variable::new("x"), BooleanExpression::Constant(true));
        let s = state(&[("x", false)]);
        let succs = cmd.successors(&s).unwrap();
        assert_eq!(succs.len(), 1);
        assert!(matches!(succs[0].command.as_ref(), Command::Skip { .. }));
        assert_eq!(succs[0].state[&Variable::new("x")], true);
    }

    #[test]
    fn seq_collapses_trailing_skip() {
        let assign = Command::assign(Variable::new("x"), BooleanExpression::Constant(true));
        let prog = Command::seq(assign, Command::skip());
        let s = state(&[("x", false)]);
        let succs = prog.successors(&s).unwrap();
        assert_eq!(succs.len(), 1);
        // after one step the whole program has reduced to Skip
        assert!(matches!(succs[0].command.as_ref(), Command::Skip { .. }));
    }

    #[test]
    fn repeat_unfolds_as_seq_with_itself() {
        let x = Variable::new("x");
        let toggle = Command::assign(x.clone(), BooleanExpression::Not(Box::new(BooleanExpression::var("x"))))
            .annotate("tick");
        let program = Command::repeat(toggle);
        let s = state(&[("x", false)]);
        let succs = program.successors(&s).unwrap();
        assert_eq!(succs.len(), 1);
        // stepping repeat(toggle) once yields repeat(toggle) again with x flipped
        assert_eq!(succs[0].command, program);
        assert_eq!(succs[0].state[&x], true);
    }

    #[test]
    fn if_else_active_annotations_descend_into_taken_branch_only() {
        let then_branch = Command::skip().annotate("then-label");
        let else_branch = Command::skip().annotate("else-label");
        let ite = Command::if_else(BooleanExpression::Constant(true), then_branch, else_branch).annotate("ite-label");
        let active = ite.active_annotations(&State::new()).unwrap();
        // the IfElse node's own "ite-label" is never included, only the taken branch's
        assert_eq!(active, Annotations::from(["then-label".to_string()]));
    }

    #[test]
    fn linearize_splits_right_associated_seq() {
        let a = Command::skip().annotate("a");
        let b = Command::skip().annotate("b");
        let c = Command::skip().annotate("c");
        let program = Command::seq(a.clone(), Command::seq(b.clone(), c.clone()));
        assert_eq!(program.linearize(), vec![a, b, c]);
    }

    #[test]
    fn simplify_drops_unannotated_skip_but_keeps_annotated_one() {
        let assign = Command::assign(Variable::new("x"), BooleanExpression::Constant(true));
        let program = Command::seq(Command::skip(), assign.clone());
        assert_eq!(program.simplify(), assign);

        let annotated_skip = Command::skip().annotate("kept");
        let program = Command::seq(annotated_skip.clone(), assign.clone());
        assert_eq!(
            program.simplify(),
            Command::seq(annotated_skip, assign)
        );
    }
}
