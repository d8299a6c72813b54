//! A TIMP module: a name, a command tree, and the derived analyses
//! (variables, annotations) the rest of the crate needs repeatedly.

use std::cell::OnceCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use super::command::{Annotations, Command, Configuration};
use super::expr::{State, Variable};

/// A single TIMP program: a name plus its command tree. `variables()` and
/// `annotations()` are cached lazily since callers (the Kripke-structure
/// builder, the AP evaluator) invoke them on every explored configuration.
#[derive(Debug, Clone)]
pub struct Module {
    name: String,
    command: Rc<Command>,
    variables: OnceCell<BTreeSet<Variable>>,
    annotations: OnceCell<Annotations>,
}

impl Module {
    /// Build a module from its name and top-level command.
    pub fn new(name: impl Into<String>, command: Rc<Command>) -> Self {
        Module {
            name: name.into(),
            command,
            variables: OnceCell::new(),
            annotations: OnceCell::new(),
        }
    }

    /// The module's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The module's top-level command.
    pub fn command(&self) -> &Rc<Command> {
        &self.command
    }

    /// The initial configuration given an initial state (unbound variables
    /// default to `false`, matching the source's zero-initialized state).
    pub fn initial_configuration(&self, mut state: State) -> Configuration {
        for var in self.variables() {
            state.entry(var.clone()).or_insert(false);
        }
        Configuration::new(Rc::clone(&self.command), state)
    }

    /// Every variable referenced anywhere in the module, computed once and
    /// cached.
    pub fn variables(&self) -> &BTreeSet<Variable> {
        self.variables.get_or_init(|| self.command.variables())
    }

    /// Every annotation label declared anywhere in the module, computed once
    /// and cached.
    pub fn annotations(&self) -> &Annotations {
        self.annotations.get_or_init(|| self.command.all_annotations())
    }

    /// Rebuild the module with its command tree constant-folded and
    /// redundant `Skip`s dropped.
    pub fn simplify(&self) -> Module {
        Module::new(self.name.clone(), self.command.simplify())
    }

    /// The module's top-level command split into its linear sequence of
    /// atomic/compound steps.
    pub fn linearize(&self) -> Vec<Rc<Command>> {
        self.command.linearize()
    }

    /// Structural pretty-print: `module NAME:` followed by the indented
    /// command tree.
    pub fn pretty(&self) -> String {
        format!("module {}:\n{}", self.name, self.command.pretty(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::expr::BooleanExpression;

    #[test]
    fn variables_are_collected_and_cached() {
        let x = Variable::new("x");
        let cmd = Command::assign(x.clone(), BooleanExpression::Constant(true));
        let module = Module::new("m", cmd);
        assert_eq!(module.variables(), &BTreeSet::from([x]));
        // second call hits the cache; result must be stable
        assert_eq!(module.variables(), module.variables());
    }

    #[test]
    fn initial_configuration_defaults_unbound_variables_to_false() {
        let x = Variable::new("x");
        let cmd = Command::assign(x.clone(), BooleanExpression::Constant(true));
        let module = Module::new("m", cmd);
        let config = module.initial_configuration(State::new());
        assert_eq!(config.state[&x], false);
    }

    #[test]
    fn annotations_collects_every_label_in_the_tree() {
        let body = Command::skip().annotate("loop-head");
        let cmd = Command::repeat(body).annotate("outer");
        let module = Module::new("m", cmd);
        assert_eq!(
            module.annotations().clone(),
            Annotations::from(["loop-head".to_string(), "outer".to_string()])
        );
    }
}
