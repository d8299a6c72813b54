//! TIMP: the tiny imperative language this crate model-checks. A `Module`
//! wraps a `Command` tree; `Command::successors` gives its small-step
//! operational semantics.

pub mod command;
pub mod expr;
pub mod module;

pub use command::{Annotations, Command, Configuration};
pub use expr::{BooleanExpression, State, Variable};
pub use module::Module;
