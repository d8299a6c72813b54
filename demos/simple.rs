//! Ported from `examples/simple.py`: build a small TIMP program directly
//! (no text grammar — §6 places the concrete-syntax parser out of scope)
//! and print its linearized steps.

use timp_core::timp::{BooleanExpression, Command, Module, Variable};

fn main() {
    env_logger::init();

    let a = Variable::new("a");
    let b = Variable::new("b");
    let program = Command::seq(
        Command::assign(a.clone(), BooleanExpression::Constant(true)).annotate("a"),
        Command::assign(b.clone(), BooleanExpression::Not(Box::new(BooleanExpression::var("a")))).annotate("b"),
    );
    let module = Module::new("simple", program);

    for cmd in module.linearize() {
        println!("{:?}", cmd.own_annotations());
        println!("{}", cmd.pretty(0));
    }
}
