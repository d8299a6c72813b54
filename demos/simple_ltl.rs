//! Ported from `examples/simple_ltl.py`: `G(Implies(AP(a), X(AP(b))))`
//! checked against a two-step program built directly from `Command`
//! constructors (no text grammar — §6).

use timp_core::ltl::LtlFormula;
use timp_core::model_checking::model_check_ltl;
use timp_core::timp::{BooleanExpression, Command, Module, State, Variable};

fn main() {
    env_logger::init();

    let a = Variable::new("a");
    let b = Variable::new("b");
    let program = Command::seq(
        Command::assign(a, BooleanExpression::Constant(true)).annotate("a"),
        Command::assign(b, BooleanExpression::Constant(true)).annotate("b"),
    );
    let module = Module::new("simple_ltl", program);
    let initial = module.initial_configuration(State::new());

    let phi = LtlFormula::globally(LtlFormula::implies(LtlFormula::ap("a"), LtlFormula::next(LtlFormula::ap("b"))));
    println!("phi = G(a -> X(b))");

    let (result, counterexample) = model_check_ltl(&module, initial, &phi).expect("well-formed module and formula");
    println!("Model checking result: {result}");

    if let Some(cex) = counterexample {
        for config in cex.stem.iter().chain(cex.cycle.iter()) {
            println!("{config}");
        }
    }
}
