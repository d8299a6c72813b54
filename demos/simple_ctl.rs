//! Ported from `examples/simple_ctl.py`: `AG(Implies(AP(a), AX(AP(b))))`
//! checked against a two-step program built directly from `Command`
//! constructors (no text grammar — §6).

use timp_core::ctl::CtlFormula;
use timp_core::model_checking::model_check_ctl;
use timp_core::timp::{BooleanExpression, Command, Module, State, Variable};

fn main() {
    env_logger::init();

    let a = Variable::new("a");
    let b = Variable::new("b");
    let program = Command::seq(
        Command::assign(a, BooleanExpression::Constant(true)).annotate("a"),
        Command::assign(b, BooleanExpression::Constant(true)).annotate("b"),
    );
    let module = Module::new("simple_ctl", program);
    let initial = module.initial_configuration(State::new());

    let phi = CtlFormula::ag(CtlFormula::implies(CtlFormula::ap("a"), CtlFormula::ax(CtlFormula::ap("b"))));
    println!("phi = AG(a -> AX(b))");

    let result = model_check_ctl(&module, initial, &phi).expect("well-formed module and formula");
    println!("CTL model checking result: {result}");
}
