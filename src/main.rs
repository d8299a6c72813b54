//! `timp_verify`: a small end-to-end demo of the verification engine. See
//! `demos/` for the one-formula-per-binary ports of the original examples.

use timp_core::ctl::CtlFormula;
use timp_core::model_checking::model_check_ctl;
use timp_core::timp::{BooleanExpression, Command, Module, State, Variable};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let a = Variable::new("a");
    let program = Command::assign(a, BooleanExpression::Constant(true)).annotate("a");
    let module = Module::new("demo", program);
    let initial = module.initial_configuration(State::new());

    println!("{}", module.pretty());

    let phi = CtlFormula::ag(CtlFormula::implies(CtlFormula::ap("a"), CtlFormula::ax(CtlFormula::ap("a"))));
    let holds = model_check_ctl(&module, initial, &phi)?;
    println!("AG(a -> AX(a)) holds: {holds}");

    Ok(())
}
