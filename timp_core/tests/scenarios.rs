//! End-to-end verification scenarios built directly from `Command`
//! constructors (no text grammar — out of scope per the module's own
//! design notes).

use timp_core::ctl::CtlFormula;
use timp_core::ltl::LtlFormula;
use timp_core::model_checking::{model_check_ctl, model_check_ltl};
use timp_core::timp::{BooleanExpression, Command, Module, State, Variable};

fn annotated_assignment() -> (Module, timp_core::timp::Configuration) {
    let x = Variable::new("x");
    let command = Command::assign(x, BooleanExpression::Constant(true)).annotate("a");
    let module = Module::new("m", command);
    let initial = module.initial_configuration(State::new());
    (module, initial)
}

fn toggle_loop() -> (Module, timp_core::timp::Configuration) {
    let x = Variable::new("x");
    let toggle = Command::assign(x, BooleanExpression::Not(Box::new(BooleanExpression::var("x")))).annotate("tick");
    let module = Module::new("m", Command::repeat(toggle));
    let initial = module.initial_configuration(State::new());
    (module, initial)
}

#[test]
fn safety_ltl_passes() {
    let (module, initial) = annotated_assignment();
    let phi = LtlFormula::globally(LtlFormula::implies(
        LtlFormula::ap("a"),
        LtlFormula::next(LtlFormula::not(LtlFormula::ap("a"))),
    ));
    let (holds, counterexample) = model_check_ltl(&module, initial, &phi).unwrap();
    assert!(holds);
    assert!(counterexample.is_none());
}

#[test]
fn ltl_violation_yields_a_two_configuration_counterexample() {
    let (module, initial) = annotated_assignment();
    let phi = LtlFormula::globally(LtlFormula::ap("a"));
    let (holds, counterexample) = model_check_ltl(&module, initial, &phi).unwrap();
    assert!(!holds);
    let cex = counterexample.expect("violation must carry a counterexample");
    assert!(!cex.cycle.is_empty());
    assert_eq!(cex.cycle.first(), cex.cycle.last());
    assert_eq!(cex.stem.last(), cex.cycle.first());
}

#[test]
fn ctl_ag_implies_ax_fails_once_the_successor_drops_the_annotation() {
    let (module, initial) = annotated_assignment();
    let phi = CtlFormula::ag(CtlFormula::implies(CtlFormula::ap("a"), CtlFormula::ax(CtlFormula::ap("a"))));
    assert!(!model_check_ctl(&module, initial, &phi).unwrap());
}

#[test]
fn repeated_toggle_satisfies_globally_finally_tick() {
    let (module, initial) = toggle_loop();
    let phi = LtlFormula::globally(LtlFormula::finally(LtlFormula::ap("tick")));
    let (holds, _) = model_check_ltl(&module, initial, &phi).unwrap();
    assert!(holds);
}
