//! A verification engine for TIMP, a small imperative language with
//! finite-state programs: LTL, CTL and PCTL model checking over the
//! program's transition graph, plus a dense-numerical DTMC engine for
//! probabilistic properties.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod automaton;
pub mod ctl;
pub mod dot;
pub mod dtmc;
pub mod error;
pub mod graph;
pub mod kripke;
pub mod ltl;
pub mod model_checking;
pub mod pctl;
pub mod timp;

pub use error::{Error, Result};
