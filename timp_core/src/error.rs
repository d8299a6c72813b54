//! Crate-wide error type.
//!
//! Every fallible operation in this crate returns [`Result`], which wraps a
//! single flat [`Error`] enum -- the same shape the teacher uses for
//! `PgError`/`CsError` rather than a tree of per-module error types.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// All ways a model-checking call can fail.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// A formula or DTMC is not well-formed with respect to its context:
    /// APs outside the module's AP set, PCTL path/state formula mixing,
    /// or probability bounds outside `[0, 1]` / `lb > ub`.
    #[error("not well-formed: {0}")]
    WellFormedness(String),
    /// A program uses a variable outside its collected variable set.
    #[error("semantic error: {0}")]
    SemanticError(String),
    /// A caller-supplied argument violates a precondition, e.g. overlapping
    /// bad/target state sets in a reachability query.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// A BFS search for a witness path found none, despite the caller
    /// believing one exists (internal invariant violation if raised after
    /// Tarjan reported an accepting SCC).
    #[error("no path to target found")]
    NoPath,
    /// A dense linear system was singular when the undetermined-state
    /// filter should have guaranteed invertibility.
    #[error("numeric error: {0}")]
    NumericError(String),
    /// An intentionally-unimplemented runtime selector value, e.g. the
    /// sparse DTMC engine stub.
    #[error("unsupported: {0}")]
    Unsupported(String),
}
