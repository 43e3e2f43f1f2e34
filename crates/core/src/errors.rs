use thiserror::Error;

/// Caller-contract violations, rejected before the request reaches the
/// admission pipeline. Everything past validation resolves to a plain answer
/// string; these are the only errors the ask entry point surfaces.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("principal must not be empty")]
    EmptyPrincipal,
    #[error("question must not be empty")]
    EmptyQuestion,
    #[error("unrecognized answer mode `{0}` (expected SIMPLE|VERBOSE)")]
    UnknownMode(String),
}
