//! Runtime error type for the VM.
//!
//! Every variant is fatal: the VM renders the message through the host's
//! `fatal_error` callback and transitions to `Stopped`. The message text is
//! the user-visible wording, so changes here are player-facing.

/// A fatal VM runtime error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuntimeError {
    #[error("Unknown jump target {0:?}.")]
    UnknownJumpTarget(String),

    #[error("Unknown call target {0:?}.")]
    UnknownCallTarget(String),

    #[error("Unknown selection target {0:?}.")]
    UnknownSelectionTarget(String),

    #[error("Return with no calling passage.")]
    ReturnWithoutCall,

    #[error("Call stack overflow (limit {0}).")]
    CallStackOverflow(usize),

    #[error("Unknown function {0:?}.")]
    UnknownFunction(String),

    #[error("Function {name:?} expects {expected} argument(s), got {got}.")]
    WrongArgumentCount {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("Function {name:?} expects integer arguments.")]
    WrongArgumentType { name: String },

    #[error("Cannot compare {left} and {right}.")]
    MismatchedComparison {
        left: &'static str,
        right: &'static str,
    },

    #[error("Cannot order {left} and {right}.")]
    UnorderedComparison {
        left: &'static str,
        right: &'static str,
    },

    #[error("Division by zero.")]
    DivisionByZero,
}
