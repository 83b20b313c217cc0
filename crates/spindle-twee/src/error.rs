//! Compile-time error type for the Twee frontend.
//!
//! Every variant carries enough context to point at the offending source
//! position: passage name plus 1-based file line and column. Compile errors
//! are load-time failures and are never recovered from.

/// An error raised while compiling Twee source into a story.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    #[error("{passage}:{line}:{column}: expected {expected}, found {found}")]
    UnexpectedToken {
        expected: String,
        found: String,
        passage: String,
        line: usize,
        column: usize,
    },

    #[error("{passage}:{line}:{column}: <<if>> without matching <<endif>>")]
    UnclosedIf {
        passage: String,
        line: usize,
        column: usize,
    },

    #[error("{passage}:{line}:{column}: <<endif>> without <<if>>")]
    StrayEndif {
        passage: String,
        line: usize,
        column: usize,
    },

    #[error("{passage}:{line}:{column}: unknown command {name:?}")]
    UnknownCommand {
        name: String,
        passage: String,
        line: usize,
        column: usize,
    },

    #[error("{passage}:{line}:{column}: unknown special {name:?}")]
    UnknownSpecial {
        name: String,
        passage: String,
        line: usize,
        column: usize,
    },

    #[error("{passage}:{line}:{column}: unterminated string")]
    UnterminatedString {
        passage: String,
        line: usize,
        column: usize,
    },

    #[error("duplicate passage {0:?}")]
    DuplicatePassage(String),

    #[error("story has no \"Start\" passage")]
    MissingStart,
}
