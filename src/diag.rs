//! `Diag` is the single error/diagnostic type threaded through every
//! fallible operation in this crate: S-expression parsing, rule lookup,
//! proof verification, and TPTP serialization. Kept dependency-free (no
//! `thiserror`/`anyhow`): every variant is a plain struct-like enum case
//! with a hand-written `Display` impl.

use std::fmt;

/// A single diagnosable failure, tagged by where in the pipeline it
/// originated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Diag {
    /// Malformed S-expression surface syntax: unbalanced parens, an empty
    /// input, an unterminated quoted atom, and the like.
    Syntax { message: String, line: usize, column: usize },
    /// A justification name that doesn't match any of the eleven rules.
    UnknownRule { name: String },
    /// A proof node failed every attempted premise ordering for its rule.
    Verification { message: String },
    /// An operation that requires a restricted fragment (e.g. TPTP export
    /// requires first-order) was given a formula outside it.
    Domain { message: String },
}

impl Diag {
    #[must_use]
    pub fn syntax(message: impl Into<String>, line: usize, column: usize) -> Self {
        Diag::Syntax { message: message.into(), line, column }
    }

    #[must_use]
    pub fn unknown_rule(name: impl Into<String>) -> Self {
        Diag::UnknownRule { name: name.into() }
    }

    #[must_use]
    pub fn verification(message: impl Into<String>) -> Self {
        Diag::Verification { message: message.into() }
    }

    #[must_use]
    pub fn domain(message: impl Into<String>) -> Self {
        Diag::Domain { message: message.into() }
    }
}

impl fmt::Display for Diag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diag::Syntax { message, line, column } => {
                write!(f, "syntax error at {line}:{column}: {message}")
            }
            Diag::UnknownRule { name } => write!(f, "unknown justification rule: {name}"),
            Diag::Verification { message } => write!(f, "verification failed: {message}"),
            Diag::Domain { message } => write!(f, "domain error: {message}"),
        }
    }
}

impl std::error::Error for Diag {}
