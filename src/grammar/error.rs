//! Grammar-construction error types.
//!
//! All of these are fatal during grammar construction; they carry the
//! offending name and a description of the rejected payload.

use thiserror::Error;

use crate::semantics::SemanticError;

#[derive(Debug, Error)]
pub enum GrammarError {
    #[error("ill-formed symbol `{name}`: {reason}")]
    IllFormedSymbol { name: String, reason: String },

    #[error("ill-formed rule on `{symbol}`: {reason}")]
    IllFormedRule { symbol: String, reason: String },

    #[error("ill-formed semantic `{name}`: {reason}")]
    IllFormedSemantic { name: String, reason: String },

    #[error("ill-formed entity category `{name}`: {reason}")]
    IllFormedEntityCategory { name: String, reason: String },

    #[error("duplicate symbol `{0}`")]
    DuplicateSymbol(String),

    #[error("duplicate rule on `{symbol}`: RHS {rhs:?}")]
    DuplicateRule { symbol: String, rhs: Vec<String> },

    #[error("duplicate semantic `{0}`")]
    DuplicateSemantic(String),

    #[error("duplicate entity `{text}` in category `{category}`")]
    DuplicateEntity { text: String, category: String },
}

impl GrammarError {
    /// Create an ill-formed-rule error.
    pub fn rule(symbol: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::IllFormedRule {
            symbol: symbol.into(),
            reason: reason.into(),
        }
    }

    /// Create an ill-formed-symbol error.
    pub fn symbol(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::IllFormedSymbol {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

impl From<SemanticError> for GrammarError {
    fn from(err: SemanticError) -> Self {
        match err {
            SemanticError::Duplicate(name) => GrammarError::DuplicateSemantic(name),
            SemanticError::IllFormed { name, reason } => {
                GrammarError::IllFormedSemantic { name, reason }
            }
        }
    }
}
