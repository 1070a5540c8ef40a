//! Compiled-grammar JSON interchange.
//!
//! The file carries the full (augmented) grammar: symbol-to-rules map,
//! semantic declarations, and entity instances. Loading re-interns
//! semantics and entities so descriptor-identity invariants hold after a
//! round trip; rebuilding the state table from a reloaded grammar yields
//! the same shifts and reductions.

mod model;

pub use model::GrammarFile;

use std::path::Path;

use thiserror::Error;

use crate::grammar::Grammar;

/// Errors that can occur during grammar interchange.
#[derive(Debug, Error)]
pub enum InterchangeError {
    /// IO error during read/write.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Rule references a semantic the file does not declare.
    #[error("unknown semantic `{0}`")]
    UnknownSemantic(String),

    /// Declared start symbol has no entry in the grammar map.
    #[error("unknown start symbol `{0}`")]
    UnknownStartSymbol(String),
}

/// Serialize a grammar to a JSON string.
pub fn to_json(grammar: &Grammar) -> Result<String, InterchangeError> {
    let file = GrammarFile::from_grammar(grammar);
    Ok(serde_json::to_string_pretty(&file)?)
}

/// Reconstruct a grammar from a JSON string.
pub fn from_json(json: &str) -> Result<Grammar, InterchangeError> {
    let file: GrammarFile = serde_json::from_str(json)?;
    file.into_grammar()
}

/// Write a grammar to a file.
pub fn save(grammar: &Grammar, path: &Path) -> Result<(), InterchangeError> {
    std::fs::write(path, to_json(grammar)?)?;
    Ok(())
}

/// Load a grammar from a file.
pub fn load(path: &Path) -> Result<Grammar, InterchangeError> {
    let json = std::fs::read_to_string(path)?;
    from_json(&json)
}
