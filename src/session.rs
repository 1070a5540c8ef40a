//! The compile pipeline and parse sessions.

use tracing::info_span;

use crate::edits;
use crate::grammar::{Diagnostic, Grammar};
use crate::parse;
use crate::search::{self, ParseTree, SearchOptions};
use crate::table::{StateTable, StateTableError};

/// Outcome of parsing one query.
#[derive(Debug)]
pub enum ParseOutcome {
    /// The K cheapest unique trees, ascending by cost.
    Trees(Vec<ParseTree>),
    /// The input parsed but no semantically legal tree survived.
    NoLegalTrees,
    /// No parse spans the input.
    Unparsable,
}

impl ParseOutcome {
    pub fn trees(&self) -> &[ParseTree] {
        match self {
            ParseOutcome::Trees(trees) => trees,
            _ => &[],
        }
    }

    pub fn is_failure(&self) -> bool {
        !matches!(self, ParseOutcome::Trees(_))
    }
}

/// A compiled grammar ready to answer queries.
#[derive(Debug)]
pub struct Session {
    grammar: Grammar,
    table: StateTable,
    diagnostics: Vec<Diagnostic>,
}

/// Validate, augment with edit rules, and build the state table.
pub fn compile(mut grammar: Grammar) -> Result<Session, StateTableError> {
    let span = info_span!("compile");
    let _guard = span.enter();
    let diagnostics = grammar.validate();
    edits::generate_edit_rules(&mut grammar);
    let table = StateTable::build(&grammar)?;
    Ok(Session {
        grammar,
        table,
        diagnostics,
    })
}

impl Session {
    /// Parse a query and return the K best unique trees.
    pub fn parse(&self, query: &str, opts: &SearchOptions) -> ParseOutcome {
        let span = info_span!("parse", query);
        let _guard = span.enter();
        match parse::parse(&self.table, query) {
            Err(parse::Unparsable) => ParseOutcome::Unparsable,
            Ok(mut parsed) => {
                let trees = search::k_best(&mut parsed, &self.table, opts);
                if trees.is_empty() {
                    ParseOutcome::NoLegalTrees
                } else {
                    ParseOutcome::Trees(trees)
                }
            }
        }
    }

    /// The augmented grammar the session was compiled from.
    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn table(&self) -> &StateTable {
        &self.table
    }

    /// Diagnostics gathered during validation.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}
