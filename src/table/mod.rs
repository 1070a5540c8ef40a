//! LALR(0) state-table construction over the augmented grammar.
//!
//! Every symbol is interned by (name, is-literal); items are dotted
//! rules; states are interned item-set kernels. Reductions carry the
//! rule's [`RuleProps`]; rules sharing an LHS and RHS merge into one
//! action whose props list is cost-ascending, so alternative insertions
//! stay one action wide.

mod build;
mod props;

pub use build::{StateTable, StateTableError};
pub use props::RuleProps;

use indexmap::IndexMap;
use smol_str::SmolStr;

/// Index of an interned symbol.
pub type SymId = usize;

/// Index of a state.
pub type StateId = usize;

/// What an interned symbol is to the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymKind {
    Nonterminal,
    /// A literal token or phrase matched against input n-grams.
    Literal,
    /// The integer placeholder; matched by numeric tokens.
    Integer,
    /// An entity-category placeholder; matched via the entity index.
    Entity,
}

/// An interned symbol and, for nonterminals, its productions.
#[derive(Debug, Clone)]
pub struct TableSymbol {
    pub name: SmolStr,
    pub kind: SymKind,
    /// Token count for literals; 1 otherwise.
    pub token_count: usize,
    pub rules: Vec<TableRule>,
}

/// A production in table form. `props` holds one entry per merged
/// grammar rule, sorted by ascending cost.
#[derive(Debug, Clone)]
pub struct TableRule {
    pub rhs: Vec<SymId>,
    pub is_terminal: bool,
    /// Reductions for this rule store their children in reversed match
    /// order.
    pub is_transposition: bool,
    pub props: Vec<RuleProps>,
}

/// A parser state: shift edges and reductions.
#[derive(Debug, Clone, Default)]
pub struct State {
    pub shifts: IndexMap<SymId, StateId>,
    pub reds: Vec<Reduction>,
    pub is_final: bool,
}

/// A reduce action. Props live on the referenced [`TableRule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reduction {
    pub lhs: SymId,
    pub rule: usize,
    pub binary: bool,
    pub is_terminal: bool,
    pub is_transposition: bool,
}
