//! Production rules and their authoring options.

use smol_str::SmolStr;

use super::{Sym, Text};
use crate::base::GramProps;
use crate::semantics::SemTree;

/// Right-hand side of an authored rule.
#[derive(Debug, Clone)]
pub enum Rhs {
    /// A terminal: a lowercase token or phrase, or a placeholder name
    /// (`<empty>`, `<int>`, `{category}`).
    Terminal(SmolStr),
    /// One or two nonterminal symbols.
    Syms(Vec<Sym>),
}

/// Options for [`crate::grammar::Grammar::add_rule`].
///
/// Constructed with [`RuleOpts::terminal`], [`RuleOpts::unary`], or
/// [`RuleOpts::binary`] and refined with the `with_*` builders.
#[derive(Debug, Clone)]
pub struct RuleOpts {
    pub(crate) rhs: Rhs,
    pub(crate) text: Option<Text>,
    pub(crate) semantic: Option<SemTree>,
    pub(crate) insertion_cost: Option<f64>,
    pub(crate) transposition_cost: Option<f64>,
    pub(crate) int_min: Option<i64>,
    pub(crate) int_max: Option<i64>,
    pub(crate) gram_props: GramProps,
}

impl RuleOpts {
    fn new(rhs: Rhs) -> Self {
        Self {
            rhs,
            text: None,
            semantic: None,
            insertion_cost: None,
            transposition_cost: None,
            int_min: None,
            int_max: None,
            gram_props: GramProps::default(),
        }
    }

    /// A terminal rule over a token, phrase, or placeholder name.
    pub fn terminal(token: &str) -> Self {
        Self::new(Rhs::Terminal(token.into()))
    }

    /// A terminal rule over a placeholder symbol (`<empty>`, `<int>`,
    /// an entity category).
    pub fn placeholder(sym: &Sym) -> Self {
        Self::new(Rhs::Terminal(sym.0.clone()))
    }

    /// A unary nonterminal rule.
    pub fn unary(sym: &Sym) -> Self {
        Self::new(Rhs::Syms(vec![sym.clone()]))
    }

    /// A binary nonterminal rule.
    pub fn binary(left: &Sym, right: &Sym) -> Self {
        Self::new(Rhs::Syms(vec![left.clone(), right.clone()]))
    }

    /// Override the display text. An empty string declares a stop-word:
    /// the terminal matches but emits nothing.
    pub fn with_text(mut self, text: Text) -> Self {
        self.text = Some(text);
        self
    }

    pub fn with_semantic(mut self, semantic: SemTree) -> Self {
        self.semantic = Some(semantic);
        self
    }

    /// Allow this terminal to be inserted when absent from the input,
    /// at the given extra cost.
    pub fn with_insertion_cost(mut self, cost: f64) -> Self {
        self.insertion_cost = Some(cost);
        self
    }

    /// Allow the two RHS branches to match in reverse order, at the
    /// given extra cost.
    pub fn with_transposition_cost(mut self, cost: f64) -> Self {
        self.transposition_cost = Some(cost);
        self
    }

    /// Bounds for the integer placeholder.
    pub fn with_int_bounds(mut self, min: i64, max: i64) -> Self {
        self.int_min = Some(min);
        self.int_max = Some(max);
        self
    }

    pub fn with_gram_props(mut self, props: GramProps) -> Self {
        self.gram_props = props;
        self
    }
}

/// A validated rule in the grammar.
#[derive(Debug, Clone)]
pub struct Rule {
    /// RHS symbol names: one terminal, or one or two nonterminals.
    pub rhs: Vec<SmolStr>,
    pub is_terminal: bool,
    /// True for `<int>` and entity-category terminals, which are never
    /// matched by literal input.
    pub is_placeholder: bool,
    pub cost: f64,
    pub text: Option<Text>,
    pub semantic: Option<SemTree>,
    /// True if `semantic` is already reduced.
    pub semantic_is_rhs: bool,
    /// Semantic contributed by an elided branch (edit rules only).
    pub inserted_semantic: Option<SemTree>,
    /// Which branch of the original rule was inserted (edit rules only).
    pub insertion_idx: Option<u8>,
    pub gram_props: GramProps,
    pub insertion_cost: Option<f64>,
    pub transposition_cost: Option<f64>,
    /// True for rules synthesized with reversed RHS.
    pub is_transposition: bool,
    pub int_min: Option<i64>,
    pub int_max: Option<i64>,
}

impl Rule {
    /// Structural identity used for duplicate detection: RHS names in
    /// order plus terminal-ness.
    pub fn same_shape(&self, other: &Rule) -> bool {
        self.is_terminal == other.is_terminal && self.rhs == other.rhs
    }

    pub fn is_binary(&self) -> bool {
        !self.is_terminal && self.rhs.len() == 2
    }
}
