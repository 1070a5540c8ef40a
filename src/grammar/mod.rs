//! Grammar model: symbols, rules, entities, display text, validation.
//!
//! A [`Grammar`] is built declaratively: nonterminal symbols own ordered
//! rule sequences; terminal symbols are plain lowercase tokens or
//! phrases; placeholder terminals (`<int>`, entity categories) are never
//! matched by literal input; `<empty>` matches the empty string.
//! Validation happens at construction; post-validation reachability
//! checks produce non-fatal diagnostics.

mod entity;
mod error;
mod rule;
mod text;
mod validate;

pub use entity::{Entity, EntityIndex};
pub use error::GrammarError;
pub use rule::{Rhs, Rule, RuleOpts};
pub use text::{coalesce, InflectionTable, Text, TextPiece};
pub use validate::{Diagnostic, Severity};

use std::fmt;

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::semantics::{is_rhs, sum_costs, SemTree, SemanticRef, SemanticRegistry};

/// The empty-string symbol.
pub const EMPTY_SYMBOL: &str = "<empty>";

/// The integer placeholder symbol.
pub const INT_SYMBOL: &str = "<int>";

/// Characters reserved for symbol-name syntax.
pub const RESERVED_CHARS: [char; 8] = ['[', ']', '{', '}', '<', '>', '(', ')'];

/// Tie-breaking increment: earlier-declared rules are marginally
/// cheaper.
pub(crate) const RULE_TIE_COST: f64 = 1e-7;

/// Handle to a symbol usable in rule right-hand sides.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sym(pub(crate) SmolStr);

impl Sym {
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sym {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A nonterminal symbol and its ordered rules.
#[derive(Debug, Clone)]
pub struct Nonterminal {
    pub name: SmolStr,
    pub rules: Vec<Rule>,
}

/// A declarative grammar under construction.
#[derive(Debug, Default)]
pub struct Grammar {
    pub(crate) nonterminals: IndexMap<SmolStr, Nonterminal>,
    pub(crate) semantics: SemanticRegistry,
    pub(crate) entities: EntityIndex,
    pub(crate) start: Option<Sym>,
}

impl Grammar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a nonterminal. The name is the hyphen-joined lowercase of
    /// the arguments, wrapped in brackets.
    pub fn nonterminal(&mut self, parts: &[&str]) -> Result<Sym, GrammarError> {
        if parts.is_empty() {
            return Err(GrammarError::symbol("[]", "symbol name has no parts"));
        }
        for part in parts {
            if part.is_empty() {
                return Err(GrammarError::symbol(parts.join("-"), "empty name part"));
            }
            if part.contains(RESERVED_CHARS) {
                return Err(GrammarError::symbol(
                    *part,
                    "name contains a reserved character",
                ));
            }
        }
        let name: SmolStr = format!("[{}]", parts.join("-").to_lowercase()).into();
        self.intern_nonterminal(name)
    }

    fn intern_nonterminal(&mut self, name: SmolStr) -> Result<Sym, GrammarError> {
        if self.nonterminals.contains_key(&name) {
            return Err(GrammarError::DuplicateSymbol(name.to_string()));
        }
        self.nonterminals.insert(
            name.clone(),
            Nonterminal {
                name: name.clone(),
                rules: Vec::new(),
            },
        );
        Ok(Sym(name))
    }

    /// The `<empty>` symbol.
    pub fn empty_sym(&self) -> Sym {
        Sym(EMPTY_SYMBOL.into())
    }

    /// The `<int>` placeholder symbol.
    pub fn int_sym(&self) -> Sym {
        Sym(INT_SYMBOL.into())
    }

    /// Declare the start symbol.
    pub fn set_start(&mut self, sym: &Sym) {
        self.start = Some(sym.clone());
    }

    pub fn start(&self) -> Option<&Sym> {
        self.start.as_ref()
    }

    /// Declare a semantic function.
    pub fn semantic_fn(
        &mut self,
        name: &str,
        cost: f64,
        min_params: usize,
        max_params: usize,
        forbids_multiple: bool,
    ) -> Result<SemanticRef, GrammarError> {
        Ok(self
            .semantics
            .function(name, cost, min_params, max_params, forbids_multiple)?)
    }

    /// Declare a semantic argument.
    pub fn semantic_arg(&mut self, name: &str, cost: f64) -> Result<SemanticRef, GrammarError> {
        Ok(self.semantics.argument(name, cost)?)
    }

    /// Declare an entity category; returns its placeholder symbol.
    pub fn entity_category(
        &mut self,
        name: &str,
        instances: &[&str],
    ) -> Result<Sym, GrammarError> {
        if name.contains(RESERVED_CHARS) {
            return Err(GrammarError::IllFormedEntityCategory {
                name: name.to_string(),
                reason: "name contains a reserved character".to_string(),
            });
        }
        let category: SmolStr = format!("{{{}}}", name.to_lowercase()).into();
        self.entities.add_category(&category, instances)?;
        Ok(Sym(category))
    }

    /// Append a validated rule to `lhs`.
    pub fn add_rule(&mut self, lhs: &Sym, opts: RuleOpts) -> Result<(), GrammarError> {
        let rule = self.check_rule(lhs, opts)?;
        let Some(nonterminal) = self.nonterminals.get_mut(&lhs.0) else {
            return Err(GrammarError::rule(lhs.0.as_str(), "unknown LHS symbol"));
        };
        if nonterminal.rules.iter().any(|r| r.same_shape(&rule)) {
            return Err(GrammarError::DuplicateRule {
                symbol: lhs.0.to_string(),
                rhs: rule.rhs.iter().map(|s| s.to_string()).collect(),
            });
        }
        nonterminal.rules.push(rule);
        Ok(())
    }

    fn check_rule(&mut self, lhs: &Sym, opts: RuleOpts) -> Result<Rule, GrammarError> {
        let Some(nonterminal) = self.nonterminals.get(&lhs.0) else {
            return Err(GrammarError::rule(lhs.0.as_str(), "unknown LHS symbol"));
        };
        let tie_cost = nonterminal.rules.len() as f64 * RULE_TIE_COST;
        let semantic_cost = opts.semantic.as_ref().map(|s| sum_costs(s)).unwrap_or(0.0);
        let semantic_is_rhs = opts.semantic.as_ref().map(is_rhs).unwrap_or(false);

        match &opts.rhs {
            Rhs::Terminal(token) => {
                let is_int = token.as_str() == INT_SYMBOL;
                let is_empty = token.as_str() == EMPTY_SYMBOL;
                let is_entity = self.entities.has_category(token);
                let is_placeholder = is_int || is_entity;
                if !is_placeholder && !is_empty {
                    self.check_terminal_token(lhs, token)?;
                }
                if opts.text.is_some() && (is_placeholder || is_empty) {
                    return Err(GrammarError::rule(
                        lhs.0.as_str(),
                        "predefined text on an empty, integer, or entity terminal",
                    ));
                }
                if opts.transposition_cost.is_some() {
                    return Err(GrammarError::rule(
                        lhs.0.as_str(),
                        "transposition cost on a non-binary rule",
                    ));
                }
                if (opts.int_min.is_some() || opts.int_max.is_some()) && !is_int {
                    return Err(GrammarError::rule(
                        lhs.0.as_str(),
                        "integer bounds on a non-integer terminal",
                    ));
                }
                if opts.insertion_cost.is_some() && (is_placeholder || is_empty) {
                    return Err(GrammarError::rule(
                        lhs.0.as_str(),
                        "insertion cost on an empty or placeholder terminal",
                    ));
                }
                if let Some(semantic) = &opts.semantic {
                    if !is_rhs(semantic) && !is_placeholder {
                        return Err(GrammarError::rule(
                            lhs.0.as_str(),
                            "unreduced semantic on a terminal rule whose RHS is neither \
                             the integer symbol nor an entity category",
                        ));
                    }
                }
                let text = if is_placeholder || is_empty {
                    None
                } else {
                    match opts.text {
                        None => Some(Text::Str(token.clone())),
                        Some(Text::Str(s)) if s.is_empty() => None,
                        other => other,
                    }
                };
                Ok(Rule {
                    rhs: vec![token.clone()],
                    is_terminal: true,
                    is_placeholder,
                    cost: tie_cost + semantic_cost,
                    text,
                    semantic: opts.semantic,
                    semantic_is_rhs,
                    inserted_semantic: None,
                    insertion_idx: None,
                    gram_props: opts.gram_props,
                    insertion_cost: opts.insertion_cost,
                    transposition_cost: None,
                    is_transposition: false,
                    int_min: opts.int_min,
                    int_max: opts.int_max,
                })
            }
            Rhs::Syms(syms) => {
                if syms.is_empty() || syms.len() > 2 {
                    return Err(GrammarError::rule(
                        lhs.0.as_str(),
                        format!("nonterminal RHS of size {} (must be 1 or 2)", syms.len()),
                    ));
                }
                for sym in syms {
                    if !self.nonterminals.contains_key(&sym.0) {
                        return Err(GrammarError::rule(
                            lhs.0.as_str(),
                            format!("unknown RHS symbol `{}`", sym.0),
                        ));
                    }
                }
                if opts.transposition_cost.is_some() && syms.len() != 2 {
                    return Err(GrammarError::rule(
                        lhs.0.as_str(),
                        "transposition cost on a non-binary rule",
                    ));
                }
                if opts.int_min.is_some() || opts.int_max.is_some() {
                    return Err(GrammarError::rule(
                        lhs.0.as_str(),
                        "integer bounds on a non-integer symbol",
                    ));
                }
                if opts.insertion_cost.is_some() {
                    return Err(GrammarError::rule(
                        lhs.0.as_str(),
                        "insertion cost on a nonterminal rule",
                    ));
                }
                if opts.text.is_some() {
                    return Err(GrammarError::rule(
                        lhs.0.as_str(),
                        "predefined text on a nonterminal rule",
                    ));
                }
                Ok(Rule {
                    rhs: syms.iter().map(|s| s.0.clone()).collect(),
                    is_terminal: false,
                    is_placeholder: false,
                    cost: tie_cost + semantic_cost,
                    text: None,
                    semantic: opts.semantic,
                    semantic_is_rhs,
                    inserted_semantic: None,
                    insertion_idx: None,
                    gram_props: opts.gram_props,
                    insertion_cost: None,
                    transposition_cost: opts.transposition_cost,
                    is_transposition: false,
                    int_min: None,
                    int_max: None,
                })
            }
        }
    }

    fn check_terminal_token(&self, lhs: &Sym, token: &str) -> Result<(), GrammarError> {
        if token.is_empty() {
            return Err(GrammarError::rule(lhs.0.as_str(), "empty terminal token"));
        }
        if token.contains(RESERVED_CHARS) {
            return Err(GrammarError::rule(
                lhs.0.as_str(),
                format!("terminal `{token}` contains a reserved character"),
            ));
        }
        if token.contains("  ") {
            return Err(GrammarError::rule(
                lhs.0.as_str(),
                format!("terminal `{token}` contains consecutive spaces"),
            ));
        }
        if token != token.to_lowercase() {
            return Err(GrammarError::rule(
                lhs.0.as_str(),
                format!("terminal `{token}` is not lowercase"),
            ));
        }
        Ok(())
    }

    /// Synthesize a fresh nonterminal carrying a single binary rule; its
    /// name is the concatenation of the two RHS symbol names. Chaining
    /// calls synthesizes nested pairs.
    pub fn binary_rule(&mut self, opts: RuleOpts) -> Result<Sym, GrammarError> {
        let Rhs::Syms(syms) = &opts.rhs else {
            return Err(GrammarError::rule(
                "[binary]",
                "binary_rule requires a two-symbol RHS",
            ));
        };
        if syms.len() != 2 {
            return Err(GrammarError::rule(
                "[binary]",
                format!("binary_rule RHS of size {}", syms.len()),
            ));
        }
        let name: SmolStr = format!(
            "[{}+{}]",
            strip_brackets(&syms[0].0),
            strip_brackets(&syms[1].0)
        )
        .into();
        let sym = self.intern_nonterminal(name)?;
        self.add_rule(&sym, opts)?;
        Ok(sym)
    }

    /// Append a rule synthesized by the edit-rule generator, bypassing
    /// authoring validation.
    pub(crate) fn push_rule_unchecked(&mut self, lhs: &SmolStr, rule: Rule) {
        if let Some(nonterminal) = self.nonterminals.get_mut(lhs) {
            nonterminal.rules.push(rule);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Nonterminal> {
        self.nonterminals.get(name)
    }

    /// Nonterminals in declaration order.
    pub fn nonterminals(&self) -> impl Iterator<Item = &Nonterminal> {
        self.nonterminals.values()
    }

    pub fn semantics(&self) -> &SemanticRegistry {
        &self.semantics
    }

    pub fn entities(&self) -> &EntityIndex {
        &self.entities
    }

    /// Build a semantic tree holding a single unapplied function.
    pub fn lhs(&self, name: &str) -> Option<SemTree> {
        let def = self.semantics.get(name)?;
        Some(vec![crate::semantics::SemNode::func(std::sync::Arc::clone(
            def,
        ))])
    }

    /// Build a semantic tree holding a single argument leaf.
    pub fn arg(&self, name: &str) -> Option<SemTree> {
        let def = self.semantics.get(name)?;
        Some(vec![crate::semantics::SemNode::arg(std::sync::Arc::clone(
            def,
        ))])
    }
}

fn strip_brackets(name: &str) -> &str {
    name.strip_prefix('[')
        .and_then(|n| n.strip_suffix(']'))
        .unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nonterminal_naming() {
        let mut g = Grammar::new();
        let sym = g.nonterminal(&["Repos", "Liked"]).unwrap();
        assert_eq!(sym.name(), "[repos-liked]");
    }

    #[test]
    fn test_duplicate_symbol_rejected() {
        let mut g = Grammar::new();
        g.nonterminal(&["repos"]).unwrap();
        assert!(matches!(
            g.nonterminal(&["repos"]),
            Err(GrammarError::DuplicateSymbol(_))
        ));
    }

    #[test]
    fn test_reserved_characters_rejected() {
        let mut g = Grammar::new();
        assert!(g.nonterminal(&["re[pos"]).is_err());
    }

    #[test]
    fn test_rule_tie_costs_increase() {
        let mut g = Grammar::new();
        let sym = g.nonterminal(&["repos"]).unwrap();
        g.add_rule(&sym, RuleOpts::terminal("repos")).unwrap();
        g.add_rule(&sym, RuleOpts::terminal("repositories")).unwrap();
        let rules = &g.get("[repos]").unwrap().rules;
        assert!(rules[0].cost < rules[1].cost);
    }

    #[test]
    fn test_duplicate_rule_rejected() {
        let mut g = Grammar::new();
        let sym = g.nonterminal(&["repos"]).unwrap();
        g.add_rule(&sym, RuleOpts::terminal("repos")).unwrap();
        assert!(matches!(
            g.add_rule(&sym, RuleOpts::terminal("repos")),
            Err(GrammarError::DuplicateRule { .. })
        ));
    }

    #[test]
    fn test_ternary_rhs_rejected() {
        let mut g = Grammar::new();
        let a = g.nonterminal(&["a"]).unwrap();
        let b = g.nonterminal(&["b"]).unwrap();
        let c = g.nonterminal(&["c"]).unwrap();
        let lhs = g.nonterminal(&["lhs"]).unwrap();
        let opts = RuleOpts {
            rhs: Rhs::Syms(vec![a, b, c]),
            ..RuleOpts::terminal("x")
        };
        assert!(g.add_rule(&lhs, opts).is_err());
    }

    #[test]
    fn test_transposition_requires_binary() {
        let mut g = Grammar::new();
        let a = g.nonterminal(&["a"]).unwrap();
        let lhs = g.nonterminal(&["lhs"]).unwrap();
        g.add_rule(&a, RuleOpts::terminal("a")).unwrap();
        assert!(g
            .add_rule(&lhs, RuleOpts::unary(&a).with_transposition_cost(1.0))
            .is_err());
    }

    #[test]
    fn test_int_bounds_require_int_symbol() {
        let mut g = Grammar::new();
        let lhs = g.nonterminal(&["count"]).unwrap();
        assert!(g
            .add_rule(&lhs, RuleOpts::terminal("five").with_int_bounds(0, 9))
            .is_err());
        let int = g.int_sym();
        assert!(g
            .add_rule(&lhs, RuleOpts::placeholder(&int).with_int_bounds(0, 9))
            .is_ok());
    }

    #[test]
    fn test_unreduced_semantic_needs_placeholder() {
        let mut g = Grammar::new();
        let lhs = g.nonterminal(&["liked"]).unwrap();
        g.semantic_fn("repos-liked", 0.5, 1, 1, false).unwrap();
        let open = g.lhs("repos-liked").unwrap();
        assert!(g
            .add_rule(&lhs, RuleOpts::terminal("liked").with_semantic(open.clone()))
            .is_err());
        let int = g.int_sym();
        assert!(g
            .add_rule(&lhs, RuleOpts::placeholder(&int).with_semantic(open))
            .is_ok());
    }

    #[test]
    fn test_stop_word_text_elided() {
        let mut g = Grammar::new();
        let lhs = g.nonterminal(&["show"]).unwrap();
        g.add_rule(&lhs, RuleOpts::terminal("show me").with_text(Text::str("")))
            .unwrap();
        assert!(g.get("[show]").unwrap().rules[0].text.is_none());
    }

    #[test]
    fn test_binary_rule_synthesizes_name() {
        let mut g = Grammar::new();
        let a = g.nonterminal(&["who"]).unwrap();
        let b = g.nonterminal(&["follow"]).unwrap();
        let pair = g.binary_rule(RuleOpts::binary(&a, &b)).unwrap();
        assert_eq!(pair.name(), "[who+follow]");
        assert_eq!(g.get("[who+follow]").unwrap().rules.len(), 1);
    }
}
