//! Post-construction grammar diagnostics.
//!
//! None of these abort the build: unused declarations and rules that can
//! never obtain a reduced semantic are reported as warnings.

use rustc_hash::FxHashSet;
use smol_str::SmolStr;
use tracing::warn;

use super::Grammar;
use crate::semantics::SemNode;

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Severity {
    #[default]
    Error,
    Warning,
    Hint,
}

impl Severity {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Hint => "hint",
        }
    }
}

/// A build-time diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }
}

impl Grammar {
    /// Run the post-validation checks. Emits each finding through
    /// `tracing` and returns the full list.
    pub fn validate(&self) -> Vec<Diagnostic> {
        let mut diags = Vec::new();
        if self.start.is_none() {
            diags.push(Diagnostic::error("no start symbol declared"));
        }
        self.check_unused(&mut diags);
        self.check_missing_rhs_semantics(&mut diags);
        for diag in &diags {
            warn!(severity = diag.severity.as_str(), "{}", diag.message);
        }
        diags
    }

    fn check_unused(&self, diags: &mut Vec<Diagnostic>) {
        let mut used_syms: FxHashSet<&str> = FxHashSet::default();
        let mut used_semantics: FxHashSet<SmolStr> = FxHashSet::default();
        if let Some(start) = &self.start {
            used_syms.insert(start.name());
        }
        for nonterminal in self.nonterminals.values() {
            for rule in &nonterminal.rules {
                for sym in &rule.rhs {
                    used_syms.insert(sym.as_str());
                }
                for tree in rule.semantic.iter().chain(rule.inserted_semantic.iter()) {
                    collect_semantic_names(tree, &mut used_semantics);
                }
            }
        }
        for nonterminal in self.nonterminals.values() {
            if nonterminal.rules.is_empty() {
                diags.push(Diagnostic::warning(format!(
                    "unused symbol: `{}` has no rules",
                    nonterminal.name
                )));
            } else if !used_syms.contains(nonterminal.name.as_str()) {
                diags.push(Diagnostic::warning(format!(
                    "unused symbol: `{}` appears in no rule",
                    nonterminal.name
                )));
            }
        }
        for category in self.entities.categories() {
            if !used_syms.contains(category.as_str()) {
                diags.push(Diagnostic::warning(format!(
                    "unused entity category: `{category}` appears in no rule"
                )));
            }
        }
        for (name, _) in self.semantics.iter() {
            if !used_semantics.contains(name) {
                diags.push(Diagnostic::warning(format!(
                    "unused semantic: `{name}` appears in no rule"
                )));
            }
        }
    }

    /// A rule with an unreduced LHS semantic whose descent can never
    /// yield a reduced semantic will reject every parse it covers.
    fn check_missing_rhs_semantics(&self, diags: &mut Vec<Diagnostic>) {
        for nonterminal in self.nonterminals.values() {
            for rule in &nonterminal.rules {
                if rule.is_terminal || rule.semantic.is_none() || rule.semantic_is_rhs {
                    continue;
                }
                let mut seen = FxHashSet::default();
                let produces = rule
                    .rhs
                    .iter()
                    .any(|sym| self.can_produce_rhs_semantic(sym, &mut seen));
                if !produces {
                    diags.push(Diagnostic::warning(format!(
                        "missing needed RHS semantic: `{}` -> {:?} can never reduce its \
                         semantic",
                        nonterminal.name, rule.rhs
                    )));
                }
            }
        }
    }

    fn can_produce_rhs_semantic(&self, sym: &SmolStr, seen: &mut FxHashSet<SmolStr>) -> bool {
        if !seen.insert(sym.clone()) {
            return false;
        }
        let Some(nonterminal) = self.nonterminals.get(sym) else {
            // Placeholder terminals synthesize their own arguments.
            return sym.as_str() == super::INT_SYMBOL || self.entities.has_category(sym);
        };
        nonterminal.rules.iter().any(|rule| {
            if rule.semantic.is_some() && rule.semantic_is_rhs {
                return true;
            }
            if rule.inserted_semantic.is_some() {
                return true;
            }
            if rule.is_terminal {
                // Placeholder matches synthesize their own arguments.
                rule.is_placeholder
            } else {
                rule.rhs
                    .iter()
                    .any(|child| self.can_produce_rhs_semantic(child, seen))
            }
        })
    }
}

fn collect_semantic_names(tree: &crate::semantics::SemTree, out: &mut FxHashSet<SmolStr>) {
    for node in tree {
        match node {
            SemNode::Func { def, children } => {
                out.insert(def.name.clone());
                collect_semantic_names(children, out);
            }
            SemNode::Arg { def } => {
                out.insert(def.name.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::RuleOpts;

    #[test]
    fn test_unused_symbol_warned() {
        let mut g = Grammar::new();
        let start = g.nonterminal(&["start"]).unwrap();
        g.nonterminal(&["orphan"]).unwrap();
        g.add_rule(&start, RuleOpts::terminal("hello")).unwrap();
        g.set_start(&start);
        let diags = g.validate();
        assert!(diags
            .iter()
            .any(|d| d.message.contains("[orphan]") && d.severity == Severity::Warning));
    }

    #[test]
    fn test_missing_start_is_error() {
        let g = Grammar::new();
        let diags = g.validate();
        assert!(diags.iter().any(|d| d.severity.is_error()));
    }

    #[test]
    fn test_missing_rhs_semantic_detected() {
        let mut g = Grammar::new();
        let start = g.nonterminal(&["start"]).unwrap();
        let word = g.nonterminal(&["word"]).unwrap();
        g.add_rule(&word, RuleOpts::terminal("hello")).unwrap();
        g.semantic_fn("greeting", 0.5, 1, 1, false).unwrap();
        let open = g.lhs("greeting").unwrap();
        g.add_rule(&start, RuleOpts::unary(&word).with_semantic(open))
            .unwrap();
        g.set_start(&start);
        let diags = g.validate();
        assert!(diags
            .iter()
            .any(|d| d.message.contains("missing needed RHS semantic")));
    }

    #[test]
    fn test_reachable_rhs_semantic_not_warned() {
        let mut g = Grammar::new();
        let start = g.nonterminal(&["start"]).unwrap();
        let word = g.nonterminal(&["word"]).unwrap();
        g.semantic_arg("me", 0.0).unwrap();
        g.semantic_fn("greeting", 0.5, 1, 1, false).unwrap();
        let me = g.arg("me").unwrap();
        g.add_rule(&word, RuleOpts::terminal("hello").with_semantic(me))
            .unwrap();
        let open = g.lhs("greeting").unwrap();
        g.add_rule(&start, RuleOpts::unary(&word).with_semantic(open))
            .unwrap();
        g.set_start(&start);
        let diags = g.validate();
        assert!(!diags
            .iter()
            .any(|d| d.message.contains("missing needed RHS semantic")));
    }
}
