//! State construction: symbol interning, items, closure, GOTO.

use std::fmt::Write as _;

use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;
use thiserror::Error;
use tracing::debug;

use super::{Reduction, RuleProps, State, StateId, SymId, SymKind, TableRule, TableSymbol};
use crate::base::cmp_cost;
use crate::grammar::{EntityIndex, Grammar, INT_SYMBOL};

#[derive(Debug, Error)]
pub enum StateTableError {
    #[error("grammar has no start symbol")]
    MissingStart,
    #[error("start symbol `{0}` has no rules")]
    EmptyStart(String),
}

/// Sentinel LHS for the start item.
const START_LHS: usize = usize::MAX;

/// A dotted rule. `lhs == START_LHS` denotes the start item, whose RHS
/// is the start symbol alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct Item {
    lhs: usize,
    rule: u32,
    dot: u8,
}

/// The compiled shift/reduce automaton plus the runtime lexicon.
#[derive(Debug)]
pub struct StateTable {
    pub symbols: Vec<TableSymbol>,
    ids: FxHashMap<(SmolStr, bool), SymId>,
    pub states: Vec<State>,
    pub start_sym: SymId,
    pub int_sym: Option<SymId>,
    pub entities: EntityIndex,
    /// Longest literal in tokens; bounds the matcher's n-grams.
    pub max_literal_tokens: usize,
}

impl StateTable {
    /// Build the automaton from an augmented grammar.
    pub fn build(grammar: &Grammar) -> Result<Self, StateTableError> {
        let start = grammar.start().ok_or(StateTableError::MissingStart)?;
        let mut builder = Builder::default();

        // Intern nonterminals first so rule RHS resolution can assume
        // their presence.
        for nonterminal in grammar.nonterminals() {
            builder.intern(nonterminal.name.clone(), false, SymKind::Nonterminal, 1);
        }
        for nonterminal in grammar.nonterminals() {
            let lhs = builder.ids[&(nonterminal.name.clone(), false)];
            for rule in &nonterminal.rules {
                let (rhs, is_terminal) = builder.intern_rhs(grammar, rule);
                builder.push_rule(lhs, rhs, is_terminal, rule);
            }
        }
        for symbol in &mut builder.symbols {
            for rule in &mut symbol.rules {
                rule.props.sort_by(|a, b| cmp_cost(a.cost, b.cost));
            }
        }

        let start_sym = *builder
            .ids
            .get(&(SmolStr::from(start.name()), false))
            .ok_or(StateTableError::MissingStart)?;
        if builder.symbols[start_sym].rules.is_empty() {
            return Err(StateTableError::EmptyStart(start.name().to_string()));
        }

        let states = builder.build_states(start_sym);
        let max_literal_tokens = builder
            .symbols
            .iter()
            .filter(|s| s.kind == SymKind::Literal)
            .map(|s| s.token_count)
            .max()
            .unwrap_or(0);
        debug!(
            symbols = builder.symbols.len(),
            states = states.len(),
            "state table built"
        );
        let int_sym = builder
            .ids
            .get(&(SmolStr::from(INT_SYMBOL), false))
            .copied();
        Ok(StateTable {
            symbols: builder.symbols,
            ids: builder.ids,
            states,
            start_sym,
            int_sym,
            entities: grammar.entities().clone(),
            max_literal_tokens,
        })
    }

    /// Interned id for a literal token or phrase.
    pub fn literal(&self, text: &str) -> Option<SymId> {
        self.ids.get(&(SmolStr::from(text), true)).copied()
    }

    /// Interned id for a named symbol (nonterminal or placeholder).
    pub fn symbol(&self, name: &str) -> Option<SymId> {
        self.ids.get(&(SmolStr::from(name), false)).copied()
    }

    /// Props list for a reduction.
    pub fn props(&self, red: &Reduction) -> &[RuleProps] {
        &self.symbols[red.lhs].rules[red.rule].props
    }

    /// Human-readable shift/reduction listing for debugging.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (index, state) in self.states.iter().enumerate() {
            let marker = if state.is_final { " (final)" } else { "" };
            let _ = writeln!(out, "state {index}{marker}");
            for (sym, target) in &state.shifts {
                let _ = writeln!(out, "  {} => shift {target}", self.symbols[*sym].name);
            }
            for red in &state.reds {
                let arity = if red.binary { "binary" } else { "unary" };
                let _ = writeln!(
                    out,
                    "  reduce {} ({arity}, {} props)",
                    self.symbols[red.lhs].name,
                    self.props(red).len()
                );
            }
        }
        out
    }
}

#[derive(Default)]
struct Builder {
    symbols: Vec<TableSymbol>,
    ids: FxHashMap<(SmolStr, bool), SymId>,
}

impl Builder {
    fn intern(&mut self, name: SmolStr, is_literal: bool, kind: SymKind, token_count: usize) -> SymId {
        if let Some(&id) = self.ids.get(&(name.clone(), is_literal)) {
            return id;
        }
        let id = self.symbols.len();
        self.symbols.push(TableSymbol {
            name: name.clone(),
            kind,
            token_count,
            rules: Vec::new(),
        });
        self.ids.insert((name, is_literal), id);
        id
    }

    fn intern_rhs(&mut self, grammar: &Grammar, rule: &crate::grammar::Rule) -> (Vec<SymId>, bool) {
        if rule.is_terminal {
            let token = &rule.rhs[0];
            let id = if token.as_str() == INT_SYMBOL {
                self.intern(token.clone(), false, SymKind::Integer, 1)
            } else if grammar.entities().has_category(token) {
                self.intern(token.clone(), false, SymKind::Entity, 1)
            } else {
                let count = token.split(' ').count();
                self.intern(token.clone(), true, SymKind::Literal, count)
            };
            (vec![id], true)
        } else {
            let rhs = rule
                .rhs
                .iter()
                .map(|sym| self.ids[&(sym.clone(), false)])
                .collect();
            (rhs, false)
        }
    }

    /// Append a rule, merging with an existing structurally identical
    /// rule by extending its props list.
    fn push_rule(
        &mut self,
        lhs: SymId,
        rhs: Vec<SymId>,
        is_terminal: bool,
        rule: &crate::grammar::Rule,
    ) {
        let props = RuleProps::from_rule(rule);
        let rules = &mut self.symbols[lhs].rules;
        if let Some(index) = rules.iter().position(|r| {
            r.rhs == rhs
                && r.is_terminal == is_terminal
                && r.is_transposition == rule.is_transposition
        }) {
            rules[index].props.push(props);
            return;
        }
        rules.push(TableRule {
            rhs,
            is_terminal,
            is_transposition: rule.is_transposition,
            props: vec![props],
        });
    }

    fn item_rhs<'a>(&'a self, item: &Item, start_rhs: &'a [SymId]) -> &'a [SymId] {
        if item.lhs == START_LHS {
            start_rhs
        } else {
            &self.symbols[item.lhs].rules[item.rule as usize].rhs
        }
    }

    fn build_states(&self, start_sym: SymId) -> Vec<State> {
        let start_rhs = [start_sym];
        let start_item = Item {
            lhs: START_LHS,
            rule: 0,
            dot: 0,
        };

        let mut states: Vec<State> = Vec::new();
        let mut kernels: Vec<Vec<Item>> = Vec::new();
        let mut interned: FxHashMap<Vec<Item>, StateId> = FxHashMap::default();

        let kernel0 = vec![start_item];
        interned.insert(kernel0.clone(), 0);
        kernels.push(kernel0);
        states.push(State::default());

        let mut next = 0;
        while next < kernels.len() {
            let kernel = kernels[next].clone();
            let closure = self.closure(&kernel, &start_rhs);

            let mut state = State::default();
            let mut partitions: IndexMap<SymId, Vec<Item>> = IndexMap::new();
            for item in &closure {
                let rhs = self.item_rhs(item, &start_rhs);
                if (item.dot as usize) < rhs.len() {
                    let sym = rhs[item.dot as usize];
                    let mut advanced = *item;
                    advanced.dot += 1;
                    partitions.entry(sym).or_default().push(advanced);
                } else if item.lhs == START_LHS {
                    state.is_final = true;
                } else {
                    let rule = &self.symbols[item.lhs].rules[item.rule as usize];
                    state.reds.push(Reduction {
                        lhs: item.lhs,
                        rule: item.rule as usize,
                        binary: rhs.len() == 2,
                        is_terminal: rule.is_terminal,
                        is_transposition: rule.is_transposition,
                    });
                }
            }

            for (sym, mut kernel) in partitions {
                kernel.sort();
                kernel.dedup();
                let target = match interned.get(&kernel) {
                    Some(&id) => id,
                    None => {
                        let id = kernels.len();
                        interned.insert(kernel.clone(), id);
                        kernels.push(kernel);
                        states.push(State::default());
                        id
                    }
                };
                state.shifts.insert(sym, target);
            }

            states[next] = state;
            next += 1;
        }
        states
    }

    /// LR(0) closure: expand every nonterminal after a dot.
    fn closure(&self, kernel: &[Item], start_rhs: &[SymId]) -> Vec<Item> {
        let mut seen: FxHashSet<Item> = kernel.iter().copied().collect();
        let mut worklist: Vec<Item> = kernel.to_vec();
        while let Some(item) = worklist.pop() {
            let rhs = self.item_rhs(&item, start_rhs);
            if (item.dot as usize) >= rhs.len() {
                continue;
            }
            let sym = rhs[item.dot as usize];
            if self.symbols[sym].kind != SymKind::Nonterminal {
                continue;
            }
            for rule in 0..self.symbols[sym].rules.len() {
                let expansion = Item {
                    lhs: sym,
                    rule: rule as u32,
                    dot: 0,
                };
                if seen.insert(expansion) {
                    worklist.push(expansion);
                }
            }
        }
        let mut items: Vec<Item> = seen.into_iter().collect();
        items.sort();
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::RuleOpts;

    fn toy_grammar() -> Grammar {
        let mut g = Grammar::new();
        let word = g.nonterminal(&["word"]).unwrap();
        let tail = g.nonterminal(&["tail"]).unwrap();
        let start = g.nonterminal(&["start"]).unwrap();
        g.add_rule(&word, RuleOpts::terminal("hello")).unwrap();
        g.add_rule(&tail, RuleOpts::terminal("world")).unwrap();
        g.add_rule(&start, RuleOpts::binary(&word, &tail)).unwrap();
        g.set_start(&start);
        g
    }

    #[test]
    fn test_build_produces_final_state() {
        let table = StateTable::build(&toy_grammar()).unwrap();
        assert!(table.states.iter().any(|s| s.is_final));
    }

    #[test]
    fn test_literal_interning_tracks_token_count() {
        let mut g = Grammar::new();
        let phrase = g.nonterminal(&["phrase"]).unwrap();
        let start = g.nonterminal(&["start"]).unwrap();
        g.add_rule(&phrase, RuleOpts::terminal("liked by")).unwrap();
        g.add_rule(&start, RuleOpts::unary(&phrase)).unwrap();
        g.set_start(&start);
        let table = StateTable::build(&g).unwrap();
        let id = table.literal("liked by").unwrap();
        assert_eq!(table.symbols[id].token_count, 2);
        assert_eq!(table.max_literal_tokens, 2);
    }

    #[test]
    fn test_missing_start_rejected() {
        let g = Grammar::new();
        assert!(matches!(
            StateTable::build(&g),
            Err(StateTableError::MissingStart)
        ));
    }

    #[test]
    fn test_same_shape_rules_merge_props_cost_sorted() {
        let mut g = Grammar::new();
        let inner = g.nonterminal(&["inner"]).unwrap();
        let filler = g.nonterminal(&["filler"]).unwrap();
        let start = g.nonterminal(&["start"]).unwrap();
        g.add_rule(&inner, RuleOpts::terminal("x")).unwrap();
        g.add_rule(&filler, RuleOpts::terminal("please").with_insertion_cost(2.0))
            .unwrap();
        g.add_rule(&filler, RuleOpts::terminal("kindly").with_insertion_cost(0.5))
            .unwrap();
        g.add_rule(&start, RuleOpts::binary(&filler, &inner)).unwrap();
        g.set_start(&start);
        crate::edits::generate_edit_rules(&mut g);
        let table = StateTable::build(&g).unwrap();
        // Two insertion rules [start] -> [inner] with different texts
        // merge into one action with cost-ascending props.
        let start_id = table.symbol("[start]").unwrap();
        let merged = table.symbols[start_id]
            .rules
            .iter()
            .find(|r| !r.is_terminal && r.rhs.len() == 1)
            .expect("merged insertion rule");
        assert_eq!(merged.props.len(), 2);
        assert!(merged.props[0].cost <= merged.props[1].cost);
    }
}
