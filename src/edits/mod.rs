//! Edit-rule generation: the augmented grammar.
//!
//! Four passes extend a validated grammar with synthesized rules that
//! let the parser absorb input omissions, swaps, and filler:
//!
//! 1. terminal insertions and empty-string elisions seed *insertion
//!    candidates* (records of how a symbol can be produced entirely
//!    from inserted material);
//! 2. a fixed point propagates candidates up through nonterminal rules
//!    whose every branch is insertable;
//! 3. binary rules with one insertable branch get partial-insertion
//!    rules keeping only the other branch;
//! 4. binary rules with a transposition cost get a reversed sibling.

mod conjugate;

pub use conjugate::{conjugate_pieces, text_key};

use indexmap::IndexMap;
use smol_str::SmolStr;
use tracing::{debug, warn};

use crate::base::PersonNumber;
use crate::grammar::{Grammar, Rule, Text, TextPiece, EMPTY_SYMBOL};
use crate::semantics::{merge_rhs, reduce, trees_equal, SemTree};

/// How a symbol can be produced entirely from insertions and empty
/// strings.
#[derive(Debug, Clone)]
pub struct InsertionCandidate {
    pub cost: f64,
    pub text: Vec<TextPiece>,
    pub inserted_syms: Vec<SmolStr>,
    pub semantic: Option<SemTree>,
    pub person_number: Option<PersonNumber>,
}

/// Insertion candidates per symbol, in discovery order.
pub type CandidateMap = IndexMap<SmolStr, Vec<InsertionCandidate>>;

/// Fixed-point sweep bound; prevents runaway candidate growth in
/// degenerate recursive grammars.
const MAX_SWEEPS: usize = 100;

/// Run all four passes over the grammar. Returns the final candidate
/// map (useful for diagnostics and tests).
pub fn generate_edit_rules(grammar: &mut Grammar) -> CandidateMap {
    let mut candidates = terminal_insertions(grammar);
    nonterminal_insertions(grammar, &mut candidates);
    partial_insertions(grammar, &candidates);
    transpositions(grammar);
    debug!(
        symbols_with_candidates = candidates.len(),
        "edit-rule generation complete"
    );
    candidates
}

/// Pass A: terminal insertions and empty-string elisions.
///
/// Empty-symbol rules are removed from the grammar; their effect
/// survives only through the candidates they seed.
fn terminal_insertions(grammar: &mut Grammar) -> CandidateMap {
    let mut candidates = CandidateMap::default();
    for nonterminal in grammar.nonterminals.values_mut() {
        let rules = std::mem::take(&mut nonterminal.rules);
        for rule in rules {
            if rule.is_terminal && rule.rhs[0].as_str() == EMPTY_SYMBOL {
                let text = rule.text.as_ref().map(Text::pieces).unwrap_or_default();
                candidates
                    .entry(nonterminal.name.clone())
                    .or_default()
                    .push(InsertionCandidate {
                        cost: rule.cost,
                        text,
                        inserted_syms: vec![rule.rhs[0].clone()],
                        semantic: rule.semantic,
                        person_number: rule.gram_props.person_number,
                    });
                continue;
            }
            if rule.is_terminal && !rule.is_placeholder {
                if let Some(insertion_cost) = rule.insertion_cost {
                    let text = rule.text.as_ref().map(Text::pieces).unwrap_or_default();
                    candidates
                        .entry(nonterminal.name.clone())
                        .or_default()
                        .push(InsertionCandidate {
                            cost: rule.cost + insertion_cost,
                            text,
                            inserted_syms: vec![rule.rhs[0].clone()],
                            semantic: rule.semantic.clone(),
                            person_number: rule.gram_props.person_number,
                        });
                }
            }
            nonterminal.rules.push(rule);
        }
    }
    candidates
}

/// Pass B: propagate candidates through nonterminal rules until no
/// sweep discovers anything new.
fn nonterminal_insertions(grammar: &Grammar, candidates: &mut CandidateMap) {
    for sweep in 0.. {
        if sweep == MAX_SWEEPS {
            warn!("insertion fixed point did not converge after {MAX_SWEEPS} sweeps");
            break;
        }
        let mut discovered: Vec<(SmolStr, InsertionCandidate)> = Vec::new();
        for nonterminal in grammar.nonterminals() {
            for rule in &nonterminal.rules {
                if rule.is_terminal || rule.is_transposition || rule.insertion_idx.is_some() {
                    continue;
                }
                let all_insertable = rule
                    .rhs
                    .iter()
                    .all(|sym| candidates.get(sym).is_some_and(|c| !c.is_empty()));
                if !all_insertable {
                    continue;
                }
                for merged in merge_branches(rule, candidates) {
                    let Some(semantic) = compose_semantic(rule, merged.semantic.clone()) else {
                        continue;
                    };
                    let unary = rule.rhs.len() == 1;
                    let text = conjugate_pieces(merged.text.clone(), &rule.gram_props, unary);
                    discovered.push((
                        nonterminal.name.clone(),
                        InsertionCandidate {
                            cost: rule.cost + merged.cost,
                            text,
                            inserted_syms: merged.inserted_syms,
                            semantic,
                            person_number: rule
                                .gram_props
                                .person_number
                                .or(merged.person_number),
                        },
                    ));
                }
            }
        }
        let mut changed = false;
        for (symbol, candidate) in discovered {
            if insert_candidate(candidates, symbol, candidate) {
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
}

/// Merge each branch's candidates; the cartesian product for binary
/// rules, a pass-through for unary rules. Pairs whose semantics cannot
/// merge are skipped.
fn merge_branches(rule: &Rule, candidates: &CandidateMap) -> Vec<InsertionCandidate> {
    let left = &candidates[&rule.rhs[0]];
    if rule.rhs.len() == 1 {
        return left.clone();
    }
    let right = &candidates[&rule.rhs[1]];
    let mut merged = Vec::new();
    for a in left {
        for b in right {
            let semantic = match (&a.semantic, &b.semantic) {
                (Some(x), Some(y)) => match merge_rhs(x, y) {
                    Ok(m) => Some(m),
                    Err(_) => continue,
                },
                (Some(x), None) => Some(x.clone()),
                (None, Some(y)) => Some(y.clone()),
                (None, None) => None,
            };
            let mut text = a.text.clone();
            text.extend(b.text.iter().cloned());
            let mut inserted_syms = a.inserted_syms.clone();
            inserted_syms.extend(b.inserted_syms.iter().cloned());
            merged.push(InsertionCandidate {
                cost: a.cost + b.cost,
                text,
                inserted_syms,
                semantic,
                // Only the first branch can dictate agreement.
                person_number: a.person_number,
            });
        }
    }
    merged
}

/// Compose a merged candidate semantic through the producing rule.
/// `None` means the candidate is not viable.
fn compose_semantic(rule: &Rule, merged: Option<SemTree>) -> Option<Option<SemTree>> {
    match (&rule.semantic, merged) {
        (None, merged) => Some(merged),
        (Some(own), None) => {
            if rule.semantic_is_rhs {
                Some(Some(own.clone()))
            } else {
                // An unreduced semantic with nothing to apply to.
                None
            }
        }
        (Some(own), Some(merged)) => {
            if rule.semantic_is_rhs {
                merge_rhs(own, &merged).ok().map(Some)
            } else {
                reduce(own, merged).ok().map(Some)
            }
        }
    }
}

/// Insert a candidate, deduplicating by display text and keeping the
/// cheapest. Returns true if the map changed.
fn insert_candidate(
    candidates: &mut CandidateMap,
    symbol: SmolStr,
    candidate: InsertionCandidate,
) -> bool {
    let key = text_key(&candidate.text);
    let bucket = candidates.entry(symbol).or_default();
    match bucket.iter().position(|c| text_key(&c.text) == key) {
        Some(index) => {
            if candidate.cost < bucket[index].cost {
                bucket[index] = candidate;
                true
            } else {
                false
            }
        }
        None => {
            bucket.push(candidate);
            true
        }
    }
}

/// Pass C: partial-insertion rules. For each binary rule with an
/// insertable branch, synthesize a unary rule keeping the other branch.
fn partial_insertions(grammar: &mut Grammar, candidates: &CandidateMap) {
    let mut synthesized: Vec<(SmolStr, Rule)> = Vec::new();
    for nonterminal in grammar.nonterminals() {
        for rule in &nonterminal.rules {
            if rule.is_terminal
                || rule.rhs.len() != 2
                || rule.is_transposition
                || rule.insertion_idx.is_some()
            {
                continue;
            }
            for inserted_side in 0..2 {
                let inserted_sym = &rule.rhs[inserted_side];
                let kept_sym = &rule.rhs[1 - inserted_side];
                // Anti-cycle guard: never reduce a rule to its own LHS.
                if *kept_sym == nonterminal.name {
                    continue;
                }
                let Some(branch_candidates) = candidates.get(inserted_sym) else {
                    continue;
                };
                for candidate in branch_candidates {
                    synthesized.push((
                        nonterminal.name.clone(),
                        partial_rule(rule, candidate, inserted_side as u8, kept_sym),
                    ));
                }
            }
        }
    }
    let count = synthesized.len();
    for (symbol, rule) in synthesized {
        apply_partial_rule(grammar, &symbol, rule);
    }
    debug!(rules = count, "partial-insertion rules synthesized");
}

fn partial_rule(rule: &Rule, candidate: &InsertionCandidate, side: u8, kept: &SmolStr) -> Rule {
    let pieces = conjugate_pieces(candidate.text.clone(), &rule.gram_props, false);
    let text = Text::from_pieces(pieces);
    // A candidate carrying neither text nor semantic synthesizes a
    // plain unary rule.
    let plain = text.is_none() && candidate.semantic.is_none();
    let mut gram_props = rule.gram_props;
    if side == 0 && gram_props.person_number.is_none() {
        gram_props.person_number = candidate.person_number;
    }
    Rule {
        rhs: vec![kept.clone()],
        is_terminal: false,
        is_placeholder: false,
        cost: rule.cost + candidate.cost,
        text,
        semantic: rule.semantic.clone(),
        semantic_is_rhs: rule.semantic_is_rhs,
        inserted_semantic: if plain {
            None
        } else {
            candidate.semantic.clone()
        },
        insertion_idx: if plain { None } else { Some(side) },
        gram_props,
        insertion_cost: None,
        transposition_cost: None,
        is_transposition: false,
        int_min: None,
        int_max: None,
    }
}

/// Duplicate policy for pass C: an edit rule with identical RHS, text,
/// inserted semantic, and parent semantic keeps only the cheaper copy.
fn apply_partial_rule(grammar: &mut Grammar, symbol: &SmolStr, rule: Rule) {
    let Some(nonterminal) = grammar.nonterminals.get_mut(symbol) else {
        return;
    };
    let existing = nonterminal.rules.iter().position(|r| {
        !r.is_terminal
            && r.rhs == rule.rhs
            && r.text == rule.text
            && r.insertion_idx == rule.insertion_idx
            && option_trees_equal(&r.inserted_semantic, &rule.inserted_semantic)
            && option_trees_equal(&r.semantic, &rule.semantic)
    });
    match existing {
        Some(index) => {
            if rule.cost < nonterminal.rules[index].cost {
                nonterminal.rules[index] = rule;
            }
        }
        None => nonterminal.rules.push(rule),
    }
}

fn option_trees_equal(a: &Option<SemTree>, b: &Option<SemTree>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(x), Some(y)) => trees_equal(x, y),
        _ => false,
    }
}

/// Pass D: transpositions. Every binary rule with a transposition cost
/// gets a reversed sibling; the original is retained.
fn transpositions(grammar: &mut Grammar) {
    let mut synthesized: Vec<(SmolStr, Rule)> = Vec::new();
    for nonterminal in grammar.nonterminals() {
        for rule in &nonterminal.rules {
            if rule.is_transposition {
                continue;
            }
            let Some(transposition_cost) = rule.transposition_cost else {
                continue;
            };
            let mut rhs = rule.rhs.clone();
            rhs.reverse();
            if nonterminal
                .rules
                .iter()
                .any(|r| !r.is_terminal && r.rhs == rhs)
            {
                continue;
            }
            let mut sibling = rule.clone();
            sibling.rhs = rhs;
            sibling.cost = rule.cost + transposition_cost;
            sibling.transposition_cost = None;
            sibling.is_transposition = true;
            synthesized.push((nonterminal.name.clone(), sibling));
        }
    }
    for (symbol, rule) in synthesized {
        let Some(nonterminal) = grammar.nonterminals.get_mut(&symbol) else {
            continue;
        };
        if !nonterminal
            .rules
            .iter()
            .any(|r| !r.is_terminal && r.rhs == rule.rhs)
        {
            nonterminal.rules.push(rule);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::RuleOpts;

    /// N -> a b where both branches elide to the empty string.
    fn empty_pair_grammar() -> Grammar {
        let mut g = Grammar::new();
        let a = g.nonterminal(&["a"]).unwrap();
        let b = g.nonterminal(&["b"]).unwrap();
        let n = g.nonterminal(&["n"]).unwrap();
        let start = g.nonterminal(&["start"]).unwrap();
        let word = g.nonterminal(&["word"]).unwrap();
        let empty = g.empty_sym();
        g.add_rule(&a, RuleOpts::terminal("alpha").with_insertion_cost(0.25))
            .unwrap();
        g.add_rule(&a, RuleOpts::placeholder(&empty)).unwrap();
        g.add_rule(&b, RuleOpts::terminal("beta").with_insertion_cost(0.5))
            .unwrap();
        g.add_rule(&n, RuleOpts::binary(&a, &b)).unwrap();
        g.add_rule(&word, RuleOpts::terminal("query")).unwrap();
        g.add_rule(&start, RuleOpts::binary(&n, &word)).unwrap();
        g.set_start(&start);
        g
    }

    #[test]
    fn test_empty_rules_are_removed() {
        let mut g = empty_pair_grammar();
        generate_edit_rules(&mut g);
        let a_rules = &g.get("[a]").unwrap().rules;
        assert!(a_rules
            .iter()
            .all(|r| r.rhs[0].as_str() != crate::grammar::EMPTY_SYMBOL));
    }

    #[test]
    fn test_candidates_propagate_through_binary_rules() {
        let mut g = empty_pair_grammar();
        let candidates = generate_edit_rules(&mut g);
        // [a] elides for free or inserts "alpha"; [b] inserts "beta".
        // The cheapest [n] candidate is elided-[a] + inserted-[b].
        let n_cands = candidates.get("[n]").expect("candidates for [n]");
        let cheapest = n_cands
            .iter()
            .map(|c| c.cost)
            .fold(f64::INFINITY, f64::min);
        let b_cost = 0.5;
        assert!((cheapest - b_cost).abs() < 1e-6);
    }

    #[test]
    fn test_partial_insertion_rule_synthesized() {
        let mut g = empty_pair_grammar();
        generate_edit_rules(&mut g);
        // [start] -> [n] [word] with [n] insertable yields
        // [start] -> [word].
        let start_rules = &g.get("[start]").unwrap().rules;
        assert!(start_rules
            .iter()
            .any(|r| !r.is_terminal && r.rhs.len() == 1 && r.rhs[0].as_str() == "[word]"));
    }

    #[test]
    fn test_generation_is_idempotent() {
        let mut g = empty_pair_grammar();
        generate_edit_rules(&mut g);
        let counts: Vec<usize> = g.nonterminals().map(|nt| nt.rules.len()).collect();
        generate_edit_rules(&mut g);
        let counts_after: Vec<usize> = g.nonterminals().map(|nt| nt.rules.len()).collect();
        assert_eq!(counts, counts_after);
    }

    #[test]
    fn test_transposition_sibling() {
        let mut g = Grammar::new();
        let a = g.nonterminal(&["a"]).unwrap();
        let b = g.nonterminal(&["b"]).unwrap();
        let start = g.nonterminal(&["start"]).unwrap();
        g.add_rule(&a, RuleOpts::terminal("alpha")).unwrap();
        g.add_rule(&b, RuleOpts::terminal("beta")).unwrap();
        g.add_rule(&start, RuleOpts::binary(&a, &b).with_transposition_cost(1.0))
            .unwrap();
        g.set_start(&start);
        generate_edit_rules(&mut g);
        let rules = &g.get("[start]").unwrap().rules;
        assert_eq!(rules.len(), 2);
        let sibling = rules.iter().find(|r| r.is_transposition).unwrap();
        assert_eq!(sibling.rhs[0].as_str(), "[b]");
        assert_eq!(sibling.rhs[1].as_str(), "[a]");
        assert!((sibling.cost - (rules[0].cost + 1.0)).abs() < 1e-9);
    }
}
