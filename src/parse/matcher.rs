//! Terminal matching: n-grams against the lexicon.
//!
//! For each input position every n-gram is tried against literal
//! terminals, the entity index, and the integer placeholder. Placeholder
//! symbols are never matched by literal text.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use super::forest::LeafData;
use super::lexer::Token;
use crate::semantics::{SemNode, SemanticDef, SemanticKind, SemanticRef};
use crate::table::{StateTable, SymId};

/// One terminal match starting at some position.
#[derive(Debug, Clone)]
pub struct Match {
    pub sym: SymId,
    pub size: usize,
    pub leaf: LeafData,
}

/// Per-parse interner for synthesized semantic arguments.
///
/// Matching the same entity or integer twice in one query must yield
/// pointer-equal descriptors so the algebra's identity checks hold.
#[derive(Debug, Default)]
pub struct ArgInterner {
    cache: FxHashMap<SmolStr, SemanticRef>,
}

impl ArgInterner {
    pub fn intern(&mut self, name: &SmolStr) -> SemanticRef {
        Arc::clone(self.cache.entry(name.clone()).or_insert_with(|| {
            Arc::new(SemanticDef {
                name: name.clone(),
                cost: 0.0,
                kind: SemanticKind::Argument,
            })
        }))
    }
}

/// All matches per start position.
pub fn match_terminals(
    table: &StateTable,
    tokens: &[Token],
    interner: &mut ArgInterner,
) -> Vec<Vec<Match>> {
    let max_ngram = table
        .max_literal_tokens
        .max(table.entities.max_token_count())
        .max(1);
    let mut matches: Vec<Vec<Match>> = vec![Vec::new(); tokens.len()];
    for start in 0..tokens.len() {
        let limit = max_ngram.min(tokens.len() - start);
        let mut phrase = String::new();
        for size in 1..=limit {
            if size > 1 {
                phrase.push(' ');
            }
            phrase.push_str(&tokens[start + size - 1].text);

            if let Some(sym) = table.literal(&phrase) {
                matches[start].push(Match {
                    sym,
                    size,
                    leaf: LeafData {
                        text: phrase.as_str().into(),
                        int_value: None,
                        semantic: None,
                    },
                });
            }
            if let Some(entities) = table.entities.lookup(&phrase) {
                for entity in entities {
                    let Some(sym) = table.symbol(&entity.category) else {
                        continue;
                    };
                    let arg = interner.intern(&entity.id);
                    matches[start].push(Match {
                        sym,
                        size,
                        leaf: LeafData {
                            text: entity.text.clone(),
                            int_value: None,
                            semantic: Some(vec![SemNode::arg(arg)]),
                        },
                    });
                }
            }
        }
        if let (Some(int_sym), Some(value)) = (table.int_sym, tokens[start].int_value) {
            let arg = interner.intern(&tokens[start].text);
            matches[start].push(Match {
                sym: int_sym,
                size: 1,
                leaf: LeafData {
                    text: tokens[start].text.clone(),
                    int_value: Some(value),
                    semantic: Some(vec![SemNode::arg(arg)]),
                },
            });
        }
    }
    matches
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interner_reuses_descriptors() {
        let mut interner = ArgInterner::default();
        let a = interner.intern(&SmolStr::from("22"));
        let b = interner.intern(&SmolStr::from("22"));
        assert!(Arc::ptr_eq(&a, &b));
    }
}
