//! Runtime parsing: tokenizer, terminal matcher, GLR engine, forest.

mod forest;
mod lexer;
mod matcher;
mod stack;

pub use forest::{Forest, LeafData, Node, NodeId, Sub, SubChildren, SubId};
pub use lexer::{tokenize, Token};
pub use matcher::{match_terminals, ArgInterner, Match};

use thiserror::Error;
use tracing::debug;

use crate::table::StateTable;
use stack::Engine;

/// The input reached no accepting state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no parse spans the input")]
pub struct Unparsable;

/// A successful parse: the forest and its start node.
#[derive(Debug)]
pub struct ParseForest {
    pub forest: Forest,
    pub root: NodeId,
    pub token_count: usize,
}

/// Parse a query string against a compiled state table.
pub fn parse(table: &StateTable, query: &str) -> Result<ParseForest, Unparsable> {
    let tokens = tokenize(query);
    parse_tokens(table, &tokens)
}

/// Parse pre-tokenized input.
pub fn parse_tokens(table: &StateTable, tokens: &[Token]) -> Result<ParseForest, Unparsable> {
    if tokens.is_empty() {
        return Err(Unparsable);
    }
    let mut interner = ArgInterner::default();
    let matches = match_terminals(table, tokens, &mut interner);
    let mut engine = Engine::new(table, tokens.len());
    for pos in 0..tokens.len() {
        engine.seed(pos, &matches[pos]);
    }
    let root = engine.accept(tokens.len()).ok_or(Unparsable)?;
    let forest = engine.forest;
    debug!(
        nodes = forest.nodes.len(),
        subs = forest.subs.len(),
        "parse forest built"
    );
    Ok(ParseForest {
        forest,
        root,
        token_count: tokens.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{Grammar, RuleOpts};

    fn compiled(mut g: Grammar) -> StateTable {
        crate::edits::generate_edit_rules(&mut g);
        StateTable::build(&g).unwrap()
    }

    fn greeting_grammar() -> Grammar {
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
    fn test_parse_accepts_spanning_derivation() {
        let table = compiled(greeting_grammar());
        let parsed = parse(&table, "hello world").unwrap();
        let root = parsed.forest.node(parsed.root);
        assert_eq!(root.size, 2);
        assert_eq!(root.start, 0);
    }

    #[test]
    fn test_parse_rejects_unknown_token() {
        let table = compiled(greeting_grammar());
        assert!(parse(&table, "hello moon").is_err());
    }

    #[test]
    fn test_parse_rejects_incomplete_input() {
        let table = compiled(greeting_grammar());
        assert!(parse(&table, "hello").is_err());
        assert!(parse(&table, "").is_err());
    }

    #[test]
    fn test_multi_token_terminal_matches() {
        let mut g = Grammar::new();
        let phrase = g.nonterminal(&["phrase"]).unwrap();
        let start = g.nonterminal(&["start"]).unwrap();
        g.add_rule(&phrase, RuleOpts::terminal("liked by")).unwrap();
        g.add_rule(&start, RuleOpts::unary(&phrase)).unwrap();
        g.set_start(&start);
        let table = compiled(g);
        assert!(parse(&table, "liked by").is_ok());
        assert!(parse(&table, "liked").is_err());
    }

    #[test]
    fn test_int_bounds_filter_matches() {
        let mut g = Grammar::new();
        let count = g.nonterminal(&["count"]).unwrap();
        let start = g.nonterminal(&["start"]).unwrap();
        let int = g.int_sym();
        g.semantic_fn("count-of", 0.5, 1, 1, false).unwrap();
        let open = g.lhs("count-of").unwrap();
        g.add_rule(
            &count,
            RuleOpts::placeholder(&int)
                .with_semantic(open)
                .with_int_bounds(0, 100),
        )
        .unwrap();
        g.add_rule(&start, RuleOpts::unary(&count)).unwrap();
        g.set_start(&start);
        let table = compiled(g);
        assert!(parse(&table, "42").is_ok());
        assert!(parse(&table, "400").is_err());
    }

    #[test]
    fn test_entity_match_spans_multiple_tokens() {
        let mut g = Grammar::new();
        let user = g.entity_category("user", &["John von Neumann"]).unwrap();
        let subject = g.nonterminal(&["subject"]).unwrap();
        let start = g.nonterminal(&["start"]).unwrap();
        g.add_rule(&subject, RuleOpts::placeholder(&user)).unwrap();
        g.add_rule(&start, RuleOpts::unary(&subject)).unwrap();
        g.set_start(&start);
        let table = compiled(g);
        let parsed = parse(&table, "john von neumann").unwrap();
        assert_eq!(parsed.forest.node(parsed.root).size, 3);
    }

    #[test]
    fn test_shared_forest_merges_ambiguity() {
        // Two derivations of the same span share one node.
        let mut g = Grammar::new();
        let a = g.nonterminal(&["a"]).unwrap();
        let b = g.nonterminal(&["b"]).unwrap();
        let start = g.nonterminal(&["start"]).unwrap();
        g.add_rule(&a, RuleOpts::terminal("x")).unwrap();
        g.add_rule(&b, RuleOpts::terminal("x")).unwrap();
        g.add_rule(&start, RuleOpts::unary(&a)).unwrap();
        g.add_rule(&start, RuleOpts::unary(&b)).unwrap();
        g.set_start(&start);
        let table = compiled(g);
        let parsed = parse(&table, "x").unwrap();
        assert_eq!(parsed.forest.node(parsed.root).subs.len(), 2);
    }
}
