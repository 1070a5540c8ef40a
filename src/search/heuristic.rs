//! Per-sub minimum completion costs.
//!
//! `sub.min_cost` is the least cost any subtree rooted below the sub can
//! add: the sum over its children of the cheapest (props cost + child
//! min) among each child's derivations. Computed once per sub by a
//! depth-first pass from the start node; this is the admissible
//! heuristic the A* search adds to each item's cost so far.

use crate::parse::{Forest, NodeId, SubChildren, SubId};
use crate::table::StateTable;

const UNVISITED: u8 = 0;
const IN_PROGRESS: u8 = 1;
const DONE: u8 = 2;

/// Annotate every sub reachable from `root` with its min cost.
pub fn calc_min_costs(forest: &mut Forest, root: NodeId, table: &StateTable) {
    let mut marks = vec![UNVISITED; forest.subs.len()];
    let subs: Vec<SubId> = forest.nodes[root].subs.clone();
    for sub in subs {
        visit_sub(forest, table, sub, &mut marks);
    }
}

/// Cheapest way to derive a node: min over its subs of the sub's own
/// (cheapest) cost plus the sub's min cost. Leaves cost nothing.
pub fn node_min(forest: &Forest, table: &StateTable, node: NodeId) -> f64 {
    let node = &forest.nodes[node];
    if node.is_leaf() {
        return 0.0;
    }
    node.subs
        .iter()
        .map(|&sub| sub_cost(forest, table, sub) + forest.subs[sub].min_cost)
        .fold(f64::INFINITY, f64::min)
}

/// A sub's own cost: the first (cheapest) props element.
pub fn sub_cost(forest: &Forest, table: &StateTable, sub: SubId) -> f64 {
    let sub = &forest.subs[sub];
    table.symbols[sub.lhs].rules[sub.rule].props[0].cost
}

fn visit_sub(forest: &mut Forest, table: &StateTable, sub: SubId, marks: &mut Vec<u8>) -> f64 {
    match marks[sub] {
        DONE => return forest.subs[sub].min_cost,
        // A sub reachable from itself cannot complete through that
        // branch; treat the cycle as unavailable.
        IN_PROGRESS => return f64::INFINITY,
        _ => {}
    }
    marks[sub] = IN_PROGRESS;
    let children = forest.subs[sub].children;
    let total = match children {
        SubChildren::One(child) => visit_node(forest, table, child, marks),
        SubChildren::Two(a, b) => {
            visit_node(forest, table, a, marks) + visit_node(forest, table, b, marks)
        }
    };
    marks[sub] = DONE;
    forest.subs[sub].min_cost = total;
    total
}

fn visit_node(forest: &mut Forest, table: &StateTable, node: NodeId, marks: &mut Vec<u8>) -> f64 {
    if forest.nodes[node].is_leaf() {
        return 0.0;
    }
    let subs: Vec<SubId> = forest.nodes[node].subs.clone();
    let mut best = f64::INFINITY;
    for sub in subs {
        let below = visit_sub(forest, table, sub, marks);
        let total = sub_cost(forest, table, sub) + below;
        best = best.min(total);
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{Grammar, RuleOpts};
    use crate::parse;
    use crate::table::StateTable;

    #[test]
    fn test_min_costs_cover_reachable_subs() {
        let mut g = Grammar::new();
        let word = g.nonterminal(&["word"]).unwrap();
        let start = g.nonterminal(&["start"]).unwrap();
        g.semantic_arg("me", 0.0).unwrap();
        let me = g.arg("me").unwrap();
        g.add_rule(&word, RuleOpts::terminal("hello").with_semantic(me))
            .unwrap();
        g.add_rule(&start, RuleOpts::unary(&word)).unwrap();
        g.set_start(&start);
        crate::edits::generate_edit_rules(&mut g);
        let table = StateTable::build(&g).unwrap();
        let mut parsed = parse::parse(&table, "hello").unwrap();
        calc_min_costs(&mut parsed.forest, parsed.root, &table);
        for sub in &parsed.forest.subs {
            assert!(!sub.min_cost.is_nan());
        }
        // The start node's cheapest completion is the [word] rule cost
        // below it.
        let root_min = node_min(&parsed.forest, &table, parsed.root);
        assert!(root_min.is_finite());
    }
}
