//! Best-first enumeration of the K cheapest unique parse trees.
//!
//! A priority-queue item is a partial derivation: the node being
//! expanded, pending right siblings and deferred text fragments, a
//! persistent list of pending semantics, the conjugation stack, the
//! display text so far, and cost-so-far plus the current sub's min-cost
//! heuristic. Ties on cost break by insertion order, keeping the search
//! deterministic.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use super::conjugate::append_text;
use super::heuristic::node_min;
use super::list::List;
use crate::base::GramProps;
use crate::grammar::Text;
use crate::parse::{Forest, NodeId, ParseForest, SubChildren, SubId};
use crate::semantics::{
    is_forbidden_multiple, is_rhs, merge_rhs, reduce, sort_siblings, to_string, SemNode, SemTree,
};
use crate::table::{RuleProps, StateTable};

/// Search configuration.
#[derive(Debug, Clone, Copy)]
pub struct SearchOptions {
    /// Number of unique trees to return.
    pub k: usize,
    /// Preemption bound: give up after this many queue pops.
    pub max_pops: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            k: 7,
            max_pops: 30_000,
        }
    }
}

/// One accepted parse.
#[derive(Debug, Clone)]
pub struct ParseTree {
    /// Conjugated display text.
    pub text: String,
    /// Reduced semantic tree.
    pub semantic: SemTree,
    /// Canonical semantic string.
    pub semantic_str: String,
    /// Total derivation cost.
    pub cost: f64,
    /// Semantic strings of discarded parses that shared this display
    /// text.
    pub disambiguations: Vec<String>,
}

/// A pending right sibling or a deferred text fragment.
#[derive(Clone)]
enum NextEntry {
    Node(NodeId),
    Text(Text),
}

/// A pending semantic: an unapplied LHS waiting for its subtree to
/// complete, or accumulated reduced (RHS) material.
#[derive(Clone)]
enum SemEntry {
    Lhs { tree: Rc<SemTree>, marker: u32 },
    Rhs { tree: Rc<SemTree> },
}

#[derive(Clone)]
struct Item {
    node: Option<NodeId>,
    nexts: List<NextEntry>,
    /// Count of node entries (not text entries) in `nexts`.
    next_len: u32,
    sems: List<SemEntry>,
    gram: List<GramProps>,
    text: String,
    cost_so_far: f64,
    cost: f64,
    seq: u64,
}

struct HeapEntry(Item);

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.0.seq == other.0.seq
    }
}
impl Eq for HeapEntry {}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap, we pop the cheapest item;
        // FIFO on equal cost.
        other
            .0
            .cost
            .total_cmp(&self.0.cost)
            .then_with(|| other.0.seq.cmp(&self.0.seq))
    }
}
impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Run the search over an annotated forest.
pub fn run(parsed: &ParseForest, table: &StateTable, opts: &SearchOptions) -> Vec<ParseTree> {
    let forest = &parsed.forest;
    let mut heap: BinaryHeap<HeapEntry> = BinaryHeap::new();
    let mut seq: u64 = 0;

    heap.push(HeapEntry(Item {
        node: Some(parsed.root),
        nexts: List::new(),
        next_len: 0,
        sems: List::new(),
        gram: List::new(),
        text: String::new(),
        cost_so_far: 0.0,
        cost: node_min(forest, table, parsed.root),
        seq,
    }));

    let mut accepted: Vec<ParseTree> = Vec::new();
    let mut seen_semantics: FxHashSet<String> = FxHashSet::default();
    let mut text_index: FxHashMap<String, usize> = FxHashMap::default();

    let mut pops = 0usize;
    while let Some(HeapEntry(mut item)) = heap.pop() {
        pops += 1;
        if pops > opts.max_pops {
            debug!(pops, "search preempted");
            break;
        }

        let node = match item.node.take() {
            Some(node) => Some(node),
            None => advance(&mut item),
        };
        let Some(node) = node else {
            // Derivation complete.
            finalize(
                item,
                &mut accepted,
                &mut seen_semantics,
                &mut text_index,
            );
            if accepted.len() >= opts.k {
                break;
            }
            continue;
        };

        for &sub_id in &forest.nodes[node].subs {
            let props_list = sub_props(forest, table, sub_id);
            for props in props_list {
                if let Some(mut successor) = expand(forest, table, &item, sub_id, props) {
                    seq += 1;
                    successor.seq = seq;
                    heap.push(HeapEntry(successor));
                }
            }
        }
    }
    debug!(pops, accepted = accepted.len(), "search finished");
    accepted
}

fn sub_props<'t>(forest: &Forest, table: &'t StateTable, sub: SubId) -> &'t [RuleProps] {
    let sub = &forest.subs[sub];
    &table.symbols[sub.lhs].rules[sub.rule].props
}

/// Consume deferred text fragments until a real node surfaces; `None`
/// means the derivation is complete.
fn advance(item: &mut Item) -> Option<NodeId> {
    loop {
        let head = item.nexts.head().cloned();
        match head {
            Some(NextEntry::Text(text)) => {
                append_text(&mut item.text, &mut item.gram, &text);
                item.nexts = item.nexts.tail();
            }
            Some(NextEntry::Node(node)) => {
                item.nexts = item.nexts.tail();
                item.next_len -= 1;
                return Some(node);
            }
            None => return None,
        }
    }
}

/// Build the successor item for one sub and one props element; `None`
/// when semantic composition rejects it.
fn expand(
    forest: &Forest,
    table: &StateTable,
    item: &Item,
    sub_id: SubId,
    props: &RuleProps,
) -> Option<Item> {
    let sub = &forest.subs[sub_id];
    let mut next = item.clone();
    next.cost_so_far += props.cost;
    next.cost = next.cost_so_far + sub.min_cost;

    match sub.children {
        SubChildren::One(child) if forest.nodes[child].is_leaf() => {
            expand_terminal(forest, table, next, child, props)
        }
        SubChildren::One(child) if props.insertion_idx.is_some() => {
            expand_insertion(next, child, props)
        }
        SubChildren::One(child) => {
            expand_nonterminal(next, Some(child), None, props)
        }
        SubChildren::Two(left, right) => {
            expand_nonterminal(next, Some(left), Some(right), props)
        }
    }
}

fn expand_terminal(
    forest: &Forest,
    table: &StateTable,
    mut next: Item,
    child: NodeId,
    props: &RuleProps,
) -> Option<Item> {
    let leaf = forest.nodes[child].leaf.as_ref()?;
    if let Some(value) = leaf.int_value {
        if !props.int_in_bounds(value) {
            return None;
        }
    }

    if let Some(text) = &props.text {
        append_text(&mut next.text, &mut next.gram, text);
    } else if matches!(
        table.symbols[forest.nodes[child].sym].kind,
        crate::table::SymKind::Integer | crate::table::SymKind::Entity
    ) {
        append_text(&mut next.text, &mut next.gram, &Text::Str(leaf.text.clone()));
    }

    let incoming: Option<SemTree> = match (&props.semantic, props.semantic_is_rhs) {
        (Some(sem), true) => Some(sem.clone()),
        (Some(sem), false) => {
            // A placeholder rule applies its semantic to the matched
            // argument.
            let arg = leaf.semantic.as_ref()?;
            Some(reduce(sem, arg.clone()).ok()?)
        }
        (None, _) => leaf.semantic.clone(),
    };
    reduce_sem_list(&mut next, incoming)?;
    next.node = None;
    Some(next)
}

fn expand_insertion(mut next: Item, child: NodeId, props: &RuleProps) -> Option<Item> {
    // The surviving branch still conjugates under the rule's
    // properties.
    if !props.gram_props.is_empty() {
        next.gram = next.gram.push(props.gram_props);
    }

    match (&props.semantic, &props.inserted_semantic) {
        (Some(parent), inserted) if !props.semantic_is_rhs => {
            push_lhs(&mut next, parent)?;
            if let Some(inserted) = inserted {
                next.sems = next.sems.push(SemEntry::Rhs {
                    tree: Rc::new(inserted.clone()),
                });
            }
        }
        (parent, inserted) => {
            // Reduced parent semantics and inserted semantics are both
            // plain RHS material at the current level.
            if let (Some(parent), true) = (parent, props.semantic_is_rhs) {
                push_rhs(&mut next, parent.clone())?;
            }
            if let Some(inserted) = inserted {
                push_rhs(&mut next, inserted.clone())?;
            }
        }
    }

    if let Some(text) = &props.text {
        if props.insertion_idx == Some(1) {
            // Inserted text on the right conjugates only after the
            // surviving branch has realized its person-number.
            next.nexts = next.nexts.push(NextEntry::Text(text.clone()));
        } else {
            append_text(&mut next.text, &mut next.gram, text);
        }
    }

    next.node = Some(child);
    Some(next)
}

fn expand_nonterminal(
    mut next: Item,
    left: Option<NodeId>,
    right: Option<NodeId>,
    props: &RuleProps,
) -> Option<Item> {
    if let Some(sem) = &props.semantic {
        if props.semantic_is_rhs {
            next.sems = next.sems.push(SemEntry::Rhs {
                tree: Rc::new(sem.clone()),
            });
        } else {
            push_lhs(&mut next, sem)?;
        }
    }
    if !props.gram_props.is_empty() {
        next.gram = next.gram.push(props.gram_props);
    }
    if let Some(right) = right {
        next.nexts = next.nexts.push(NextEntry::Node(right));
        next.next_len += 1;
    }
    next.node = left;
    Some(next)
}

/// Queue an unapplied LHS semantic, rejecting early when its function
/// can never merge beside the accumulated RHS.
fn push_lhs(next: &mut Item, sem: &SemTree) -> Option<()> {
    if let Some(SemEntry::Rhs { tree }) = next.sems.head() {
        if let Some(SemNode::Func { def, .. }) = sem.first() {
            if is_forbidden_multiple(tree, def) {
                return None;
            }
        }
    }
    next.sems = next.sems.push(SemEntry::Lhs {
        tree: Rc::new(sem.clone()),
        marker: next.next_len,
    });
    Some(())
}

/// Add reduced material at the current level, merging with the head
/// when it is also reduced.
fn push_rhs(next: &mut Item, tree: SemTree) -> Option<()> {
    let head = match next.sems.head() {
        Some(SemEntry::Rhs { tree }) => Some(Rc::clone(tree)),
        _ => None,
    };
    match head {
        Some(head) => {
            let merged = merge_rhs(&head, &tree).ok()?;
            next.sems = next.sems.tail().push(SemEntry::Rhs {
                tree: Rc::new(merged),
            });
        }
        None => {
            next.sems = next.sems.push(SemEntry::Rhs {
                tree: Rc::new(tree),
            });
        }
    }
    Some(())
}

/// The reduction walk run at every completed branch tip: merge the
/// incoming reduced material downward, applying each LHS whose subtree
/// is complete (its marker is at or above the current depth).
fn reduce_sem_list(next: &mut Item, incoming: Option<SemTree>) -> Option<()> {
    let mut acc = incoming;
    loop {
        let head = next.sems.head().cloned();
        match head {
            Some(SemEntry::Rhs { tree }) => {
                acc = Some(match acc {
                    Some(rhs) => merge_rhs(&tree, &rhs).ok()?,
                    None => (*tree).clone(),
                });
                next.sems = next.sems.tail();
            }
            Some(SemEntry::Lhs { tree, marker }) if marker >= next.next_len => {
                let Some(rhs) = acc.take() else { break };
                acc = Some(reduce(&tree, rhs).ok()?);
                next.sems = next.sems.tail();
            }
            _ => break,
        }
    }
    if let Some(acc) = acc {
        next.sems = next.sems.push(SemEntry::Rhs {
            tree: Rc::new(acc),
        });
    }
    Some(())
}

/// Uniqueness filter and acceptance for a completed derivation.
fn finalize(
    item: Item,
    accepted: &mut Vec<ParseTree>,
    seen_semantics: &mut FxHashSet<String>,
    text_index: &mut FxHashMap<String, usize>,
) {
    // Any unapplied LHS left over (an `intersect` that never received
    // an argument, for instance) is illegal.
    let mut semantic: SemTree = Vec::new();
    for entry in item.sems.iter() {
        match entry {
            SemEntry::Lhs { .. } => return,
            SemEntry::Rhs { tree } => {
                semantic = match merge_rhs(tree, &semantic) {
                    Ok(merged) => merged,
                    Err(_) => return,
                };
            }
        }
    }
    sort_siblings(&mut semantic);
    if !is_rhs(&semantic) {
        return;
    }
    let semantic_str = to_string(&semantic);
    let text = item.text.trim_start().to_string();

    if seen_semantics.contains(&semantic_str) {
        return;
    }
    if let Some(&index) = text_index.get(&text) {
        seen_semantics.insert(semantic_str.clone());
        accepted[index].disambiguations.push(semantic_str);
        return;
    }
    seen_semantics.insert(semantic_str.clone());
    text_index.insert(text.clone(), accepted.len());
    accepted.push(ParseTree {
        text,
        semantic,
        semantic_str,
        cost: item.cost_so_far,
        disambiguations: Vec::new(),
    });
}
