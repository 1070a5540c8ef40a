//! The shared-packed parse forest.
//!
//! Nodes and subs live in arena vectors; references are indices.
//! Identical subtrees are shared: a node is keyed by (symbol, start,
//! size) and owns deduplicated *subs*, each one derivation of the node.

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::semantics::SemTree;
use crate::table::{SymId, SymKind};

pub type NodeId = usize;
pub type SubId = usize;

/// Data captured when a terminal or placeholder matched the input.
#[derive(Debug, Clone)]
pub struct LeafData {
    /// Display text of the match (entity text keeps its original case).
    pub text: SmolStr,
    /// Parsed value for integer matches.
    pub int_value: Option<i64>,
    /// Synthesized argument for placeholder matches.
    pub semantic: Option<SemTree>,
}

/// A derivation of a symbol over a contiguous input range.
#[derive(Debug)]
pub struct Node {
    pub sym: SymId,
    pub start: usize,
    pub size: usize,
    pub subs: Vec<SubId>,
    pub leaf: Option<LeafData>,
}

impl Node {
    pub fn is_leaf(&self) -> bool {
        self.leaf.is_some()
    }
}

/// Children of a sub: one node, or a linked pair for binary rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubChildren {
    One(NodeId),
    Two(NodeId, NodeId),
}

/// One derivation of a node, with the reduction that produced it.
#[derive(Debug)]
pub struct Sub {
    pub lhs: SymId,
    /// Index into the LHS symbol's table rules; resolves the props.
    pub rule: usize,
    pub children: SubChildren,
    pub size: usize,
    /// Minimum completion cost, annotated once by the heuristic
    /// calculator; NaN until then.
    pub min_cost: f64,
}

/// Arena of nodes and subs for one parse.
#[derive(Debug, Default)]
pub struct Forest {
    pub nodes: Vec<Node>,
    pub subs: Vec<Sub>,
    index: FxHashMap<(SymId, usize, usize), NodeId>,
}

impl Forest {
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn sub(&self, id: SubId) -> &Sub {
        &self.subs[id]
    }

    /// Get or create a leaf node for a matched terminal.
    pub fn leaf(&mut self, sym: SymId, start: usize, size: usize, data: LeafData) -> NodeId {
        let key = (sym, start, size);
        if let Some(&id) = self.index.get(&key) {
            return id;
        }
        let id = self.nodes.len();
        self.nodes.push(Node {
            sym,
            start,
            size,
            subs: Vec::new(),
            leaf: Some(data),
        });
        self.index.insert(key, id);
        id
    }

    /// Get or create a derived node and attach a sub, deduplicating
    /// subs by (children, rule).
    pub fn derive(
        &mut self,
        sym: SymId,
        start: usize,
        size: usize,
        children: SubChildren,
        rule: usize,
    ) -> NodeId {
        let key = (sym, start, size);
        let id = match self.index.get(&key) {
            Some(&id) => id,
            None => {
                let id = self.nodes.len();
                self.nodes.push(Node {
                    sym,
                    start,
                    size,
                    subs: Vec::new(),
                    leaf: None,
                });
                self.index.insert(key, id);
                id
            }
        };
        let duplicate = self.nodes[id].subs.iter().any(|&sub| {
            self.subs[sub].children == children && self.subs[sub].rule == rule
        });
        if !duplicate {
            let sub = self.subs.len();
            self.subs.push(Sub {
                lhs: sym,
                rule,
                children,
                size,
                min_cost: f64::NAN,
            });
            self.nodes[id].subs.push(sub);
        }
        id
    }

    /// Find an already-built node.
    pub fn lookup(&self, sym: SymId, start: usize, size: usize) -> Option<NodeId> {
        self.index.get(&(sym, start, size)).copied()
    }

    /// Render the forest for debugging, one node per line.
    pub fn render(&self, symbols: &[crate::table::TableSymbol]) -> String {
        use std::fmt::Write as _;
        let mut out = String::new();
        for (id, node) in self.nodes.iter().enumerate() {
            let kind = symbols[node.sym].kind;
            let _ = write!(
                out,
                "#{id} {} [{}..{}]",
                symbols[node.sym].name,
                node.start,
                node.start + node.size
            );
            if let Some(leaf) = &node.leaf {
                let _ = write!(out, " = {:?}", leaf.text);
                if kind == SymKind::Integer {
                    let _ = write!(out, " (int)");
                }
            }
            for &sub in &node.subs {
                match self.subs[sub].children {
                    SubChildren::One(a) => {
                        let _ = write!(out, " <- (#{a})");
                    }
                    SubChildren::Two(a, b) => {
                        let _ = write!(out, " <- (#{a} #{b})");
                    }
                }
            }
            out.push('\n');
        }
        out
    }
}
