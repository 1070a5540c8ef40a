//! The generalized-LR engine: a graph-structured stack over the state
//! table.
//!
//! Each input position keeps one vertex per live automaton state. A
//! vertex owns zNodes: (forest node, predecessor vertices) pairs. Shifts
//! move nodes across vertices; reductions fire once per (zNode, rule)
//! pair, pairing binary reductions with the zNodes one vertex back. All
//! pending shifts drain before each reduction so predecessor sets are as
//! complete as possible.

use std::collections::VecDeque;

use rustc_hash::FxHashMap;

use super::forest::{Forest, NodeId, SubChildren};
use super::matcher::Match;
use crate::table::{Reduction, StateId, StateTable};

struct Vertex {
    state: StateId,
    znodes: Vec<ZNode>,
}

struct ZNode {
    node: NodeId,
    verts: Vec<usize>,
}

pub(crate) struct Engine<'t> {
    table: &'t StateTable,
    pub forest: Forest,
    verts: Vec<Vertex>,
    by_pos: Vec<FxHashMap<StateId, usize>>,
    shift_queue: VecDeque<(NodeId, usize)>,
    red_queue: VecDeque<(usize, usize, Reduction)>,
}

impl<'t> Engine<'t> {
    pub fn new(table: &'t StateTable, token_count: usize) -> Self {
        let mut engine = Self {
            table,
            forest: Forest::default(),
            verts: Vec::new(),
            by_pos: vec![FxHashMap::default(); token_count + 1],
            shift_queue: VecDeque::new(),
            red_queue: VecDeque::new(),
        };
        engine.vertex(0, 0);
        engine
    }

    fn vertex(&mut self, state: StateId, pos: usize) -> usize {
        if let Some(&vert) = self.by_pos[pos].get(&state) {
            return vert;
        }
        let vert = self.verts.len();
        self.verts.push(Vertex {
            state,
            znodes: Vec::new(),
        });
        self.by_pos[pos].insert(state, vert);
        vert
    }

    /// Shift every terminal match starting at `pos` from every live
    /// vertex there, then run shifts and reductions to quiescence.
    pub fn seed(&mut self, pos: usize, matches: &[Match]) {
        for m in matches {
            let node = self.forest.leaf(m.sym, pos, m.size, m.leaf.clone());
            let from: Vec<usize> = self.by_pos[pos].values().copied().collect();
            for vert in from {
                self.shift_queue.push_back((node, vert));
            }
        }
        self.drain();
    }

    fn drain(&mut self) {
        loop {
            while let Some((node, vert)) = self.shift_queue.pop_front() {
                self.shift(node, vert);
            }
            match self.red_queue.pop_front() {
                Some((vert, znode, red)) => self.reduce(vert, znode, red),
                None => break,
            }
        }
    }

    fn shift(&mut self, node: NodeId, from: usize) {
        let state = self.verts[from].state;
        let sym = self.forest.nodes[node].sym;
        let Some(&target) = self.table.states[state].shifts.get(&sym) else {
            return;
        };
        let end = self.forest.nodes[node].start + self.forest.nodes[node].size;
        let to = self.vertex(target, end);
        match self.verts[to].znodes.iter().position(|z| z.node == node) {
            Some(zi) => {
                if !self.verts[to].znodes[zi].verts.contains(&from) {
                    self.verts[to].znodes[zi].verts.push(from);
                }
            }
            None => {
                self.verts[to].znodes.push(ZNode {
                    node,
                    verts: vec![from],
                });
                let zi = self.verts[to].znodes.len() - 1;
                for red in &self.table.states[target].reds {
                    self.red_queue.push_back((to, zi, *red));
                }
            }
        }
    }

    fn reduce(&mut self, vert: usize, znode: usize, red: Reduction) {
        let right = self.verts[vert].znodes[znode].node;
        if red.binary {
            let preds = self.verts[vert].znodes[znode].verts.clone();
            for pred in preds {
                let lefts: Vec<(NodeId, Vec<usize>)> = self.verts[pred]
                    .znodes
                    .iter()
                    .map(|z| (z.node, z.verts.clone()))
                    .collect();
                for (left, grand) in lefts {
                    // A transposed rule matched its branches in reverse;
                    // store the children in original order.
                    let (a, b) = if red.is_transposition {
                        (right, left)
                    } else {
                        (left, right)
                    };
                    let start = self.forest.nodes[left].start;
                    let size = self.forest.nodes[left].size + self.forest.nodes[right].size;
                    let lhs_node =
                        self.forest
                            .derive(red.lhs, start, size, SubChildren::Two(a, b), red.rule);
                    for vert in grand {
                        self.shift_queue.push_back((lhs_node, vert));
                    }
                }
            }
        } else {
            let child = right;
            if red.is_terminal {
                if let Some(value) = self.forest.nodes[child].leaf.as_ref().and_then(|l| l.int_value)
                {
                    // Integer rules apply only within their bounds.
                    let props = self.table.props(&red);
                    if !props.iter().any(|p| p.int_in_bounds(value)) {
                        return;
                    }
                }
            }
            let start = self.forest.nodes[child].start;
            let size = self.forest.nodes[child].size;
            let lhs_node = self
                .forest
                .derive(red.lhs, start, size, SubChildren::One(child), red.rule);
            let preds = self.verts[vert].znodes[znode].verts.clone();
            for vert in preds {
                self.shift_queue.push_back((lhs_node, vert));
            }
        }
    }

    /// After all tokens, a final-state vertex holding a start node that
    /// spans the whole input accepts.
    pub fn accept(&self, token_count: usize) -> Option<NodeId> {
        for (&state, &vert) in &self.by_pos[token_count] {
            if !self.table.states[state].is_final {
                continue;
            }
            for z in &self.verts[vert].znodes {
                let node = &self.forest.nodes[z.node];
                if node.sym == self.table.start_sym && node.start == 0 && node.size == token_count
                {
                    return Some(z.node);
                }
            }
        }
        None
    }
}
