//! Pure functions over semantic trees.
//!
//! The algebra upholds the tree invariants: sibling nodes sorted by
//! [`compare`], no duplicate sibling subtrees, arity bounds respected,
//! and reduced (RHS) trees fully applied.

use std::cmp::Ordering;
use std::sync::Arc;

use super::{SemNode, SemTree, SemanticRef, NEGATION};

/// Why two reduced trees could not merge under one parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeError {
    /// Both sides carry the same forbidden-multiple function.
    ForbiddenMultiple,
    /// One side negates a subtree the other side asserts.
    NegationConflict,
    /// A subtree occurs on both sides.
    Duplicate,
}

/// Why a LHS could not be applied to a RHS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReduceError {
    BadArity,
}

/// Total order on semantic nodes: arguments before functions, functions
/// by name, ties broken by recursive child-wise comparison.
pub fn compare(a: &SemNode, b: &SemNode) -> Ordering {
    match (a, b) {
        (SemNode::Arg { def: da }, SemNode::Arg { def: db }) => {
            if Arc::ptr_eq(da, db) {
                Ordering::Equal
            } else {
                da.name.cmp(&db.name)
            }
        }
        (SemNode::Arg { .. }, SemNode::Func { .. }) => Ordering::Less,
        (SemNode::Func { .. }, SemNode::Arg { .. }) => Ordering::Greater,
        (
            SemNode::Func {
                def: da,
                children: ca,
            },
            SemNode::Func {
                def: db,
                children: cb,
            },
        ) => da.name.cmp(&db.name).then_with(|| compare_trees(ca, cb)),
    }
}

fn compare_trees(a: &SemTree, b: &SemTree) -> Ordering {
    for (na, nb) in a.iter().zip(b.iter()) {
        let ord = compare(na, nb);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.len().cmp(&b.len())
}

/// Structural equality of two nodes; leaves compare by descriptor
/// identity.
pub fn nodes_equal(a: &SemNode, b: &SemNode) -> bool {
    match (a, b) {
        (SemNode::Arg { def: da }, SemNode::Arg { def: db }) => Arc::ptr_eq(da, db),
        (
            SemNode::Func {
                def: da,
                children: ca,
            },
            SemNode::Func {
                def: db,
                children: cb,
            },
        ) => Arc::ptr_eq(da, db) && trees_equal(ca, cb),
        _ => false,
    }
}

/// Structural equality of two sibling sequences: same length, all pairs
/// equal in order.
pub fn trees_equal(a: &SemTree, b: &SemTree) -> bool {
    a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| nodes_equal(x, y))
}

/// Post-order sum of all node costs.
pub fn sum_costs(tree: &SemTree) -> f64 {
    tree.iter()
        .map(|node| match node {
            SemNode::Func { def, children } => def.cost + sum_costs(children),
            SemNode::Arg { def } => def.cost,
        })
        .sum()
}

/// Sort a sibling sequence in place by [`compare`].
pub fn sort_siblings(tree: &mut SemTree) {
    tree.sort_by(compare);
}

/// Fast pre-check before a LHS is even queued: a forbidden-multiple
/// function already present in the accumulated RHS can never merge.
pub fn is_forbidden_multiple(rhs: &SemTree, new_lhs: &SemanticRef) -> bool {
    new_lhs.forbids_multiple()
        && rhs.iter().any(|node| match node {
            SemNode::Func { def, .. } => Arc::ptr_eq(def, new_lhs),
            SemNode::Arg { .. } => false,
        })
}

/// Combine two reduced trees that share a parent.
///
/// Fails on a shared forbidden-multiple function, on a negation of a
/// subtree the other side asserts, or on any duplicated subtree.
/// Sorting is deferred until the parent LHS reduces.
pub fn merge_rhs(a: &SemTree, b: &SemTree) -> Result<SemTree, MergeError> {
    for node in a {
        if let SemNode::Func { def, .. } = node {
            if def.forbids_multiple()
                && b.iter().any(|other| match other {
                    SemNode::Func { def: od, .. } => Arc::ptr_eq(od, def),
                    SemNode::Arg { .. } => false,
                })
            {
                return Err(MergeError::ForbiddenMultiple);
            }
        }
    }
    if negation_conflict(a, b) || negation_conflict(b, a) {
        return Err(MergeError::NegationConflict);
    }
    for node in b {
        if a.iter().any(|other| nodes_equal(other, node)) {
            return Err(MergeError::Duplicate);
        }
    }
    let mut merged = a.clone();
    merged.extend(b.iter().cloned());
    Ok(merged)
}

/// True if `negated` contains `not(X)` while `asserted` contains an
/// equivalent `X`.
fn negation_conflict(negated: &SemTree, asserted: &SemTree) -> bool {
    negated.iter().any(|node| match node {
        SemNode::Func { def, children } if def.name == NEGATION => children
            .iter()
            .any(|inner| asserted.iter().any(|other| nodes_equal(other, inner))),
        _ => false,
    })
}

/// Apply a one-function LHS to a reduced RHS.
///
/// A nested LHS (a function wrapping an unapplied function) attaches the
/// RHS at its innermost open function. `intersect` over a single child
/// is the identity; a function with `maxParams == 1` receiving several
/// children is cloned once per child.
pub fn reduce(lhs: &SemTree, rhs: SemTree) -> Result<SemTree, ReduceError> {
    let Some(SemNode::Func { def, children }) = lhs.first() else {
        return Err(ReduceError::BadArity);
    };
    if !children.is_empty() {
        // Descend to the innermost open function.
        let inner = reduce(children, rhs)?;
        return Ok(vec![SemNode::Func {
            def: Arc::clone(def),
            children: inner,
        }]);
    }

    let (min_params, max_params) = def.params();
    if def.name == super::INTERSECT && rhs.len() == 1 {
        return Ok(rhs);
    }
    if rhs.len() < min_params {
        return Err(ReduceError::BadArity);
    }
    if rhs.len() > max_params {
        if max_params == 1 {
            let mut cloned: SemTree = rhs
                .into_iter()
                .map(|child| SemNode::Func {
                    def: Arc::clone(def),
                    children: vec![child],
                })
                .collect();
            sort_siblings(&mut cloned);
            return Ok(cloned);
        }
        if !def.forbids_multiple() {
            return Err(ReduceError::BadArity);
        }
    }
    let mut children = rhs;
    sort_siblings(&mut children);
    Ok(vec![SemNode::Func {
        def: Arc::clone(def),
        children,
    }])
}

/// True if every function node has a non-empty, recursively reduced
/// child sequence of legal arity.
pub fn is_rhs(tree: &SemTree) -> bool {
    tree.iter().all(|node| match node {
        SemNode::Arg { .. } => true,
        SemNode::Func { def, children } => {
            let (min_params, _) = def.params();
            !children.is_empty() && children.len() >= min_params && is_rhs(children)
        }
    })
}

/// Canonical string form: `func(childA,childB)`, arguments as bare
/// names, siblings joined by commas.
pub fn to_string(tree: &SemTree) -> String {
    let mut out = String::new();
    write_tree(tree, &mut out);
    out
}

fn write_tree(tree: &SemTree, out: &mut String) {
    for (i, node) in tree.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        match node {
            SemNode::Arg { def } => out.push_str(&def.name),
            SemNode::Func { def, children } => {
                out.push_str(&def.name);
                out.push('(');
                write_tree(children, out);
                out.push(')');
            }
        }
    }
}
