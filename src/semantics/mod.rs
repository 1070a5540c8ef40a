//! Semantic descriptors, semantic trees, and the semantic algebra.
//!
//! A *semantic* is either a function (with an arity range and a cost) or
//! an argument (a leaf). A *semantic tree* is an ordered sequence of
//! nodes, each a function application or an argument. Trees produced by
//! the algebra keep their siblings sorted and free of duplicates.

mod algebra;
mod registry;

pub use algebra::{
    compare, is_forbidden_multiple, is_rhs, merge_rhs, nodes_equal, reduce, sort_siblings,
    sum_costs, to_string, trees_equal, MergeError, ReduceError,
};
pub use registry::{SemanticRegistry, INTERSECT, NEGATION};

use std::sync::Arc;

use smol_str::SmolStr;
use thiserror::Error;

/// Errors raised while declaring semantics.
#[derive(Debug, Error)]
pub enum SemanticError {
    #[error("duplicate semantic `{0}`")]
    Duplicate(String),
    #[error("ill-formed semantic `{name}`: {reason}")]
    IllFormed { name: String, reason: String },
}

/// A semantic function or argument descriptor.
///
/// Descriptors are interned by the [`SemanticRegistry`]; two references
/// to the same name are pointer-equal, which the algebra relies on for
/// leaf comparison.
#[derive(Debug, PartialEq)]
pub struct SemanticDef {
    pub name: SmolStr,
    pub cost: f64,
    pub kind: SemanticKind,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SemanticKind {
    Function {
        min_params: usize,
        max_params: usize,
        forbids_multiple: bool,
    },
    Argument,
}

/// Shared handle to an interned descriptor.
pub type SemanticRef = Arc<SemanticDef>;

impl SemanticDef {
    pub fn is_function(&self) -> bool {
        matches!(self.kind, SemanticKind::Function { .. })
    }

    pub fn forbids_multiple(&self) -> bool {
        matches!(
            self.kind,
            SemanticKind::Function {
                forbids_multiple: true,
                ..
            }
        )
    }

    /// Arity bounds; `(0, usize::MAX)` for arguments, which never apply.
    pub fn params(&self) -> (usize, usize) {
        match self.kind {
            SemanticKind::Function {
                min_params,
                max_params,
                ..
            } => (min_params, max_params),
            SemanticKind::Argument => (0, usize::MAX),
        }
    }
}

/// One node of a semantic tree.
#[derive(Debug, Clone, PartialEq)]
pub enum SemNode {
    /// A function application over an ordered child tree.
    Func {
        def: SemanticRef,
        children: SemTree,
    },
    /// An argument leaf.
    Arg { def: SemanticRef },
}

/// An ordered sequence of sibling nodes.
pub type SemTree = Vec<SemNode>;

impl SemNode {
    pub fn def(&self) -> &SemanticRef {
        match self {
            SemNode::Func { def, .. } | SemNode::Arg { def } => def,
        }
    }

    pub fn name(&self) -> &SmolStr {
        &self.def().name
    }

    /// Build a childless function node (an unapplied LHS semantic).
    pub fn func(def: SemanticRef) -> Self {
        SemNode::Func {
            def,
            children: Vec::new(),
        }
    }

    /// Build an argument leaf.
    pub fn arg(def: SemanticRef) -> Self {
        SemNode::Arg { def }
    }
}
