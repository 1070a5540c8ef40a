//! Per-reduction rule properties.

use crate::base::GramProps;
use crate::grammar::{Rule, Text};
use crate::semantics::SemTree;

/// The lean per-rule payload attached to reductions.
///
/// Only the cost is always meaningful; everything else defaults when
/// the source rule did not set it.
#[derive(Debug, Clone, Default)]
pub struct RuleProps {
    pub cost: f64,
    pub text: Option<Text>,
    pub semantic: Option<SemTree>,
    pub semantic_is_rhs: bool,
    pub inserted_semantic: Option<SemTree>,
    pub insertion_idx: Option<u8>,
    pub gram_props: GramProps,
    pub int_min: Option<i64>,
    pub int_max: Option<i64>,
}

impl RuleProps {
    /// Extract the runtime-relevant fields of a grammar rule.
    pub fn from_rule(rule: &Rule) -> Self {
        Self {
            cost: rule.cost,
            text: rule.text.clone(),
            semantic: rule.semantic.clone(),
            semantic_is_rhs: rule.semantic_is_rhs,
            inserted_semantic: rule.inserted_semantic.clone(),
            insertion_idx: rule.insertion_idx,
            gram_props: rule.gram_props,
            int_min: rule.int_min,
            int_max: rule.int_max,
        }
    }

    /// True when an integer value satisfies the rule's bounds.
    pub fn int_in_bounds(&self, value: i64) -> bool {
        self.int_min.is_none_or(|min| value >= min)
            && self.int_max.is_none_or(|max| value <= max)
    }
}
