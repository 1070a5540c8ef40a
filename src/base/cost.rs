//! Total ordering for rule and tree costs.

use std::cmp::Ordering;

/// Compare two costs with a total order.
///
/// Costs are finite `f64` values throughout the pipeline, but sorting
/// and heap ordering need a total order, not a partial one.
pub fn cmp_cost(a: f64, b: f64) -> Ordering {
    a.total_cmp(&b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_ordering() {
        assert_eq!(cmp_cost(0.0, 1.0), Ordering::Less);
        assert_eq!(cmp_cost(1.0, 1.0), Ordering::Equal);
        assert_eq!(cmp_cost(2.5, 1.0), Ordering::Greater);
    }

    #[test]
    fn test_epsilon_costs_are_distinct() {
        assert_eq!(cmp_cost(1e-7, 2e-7), Ordering::Less);
    }
}
