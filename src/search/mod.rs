//! K-best enumeration over parse forests: heuristic annotation plus
//! best-first search.

mod astar;
mod conjugate;
mod heuristic;
mod list;

pub use astar::{ParseTree, SearchOptions};
pub use heuristic::{calc_min_costs, node_min};
pub use list::List;

use crate::parse::ParseForest;
use crate::table::StateTable;

/// Annotate the forest with per-sub minimum completion costs, then
/// return the K cheapest semantically- and textually-unique trees in
/// ascending cost order.
pub fn k_best(
    parsed: &mut ParseForest,
    table: &StateTable,
    opts: &SearchOptions,
) -> Vec<ParseTree> {
    calc_min_costs(&mut parsed.forest, parsed.root, table);
    astar::run(parsed, table, opts)
}
