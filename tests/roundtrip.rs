//! Grammar JSON round trip: serializing the augmented grammar and
//! rebuilding must yield an equivalent state table and identical parse
//! results.

use parlance::edits::generate_edit_rules;
use parlance::session::{compile, ParseOutcome};
use parlance::table::StateTable;
use parlance::{demo, interchange, SearchOptions};

fn augmented_demo() -> parlance::Grammar {
    let mut grammar = demo::grammar().unwrap();
    generate_edit_rules(&mut grammar);
    grammar
}

/// Shifts and reductions of a state, by symbol name, for comparison
/// across independently built tables.
fn state_signature(table: &StateTable, index: usize) -> (Vec<(String, usize)>, Vec<String>) {
    let state = &table.states[index];
    let shifts = state
        .shifts
        .iter()
        .map(|(sym, target)| (table.symbols[*sym].name.to_string(), *target))
        .collect();
    let mut reds: Vec<String> = state
        .reds
        .iter()
        .map(|red| {
            let costs: Vec<String> = table
                .props(red)
                .iter()
                .map(|p| format!("{:.9}", p.cost))
                .collect();
            format!(
                "{} {} [{}]",
                table.symbols[red.lhs].name,
                if red.binary { "binary" } else { "unary" },
                costs.join(",")
            )
        })
        .collect();
    reds.sort();
    (shifts, reds)
}

#[test]
fn state_tables_are_equivalent_after_reload() {
    let original = augmented_demo();
    let json = interchange::to_json(&original).unwrap();
    let reloaded = interchange::from_json(&json).unwrap();

    let table_a = StateTable::build(&original).unwrap();
    let table_b = StateTable::build(&reloaded).unwrap();

    assert_eq!(table_a.states.len(), table_b.states.len());
    for index in 0..table_a.states.len() {
        assert_eq!(
            state_signature(&table_a, index),
            state_signature(&table_b, index),
            "state {index} differs after round trip"
        );
        assert_eq!(
            table_a.states[index].is_final,
            table_b.states[index].is_final
        );
    }
}

#[test]
fn reloaded_grammar_answers_queries_identically() {
    let json = interchange::to_json(&augmented_demo()).unwrap();
    let reloaded = interchange::from_json(&json).unwrap();
    let session = compile(reloaded).unwrap();
    let fresh = compile(demo::grammar().unwrap()).unwrap();

    for query in demo::TEST_QUERIES {
        let a = session.parse(query, &SearchOptions::default());
        let b = fresh.parse(query, &SearchOptions::default());
        match (a, b) {
            (ParseOutcome::Trees(ta), ParseOutcome::Trees(tb)) => {
                assert_eq!(ta.len(), tb.len(), "tree count differs for {query:?}");
                for (x, y) in ta.iter().zip(tb.iter()) {
                    assert_eq!(x.text, y.text);
                    assert_eq!(x.semantic_str, y.semantic_str);
                    assert!((x.cost - y.cost).abs() < 1e-9);
                }
            }
            (a, b) => panic!("outcomes differ for {query:?}: {a:?} vs {b:?}"),
        }
    }
}

#[test]
fn save_and_load_through_the_filesystem() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("grammar.json");
    let grammar = augmented_demo();
    interchange::save(&grammar, &path).unwrap();
    let reloaded = interchange::load(&path).unwrap();
    assert_eq!(
        grammar.nonterminals().count(),
        reloaded.nonterminals().count()
    );
    assert!(StateTable::build(&reloaded).is_ok());
}
