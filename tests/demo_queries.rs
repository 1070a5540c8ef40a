//! End-to-end scenarios over the bundled demo grammar.

use once_cell::sync::Lazy;
use rstest::rstest;

use parlance::session::{compile, ParseOutcome, Session};
use parlance::{demo, ParseTree, SearchOptions};

static SESSION: Lazy<Session> = Lazy::new(|| {
    let grammar = demo::grammar().expect("demo grammar builds");
    compile(grammar).expect("demo grammar compiles")
});

fn trees(query: &str) -> Vec<ParseTree> {
    match SESSION.parse(query, &SearchOptions::default()) {
        ParseOutcome::Trees(trees) => trees,
        other => panic!("expected trees for {query:?}, got {other:?}"),
    }
}

fn best(query: &str) -> ParseTree {
    trees(query).remove(0)
}

#[rstest]
#[case("repos I have liked", "repos-liked(me)")]
#[case("repos I like", "repos-liked(me)")]
#[case("my repos", "repos-created(me)")]
#[case("issues with 22 comments", "issues-comment-count(22)")]
#[case("my pull requests", "pull-requests-created(me)")]
#[case("repos Danny likes", "repos-liked(0)")]
fn best_semantic_per_query(#[case] query: &str, #[case] expected: &str) {
    assert_eq!(best(query).semantic_str, expected);
}

#[test]
fn relative_clause_with_auxiliary() {
    let tree = best("repos I have liked");
    assert_eq!(tree.semantic_str, "repos-liked(me)");
    assert_eq!(tree.text, "repos I have liked");
}

#[test]
fn present_tense_is_cheaper_than_auxiliary() {
    let present = best("repos I like");
    let past = best("repos I have liked");
    assert_eq!(present.semantic_str, "repos-liked(me)");
    assert_eq!(present.text, "repos I like");
    assert!(present.cost < past.cost);
}

#[test]
fn passive_conjunction_clones_single_param_function() {
    let tree = best("repos liked by me and my followers");
    assert_eq!(
        tree.semantic_str,
        "intersect(repos-liked(me),repos-liked(followers(me)))"
    );
    assert_eq!(tree.text, "repos liked by me and my followers");
}

#[test]
fn possessive_determiner() {
    let tree = best("my repos");
    assert_eq!(tree.semantic_str, "repos-created(me)");
    assert_eq!(tree.text, "my repos");
}

#[test]
fn integer_placeholder_becomes_argument() {
    let tree = best("issues with 22 comments");
    assert_eq!(tree.semantic_str, "issues-comment-count(22)");
    assert_eq!(tree.text, "issues with 22 comments");
}

#[test]
fn conjoined_clauses_intersect() {
    let all = trees("people who follow me and I follow");
    assert!(all.len() >= 2, "expected at least two trees");
    assert_eq!(
        all[0].semantic_str,
        "intersect(followers(me),users-followed(me))"
    );
    assert_eq!(all[0].text, "people who follow me and I follow");
    assert!(all[1].cost > all[0].cost);
}

#[test]
fn negated_variant_surfaces_at_higher_cost() {
    let all = trees("people who follow me and I follow");
    let negated = all
        .iter()
        .find(|t| t.semantic_str.contains("not(users-followed(me))"))
        .expect("negated reading present");
    assert!(negated.text.contains("do not"));
}

#[test]
fn trees_are_unique_and_cost_ordered() {
    for query in demo::TEST_QUERIES {
        let all = trees(query);
        for pair in all.windows(2) {
            assert!(
                pair[0].cost <= pair[1].cost,
                "costs not monotone for {query:?}"
            );
        }
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a.semantic_str, b.semantic_str, "duplicate semantics");
                assert_ne!(a.text, b.text, "duplicate display text");
            }
        }
    }
}

#[test]
fn auxiliary_inserted_for_bare_past() {
    // "repos I liked" has a cheap present-tense reading; the
    // auxiliary-insertion reading shares its semantic and is deduped.
    let tree = best("repos i liked");
    assert_eq!(tree.semantic_str, "repos-liked(me)");
    assert_eq!(tree.text, "repos I like");
}

#[test]
fn person_number_corrects_verb_agreement() {
    // "likes" with a first-person subject conjugates back to "like".
    let tree = best("repos i likes");
    assert_eq!(tree.text, "repos I like");
}

#[test]
fn plural_subject_keeps_have() {
    let tree = best("repos my followers have liked");
    assert_eq!(tree.semantic_str, "repos-liked(followers(me))");
    assert_eq!(tree.text, "repos my followers have liked");
}

#[test]
fn deferred_insertion_conjugates_against_first_branch() {
    // The verb is inserted on the right; its inflection table resolves
    // only after the subject realizes its person-number.
    let singular = best("repos danny");
    assert_eq!(singular.text, "repos Danny likes");
    let first_person = best("repos i");
    assert_eq!(first_person.text, "repos I like");
}

#[test]
fn entity_match_spans_three_tokens() {
    let tree = best("repos john von neumann likes");
    assert_eq!(tree.text, "repos John von Neumann likes");
    assert_eq!(tree.semantic_str, "repos-liked(2)");
}

#[test]
fn stop_word_prefix_displays_nothing() {
    let tree = best("show me my repos");
    assert_eq!(tree.semantic_str, "repos-created(me)");
    assert_eq!(tree.text, "my repos");
}

#[test]
fn transposed_count_displays_in_original_order() {
    let straight = best("issues with 22 comments");
    let swapped = best("issues with comments 22");
    assert_eq!(swapped.semantic_str, "issues-comment-count(22)");
    assert_eq!(swapped.text, "issues with 22 comments");
    assert!(swapped.cost > straight.cost);
}

#[test]
fn multi_token_head_noun() {
    let tree = best("my pull requests");
    assert_eq!(tree.semantic_str, "pull-requests-created(me)");
    assert_eq!(tree.text, "my pull requests");
}

#[test]
fn forbidden_multiple_rejects_conjoined_counts() {
    let outcome = SESSION.parse(
        "issues with 2 comments and 3 comments",
        &SearchOptions::default(),
    );
    assert!(
        matches!(outcome, ParseOutcome::NoLegalTrees),
        "expected NoLegalTrees, got {outcome:?}"
    );
}

#[test]
fn duplicate_semantics_reject_conjunction() {
    let outcome = SESSION.parse("repos liked by me and me", &SearchOptions::default());
    assert!(outcome.is_failure());
}

#[test]
fn unknown_vocabulary_is_unparsable() {
    let outcome = SESSION.parse("frobnicate the widgets", &SearchOptions::default());
    assert!(matches!(outcome, ParseOutcome::Unparsable));
}

#[test]
fn empty_query_is_unparsable() {
    let outcome = SESSION.parse("", &SearchOptions::default());
    assert!(matches!(outcome, ParseOutcome::Unparsable));
}

#[test]
fn k_limits_returned_trees() {
    let opts = SearchOptions {
        k: 1,
        ..SearchOptions::default()
    };
    match SESSION.parse("people who follow me and I follow", &opts) {
        ParseOutcome::Trees(trees) => assert_eq!(trees.len(), 1),
        other => panic!("expected trees, got {other:?}"),
    }
}

#[test]
fn heuristic_lower_bounds_accepted_cost() {
    // The start node's minimum completion estimate never exceeds the
    // cost of the best accepted tree.
    let table = SESSION.table();
    for query in demo::TEST_QUERIES {
        let mut parsed = parlance::parse::parse(table, query).unwrap();
        parlance::search::calc_min_costs(&mut parsed.forest, parsed.root, table);
        let root_min = parlance::search::node_min(&parsed.forest, table, parsed.root);
        let trees = parlance::search::k_best(&mut parsed, table, &SearchOptions::default());
        assert!(!trees.is_empty());
        assert!(
            root_min <= trees[0].cost + 1e-9,
            "inadmissible heuristic for {query:?}: {root_min} > {}",
            trees[0].cost
        );
    }
}

#[test]
fn integer_out_of_bounds_fails() {
    // The demo grammar bounds comment counts below ten million.
    let outcome = SESSION.parse("issues with 99999999 comments", &SearchOptions::default());
    assert!(outcome.is_failure());
}
