//! The bundled demo grammar: English queries over a GitHub-like domain.
//!
//! Covers users, repositories, issues, pull requests, and followers,
//! and exercises the whole pipeline: pronoun case tables, verb
//! inflection, insertion costs, empty-string elision, stop-words,
//! multi-token terminals, an entity category, integer bounds, and a
//! transposition.

use std::sync::Arc;

use crate::base::{GramCase, GramProps, PersonNumber, VerbForm};
use crate::grammar::{Grammar, GrammarError, InflectionTable, RuleOpts, Text};
use crate::semantics::SemNode;

/// Queries exercised by the console's `.test` command.
pub const TEST_QUERIES: &[&str] = &[
    "repos I have liked",
    "repos I like",
    "repos liked by me and my followers",
    "my repos",
    "issues with 22 comments",
    "people who follow me and I follow",
    "repos Danny likes",
    "my pull requests",
];

/// Build the demo grammar.
pub fn grammar() -> Result<Grammar, GrammarError> {
    let mut g = Grammar::new();

    // Semantics.
    let me_def = g.semantic_arg("me", 0.0)?;
    let intersect_def = g.semantic_fn("intersect", 0.0, 1, 16, false)?;
    let not_def = g.semantic_fn("not", 0.5, 1, 1, false)?;
    let repos_liked_def = g.semantic_fn("repos-liked", 0.5, 1, 1, false)?;
    let repos_created_def = g.semantic_fn("repos-created", 0.5, 1, 1, false)?;
    let followers_def = g.semantic_fn("followers", 0.5, 1, 1, false)?;
    let users_followed_def = g.semantic_fn("users-followed", 0.5, 1, 1, false)?;
    let comment_count_def = g.semantic_fn("issues-comment-count", 0.5, 1, 1, true)?;
    let prs_created_def = g.semantic_fn("pull-requests-created", 0.5, 1, 1, false)?;

    let me = vec![SemNode::arg(Arc::clone(&me_def))];
    let intersect = vec![SemNode::func(Arc::clone(&intersect_def))];
    let repos_liked = vec![SemNode::func(Arc::clone(&repos_liked_def))];
    let repos_created = vec![SemNode::func(Arc::clone(&repos_created_def))];
    let followers_sem = vec![SemNode::func(Arc::clone(&followers_def))];
    let users_followed_sem = vec![SemNode::func(Arc::clone(&users_followed_def))];
    let comment_count = vec![SemNode::func(Arc::clone(&comment_count_def))];
    let prs_created = vec![SemNode::func(Arc::clone(&prs_created_def))];
    // not(users-followed(·)): negation wraps the still-open function.
    let not_followed = vec![SemNode::Func {
        def: Arc::clone(&not_def),
        children: vec![SemNode::func(Arc::clone(&users_followed_def))],
    }];

    // Entities.
    let user = g.entity_category("user", &["Danny", "Aral", "John von Neumann"])?;

    // Shared vocabulary.
    let pronoun = InflectionTable::pronoun("I", "me");
    let like_table = InflectionTable::verb("like", "likes", "liked");
    let follow_table = InflectionTable::verb("follow", "follows", "followed");
    let have_table = InflectionTable::present("have", "has");

    let one_sg = g.nonterminal(&["1", "sg"])?;
    g.add_rule(
        &one_sg,
        RuleOpts::terminal("i")
            .with_text(Text::Table(pronoun.clone()))
            .with_semantic(me.clone()),
    )?;
    g.add_rule(
        &one_sg,
        RuleOpts::terminal("me")
            .with_text(Text::Table(pronoun))
            .with_semantic(me.clone()),
    )?;

    let user_ent = g.nonterminal(&["user", "entity"])?;
    g.add_rule(&user_ent, RuleOpts::placeholder(&user))?;

    let poss_det = g.nonterminal(&["poss", "det"])?;
    g.add_rule(&poss_det, RuleOpts::terminal("my").with_semantic(me.clone()))?;

    let followers_noun = g.nonterminal(&["followers", "noun"])?;
    g.add_rule(&followers_noun, RuleOpts::terminal("followers"))?;

    let my_followers = g.nonterminal(&["my", "followers"])?;
    g.add_rule(
        &my_followers,
        RuleOpts::binary(&poss_det, &followers_noun).with_semantic(followers_sem.clone()),
    )?;

    // Subjects and objects. A nominative subject keeps its
    // person-number on the stack for the verb that follows.
    let nom_users = g.nonterminal(&["nom", "users"])?;
    g.add_rule(
        &nom_users,
        RuleOpts::unary(&one_sg).with_gram_props(
            GramProps::default()
                .with_gram_case(GramCase::Nom)
                .with_person_number(PersonNumber::One),
        ),
    )?;
    g.add_rule(
        &nom_users,
        RuleOpts::unary(&user_ent)
            .with_gram_props(GramProps::default().with_person_number(PersonNumber::ThreeSg)),
    )?;
    g.add_rule(
        &nom_users,
        RuleOpts::unary(&my_followers)
            .with_gram_props(GramProps::default().with_person_number(PersonNumber::Pl)),
    )?;

    let obj_users = g.nonterminal(&["obj", "users"])?;
    g.add_rule(
        &obj_users,
        RuleOpts::unary(&one_sg)
            .with_gram_props(GramProps::default().with_gram_case(GramCase::Obj)),
    )?;
    g.add_rule(&obj_users, RuleOpts::unary(&user_ent))?;
    g.add_rule(&obj_users, RuleOpts::unary(&my_followers))?;

    let and = g.nonterminal(&["and"])?;
    g.add_rule(&and, RuleOpts::terminal("and"))?;

    let obj_users_conj = g.nonterminal(&["obj", "users", "conj"])?;
    let and_obj = g.binary_rule(RuleOpts::binary(&and, &obj_users_conj))?;
    g.add_rule(&obj_users_conj, RuleOpts::unary(&obj_users))?;
    g.add_rule(&obj_users_conj, RuleOpts::binary(&obj_users, &and_obj))?;

    // Verbs.
    let like_term = g.nonterminal(&["like", "term"])?;
    for form in ["like", "likes", "liked"] {
        let mut opts = RuleOpts::terminal(form).with_text(Text::Table(like_table.clone()));
        if form == "like" {
            opts = opts.with_insertion_cost(1.2);
        }
        g.add_rule(&like_term, opts)?;
    }

    let have_term = g.nonterminal(&["have", "term"])?;
    g.add_rule(
        &have_term,
        RuleOpts::terminal("have")
            .with_text(Text::Table(have_table.clone()))
            .with_insertion_cost(0.5),
    )?;
    g.add_rule(
        &have_term,
        RuleOpts::terminal("has").with_text(Text::Table(have_table)),
    )?;

    let follow_term = g.nonterminal(&["follow", "term"])?;
    for form in ["follow", "follows", "followed"] {
        g.add_rule(
            &follow_term,
            RuleOpts::terminal(form).with_text(Text::Table(follow_table.clone())),
        )?;
    }

    // "I like" / "I have liked".
    let like_complex = g.nonterminal(&["like", "complex"])?;
    g.add_rule(&like_complex, RuleOpts::unary(&like_term))?;
    g.add_rule(
        &like_complex,
        RuleOpts::binary(&have_term, &like_term)
            .with_gram_props(GramProps::default().with_verb_form(VerbForm::Past)),
    )?;

    // Repository queries.
    let repos_head = g.nonterminal(&["repos", "head"])?;
    g.add_rule(&repos_head, RuleOpts::terminal("repos"))?;
    g.add_rule(&repos_head, RuleOpts::terminal("repositories"))?;

    let liked_by = g.nonterminal(&["liked", "by"])?;
    g.add_rule(&liked_by, RuleOpts::terminal("liked by"))?;

    let repos_clause = g.nonterminal(&["repos", "clause"])?;
    g.add_rule(
        &repos_clause,
        RuleOpts::binary(&nom_users, &like_complex).with_semantic(repos_liked.clone()),
    )?;
    g.add_rule(
        &repos_clause,
        RuleOpts::binary(&liked_by, &obj_users_conj).with_semantic(repos_liked),
    )?;

    let repos_clauses = g.nonterminal(&["repos", "clauses"])?;
    let and_repos = g.binary_rule(RuleOpts::binary(&and, &repos_clauses))?;
    g.add_rule(&repos_clauses, RuleOpts::unary(&repos_clause))?;
    g.add_rule(&repos_clauses, RuleOpts::binary(&repos_clause, &and_repos))?;

    let repos_query = g.nonterminal(&["repos", "query"])?;
    g.add_rule(
        &repos_query,
        RuleOpts::binary(&repos_head, &repos_clauses).with_semantic(intersect.clone()),
    )?;
    g.add_rule(
        &repos_query,
        RuleOpts::binary(&poss_det, &repos_head).with_semantic(repos_created),
    )?;

    // People queries.
    let people_head = g.nonterminal(&["people", "head"])?;
    g.add_rule(&people_head, RuleOpts::terminal("people"))?;
    g.add_rule(&people_head, RuleOpts::terminal("users"))?;

    let who = g.nonterminal(&["who"])?;
    g.add_rule(&who, RuleOpts::terminal("who"))?;
    g.add_rule(&who, RuleOpts::terminal("that"))?;

    let do_not = g.nonterminal(&["do", "not"])?;
    g.add_rule(
        &do_not,
        RuleOpts::terminal("do not").with_insertion_cost(1.0),
    )?;

    let follow_obj = g.binary_rule(RuleOpts::binary(&follow_term, &obj_users))?;
    let neg_follow = g.binary_rule(RuleOpts::binary(&do_not, &follow_term))?;

    let people_clause = g.nonterminal(&["people", "clause"])?;
    g.add_rule(
        &people_clause,
        RuleOpts::binary(&who, &follow_obj)
            .with_semantic(followers_sem)
            .with_gram_props(GramProps::default().with_person_number(PersonNumber::Pl)),
    )?;
    g.add_rule(
        &people_clause,
        RuleOpts::binary(&nom_users, &follow_term).with_semantic(users_followed_sem),
    )?;
    g.add_rule(
        &people_clause,
        RuleOpts::binary(&nom_users, &neg_follow).with_semantic(not_followed),
    )?;

    let people_clauses = g.nonterminal(&["people", "clauses"])?;
    let and_people = g.binary_rule(RuleOpts::binary(&and, &people_clauses))?;
    g.add_rule(&people_clauses, RuleOpts::unary(&people_clause))?;
    g.add_rule(
        &people_clauses,
        RuleOpts::binary(&people_clause, &and_people),
    )?;

    let users_query = g.nonterminal(&["users", "query"])?;
    g.add_rule(
        &users_query,
        RuleOpts::binary(&people_head, &people_clauses).with_semantic(intersect.clone()),
    )?;

    // Issue queries.
    let issues_head = g.nonterminal(&["issues", "head"])?;
    g.add_rule(&issues_head, RuleOpts::terminal("issues"))?;

    let with = g.nonterminal(&["with"])?;
    g.add_rule(&with, RuleOpts::terminal("with"))?;

    let int_count = g.nonterminal(&["int", "count"])?;
    let int = g.int_sym();
    g.add_rule(
        &int_count,
        RuleOpts::placeholder(&int).with_int_bounds(0, 9_999_999),
    )?;

    let comments_noun = g.nonterminal(&["comments", "noun"])?;
    g.add_rule(&comments_noun, RuleOpts::terminal("comments"))?;

    let count_comments = g.nonterminal(&["count", "comments"])?;
    g.add_rule(
        &count_comments,
        RuleOpts::binary(&int_count, &comments_noun).with_transposition_cost(1.0),
    )?;

    let issues_clause = g.nonterminal(&["issues", "clause"])?;
    g.add_rule(
        &issues_clause,
        RuleOpts::binary(&with, &count_comments).with_semantic(comment_count),
    )?;

    let issues_clauses = g.nonterminal(&["issues", "clauses"])?;
    let and_issues = g.binary_rule(RuleOpts::binary(&and, &issues_clauses))?;
    g.add_rule(&issues_clauses, RuleOpts::unary(&issues_clause))?;
    g.add_rule(
        &issues_clauses,
        RuleOpts::binary(&issues_clause, &and_issues),
    )?;

    let issues_query = g.nonterminal(&["issues", "query"])?;
    g.add_rule(
        &issues_query,
        RuleOpts::binary(&issues_head, &issues_clauses).with_semantic(intersect),
    )?;

    // Pull-request queries.
    let prs_head = g.nonterminal(&["prs", "head"])?;
    g.add_rule(&prs_head, RuleOpts::terminal("pull requests"))?;
    g.add_rule(&prs_head, RuleOpts::terminal("prs"))?;

    let prs_query = g.nonterminal(&["prs", "query"])?;
    g.add_rule(
        &prs_query,
        RuleOpts::binary(&poss_det, &prs_head).with_semantic(prs_created),
    )?;

    // Start: an optional courtesy prefix that displays nothing.
    let query = g.nonterminal(&["query"])?;
    g.add_rule(&query, RuleOpts::unary(&repos_query))?;
    g.add_rule(&query, RuleOpts::unary(&users_query))?;
    g.add_rule(&query, RuleOpts::unary(&issues_query))?;
    g.add_rule(&query, RuleOpts::unary(&prs_query))?;

    let show_opt = g.nonterminal(&["show", "opt"])?;
    g.add_rule(&show_opt, RuleOpts::terminal("show me").with_text(Text::str("")))?;
    let empty = g.empty_sym();
    g.add_rule(&show_opt, RuleOpts::placeholder(&empty))?;

    let start = g.nonterminal(&["start"])?;
    g.add_rule(&start, RuleOpts::binary(&show_opt, &query))?;
    g.set_start(&start);

    Ok(g)
}
