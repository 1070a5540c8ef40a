//! Generation-time conjugation of candidate text.
//!
//! During edit-rule generation a rule's own grammatical properties are
//! applied to the text it inserts. Unresolvable inflections are left as
//! tables to be resolved at search time against the conjugation stack.

use smol_str::SmolStr;

use crate::base::GramProps;
use crate::grammar::{coalesce, InflectionTable, TextPiece};

/// Conjugate a fragment sequence against a rule's properties, trying
/// grammatical case, then verb form, then person-number. For unary
/// rules only the case may apply.
pub fn conjugate_pieces(pieces: Vec<TextPiece>, props: &GramProps, unary: bool) -> Vec<TextPiece> {
    let resolved = pieces
        .into_iter()
        .map(|piece| match piece {
            TextPiece::Str(s) => TextPiece::Str(s),
            TextPiece::Table(table) => match resolve(&table, props, unary) {
                Some(s) => TextPiece::Str(s),
                None => TextPiece::Table(table),
            },
        })
        .collect();
    coalesce(resolved)
}

fn resolve(table: &InflectionTable, props: &GramProps, unary: bool) -> Option<SmolStr> {
    if let Some(case) = props.gram_case {
        if let Some(s) = table.for_gram_case(case) {
            return Some(s.clone());
        }
    }
    if unary {
        return None;
    }
    if let Some(form) = props.verb_form {
        if let Some(s) = table.for_verb_form(form) {
            return Some(s.clone());
        }
    }
    if let Some(pn) = props.person_number {
        if let Some(s) = table.for_person_number(pn) {
            return Some(s.clone());
        }
    }
    None
}

/// Canonical key for a fragment sequence, used to deduplicate insertion
/// candidates by display text.
pub fn text_key(pieces: &[TextPiece]) -> String {
    let mut key = String::new();
    for piece in pieces {
        if !key.is_empty() {
            key.push(' ');
        }
        match piece {
            TextPiece::Str(s) => key.push_str(s),
            TextPiece::Table(t) => key.push_str(&t.to_string()),
        }
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{PersonNumber, VerbForm};

    #[test]
    fn test_verb_form_resolves_before_person_number() {
        let props = GramProps::default()
            .with_verb_form(VerbForm::Past)
            .with_person_number(PersonNumber::ThreeSg);
        let pieces = conjugate_pieces(
            vec![TextPiece::Table(InflectionTable::verb(
                "like", "likes", "liked",
            ))],
            &props,
            false,
        );
        assert_eq!(pieces, vec![TextPiece::Str("liked".into())]);
    }

    #[test]
    fn test_unresolved_table_is_kept() {
        let props = GramProps::default().with_verb_form(VerbForm::Past);
        let have = InflectionTable::present("have", "has");
        let pieces = conjugate_pieces(vec![TextPiece::Table(have.clone())], &props, false);
        assert_eq!(pieces, vec![TextPiece::Table(have)]);
    }

    #[test]
    fn test_unary_rules_only_apply_case() {
        let props = GramProps::default().with_person_number(PersonNumber::Pl);
        let have = InflectionTable::present("have", "has");
        let pieces = conjugate_pieces(vec![TextPiece::Table(have.clone())], &props, true);
        assert_eq!(pieces, vec![TextPiece::Table(have)]);
    }
}
