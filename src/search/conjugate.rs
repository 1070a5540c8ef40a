//! Search-time conjugation against the pending-properties stack.
//!
//! The stack holds the grammatical properties of every rule entered on
//! the path so far, newest first. A text fragment carrying an inflection
//! table scans the stack for the first entry that resolves it, trying
//! the entry's verb form, then person-number, then case. A matched
//! entry is consumed, except that a case match leaves a paired
//! person-number behind for the other branch.

use smol_str::SmolStr;
use tracing::warn;

use super::list::List;
use crate::base::GramProps;
use crate::grammar::{InflectionTable, Text, TextPiece};

/// Resolve a table against the stack. Returns the surface form and the
/// updated stack, or `None` when nothing matches.
pub fn resolve(
    stack: &List<GramProps>,
    table: &InflectionTable,
) -> Option<(SmolStr, List<GramProps>)> {
    let entries: Vec<GramProps> = stack.iter().copied().collect();
    for (index, entry) in entries.iter().enumerate() {
        if let Some(form) = entry.verb_form {
            if let Some(s) = table.for_verb_form(form) {
                return Some((s.clone(), without(&entries, index)));
            }
        }
        if let Some(pn) = entry.person_number {
            if let Some(s) = table.for_person_number(pn) {
                return Some((s.clone(), without(&entries, index)));
            }
        }
        if let Some(case) = entry.gram_case {
            if let Some(s) = table.for_gram_case(case) {
                let updated = if entry.person_number.is_some() {
                    // The person-number stays for the other branch.
                    let mut kept = entries.clone();
                    kept[index].gram_case = None;
                    List::from_slice(&kept)
                } else {
                    without(&entries, index)
                };
                return Some((s.clone(), updated));
            }
        }
    }
    None
}

fn without(entries: &[GramProps], index: usize) -> List<GramProps> {
    let mut kept: Vec<GramProps> = Vec::with_capacity(entries.len() - 1);
    kept.extend_from_slice(&entries[..index]);
    kept.extend_from_slice(&entries[index + 1..]);
    List::from_slice(&kept)
}

/// Append a display text to the accumulated output, conjugating each
/// table fragment. An unresolvable table is emitted verbatim.
pub fn append_text(out: &mut String, stack: &mut List<GramProps>, text: &Text) {
    for piece in text.pieces() {
        match piece {
            TextPiece::Str(s) => append_fragment(out, &s),
            TextPiece::Table(table) => match resolve(stack, &table) {
                Some((s, updated)) => {
                    *stack = updated;
                    append_fragment(out, &s);
                }
                None => {
                    warn!(table = %table, "conjugation failed; emitting table verbatim");
                    append_fragment(out, &table.to_string());
                }
            },
        }
    }
}

fn append_fragment(out: &mut String, fragment: &str) {
    if fragment.is_empty() {
        return;
    }
    out.push(' ');
    out.push_str(fragment);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{GramCase, PersonNumber, VerbForm};

    #[test]
    fn test_newest_entry_wins() {
        // The most recent push is scanned first: Past beats ThreeSg.
        let stack = List::new()
            .push(GramProps::default().with_person_number(PersonNumber::ThreeSg))
            .push(GramProps::default().with_verb_form(VerbForm::Past));
        let like = InflectionTable::verb("like", "likes", "liked");
        let (form, rest) = resolve(&stack, &like).unwrap();
        assert_eq!(form.as_str(), "liked");
        assert_eq!(rest.iter().count(), 1);
    }

    #[test]
    fn test_case_match_keeps_paired_person_number() {
        let stack = List::new().push(
            GramProps::default()
                .with_gram_case(GramCase::Nom)
                .with_person_number(PersonNumber::One),
        );
        let pronoun = InflectionTable::pronoun("I", "me");
        let (form, rest) = resolve(&stack, &pronoun).unwrap();
        assert_eq!(form.as_str(), "I");
        // The entry survives with only its person-number.
        let remaining = rest.head().unwrap();
        assert_eq!(remaining.person_number, Some(PersonNumber::One));
        assert_eq!(remaining.gram_case, None);
        // A later verb resolves against the kept person-number.
        let have = InflectionTable::present("have", "has");
        let (form, rest) = resolve(&rest, &have).unwrap();
        assert_eq!(form.as_str(), "have");
        assert!(rest.is_empty());
    }

    #[test]
    fn test_nonmatching_entries_are_skipped() {
        let stack = List::new()
            .push(GramProps::default().with_person_number(PersonNumber::Pl))
            .push(GramProps::default().with_verb_form(VerbForm::Past));
        // Head entry is Past; "have" has no past form, so the older
        // plural entry resolves it.
        let have = InflectionTable::present("have", "has");
        let (form, _) = resolve(&stack, &have).unwrap();
        assert_eq!(form.as_str(), "have");
    }

    #[test]
    fn test_unresolved_table_emitted_verbatim() {
        let mut out = String::new();
        let mut stack = List::new();
        append_text(
            &mut out,
            &mut stack,
            &Text::Table(InflectionTable::present("have", "has")),
        );
        assert!(out.contains("have"));
        assert!(out.contains("{"));
    }
}
