//! Display text: plain strings, inflection tables, and mixed sequences.
//!
//! Text carrying no table is already conjugated; text carrying a table
//! must be conjugated against grammatical properties before emission.
//! Edit-rule generation composes multi-fragment sequences when several
//! insertions contribute text to one rule.

use std::fmt;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::base::{GramCase, PersonNumber, VerbForm};

/// Finite mapping from inflection key to surface string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InflectionTable {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub one: Option<SmolStr>,
    #[serde(rename = "threeSg", skip_serializing_if = "Option::is_none")]
    pub three_sg: Option<SmolStr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pl: Option<SmolStr>,
    #[serde(rename = "oneOrPl", skip_serializing_if = "Option::is_none")]
    pub one_or_pl: Option<SmolStr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub past: Option<SmolStr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nom: Option<SmolStr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub obj: Option<SmolStr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plain: Option<SmolStr>,
}

impl InflectionTable {
    /// Table for a verb with distinct third-person-singular and past
    /// forms ("like" / "likes" / "liked").
    pub fn verb(base: &str, three_sg: &str, past: &str) -> Self {
        Self {
            one_or_pl: Some(base.into()),
            three_sg: Some(three_sg.into()),
            past: Some(past.into()),
            ..Self::default()
        }
    }

    /// Table for a present-only verb ("have" / "has").
    pub fn present(base: &str, three_sg: &str) -> Self {
        Self {
            one_or_pl: Some(base.into()),
            three_sg: Some(three_sg.into()),
            ..Self::default()
        }
    }

    /// Table for a pronoun with case forms ("I" / "me").
    pub fn pronoun(nom: &str, obj: &str) -> Self {
        Self {
            nom: Some(nom.into()),
            obj: Some(obj.into()),
            ..Self::default()
        }
    }

    pub fn for_verb_form(&self, form: VerbForm) -> Option<&SmolStr> {
        match form {
            VerbForm::Past => self.past.as_ref(),
        }
    }

    pub fn for_person_number(&self, pn: PersonNumber) -> Option<&SmolStr> {
        let exact = match pn {
            PersonNumber::One => self.one.as_ref().or(self.one_or_pl.as_ref()),
            PersonNumber::ThreeSg => self.three_sg.as_ref(),
            PersonNumber::Pl => self.pl.as_ref().or(self.one_or_pl.as_ref()),
        };
        exact.or(self.plain.as_ref())
    }

    pub fn for_gram_case(&self, case: GramCase) -> Option<&SmolStr> {
        match case {
            GramCase::Nom => self.nom.as_ref(),
            GramCase::Obj => self.obj.as_ref(),
        }
    }
}

impl fmt::Display for InflectionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pairs = [
            ("one", &self.one),
            ("threeSg", &self.three_sg),
            ("pl", &self.pl),
            ("oneOrPl", &self.one_or_pl),
            ("past", &self.past),
            ("nom", &self.nom),
            ("obj", &self.obj),
            ("plain", &self.plain),
        ];
        write!(f, "{{")?;
        let mut first = true;
        for (key, value) in pairs {
            if let Some(value) = value {
                if !first {
                    write!(f, ",")?;
                }
                write!(f, "{key}:{value}")?;
                first = false;
            }
        }
        write!(f, "}}")
    }
}

/// One fragment of a mixed text sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextPiece {
    Str(SmolStr),
    Table(InflectionTable),
}

/// Display text attached to a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Text {
    Str(SmolStr),
    Table(InflectionTable),
    Seq(Vec<TextPiece>),
}

impl Text {
    pub fn str(s: &str) -> Self {
        Text::Str(s.into())
    }

    /// View as a fragment sequence regardless of variant.
    pub fn pieces(&self) -> Vec<TextPiece> {
        match self {
            Text::Str(s) => vec![TextPiece::Str(s.clone())],
            Text::Table(t) => vec![TextPiece::Table(t.clone())],
            Text::Seq(pieces) => pieces.clone(),
        }
    }

    /// Collapse a fragment sequence back into the smallest variant;
    /// `None` for an empty sequence.
    pub fn from_pieces(mut pieces: Vec<TextPiece>) -> Option<Text> {
        match pieces.len() {
            0 => None,
            1 => Some(match pieces.remove(0) {
                TextPiece::Str(s) => Text::Str(s),
                TextPiece::Table(t) => Text::Table(t),
            }),
            _ => Some(Text::Seq(pieces)),
        }
    }
}

/// Coalesce adjacent string fragments with single-space separators.
pub fn coalesce(pieces: Vec<TextPiece>) -> Vec<TextPiece> {
    let mut out: Vec<TextPiece> = Vec::with_capacity(pieces.len());
    for piece in pieces {
        match (out.last_mut(), piece) {
            (Some(TextPiece::Str(prev)), TextPiece::Str(next)) => {
                let mut joined = prev.to_string();
                joined.push(' ');
                joined.push_str(&next);
                *prev = joined.into();
            }
            (_, piece) => out.push(piece),
        }
    }
    out
}
