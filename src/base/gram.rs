//! Grammatical property keys.
//!
//! Rules may carry a verb form, a person-number, and a grammatical case.
//! These drive conjugation: a display text carrying an inflection table
//! is resolved against the properties of the rules above it.

use serde::{Deserialize, Serialize};

/// Verb form selected by a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VerbForm {
    #[serde(rename = "past")]
    Past,
}

/// Person-number agreement selected by a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PersonNumber {
    /// First person singular ("I have")
    #[serde(rename = "one")]
    One,
    /// Third person singular ("she has")
    #[serde(rename = "threeSg")]
    ThreeSg,
    /// Plural ("they have")
    #[serde(rename = "pl")]
    Pl,
}

/// Grammatical case selected by a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GramCase {
    #[serde(rename = "nom")]
    Nom,
    #[serde(rename = "obj")]
    Obj,
}

/// The grammatical properties a rule may carry.
///
/// A property triple is pushed onto the search's conjugation stack when
/// the rule's derivation is entered, and consumed by the first display
/// text whose inflection table it resolves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GramProps {
    #[serde(rename = "verbForm", skip_serializing_if = "Option::is_none")]
    pub verb_form: Option<VerbForm>,
    #[serde(rename = "personNumber", skip_serializing_if = "Option::is_none")]
    pub person_number: Option<PersonNumber>,
    #[serde(rename = "gramCase", skip_serializing_if = "Option::is_none")]
    pub gram_case: Option<GramCase>,
}

impl GramProps {
    /// True if no property is set.
    pub fn is_empty(&self) -> bool {
        self.verb_form.is_none() && self.person_number.is_none() && self.gram_case.is_none()
    }

    pub fn with_verb_form(mut self, form: VerbForm) -> Self {
        self.verb_form = Some(form);
        self
    }

    pub fn with_person_number(mut self, pn: PersonNumber) -> Self {
        self.person_number = Some(pn);
        self
    }

    pub fn with_gram_case(mut self, case: GramCase) -> Self {
        self.gram_case = Some(case);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_props() {
        assert!(GramProps::default().is_empty());
        assert!(!GramProps::default().with_gram_case(GramCase::Nom).is_empty());
    }

    #[test]
    fn test_serde_keys() {
        let props = GramProps::default()
            .with_verb_form(VerbForm::Past)
            .with_person_number(PersonNumber::ThreeSg);
        let json = serde_json::to_string(&props).unwrap();
        assert_eq!(json, r#"{"verbForm":"past","personNumber":"threeSg"}"#);
    }
}
