//! Typed DTOs for the compiled-grammar file format.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use super::InterchangeError;
use crate::base::GramProps;
use crate::grammar::{
    Entity, Grammar, Rule, Sym, Text, EMPTY_SYMBOL, INT_SYMBOL,
};
use crate::semantics::{SemNode, SemTree, SemanticKind, SemanticRegistry};

/// Top level of the compiled-grammar file.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrammarFile {
    pub start_symbol: String,
    pub int_symbol: String,
    pub empty_symbol: String,
    pub grammar: IndexMap<String, Vec<RuleDto>>,
    pub semantics: IndexMap<String, SemanticDto>,
    pub entities: IndexMap<String, Vec<EntityDto>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RuleDto {
    #[serde(rename = "RHS")]
    pub rhs: Vec<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub terminal: bool,
    pub cost: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<Text>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic: Option<Vec<SemNodeDto>>,
    #[serde(
        rename = "semanticIsRHS",
        default,
        skip_serializing_if = "is_false"
    )]
    pub semantic_is_rhs: bool,
    #[serde(
        rename = "insertedSemantic",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub inserted_semantic: Option<Vec<SemNodeDto>>,
    #[serde(rename = "insertionIdx", default, skip_serializing_if = "Option::is_none")]
    pub insertion_idx: Option<u8>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub transposition: bool,
    #[serde(rename = "isPlaceholder", default, skip_serializing_if = "is_false")]
    pub is_placeholder: bool,
    #[serde(rename = "intMin", default, skip_serializing_if = "Option::is_none")]
    pub int_min: Option<i64>,
    #[serde(rename = "intMax", default, skip_serializing_if = "Option::is_none")]
    pub int_max: Option<i64>,
    #[serde(rename = "gramProps", default, skip_serializing_if = "GramProps::is_empty")]
    pub gram_props: GramProps,
    #[serde(
        rename = "insertionCost",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub insertion_cost: Option<f64>,
    #[serde(
        rename = "transpositionCost",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub transposition_cost: Option<f64>,
}

/// One node of a serialized semantic tree; argument nodes carry no
/// `children` key, unapplied functions carry an empty list.
#[derive(Debug, Serialize, Deserialize)]
pub struct SemNodeDto {
    pub semantic: SemRefDto,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<SemNodeDto>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SemRefDto {
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticDto {
    pub cost: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_params: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_params: Option<usize>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub forbids_multiple: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EntityDto {
    pub text: String,
    pub category: String,
    pub id: String,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl GrammarFile {
    pub fn from_grammar(grammar: &Grammar) -> Self {
        let mut rules: IndexMap<String, Vec<RuleDto>> = IndexMap::new();
        for nonterminal in grammar.nonterminals() {
            let dtos = nonterminal.rules.iter().map(rule_to_dto).collect();
            rules.insert(nonterminal.name.to_string(), dtos);
        }
        let mut semantics = IndexMap::new();
        for (name, def) in grammar.semantics().iter() {
            let dto = match def.kind {
                SemanticKind::Function {
                    min_params,
                    max_params,
                    forbids_multiple,
                } => SemanticDto {
                    cost: def.cost,
                    min_params: Some(min_params),
                    max_params: Some(max_params),
                    forbids_multiple,
                },
                SemanticKind::Argument => SemanticDto {
                    cost: def.cost,
                    min_params: None,
                    max_params: None,
                    forbids_multiple: false,
                },
            };
            semantics.insert(name.to_string(), dto);
        }
        let mut entities: IndexMap<String, Vec<EntityDto>> = IndexMap::new();
        for (key, instances) in grammar.entities().iter() {
            entities.insert(
                key.to_string(),
                instances
                    .iter()
                    .map(|e| EntityDto {
                        text: e.text.to_string(),
                        category: e.category.to_string(),
                        id: e.id.to_string(),
                    })
                    .collect(),
            );
        }
        GrammarFile {
            start_symbol: grammar
                .start()
                .map(|s| s.name().to_string())
                .unwrap_or_default(),
            int_symbol: INT_SYMBOL.to_string(),
            empty_symbol: EMPTY_SYMBOL.to_string(),
            grammar: rules,
            semantics,
            entities,
        }
    }

    pub fn into_grammar(self) -> Result<Grammar, InterchangeError> {
        let mut grammar = Grammar::default();

        let mut registry = SemanticRegistry::new();
        for (name, dto) in &self.semantics {
            let result = match (dto.min_params, dto.max_params) {
                (Some(min), Some(max)) => {
                    registry.function(name, dto.cost, min, max, dto.forbids_multiple)
                }
                _ => registry.argument(name, dto.cost),
            };
            result.map_err(|_| InterchangeError::UnknownSemantic(name.clone()))?;
        }

        let mut entities = crate::grammar::EntityIndex::default();
        for (key, instances) in &self.entities {
            for dto in instances {
                entities.restore(
                    key,
                    Entity {
                        text: dto.text.as_str().into(),
                        category: dto.category.as_str().into(),
                        id: dto.id.as_str().into(),
                    },
                );
            }
        }

        if !self.grammar.contains_key(&self.start_symbol) {
            return Err(InterchangeError::UnknownStartSymbol(self.start_symbol));
        }

        grammar.semantics = registry;
        grammar.entities = entities;
        for name in self.grammar.keys() {
            let name: SmolStr = name.as_str().into();
            grammar.nonterminals.insert(
                name.clone(),
                crate::grammar::Nonterminal {
                    name,
                    rules: Vec::new(),
                },
            );
        }
        for (name, dtos) in &self.grammar {
            let lhs: SmolStr = name.as_str().into();
            for dto in dtos {
                let rule = dto_to_rule(dto, &grammar.semantics)?;
                grammar.push_rule_unchecked(&lhs, rule);
            }
        }
        grammar.start = Some(Sym(self.start_symbol.as_str().into()));
        Ok(grammar)
    }
}

fn rule_to_dto(rule: &Rule) -> RuleDto {
    RuleDto {
        rhs: rule.rhs.iter().map(|s| s.to_string()).collect(),
        terminal: rule.is_terminal,
        cost: rule.cost,
        text: rule.text.clone(),
        semantic: rule.semantic.as_ref().map(|t| tree_to_dto(t)),
        semantic_is_rhs: rule.semantic_is_rhs,
        inserted_semantic: rule.inserted_semantic.as_ref().map(|t| tree_to_dto(t)),
        insertion_idx: rule.insertion_idx,
        transposition: rule.is_transposition,
        is_placeholder: rule.is_placeholder,
        int_min: rule.int_min,
        int_max: rule.int_max,
        gram_props: rule.gram_props,
        insertion_cost: rule.insertion_cost,
        transposition_cost: rule.transposition_cost,
    }
}

fn dto_to_rule(dto: &RuleDto, registry: &SemanticRegistry) -> Result<Rule, InterchangeError> {
    Ok(Rule {
        rhs: dto.rhs.iter().map(|s| s.as_str().into()).collect(),
        is_terminal: dto.terminal,
        is_placeholder: dto.is_placeholder,
        cost: dto.cost,
        text: dto.text.clone(),
        semantic: dto
            .semantic
            .as_ref()
            .map(|t| dto_to_tree(t, registry))
            .transpose()?,
        semantic_is_rhs: dto.semantic_is_rhs,
        inserted_semantic: dto
            .inserted_semantic
            .as_ref()
            .map(|t| dto_to_tree(t, registry))
            .transpose()?,
        insertion_idx: dto.insertion_idx,
        gram_props: dto.gram_props,
        insertion_cost: dto.insertion_cost,
        transposition_cost: dto.transposition_cost,
        is_transposition: dto.transposition,
        int_min: dto.int_min,
        int_max: dto.int_max,
    })
}

fn tree_to_dto(tree: &SemTree) -> Vec<SemNodeDto> {
    tree.iter()
        .map(|node| match node {
            SemNode::Func { def, children } => SemNodeDto {
                semantic: SemRefDto {
                    name: def.name.to_string(),
                },
                children: Some(tree_to_dto(children)),
            },
            SemNode::Arg { def } => SemNodeDto {
                semantic: SemRefDto {
                    name: def.name.to_string(),
                },
                children: None,
            },
        })
        .collect()
}

fn dto_to_tree(
    nodes: &[SemNodeDto],
    registry: &SemanticRegistry,
) -> Result<SemTree, InterchangeError> {
    nodes
        .iter()
        .map(|dto| {
            let def = registry
                .get(&dto.semantic.name)
                .ok_or_else(|| InterchangeError::UnknownSemantic(dto.semantic.name.clone()))?;
            Ok(match &dto.children {
                Some(children) => SemNode::Func {
                    def: std::sync::Arc::clone(def),
                    children: dto_to_tree(children, registry)?,
                },
                None => SemNode::Arg {
                    def: std::sync::Arc::clone(def),
                },
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::RuleOpts;

    fn sample_grammar() -> Grammar {
        let mut g = Grammar::new();
        let user = g.entity_category("user", &["Danny"]).unwrap();
        let subject = g.nonterminal(&["subject"]).unwrap();
        let liked = g.nonterminal(&["liked"]).unwrap();
        let start = g.nonterminal(&["start"]).unwrap();
        g.semantic_arg("me", 0.0).unwrap();
        g.semantic_fn("repos-liked", 0.5, 1, 1, false).unwrap();
        let me = g.arg("me").unwrap();
        g.add_rule(&subject, RuleOpts::terminal("i").with_semantic(me))
            .unwrap();
        g.add_rule(&subject, RuleOpts::placeholder(&user)).unwrap();
        g.add_rule(&liked, RuleOpts::terminal("liked").with_insertion_cost(0.5))
            .unwrap();
        let open = g.lhs("repos-liked").unwrap();
        g.add_rule(&start, RuleOpts::binary(&subject, &liked).with_semantic(open))
            .unwrap();
        g.set_start(&start);
        g
    }

    #[test]
    fn test_round_trip_preserves_rules() {
        let mut g = sample_grammar();
        crate::edits::generate_edit_rules(&mut g);
        let json = crate::interchange::to_json(&g).unwrap();
        let reloaded = crate::interchange::from_json(&json).unwrap();
        for (a, b) in g.nonterminals().zip(reloaded.nonterminals()) {
            assert_eq!(a.name, b.name);
            assert_eq!(a.rules.len(), b.rules.len());
            for (ra, rb) in a.rules.iter().zip(b.rules.iter()) {
                assert_eq!(ra.rhs, rb.rhs);
                assert_eq!(ra.is_terminal, rb.is_terminal);
                assert!((ra.cost - rb.cost).abs() < 1e-12);
                assert_eq!(ra.text, rb.text);
                assert_eq!(ra.insertion_idx, rb.insertion_idx);
            }
        }
    }

    #[test]
    fn test_unknown_semantic_rejected() {
        let json = r#"{
            "startSymbol": "[start]",
            "intSymbol": "<int>",
            "emptySymbol": "<empty>",
            "grammar": {
                "[start]": [
                    {"RHS": ["ok"], "terminal": true, "cost": 0.0,
                     "semantic": [{"semantic": {"name": "ghost"}}]}
                ]
            },
            "semantics": {},
            "entities": {}
        }"#;
        assert!(matches!(
            crate::interchange::from_json(json),
            Err(InterchangeError::UnknownSemantic(_))
        ));
    }

    #[test]
    fn test_lhs_semantics_keep_empty_children() {
        let g = sample_grammar();
        let file = GrammarFile::from_grammar(&g);
        let start_rules = &file.grammar["[start]"];
        let semantic = start_rules[0].semantic.as_ref().unwrap();
        assert_eq!(semantic[0].semantic.name, "repos-liked");
        assert!(semantic[0].children.as_ref().is_some_and(|c| c.is_empty()));
    }
}
