//! Interning registry for semantic descriptors.

use std::sync::Arc;

use indexmap::IndexMap;
use smol_str::SmolStr;

use super::{SemanticDef, SemanticError, SemanticKind, SemanticRef};

/// Name of the distinguished conjunction function; `intersect(x)` with a
/// single argument is the identity.
pub const INTERSECT: &str = "intersect";

/// Name of the negation function used for conflict detection in merges.
pub const NEGATION: &str = "not";

/// Registry of declared semantics, in declaration order.
///
/// Interning guarantees one descriptor per name, so leaf equality in the
/// algebra can compare by pointer identity.
#[derive(Debug, Default)]
pub struct SemanticRegistry {
    defs: IndexMap<SmolStr, SemanticRef>,
}

impl SemanticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a semantic function.
    pub fn function(
        &mut self,
        name: &str,
        cost: f64,
        min_params: usize,
        max_params: usize,
        forbids_multiple: bool,
    ) -> Result<SemanticRef, SemanticError> {
        if min_params > max_params {
            return Err(SemanticError::IllFormed {
                name: name.to_string(),
                reason: format!("minParams {min_params} exceeds maxParams {max_params}"),
            });
        }
        if max_params == 0 {
            return Err(SemanticError::IllFormed {
                name: name.to_string(),
                reason: "maxParams must be at least 1".to_string(),
            });
        }
        self.insert(SemanticDef {
            name: name.into(),
            cost,
            kind: SemanticKind::Function {
                min_params,
                max_params,
                forbids_multiple,
            },
        })
    }

    /// Declare a semantic argument.
    pub fn argument(&mut self, name: &str, cost: f64) -> Result<SemanticRef, SemanticError> {
        self.insert(SemanticDef {
            name: name.into(),
            cost,
            kind: SemanticKind::Argument,
        })
    }

    fn insert(&mut self, def: SemanticDef) -> Result<SemanticRef, SemanticError> {
        if self.defs.contains_key(&def.name) {
            return Err(SemanticError::Duplicate(def.name.to_string()));
        }
        let reference = Arc::new(def);
        self.defs
            .insert(reference.name.clone(), Arc::clone(&reference));
        Ok(reference)
    }

    pub fn get(&self, name: &str) -> Option<&SemanticRef> {
        self.defs.get(name)
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SmolStr, &SemanticRef)> {
        self.defs.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_semantic_rejected() {
        let mut reg = SemanticRegistry::new();
        reg.argument("me", 0.0).unwrap();
        assert!(matches!(
            reg.argument("me", 0.0),
            Err(SemanticError::Duplicate(_))
        ));
    }

    #[test]
    fn test_bad_arity_bounds_rejected() {
        let mut reg = SemanticRegistry::new();
        assert!(reg.function("f", 0.0, 2, 1, false).is_err());
        assert!(reg.function("g", 0.0, 0, 0, false).is_err());
    }

    #[test]
    fn test_interning_yields_pointer_identity() {
        let mut reg = SemanticRegistry::new();
        let a = reg.argument("me", 0.0).unwrap();
        let b = Arc::clone(reg.get("me").unwrap());
        assert!(Arc::ptr_eq(&a, &b));
    }
}
