//! Entity categories and their instances.
//!
//! An entity category is a placeholder terminal (`{user}`) holding an
//! ordered set of instances. Each instance carries its display text, its
//! category, and a globally unique id; the id becomes the synthesized
//! semantic argument when the entity is matched in a query.

use indexmap::IndexMap;
use smol_str::SmolStr;

use super::GrammarError;

/// One entity instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    /// Display text in its original casing.
    pub text: SmolStr,
    /// Owning category name, including braces.
    pub category: SmolStr,
    /// Globally unique id; doubles as the semantic argument name.
    pub id: SmolStr,
}

/// Index of all declared entities, keyed by lowercase match text.
#[derive(Debug, Clone, Default)]
pub struct EntityIndex {
    by_text: IndexMap<SmolStr, Vec<Entity>>,
    categories: Vec<SmolStr>,
    next_id: usize,
}

impl EntityIndex {
    /// Register a category and its instances. Instance uniqueness is
    /// case-insensitive within the category.
    pub fn add_category(
        &mut self,
        category: &str,
        instances: &[&str],
    ) -> Result<(), GrammarError> {
        if self.categories.iter().any(|c| c == category) {
            return Err(GrammarError::DuplicateSymbol(category.to_string()));
        }
        if instances.is_empty() {
            return Err(GrammarError::IllFormedEntityCategory {
                name: category.to_string(),
                reason: "category has no instances".to_string(),
            });
        }
        self.categories.push(category.into());
        for instance in instances {
            let key: SmolStr = instance.to_lowercase().into();
            let bucket = self.by_text.entry(key).or_default();
            if bucket.iter().any(|e| e.category.as_str() == category) {
                return Err(GrammarError::DuplicateEntity {
                    text: instance.to_string(),
                    category: category.to_string(),
                });
            }
            let id: SmolStr = format!("{}", self.next_id).into();
            self.next_id += 1;
            bucket.push(Entity {
                text: SmolStr::from(*instance),
                category: category.into(),
                id,
            });
        }
        Ok(())
    }

    /// Restore one instance with a preassigned id (interchange load).
    pub fn restore(&mut self, key: &str, entity: Entity) {
        if !self.categories.iter().any(|c| *c == entity.category) {
            self.categories.push(entity.category.clone());
        }
        if let Ok(numeric) = entity.id.parse::<usize>() {
            self.next_id = self.next_id.max(numeric + 1);
        }
        self.by_text.entry(key.into()).or_default().push(entity);
    }

    /// Entities matching a lowercase text key.
    pub fn lookup(&self, text: &str) -> Option<&[Entity]> {
        self.by_text.get(text).map(Vec::as_slice)
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }

    pub fn categories(&self) -> &[SmolStr] {
        &self.categories
    }

    /// All (lowercase key, instances) pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&SmolStr, &Vec<Entity>)> {
        self.by_text.iter()
    }

    /// Longest instance key in tokens; bounds the matcher's n-grams.
    pub fn max_token_count(&self) -> usize {
        self.by_text
            .keys()
            .map(|key| key.split_whitespace().count())
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_monotonic() {
        let mut index = EntityIndex::default();
        index.add_category("{user}", &["Danny", "Aral"]).unwrap();
        index.add_category("{repo}", &["parlance"]).unwrap();
        let danny = &index.lookup("danny").unwrap()[0];
        let aral = &index.lookup("aral").unwrap()[0];
        let repo = &index.lookup("parlance").unwrap()[0];
        assert_eq!(danny.id.as_str(), "0");
        assert_eq!(aral.id.as_str(), "1");
        assert_eq!(repo.id.as_str(), "2");
    }

    #[test]
    fn test_case_insensitive_duplicates_rejected() {
        let mut index = EntityIndex::default();
        let err = index.add_category("{user}", &["Danny", "DANNY"]);
        assert!(matches!(err, Err(GrammarError::DuplicateEntity { .. })));
    }

    #[test]
    fn test_same_text_across_categories_allowed() {
        let mut index = EntityIndex::default();
        index.add_category("{user}", &["mercury"]).unwrap();
        index.add_category("{repo}", &["Mercury"]).unwrap();
        assert_eq!(index.lookup("mercury").unwrap().len(), 2);
    }
}
