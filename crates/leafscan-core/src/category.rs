//! Plant categories and the fixed registry of supported ones.
//!
//! Each category selects its own model and metadata files. The registry is
//! built once at start-up and never mutated afterwards.

use std::fmt;

use serde::Serialize;

use crate::PipelineError;

/// Plants with a trained model in the default model directory.
pub const DEFAULT_CATEGORIES: &[&str] = &[
    "apple",
    "tomato",
    "potato",
    "orange",
    "chili",
    "grape",
    "tea",
    "peach",
    "coffee",
    "corn",
    "cucumber",
    "jamun",
    "lemon",
    "mango",
    "pepper",
    "rice",
    "soybean",
    "sugarcane",
    "wheat",
];

/// A plant species identifier, stored lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    /// Normalise a raw name: trimmed and lowercased.
    pub fn new(name: &str) -> Self {
        Self(name.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name for display, first letter uppercased ("apple" → "Apple").
    pub fn display_name(&self) -> String {
        let mut chars = self.0.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Registry of supported categories, in presentation order.
#[derive(Debug, Clone)]
pub struct CategoryRegistry {
    categories: Vec<Category>,
}

impl Default for CategoryRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_CATEGORIES.iter().copied())
    }
}

impl CategoryRegistry {
    /// Build a registry from raw names. Duplicates (after normalisation) are
    /// dropped, keeping the first occurrence.
    pub fn new<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut categories: Vec<Category> = Vec::new();
        for name in names {
            let category = Category::new(name);
            if !category.as_str().is_empty() && !categories.contains(&category) {
                categories.push(category);
            }
        }
        Self { categories }
    }

    /// Resolve a requested name against the registry.
    pub fn resolve(&self, name: &str) -> Result<Category, PipelineError> {
        let wanted = Category::new(name);
        self.categories
            .iter()
            .find(|c| **c == wanted)
            .cloned()
            .ok_or_else(|| PipelineError::InvalidCategory {
                category: name.to_string(),
            })
    }

    pub fn contains(&self, category: &Category) -> bool {
        self.categories.contains(category)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_has_all_plants() {
        let registry = CategoryRegistry::default();
        assert_eq!(registry.len(), 19);
        assert!(registry.contains(&Category::new("apple")));
        assert!(registry.contains(&Category::new("wheat")));
    }

    #[test]
    fn resolve_normalises_case_and_whitespace() {
        let registry = CategoryRegistry::default();
        let category = registry.resolve("  Tomato ").unwrap();
        assert_eq!(category.as_str(), "tomato");
    }

    #[test]
    fn resolve_rejects_unknown() {
        let registry = CategoryRegistry::default();
        let err = registry.resolve("banana").unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InvalidCategory { ref category } if category == "banana"
        ));
    }

    #[test]
    fn duplicates_and_blanks_dropped() {
        let registry = CategoryRegistry::new(["apple", "Apple", "", "rice"]);
        let names: Vec<&str> = registry.iter().map(|c| c.as_str()).collect();
        assert_eq!(names, vec!["apple", "rice"]);
    }

    #[test]
    fn serialises_as_normalised_name() {
        let category = Category::new(" Apple ");
        assert_eq!(serde_json::to_string(&category).unwrap(), r#""apple""#);
        assert_eq!(CategoryRegistry::default().resolve(" Apple ").unwrap(), category);
    }

    #[test]
    fn display_name_capitalises() {
        assert_eq!(Category::new("sugarcane").display_name(), "Sugarcane");
        assert_eq!(Category::new("").display_name(), "");
    }
}
