//! Category vocabularies for receipt type labels and line-item tags.

use serde::{Deserialize, Serialize};

pub const UNCATEGORIZED: &str = "Uncategorized";
pub const MISC: &str = "Misc";
/// Name of the synthesized all-categories budget view.
pub const TOTAL: &str = "Total";

/// Coarse receipt-level labels, in display order.
pub const TYPE_LABELS: [&str; 15] = [
    "Groceries",
    "Restaurants & Dining",
    "Transportation",
    "Fuel",
    "Home & Utilities",
    "Shopping & Entertainment",
    "Health",
    "Travel",
    "Personal & Family Care",
    "Education",
    "Business Expenses",
    "Finance",
    "Giving",
    "Cash, Checks & Misc",
    UNCATEGORIZED,
];

/// Spellings seen in the data that fold into a canonical type label.
pub const TYPE_LABEL_SYNONYMS: [(&str, &str); 4] = [
    ("Grocery", "Groceries"),
    ("Gas", "Fuel"),
    ("Restaurant", "Restaurants & Dining"),
    ("Dining", "Restaurants & Dining"),
];

/// Fine-grained grocery line-item tags.
pub const ITEM_CATEGORIES: [&str; 10] = [
    "Fruits",
    "Vegetables",
    "Meat / Fish",
    "Dairy & Eggs",
    "Grains & Staples",
    "Frozen Foods",
    "Snacks & Sweets",
    "Condiments & Cooking Ingredients",
    "Toiletries/Cleaning",
    MISC,
];

pub const ITEM_CATEGORY_SYNONYMS: [(&str, &str); 3] = [
    ("Toiletries", "Toiletries/Cleaning"),
    ("Dairy", "Dairy & Eggs"),
    ("Meat", "Meat / Fish"),
];

/// A closed (or open) set of category names with a fallback for anything
/// that does not resolve.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryVocabulary {
    categories: Vec<String>,
    synonyms: Vec<(String, String)>,
    fallback: String,
    /// Open vocabularies keep unknown non-empty names as-is.
    open: bool,
}

impl CategoryVocabulary {
    /// Receipt type labels; unknown labels fold into `Uncategorized`.
    pub fn type_labels() -> Self {
        Self::from_parts(&TYPE_LABELS, &TYPE_LABEL_SYNONYMS, UNCATEGORIZED)
    }

    /// Grocery item tags; unknown tags fold into `Misc`.
    pub fn item_categories() -> Self {
        Self::from_parts(&ITEM_CATEGORIES, &ITEM_CATEGORY_SYNONYMS, MISC)
    }

    /// Closed vocabulary over caller-supplied names.
    pub fn custom<I, S>(categories: I, fallback: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            categories: categories.into_iter().map(Into::into).collect(),
            synonyms: Vec::new(),
            fallback: fallback.into(),
            open: false,
        }
    }

    /// Accepts any non-blank name; only missing names use the fallback.
    pub fn open(fallback: impl Into<String>) -> Self {
        Self {
            categories: Vec::new(),
            synonyms: Vec::new(),
            fallback: fallback.into(),
            open: true,
        }
    }

    fn from_parts(categories: &[&str], synonyms: &[(&str, &str)], fallback: &str) -> Self {
        Self {
            categories: categories.iter().map(|c| c.to_string()).collect(),
            synonyms: synonyms
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
            fallback: fallback.to_string(),
            open: false,
        }
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Canonical spelling of `name` when it is known (case-insensitive,
    /// synonyms applied).
    pub fn canonical(&self, name: &str) -> Option<&str> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return None;
        }
        let target = self
            .synonyms
            .iter()
            .find(|(from, _)| from.eq_ignore_ascii_case(trimmed))
            .map(|(_, to)| to.as_str())
            .unwrap_or(trimmed);
        self.categories
            .iter()
            .find(|known| known.eq_ignore_ascii_case(target))
            .map(String::as_str)
            .or_else(|| (self.fallback.eq_ignore_ascii_case(target)).then_some(self.fallback()))
    }

    /// Maps any input, including a missing one, to a name this vocabulary
    /// reports under.
    pub fn resolve(&self, name: Option<&str>) -> String {
        let Some(raw) = name.map(str::trim).filter(|raw| !raw.is_empty()) else {
            return self.fallback.clone();
        };
        match self.canonical(raw) {
            Some(known) => known.to_string(),
            None if self.open => raw.to_string(),
            None => self.fallback.clone(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.canonical(name).is_some()
    }

    /// Every spelling (canonical or synonym) that resolves to `canonical`.
    pub fn spellings_of(&self, canonical: &str) -> Vec<String> {
        let mut spellings = vec![canonical.to_string()];
        spellings.extend(
            self.synonyms
                .iter()
                .filter(|(_, to)| to.eq_ignore_ascii_case(canonical))
                .map(|(from, _)| from.clone()),
        );
        spellings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grocery_synonym_folds_into_groceries() {
        let vocab = CategoryVocabulary::type_labels();
        assert_eq!(vocab.resolve(Some("Grocery")), "Groceries");
        assert_eq!(vocab.resolve(Some(" groceries ")), "Groceries");
        assert_eq!(vocab.resolve(Some("Gas")), "Fuel");
    }

    #[test]
    fn unknown_and_missing_labels_fall_back() {
        let vocab = CategoryVocabulary::type_labels();
        assert_eq!(vocab.resolve(None), UNCATEGORIZED);
        assert_eq!(vocab.resolve(Some("   ")), UNCATEGORIZED);
        assert_eq!(vocab.resolve(Some("Spaceships")), UNCATEGORIZED);
        assert!(!vocab.contains("Spaceships"));
    }

    #[test]
    fn item_vocabulary_falls_back_to_misc() {
        let vocab = CategoryVocabulary::item_categories();
        assert_eq!(vocab.resolve(Some("Bakery")), MISC);
        assert_eq!(vocab.resolve(Some("Toiletries")), "Toiletries/Cleaning");
    }

    #[test]
    fn open_vocabulary_keeps_unknown_names() {
        let vocab = CategoryVocabulary::open(UNCATEGORIZED);
        assert_eq!(vocab.resolve(Some("Bakery")), "Bakery");
        assert_eq!(vocab.resolve(None), UNCATEGORIZED);
    }

    #[test]
    fn spellings_include_synonyms() {
        let vocab = CategoryVocabulary::type_labels();
        let spellings = vocab.spellings_of("Groceries");
        assert_eq!(spellings, vec!["Groceries".to_string(), "Grocery".to_string()]);
    }
}
