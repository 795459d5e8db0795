use std::collections::HashMap;

use raccoon_domain::{
    BucketItem, CategoryAmount, CategoryBreakdown, CategoryVocabulary, LineItem, RankedEntry,
    Transaction, UNKNOWN_ITEM, UNKNOWN_STORE,
};
use rust_decimal::Decimal;

/// Category roll-ups and top-N rankings.
pub struct CategoryService;

impl CategoryService {
    /// Sums item prices per category. Unknown or missing tags fold into the
    /// vocabulary's fallback; no spend is ever dropped.
    pub fn aggregate<'a, I>(items: I, vocabulary: &CategoryVocabulary) -> CategoryBreakdown
    where
        I: IntoIterator<Item = &'a LineItem>,
    {
        Self::fold(
            items
                .into_iter()
                .map(|item| (vocabulary.resolve(item.category.as_deref()), item.price)),
            vocabulary,
            false,
        )
    }

    /// Same as [`CategoryService::aggregate`] but lists every vocabulary
    /// category, zero when nothing was spent.
    pub fn aggregate_with_empty<'a, I>(
        items: I,
        vocabulary: &CategoryVocabulary,
    ) -> CategoryBreakdown
    where
        I: IntoIterator<Item = &'a LineItem>,
    {
        Self::fold(
            items
                .into_iter()
                .map(|item| (vocabulary.resolve(item.category.as_deref()), item.price)),
            vocabulary,
            true,
        )
    }

    /// Item-level roll-up across receipts; item-less receipts count as one
    /// item tagged with their type label.
    pub fn aggregate_transactions(
        transactions: &[Transaction],
        vocabulary: &CategoryVocabulary,
    ) -> CategoryBreakdown {
        let items: Vec<LineItem> = transactions
            .iter()
            .flat_map(Transaction::items_or_synthetic)
            .collect();
        Self::aggregate(&items, vocabulary)
    }

    /// Receipt totals per type label, dated or not.
    pub fn aggregate_by_type_label(transactions: &[Transaction]) -> CategoryBreakdown {
        let vocabulary = CategoryVocabulary::type_labels();
        Self::fold(
            transactions
                .iter()
                .map(|txn| (vocabulary.resolve(Some(txn.type_label.as_str())), txn.amount)),
            &vocabulary,
            false,
        )
    }

    pub fn top_stores(transactions: &[Transaction], n: usize) -> Vec<RankedEntry> {
        Self::rank(
            transactions
                .iter()
                .map(|txn| (display_name(&txn.merchant, UNKNOWN_STORE), txn.amount)),
            n,
        )
    }

    pub fn top_items<'a, I>(items: I, n: usize) -> Vec<RankedEntry>
    where
        I: IntoIterator<Item = &'a LineItem>,
    {
        Self::rank(
            items
                .into_iter()
                .map(|item| (display_name(&item.name, UNKNOWN_ITEM), item.price)),
            n,
        )
    }

    /// Top items among those whose tag resolves to `category`.
    pub fn top_items_in_category<'a, I>(
        items: I,
        category: &str,
        vocabulary: &CategoryVocabulary,
        n: usize,
    ) -> Vec<RankedEntry>
    where
        I: IntoIterator<Item = &'a LineItem>,
    {
        let wanted = vocabulary.resolve(Some(category));
        Self::top_items(
            items.into_iter().filter(|item| {
                vocabulary
                    .resolve(item.category.as_deref())
                    .eq_ignore_ascii_case(&wanted)
            }),
            n,
        )
    }

    /// The `n` most expensive individual lines, ties in input order.
    pub fn largest_items(items: &[BucketItem], n: usize) -> Vec<BucketItem> {
        let mut sorted = items.to_vec();
        sorted.sort_by(|a, b| b.item.price.cmp(&a.item.price));
        sorted.truncate(n);
        sorted
    }

    fn fold<I>(pairs: I, vocabulary: &CategoryVocabulary, include_empty: bool) -> CategoryBreakdown
    where
        I: IntoIterator<Item = (String, Decimal)>,
    {
        let mut entries: Vec<CategoryAmount> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        if include_empty {
            for category in vocabulary.categories() {
                positions.insert(category.clone(), entries.len());
                entries.push(CategoryAmount {
                    category: category.clone(),
                    amount: Decimal::ZERO,
                });
            }
        }
        for (category, amount) in pairs {
            match positions.get(&category) {
                Some(&index) => entries[index].amount += amount,
                None => {
                    positions.insert(category.clone(), entries.len());
                    entries.push(CategoryAmount { category, amount });
                }
            }
        }

        // Vocabulary order, then open-vocabulary names as first seen, fallback last.
        let known = vocabulary.categories();
        let rank = |name: &str| -> usize {
            if let Some(position) = known.iter().position(|known| known == name) {
                position
            } else if name == vocabulary.fallback() {
                usize::MAX
            } else {
                known.len()
            }
        };
        entries.sort_by_key(|entry| rank(&entry.category));
        CategoryBreakdown { entries }
    }

    fn rank<I>(pairs: I, n: usize) -> Vec<RankedEntry>
    where
        I: IntoIterator<Item = (String, Decimal)>,
    {
        let mut entries: Vec<RankedEntry> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        for (name, amount) in pairs {
            match positions.get(&name) {
                Some(&index) => {
                    entries[index].amount += amount;
                    entries[index].count += 1;
                }
                None => {
                    positions.insert(name.clone(), entries.len());
                    entries.push(RankedEntry {
                        name,
                        amount,
                        count: 1,
                    });
                }
            }
        }
        entries.sort_by(|a, b| b.amount.cmp(&a.amount));
        entries.truncate(n);
        entries
    }
}

fn display_name(raw: &str, fallback: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use raccoon_domain::{MISC, UNCATEGORIZED};

    fn dec(value: i64) -> Decimal {
        Decimal::from(value)
    }

    fn item(name: &str, price: i64, category: Option<&str>) -> LineItem {
        LineItem::new(name, dec(price), category.map(str::to_string))
    }

    #[test]
    fn closed_vocabulary_folds_unknown_into_fallback() {
        let items = vec![
            item("Apples", 3, Some("Fruits")),
            item("Bagel", 2, Some("Bakery")),
            item("Soap", 4, None),
            item("Shampoo", 5, Some("toiletries")),
        ];
        let breakdown = CategoryService::aggregate(&items, &CategoryVocabulary::item_categories());
        let names: Vec<&str> = breakdown
            .entries
            .iter()
            .map(|e| e.category.as_str())
            .collect();
        assert_eq!(names, vec!["Fruits", "Toiletries/Cleaning", MISC]);
        assert_eq!(breakdown.get(MISC), Some(dec(6)));
        assert_eq!(breakdown.total(), dec(14));
    }

    #[test]
    fn include_empty_lists_every_category() {
        let vocab = CategoryVocabulary::item_categories();
        let breakdown = CategoryService::aggregate_with_empty(&[], &vocab);
        assert_eq!(breakdown.len(), vocab.categories().len());
        assert_eq!(breakdown.total(), Decimal::ZERO);
    }

    #[test]
    fn itemless_receipts_use_type_label() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1);
        let txns = vec![
            Transaction::new("1", day, dec(40), "Pump & Go", "Fuel"),
            Transaction::new("2", None, dec(10), "Cafe", "Restaurants & Dining")
                .with_items(vec![item("Latte", 10, Some("Restaurants & Dining"))]),
        ];
        let breakdown =
            CategoryService::aggregate_transactions(&txns, &CategoryVocabulary::type_labels());
        assert_eq!(breakdown.get("Fuel"), Some(dec(40)));
        assert_eq!(breakdown.get("Restaurants & Dining"), Some(dec(10)));

        let by_label = CategoryService::aggregate_by_type_label(&txns);
        assert_eq!(by_label.total(), dec(50));
        assert_eq!(by_label.get(UNCATEGORIZED), None);
    }

    #[test]
    fn rankings_break_ties_by_first_seen() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1);
        let txns = vec![
            Transaction::new("1", day, dec(5), "Beta", "Groceries"),
            Transaction::new("2", day, dec(5), " Alpha ", "Groceries"),
            Transaction::new("3", day, dec(9), "Gamma", "Groceries"),
            Transaction::new("4", day, dec(1), "  ", "Groceries"),
            Transaction::new("5", day, dec(2), "Beta", "Groceries"),
        ];
        let top = CategoryService::top_stores(&txns, 3);
        let names: Vec<&str> = top.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Gamma", "Beta", "Alpha"]);
        assert_eq!(top[1].count, 2);

        let all = CategoryService::top_stores(&txns, 10);
        assert_eq!(all.last().map(|e| e.name.as_str()), Some(UNKNOWN_STORE));
    }

    #[test]
    fn top_items_within_category() {
        let items = vec![
            item("Apples", 3, Some("Fruits")),
            item("Milk", 8, Some("Dairy")),
            item("Pears", 4, Some("fruits")),
            item("Apples", 2, Some("Fruits")),
        ];
        let vocab = CategoryVocabulary::item_categories();
        let top = CategoryService::top_items_in_category(&items, "Fruits", &vocab, 10);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].name, "Apples");
        assert_eq!(top[0].amount, dec(5));
        assert_eq!(top[1].name, "Pears");
    }

    #[test]
    fn largest_items_keeps_input_order_on_ties() {
        let tagged = |name: &str, price: i64| BucketItem {
            transaction_id: "t".into(),
            merchant: "Shop".into(),
            item: item(name, price, None),
        };
        let items = vec![tagged("a", 2), tagged("b", 7), tagged("c", 2), tagged("d", 1)];
        let largest = CategoryService::largest_items(&items, 3);
        let names: Vec<&str> = largest.iter().map(|i| i.item.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }
}
