use std::collections::BTreeSet;

use chrono::NaiveDate;
use raccoon_domain::{
    round_money, CategoryVocabulary, PricePoint, PriceSeries, RestockRow, Transaction,
};

/// Item-level price tracking across receipts.
pub struct PriceService;

impl PriceService {
    /// Unit-price history for each requested item name (case-insensitive),
    /// oldest first. Series come back in request order.
    pub fn history(transactions: &[Transaction], items: &[String]) -> Vec<PriceSeries> {
        items
            .iter()
            .map(|wanted| {
                let wanted = wanted.trim();
                let mut points: Vec<PricePoint> = transactions
                    .iter()
                    .filter_map(|txn| txn.date.map(|date| (txn, date)))
                    .flat_map(|(txn, date)| {
                        txn.line_items
                            .iter()
                            .filter(move |item| item.name.trim().eq_ignore_ascii_case(wanted))
                            .map(move |item| PricePoint {
                                date,
                                unit_price: round_money(item.unit_price()),
                                merchant: txn.merchant.clone(),
                            })
                    })
                    .collect();
                points.sort_by_key(|point| point.date);
                PriceSeries {
                    item: wanted.to_string(),
                    points,
                }
            })
            .collect()
    }

    /// Distinct item names bought on receipts with `type_label` (all labels
    /// when `None`), sorted.
    pub fn catalogue(transactions: &[Transaction], type_label: Option<&str>) -> Vec<String> {
        let vocabulary = CategoryVocabulary::type_labels();
        let wanted = type_label.map(|label| vocabulary.resolve(Some(label)));
        transactions
            .iter()
            .filter(|txn| match &wanted {
                Some(label) => vocabulary.resolve(Some(txn.type_label.as_str())) == *label,
                None => true,
            })
            .flat_map(|txn| txn.line_items.iter())
            .map(|item| item.name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Dated items tagged `category`, most recent purchase first, with days
    /// elapsed since `today`.
    pub fn restock(
        transactions: &[Transaction],
        category: &str,
        vocabulary: &CategoryVocabulary,
        today: NaiveDate,
    ) -> Vec<RestockRow> {
        let wanted = vocabulary.resolve(Some(category));
        let wanted = wanted.as_str();
        let mut rows: Vec<RestockRow> = transactions
            .iter()
            .filter_map(|txn| txn.date.map(|date| (txn, date)))
            .flat_map(|(txn, date)| {
                txn.line_items
                    .iter()
                    .filter(move |item| {
                        vocabulary
                            .resolve(item.category.as_deref())
                            .eq_ignore_ascii_case(wanted)
                    })
                    .map(move |item| RestockRow {
                        name: item.name.clone(),
                        price: item.price,
                        purchased_on: date,
                        days_since: (today - date).num_days().abs(),
                    })
            })
            .collect();
        rows.sort_by(|a, b| b.purchased_on.cmp(&a.purchased_on));
        rows
    }
}
