use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};
use raccoon_domain::{
    Bucket, BucketItem, BucketKey, CategoryFilter, CategorySeriesPoint, CategoryVocabulary,
    Granularity, Transaction, WeekStart,
};
use rust_decimal::Decimal;
use tracing::debug;

/// Groups dated transactions into chronological time buckets.
pub struct BucketService;

impl BucketService {
    /// Buckets every dated transaction. Undated ones are skipped here but
    /// still count in global totals elsewhere.
    pub fn bucket(
        transactions: &[Transaction],
        granularity: Granularity,
        week_start: WeekStart,
    ) -> Vec<Bucket> {
        let mut buckets: BTreeMap<BucketKey, Bucket> = BTreeMap::new();
        let mut dated: Vec<(NaiveDate, &Transaction)> = transactions
            .iter()
            .filter_map(|txn| txn.date.map(|date| (date, txn)))
            .collect();
        let skipped = transactions.len() - dated.len();
        // Stable sort: input position only breaks (date, id) ties.
        dated.sort_by(|(a_date, a), (b_date, b)| {
            a_date.cmp(b_date).then_with(|| a.id.cmp(&b.id))
        });

        for (rank, (date, txn)) in dated.into_iter().enumerate() {
            let key = Self::key_for(date, rank, granularity, week_start);
            let bucket = buckets
                .entry(key)
                .or_insert_with(|| Bucket::new(key, Self::label(key), Self::start(key)));
            bucket.total_amount += txn.amount;
            bucket.transaction_ids.push(txn.id.clone());
            bucket
                .items
                .extend(txn.items_or_synthetic().into_iter().map(|item| BucketItem {
                    transaction_id: txn.id.clone(),
                    merchant: txn.merchant.clone(),
                    item,
                }));
        }

        if skipped > 0 {
            debug!(skipped, %granularity, "undated transactions left out of buckets");
        }

        let mut ordered: Vec<Bucket> = buckets.into_values().collect();
        ordered.sort_by(|a, b| a.sort_key.cmp(&b.sort_key).then(a.key.cmp(&b.key)));
        ordered
    }

    /// Like [`BucketService::bucket`], narrowed by `filter`. A type-label
    /// filter drops whole receipts; an item-category filter only trims each
    /// bucket's items and leaves its total alone.
    pub fn bucket_filtered(
        transactions: &[Transaction],
        granularity: Granularity,
        week_start: WeekStart,
        filter: &CategoryFilter,
        item_vocabulary: &CategoryVocabulary,
    ) -> Vec<Bucket> {
        match filter {
            CategoryFilter::All => Self::bucket(transactions, granularity, week_start),
            CategoryFilter::TypeLabel(label) => {
                let wanted = CategoryVocabulary::type_labels().resolve(Some(label.as_str()));
                let kept: Vec<Transaction> = transactions
                    .iter()
                    .filter(|txn| txn.type_label.eq_ignore_ascii_case(&wanted))
                    .cloned()
                    .collect();
                Self::bucket(&kept, granularity, week_start)
            }
            CategoryFilter::ItemCategory(category) => {
                let wanted = item_vocabulary.resolve(Some(category.as_str()));
                let mut buckets = Self::bucket(transactions, granularity, week_start);
                for bucket in &mut buckets {
                    bucket.items.retain(|tagged| {
                        item_vocabulary
                            .resolve(tagged.item.category.as_deref())
                            .eq_ignore_ascii_case(&wanted)
                    });
                }
                buckets
            }
        }
    }

    /// Per-bucket item spend for each of `categories`, zero-filled, in bucket order.
    pub fn category_series(
        transactions: &[Transaction],
        granularity: Granularity,
        week_start: WeekStart,
        categories: &[String],
        item_vocabulary: &CategoryVocabulary,
    ) -> Vec<CategorySeriesPoint> {
        Self::bucket(transactions, granularity, week_start)
            .into_iter()
            .map(|bucket| {
                let mut values: Vec<(String, Decimal)> = categories
                    .iter()
                    .map(|category| (category.clone(), Decimal::ZERO))
                    .collect();
                for item in bucket.line_items() {
                    let resolved = item_vocabulary.resolve(item.category.as_deref());
                    if let Some((_, sum)) = values
                        .iter_mut()
                        .find(|(name, _)| name.eq_ignore_ascii_case(&resolved))
                    {
                        *sum += item.price;
                    }
                }
                CategorySeriesPoint {
                    label: bucket.label,
                    sort_key: bucket.sort_key,
                    values,
                }
            })
            .collect()
    }

    pub fn key_for(
        date: NaiveDate,
        index: usize,
        granularity: Granularity,
        week_start: WeekStart,
    ) -> BucketKey {
        match granularity {
            Granularity::Trip => BucketKey::Trip { date, index },
            Granularity::Week => BucketKey::Week {
                start: week_start.start_of_week(date),
            },
            Granularity::Month => BucketKey::Month {
                year: date.year(),
                month: date.month(),
            },
            Granularity::Year => BucketKey::Year { year: date.year() },
        }
    }

    /// First calendar day covered by `key`.
    pub fn start(key: BucketKey) -> NaiveDate {
        match key {
            BucketKey::Trip { date, .. } => date,
            BucketKey::Week { start } => start,
            BucketKey::Month { year, month } => NaiveDate::from_ymd_opt(year, month, 1)
                .unwrap_or(NaiveDate::MIN),
            BucketKey::Year { year } => NaiveDate::from_yo_opt(year, 1).unwrap_or(NaiveDate::MIN),
        }
    }

    pub fn label(key: BucketKey) -> String {
        let start = Self::start(key);
        match key {
            BucketKey::Trip { .. } | BucketKey::Week { .. } => {
                start.format("%b %-d, %Y").to_string()
            }
            BucketKey::Month { .. } => start.format("%b %Y").to_string(),
            BucketKey::Year { year } => year.to_string(),
        }
    }
}

/// First day of the month containing `date`.
pub(crate) fn month_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.day0() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use raccoon_domain::LineItem;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dec(value: i64) -> Decimal {
        Decimal::from(value)
    }

    fn txn(id: &str, day: Option<NaiveDate>, amount: i64, label: &str) -> Transaction {
        Transaction::new(id, day, dec(amount), "Shop", label)
    }

    #[test]
    fn labels_follow_granularity() {
        let day = date(2024, 1, 10); // Wednesday
        let labels: Vec<String> = Granularity::ALL
            .iter()
            .map(|g| BucketService::label(BucketService::key_for(day, 0, *g, WeekStart::Sunday)))
            .collect();
        assert_eq!(labels, vec!["Jan 10, 2024", "Jan 7, 2024", "Jan 2024", "2024"]);

        let monday = BucketService::key_for(day, 0, Granularity::Week, WeekStart::Monday);
        assert_eq!(BucketService::label(monday), "Jan 8, 2024");
    }

    #[test]
    fn week_buckets_cross_year_boundary() {
        let txns = vec![
            txn("a", Some(date(2023, 12, 31)), 5, "Groceries"),
            txn("b", Some(date(2024, 1, 6)), 7, "Groceries"),
            txn("c", Some(date(2024, 1, 7)), 1, "Groceries"),
        ];
        let buckets = BucketService::bucket(&txns, Granularity::Week, WeekStart::Sunday);
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].label, "Dec 31, 2023");
        assert_eq!(buckets[0].total_amount, dec(12));
        assert_eq!(buckets[1].label, "Jan 7, 2024");
    }

    #[test]
    fn same_day_trips_stay_separate_ordered_by_id() {
        let txns = vec![
            txn("second", Some(date(2024, 2, 3)), 3, "Groceries"),
            txn("first", Some(date(2024, 2, 1)), 2, "Fuel"),
            txn("late", Some(date(2024, 2, 3)), 1, "Groceries"),
        ];
        let buckets = BucketService::bucket(&txns, Granularity::Trip, WeekStart::Sunday);
        let ids: Vec<&str> = buckets
            .iter()
            .map(|b| b.transaction_ids[0].as_str())
            .collect();
        assert_eq!(ids, vec!["first", "late", "second"]);
        assert_eq!(buckets[1].label, buckets[2].label);
    }

    #[test]
    fn same_day_trips_ignore_input_order() {
        let a = txn("a", Some(date(2024, 1, 5)), 10, "Groceries");
        let b = txn("b", Some(date(2024, 1, 5)), 99, "Groceries");
        let forward =
            BucketService::bucket(&[a.clone(), b.clone()], Granularity::Trip, WeekStart::Sunday);
        let reversed = BucketService::bucket(&[b, a], Granularity::Trip, WeekStart::Sunday);
        let totals = |buckets: &[Bucket]| -> Vec<Decimal> {
            buckets.iter().map(|bucket| bucket.total_amount).collect()
        };
        assert_eq!(totals(&forward), vec![dec(10), dec(99)]);
        assert_eq!(totals(&forward), totals(&reversed));
        assert_eq!(forward, reversed);
    }

    #[test]
    fn item_filter_trims_items_but_not_totals() {
        let txns = vec![txn("a", Some(date(2024, 1, 2)), 10, "Groceries").with_items(vec![
            LineItem::new("Milk", dec(4), Some("Dairy & Eggs".into())),
            LineItem::new("Apples", dec(6), Some("Fruits".into())),
        ])];
        let vocab = CategoryVocabulary::item_categories();
        let buckets = BucketService::bucket_filtered(
            &txns,
            Granularity::Month,
            WeekStart::Sunday,
            &CategoryFilter::ItemCategory("fruits".into()),
            &vocab,
        );
        assert_eq!(buckets[0].total_amount, dec(10));
        assert_eq!(buckets[0].items.len(), 1);
        assert_eq!(buckets[0].items[0].item.name, "Apples");
    }

    #[test]
    fn type_label_filter_drops_receipts() {
        let txns = vec![
            txn("a", Some(date(2024, 1, 2)), 10, "Groceries"),
            txn("b", Some(date(2024, 1, 3)), 30, "Fuel"),
        ];
        let buckets = BucketService::bucket_filtered(
            &txns,
            Granularity::Month,
            WeekStart::Sunday,
            &CategoryFilter::TypeLabel("Gas".into()),
            &CategoryVocabulary::item_categories(),
        );
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].total_amount, dec(30));
    }

    #[test]
    fn category_series_is_zero_filled() {
        let txns = vec![
            txn("a", Some(date(2024, 1, 2)), 4, "Groceries").with_items(vec![LineItem::new(
                "Apples",
                dec(4),
                Some("Fruits".into()),
            )]),
            txn("b", Some(date(2024, 2, 2)), 3, "Groceries").with_items(vec![LineItem::new(
                "Carrots",
                dec(3),
                Some("Vegetables".into()),
            )]),
        ];
        let series = BucketService::category_series(
            &txns,
            Granularity::Month,
            WeekStart::Sunday,
            &["Fruits".to_string(), "Vegetables".to_string()],
            &CategoryVocabulary::item_categories(),
        );
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].value("Fruits"), dec(4));
        assert_eq!(series[0].value("Vegetables"), Decimal::ZERO);
        assert_eq!(series[1].value("Vegetables"), dec(3));
    }
}
