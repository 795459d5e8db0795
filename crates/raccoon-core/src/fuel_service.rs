use raccoon_domain::{round_money, FuelInsights, StationStats, Transaction};
use rust_decimal::Decimal;
use tracing::debug;

/// Miles per gallon assumed for range estimates.
pub const MPG_ESTIMATE: Decimal = Decimal::from_parts(25, 0, 0, false, 0);
/// Price per gallon used to estimate volume when a receipt has no quantity.
pub const FALLBACK_UNIT_PRICE: Decimal = Decimal::from_parts(400, 0, 0, false, 2);
/// Unit prices at or above this are extraction mistakes.
pub const UNIT_PRICE_CEILING: Decimal = Decimal::from_parts(10, 0, 0, false, 0);

const FUEL_LABELS: [&str; 2] = ["Fuel", "Transportation"];

/// Fill-up statistics for fuel receipts.
pub struct FuelService;

struct Fill {
    gallons: Decimal,
    unit_price: Option<Decimal>,
}

impl FuelService {
    /// Receipts whose type label is fuel-related.
    pub fn fuel_transactions(transactions: &[Transaction]) -> Vec<Transaction> {
        transactions
            .iter()
            .filter(|txn| FUEL_LABELS.iter().any(|label| txn.type_label == *label))
            .cloned()
            .collect()
    }

    /// Per-station and overall figures over dated fuel receipts. Stations are
    /// ordered by visit count, first seen wins ties.
    pub fn insights(transactions: &[Transaction]) -> FuelInsights {
        let mut stations: Vec<StationStats> = Vec::new();
        let mut station_prices: Vec<(Decimal, usize)> = Vec::new();
        let mut price_sum = Decimal::ZERO;
        let mut price_count = 0usize;
        let mut gallons = Decimal::ZERO;
        let mut last_fill = None;

        for txn in transactions {
            let Some(date) = txn.date else { continue };
            let fill = Self::fill(txn);
            gallons += fill.gallons;
            last_fill = last_fill.max(Some(date));

            let address = txn
                .merchant_address
                .clone()
                .unwrap_or_else(|| txn.merchant.clone());
            let index = match stations
                .iter()
                .position(|station| station.name == txn.merchant && station.address == address)
            {
                Some(index) => index,
                None => {
                    stations.push(StationStats {
                        name: txn.merchant.clone(),
                        address,
                        visits: 0,
                        average_unit_price: Decimal::ZERO,
                        last_visit: None,
                    });
                    station_prices.push((Decimal::ZERO, 0));
                    stations.len() - 1
                }
            };
            let station = &mut stations[index];
            station.visits += 1;
            station.last_visit = station.last_visit.max(Some(date));

            match fill.unit_price {
                Some(price) if price > Decimal::ZERO && price < UNIT_PRICE_CEILING => {
                    price_sum += price;
                    price_count += 1;
                    let (sum, count) = &mut station_prices[index];
                    *sum += price;
                    *count += 1;
                }
                Some(price) => debug!(id = %txn.id, %price, "unit price outlier ignored"),
                None => {}
            }
        }

        for (station, (sum, count)) in stations.iter_mut().zip(station_prices) {
            if count > 0 {
                station.average_unit_price = round_money(sum / Decimal::from(count as u64));
            }
        }
        stations.sort_by(|a, b| b.visits.cmp(&a.visits));

        let average_unit_price = if price_count == 0 {
            Decimal::ZERO
        } else {
            round_money(price_sum / Decimal::from(price_count as u64))
        };
        FuelInsights {
            stations,
            average_unit_price,
            estimated_gallons: round_money(gallons),
            estimated_miles: (gallons * MPG_ESTIMATE).round(),
            last_fill,
        }
    }

    /// Volume from the first line's quantity, else estimated from the total
    /// at the fallback price. Receipts without lines have no known unit price.
    fn fill(txn: &Transaction) -> Fill {
        let estimated = txn.amount / FALLBACK_UNIT_PRICE;
        let Some(line) = txn.line_items.first() else {
            return Fill {
                gallons: estimated,
                unit_price: None,
            };
        };
        let gallons = match line.quantity {
            Some(quantity) if quantity > Decimal::ZERO => quantity,
            _ => estimated,
        };
        if gallons <= Decimal::ZERO {
            return Fill {
                gallons: Decimal::ZERO,
                unit_price: None,
            };
        }
        let paid = if line.price > Decimal::ZERO {
            line.price
        } else {
            txn.amount
        };
        Fill {
            gallons,
            unit_price: Some(paid / gallons),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use raccoon_domain::LineItem;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    fn dec(text: &str) -> Decimal {
        text.parse().unwrap()
    }

    fn pump(id: &str, day: Option<NaiveDate>, station: &str, total: &str, gallons: &str) -> Transaction {
        Transaction::new(id, day, dec(total), station, "Fuel").with_items(vec![LineItem::new(
            "Regular",
            dec(total),
            Some("Fuel".into()),
        )
        .with_quantity(dec(gallons))])
    }

    #[test]
    fn insights_rank_stations_and_skip_outliers() {
        let txns = vec![
            pump("1", date(2024, 1, 3), "Shell", "40.00", "10"),
            pump("2", date(2024, 1, 9), "Costco", "30.00", "10"),
            pump("3", date(2024, 1, 20), "Costco", "35.00", "10"),
            // 50 / 2 = 25 per gallon: an extraction error.
            pump("4", date(2024, 1, 25), "Shell", "50.00", "2"),
            pump("5", None, "Shell", "99.00", "20"),
        ];
        let insights = FuelService::insights(&txns);
        assert_eq!(insights.stations[0].name, "Shell");
        assert_eq!(insights.stations[0].visits, 2);
        assert_eq!(insights.stations[0].average_unit_price, dec("4.00"));
        assert_eq!(insights.stations[1].average_unit_price, dec("3.25"));
        assert_eq!(insights.average_unit_price, dec("3.50"));
        assert_eq!(insights.estimated_gallons, dec("32"));
        assert_eq!(insights.estimated_miles, dec("800"));
        assert_eq!(insights.last_fill, date(2024, 1, 25));
    }

    #[test]
    fn receipts_without_quantity_use_fallback_price() {
        let txns = vec![Transaction::new("1", date(2024, 2, 1), dec("20.00"), "Arco", "Fuel")];
        let insights = FuelService::insights(&txns);
        assert_eq!(insights.estimated_gallons, dec("5"));
        assert_eq!(insights.average_unit_price, Decimal::ZERO);
        assert_eq!(insights.stations[0].visits, 1);
    }

    #[test]
    fn fuel_transactions_filters_by_label() {
        let txns = vec![
            Transaction::new("1", None, dec("1"), "A", "Fuel"),
            Transaction::new("2", None, dec("1"), "B", "Groceries"),
            Transaction::new("3", None, dec("1"), "C", "Transportation"),
        ];
        assert_eq!(FuelService::fuel_transactions(&txns).len(), 2);
    }
}
