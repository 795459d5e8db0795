use raccoon_domain::{Coordinates, LocationGroup, Transaction};
use rust_decimal::Decimal;
use tracing::debug;

use crate::source::GeoCache;

/// Addresses this short are too vague to place on a map.
const MIN_ADDRESS_LEN: usize = 6;
const CACHE_PREFIX: &str = "geo_";

/// Spend grouped by store address, with coordinates from a cache.
pub struct LocationService;

impl LocationService {
    /// One group per normalized address, in first-seen order. Receipts with
    /// no usable address are left out.
    pub fn group_by_address(transactions: &[Transaction]) -> Vec<LocationGroup> {
        let mut groups: Vec<LocationGroup> = Vec::new();
        for txn in transactions {
            let Some(address) = txn.merchant_address.as_deref().map(str::trim) else {
                continue;
            };
            if address.chars().count() < MIN_ADDRESS_LEN {
                continue;
            }
            let key = Self::normalize_address(address);
            match groups.iter_mut().find(|group| group.key == key) {
                Some(group) => {
                    group.total += txn.amount;
                    group.visits += 1;
                }
                None => groups.push(LocationGroup {
                    key,
                    name: txn.merchant.clone(),
                    address: address.to_string(),
                    total: txn.amount,
                    visits: 1,
                    coordinates: None,
                }),
            }
        }
        groups
    }

    pub fn normalize_address(address: &str) -> String {
        address.trim().to_lowercase()
    }

    pub fn cache_key(group: &LocationGroup) -> String {
        format!("{CACHE_PREFIX}{}", group.key)
    }

    /// Fills in coordinates already known to `cache`.
    pub fn locate(groups: Vec<LocationGroup>, cache: &dyn GeoCache) -> Vec<LocationGroup> {
        groups
            .into_iter()
            .map(|mut group| {
                if group.coordinates.is_none() {
                    group.coordinates = cache.get(&Self::cache_key(&group));
                }
                group
            })
            .collect()
    }

    /// Groups that still need a lookup.
    pub fn unresolved(groups: &[LocationGroup]) -> Vec<&LocationGroup> {
        groups
            .iter()
            .filter(|group| group.coordinates.is_none())
            .collect()
    }

    pub fn remember(cache: &mut dyn GeoCache, group: &LocationGroup, coordinates: Coordinates) {
        debug!(key = %group.key, "caching coordinates");
        cache.put(&Self::cache_key(group), coordinates);
    }

    pub fn total_located(groups: &[LocationGroup]) -> Decimal {
        groups
            .iter()
            .filter(|group| group.coordinates.is_some())
            .map(|group| group.total)
            .sum()
    }
}
