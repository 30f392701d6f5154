use crate::models::{CategoryId, Coordinate, Store, StoreType};

use super::geo;

/// Optional predicates from the list query. `None` means "don't filter".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreFilters {
    /// Keep stores in at least one of these categories
    pub category_ids: Option<Vec<CategoryId>>,
    pub store_type: Option<StoreType>,
    /// Inclusive lower price bound
    pub min_price: Option<i64>,
    /// Inclusive upper price bound
    pub max_price: Option<i64>,
}

impl StoreFilters {
    pub fn matches(&self, store: &Store) -> bool {
        if let Some(categories) = &self.category_ids {
            if !categories.is_empty() && !categories.iter().any(|c| store.in_category(*c)) {
                return false;
            }
        }

        if let Some(store_type) = self.store_type {
            if store.store_type != store_type {
                return false;
            }
        }

        if let Some(min) = self.min_price {
            if store.average_price < min {
                return false;
            }
        }

        if let Some(max) = self.max_price {
            if store.average_price > max {
                return false;
            }
        }

        true
    }
}

/// A store that passed every predicate, with its exact distance from the origin
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub store: Store,
    pub distance_km: f64,
}

/// Narrows bounding-box results down to scorable candidates.
///
/// Radius bounds are validated by the caller; an empty result is not an error.
pub fn filter_candidates(
    stores: Vec<Store>,
    origin: &Coordinate,
    radius_km: f64,
    filters: &StoreFilters,
) -> Vec<Candidate> {
    stores
        .into_iter()
        .filter(|store| !store.is_deleted() && filters.matches(store))
        .filter_map(|store| {
            let distance_km = geo::distance_between(origin, &store.location);
            (distance_km <= radius_km).then_some(Candidate { store, distance_km })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    const ORIGIN: Coordinate = Coordinate {
        latitude: 37.4783,
        longitude: 126.9516,
    };

    /// A store `km` kilometres due north of the origin
    fn store_north(id: i64, km: f64, category: CategoryId, price: i64, kind: StoreType) -> Store {
        let lat = ORIGIN.latitude + km / (geo::EARTH_RADIUS_KM.to_radians());
        Store {
            id,
            name: format!("store-{}", id),
            category_ids: vec![category],
            food_ids: vec![],
            location: Coordinate::new(lat, ORIGIN.longitude),
            average_price: price,
            review_count: 0,
            view_count: 0,
            favorite_count: 0,
            store_type: kind,
            registered_at: Utc::now(),
            deleted_at: None,
        }
    }

    fn ids(candidates: &[Candidate]) -> Vec<i64> {
        candidates.iter().map(|c| c.store.id).collect()
    }

    #[test]
    fn test_radius_cut() {
        let stores = vec![
            store_north(1, 0.5, 1, 10_000, StoreType::Restaurant),
            store_north(2, 2.9, 1, 10_000, StoreType::Restaurant),
            store_north(3, 3.1, 1, 10_000, StoreType::Restaurant),
        ];
        let result = filter_candidates(stores, &ORIGIN, 3.0, &StoreFilters::default());
        assert_eq!(ids(&result), vec![1, 2]);
        assert!((result[0].distance_km - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_category_type_and_price_predicates() {
        let stores = vec![
            store_north(1, 0.1, 1, 5_000, StoreType::Restaurant),
            store_north(2, 0.1, 2, 12_000, StoreType::Cafe),
            store_north(3, 0.1, 3, 20_000, StoreType::Restaurant),
            store_north(4, 0.1, 2, 25_000, StoreType::Restaurant),
        ];

        let by_category = StoreFilters {
            category_ids: Some(vec![2, 3]),
            ..Default::default()
        };
        assert_eq!(
            ids(&filter_candidates(stores.clone(), &ORIGIN, 1.0, &by_category)),
            vec![2, 3, 4]
        );

        let by_type = StoreFilters {
            store_type: Some(StoreType::Cafe),
            ..Default::default()
        };
        assert_eq!(
            ids(&filter_candidates(stores.clone(), &ORIGIN, 1.0, &by_type)),
            vec![2]
        );

        let by_price = StoreFilters {
            min_price: Some(12_000),
            max_price: Some(20_000),
            ..Default::default()
        };
        assert_eq!(
            ids(&filter_candidates(stores, &ORIGIN, 1.0, &by_price)),
            vec![2, 3]
        );
    }

    #[test]
    fn test_empty_category_list_does_not_filter() {
        let stores = vec![store_north(1, 0.1, 9, 1, StoreType::Bar)];
        let filters = StoreFilters {
            category_ids: Some(vec![]),
            ..Default::default()
        };
        assert_eq!(filter_candidates(stores, &ORIGIN, 1.0, &filters).len(), 1);
    }

    #[test]
    fn test_nothing_matches_is_empty() {
        let stores = vec![store_north(1, 0.1, 1, 1, StoreType::Bar)];
        let filters = StoreFilters {
            store_type: Some(StoreType::Bakery),
            ..Default::default()
        };
        assert!(filter_candidates(stores, &ORIGIN, 1.0, &filters).is_empty());
    }

    #[test]
    fn test_soft_deleted_store_is_dropped() {
        let mut store = store_north(1, 0.1, 1, 1, StoreType::Bar);
        store.deleted_at = Some(Utc::now());
        assert!(filter_candidates(vec![store], &ORIGIN, 1.0, &StoreFilters::default()).is_empty());
    }
}
