use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

use super::{CategoryId, Coordinate, FoodId, ParseEnumError, StoreId};

/// Kind of venue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StoreType {
    Restaurant,
    Cafe,
    Bar,
    Bakery,
    FoodTruck,
}

impl StoreType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreType::Restaurant => "RESTAURANT",
            StoreType::Cafe => "CAFE",
            StoreType::Bar => "BAR",
            StoreType::Bakery => "BAKERY",
            StoreType::FoodTruck => "FOOD_TRUCK",
        }
    }
}

impl FromStr for StoreType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "RESTAURANT" => Ok(StoreType::Restaurant),
            "CAFE" => Ok(StoreType::Cafe),
            "BAR" => Ok(StoreType::Bar),
            "BAKERY" => Ok(StoreType::Bakery),
            "FOOD_TRUCK" => Ok(StoreType::FoodTruck),
            _ => Err(ParseEnumError::new("store type", s)),
        }
    }
}

impl Display for StoreType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A store as seen by the ranking engine.
///
/// Counters are read-only here; they are bumped by other write paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
    pub id: StoreId,
    pub name: String,
    pub category_ids: Vec<CategoryId>,
    /// Foods on the store's menu
    pub food_ids: Vec<FoodId>,
    pub location: Coordinate,
    /// Average price per person, in whole currency units
    pub average_price: i64,
    pub review_count: i64,
    pub view_count: i64,
    pub favorite_count: i64,
    pub store_type: StoreType,
    pub registered_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Store {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn in_category(&self, category_id: CategoryId) -> bool {
        self.category_ids.contains(&category_id)
    }
}
