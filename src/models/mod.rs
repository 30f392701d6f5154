use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

mod page;
mod preference;
mod score;
mod store;

pub use page::{PageInfo, RankedPage, RankedStore};
pub use preference::{
    CategoryPreference, CategoryWeight, FoodPreference, FoodPreferenceKind, PreferenceProfile,
};
pub use score::{ComponentScores, ScoreResult, ScoreWeights};
pub use store::{Store, StoreType};

pub type MemberId = i64;
pub type StoreId = i64;
pub type CategoryId = i64;
pub type FoodId = i64;

/// Returned when a textual enum value (query parameter or database column) is unknown
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// A WGS84 point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

/// How a member wants recommendations to be weighted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendationType {
    /// Budget-focused
    Saver,
    /// Novelty-seeking
    Adventurer,
    Balanced,
}

impl RecommendationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationType::Saver => "SAVER",
            RecommendationType::Adventurer => "ADVENTURER",
            RecommendationType::Balanced => "BALANCED",
        }
    }

    /// Component weights for this type. Each row sums to 1.0.
    pub fn weights(&self) -> ScoreWeights {
        match self {
            RecommendationType::Saver => ScoreWeights {
                stability: 0.20,
                exploration: 0.10,
                budget_efficiency: 0.50,
                accessibility: 0.20,
            },
            RecommendationType::Adventurer => ScoreWeights {
                stability: 0.10,
                exploration: 0.50,
                budget_efficiency: 0.20,
                accessibility: 0.20,
            },
            RecommendationType::Balanced => ScoreWeights {
                stability: 0.25,
                exploration: 0.25,
                budget_efficiency: 0.25,
                accessibility: 0.25,
            },
        }
    }
}

impl FromStr for RecommendationType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SAVER" => Ok(RecommendationType::Saver),
            "ADVENTURER" => Ok(RecommendationType::Adventurer),
            "BALANCED" => Ok(RecommendationType::Balanced),
            _ => Err(ParseEnumError::new("recommendation type", s)),
        }
    }
}

impl Display for RecommendationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity and location of the authenticated member, as resolved by the account service
#[derive(Debug, Clone, PartialEq)]
pub struct MemberContext {
    pub member_id: MemberId,
    pub recommendation_type: RecommendationType,
    /// Coordinate of the member's primary address
    pub reference: Coordinate,
}

/// Sort keys accepted by the store list query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortBy {
    #[default]
    Score,
    Distance,
    Review,
    Favorite,
    PriceLow,
    PriceHigh,
    /// Highest stability score first
    InterestHigh,
    InterestLow,
}

impl SortBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::Score => "SCORE",
            SortBy::Distance => "DISTANCE",
            SortBy::Review => "REVIEW",
            SortBy::Favorite => "FAVORITE",
            SortBy::PriceLow => "PRICE_LOW",
            SortBy::PriceHigh => "PRICE_HIGH",
            SortBy::InterestHigh => "INTEREST_HIGH",
            SortBy::InterestLow => "INTEREST_LOW",
        }
    }
}

impl FromStr for SortBy {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SCORE" => Ok(SortBy::Score),
            "DISTANCE" => Ok(SortBy::Distance),
            "REVIEW" => Ok(SortBy::Review),
            "FAVORITE" => Ok(SortBy::Favorite),
            "PRICE_LOW" => Ok(SortBy::PriceLow),
            "PRICE_HIGH" => Ok(SortBy::PriceHigh),
            "INTEREST_HIGH" => Ok(SortBy::InterestHigh),
            "INTEREST_LOW" => Ok(SortBy::InterestLow),
            _ => Err(ParseEnumError::new("sort key", s)),
        }
    }
}

impl Display for SortBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
