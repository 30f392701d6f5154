use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{CategoryId, FoodId, MemberId};

/// A member's stance on a store category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CategoryWeight {
    Dislike,
    #[default]
    Neutral,
    Like,
}

impl CategoryWeight {
    pub fn value(&self) -> i32 {
        match self {
            CategoryWeight::Dislike => -100,
            CategoryWeight::Neutral => 0,
            CategoryWeight::Like => 100,
        }
    }
}

impl TryFrom<i32> for CategoryWeight {
    type Error = i32;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            -100 => Ok(CategoryWeight::Dislike),
            0 => Ok(CategoryWeight::Neutral),
            100 => Ok(CategoryWeight::Like),
            other => Err(other),
        }
    }
}

impl Serialize for CategoryWeight {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(self.value())
    }
}

impl<'de> Deserialize<'de> for CategoryWeight {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = i32::deserialize(deserializer)?;
        CategoryWeight::try_from(raw).map_err(|v| {
            serde::de::Error::custom(format!("weight must be -100, 0 or 100, got {}", v))
        })
    }
}

/// Stored weight for one (member, category) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPreference {
    pub member_id: MemberId,
    pub category_id: CategoryId,
    pub weight: CategoryWeight,
}

/// Stored like/dislike flag for one (member, food) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodPreference {
    pub member_id: MemberId,
    pub food_id: FoodId,
    pub is_preferred: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FoodPreferenceKind {
    Liked,
    Disliked,
    Unknown,
}

/// Read-only view of everything a member has said about categories and foods.
///
/// Built once per request and shared with every scoring worker. Ids without a
/// stored row read as neutral / unknown.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PreferenceProfile {
    member_id: MemberId,
    category_weights: HashMap<CategoryId, CategoryWeight>,
    food_flags: HashMap<FoodId, bool>,
}

impl PreferenceProfile {
    /// Creates a profile with no preferences at all
    pub fn empty(member_id: MemberId) -> Self {
        Self {
            member_id,
            ..Default::default()
        }
    }

    /// Builds a profile from stored rows. A later row for the same id replaces an earlier one.
    pub fn from_rows(
        member_id: MemberId,
        categories: impl IntoIterator<Item = (CategoryId, CategoryWeight)>,
        foods: impl IntoIterator<Item = (FoodId, bool)>,
    ) -> Self {
        Self {
            member_id,
            category_weights: categories.into_iter().collect(),
            food_flags: foods.into_iter().collect(),
        }
    }

    pub fn member_id(&self) -> MemberId {
        self.member_id
    }

    pub fn category_weight(&self, category_id: CategoryId) -> i32 {
        self.category_weights
            .get(&category_id)
            .copied()
            .unwrap_or_default()
            .value()
    }

    pub fn food_preference(&self, food_id: FoodId) -> FoodPreferenceKind {
        match self.food_flags.get(&food_id) {
            Some(true) => FoodPreferenceKind::Liked,
            Some(false) => FoodPreferenceKind::Disliked,
            None => FoodPreferenceKind::Unknown,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.category_weights.is_empty() && self.food_flags.is_empty()
    }

    /// Categories the member explicitly likes
    pub fn liked_categories(&self) -> Vec<CategoryId> {
        let mut ids: Vec<CategoryId> = self
            .category_weights
            .iter()
            .filter(|(_, w)| **w == CategoryWeight::Like)
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Foods the member explicitly dislikes
    pub fn disliked_foods(&self) -> Vec<FoodId> {
        let mut ids: Vec<FoodId> = self
            .food_flags
            .iter()
            .filter(|(_, liked)| !**liked)
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        ids
    }
}
