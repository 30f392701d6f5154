//! Data providers for the ranking engine
//!
//! The engine never talks to storage directly. Member lookup, preference rows
//! and candidate stores come through the traits below, so the same pipeline
//! runs against PostgreSQL in production and an in-process catalog in tests.
use crate::{
    error::AppResult,
    models::{
        CategoryId, CategoryPreference, CategoryWeight, Coordinate, FoodId, FoodPreference,
        MemberContext, MemberId, Store, StoreId,
    },
};

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryProvider;
pub use postgres::PgProvider;

/// Account/profile collaborator
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MemberProvider: Send + Sync {
    /// Resolves the member's recommendation type and primary-address coordinate
    ///
    /// Fails with `MEMBER_NOT_FOUND` for an unknown member and
    /// `ADDRESS_NOT_FOUND` when the member has no primary address.
    async fn resolve_member(&self, member_id: MemberId) -> AppResult<MemberContext>;
}

/// Category and food preference rows
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PreferenceProvider: Send + Sync {
    async fn category_preferences(&self, member_id: MemberId)
        -> AppResult<Vec<CategoryPreference>>;

    async fn food_preferences(&self, member_id: MemberId) -> AppResult<Vec<FoodPreference>>;

    /// Sets the weight for a category, replacing any previous weight
    async fn upsert_category_preference(
        &self,
        member_id: MemberId,
        category_id: CategoryId,
        weight: CategoryWeight,
    ) -> AppResult<CategoryPreference>;

    /// Records a like/dislike for a food. An existing row for the pair is a conflict.
    async fn add_food_preference(
        &self,
        member_id: MemberId,
        food_id: FoodId,
        is_preferred: bool,
    ) -> AppResult<FoodPreference>;

    async fn remove_food_preference(&self, member_id: MemberId, food_id: FoodId) -> AppResult<()>;
}

/// Candidate store source
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait StoreProvider: Send + Sync {
    /// Live stores inside the coarse bounding box around `center`
    ///
    /// May return stores slightly beyond `radius_km`; the exact distance check
    /// happens afterwards.
    async fn stores_within_bounding_box(
        &self,
        center: Coordinate,
        radius_km: f64,
    ) -> AppResult<Vec<Store>>;

    /// A live store by id, `None` when unknown or soft-deleted
    async fn find_store(&self, store_id: StoreId) -> AppResult<Option<Store>>;
}
