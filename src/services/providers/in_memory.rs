//! In-process provider backed by tokio `RwLock`ed maps
//!
//! Used for local runs (`DATA_SOURCE=memory`) and as the fixture behind the
//! HTTP tests. Implements all three provider traits with the same semantics as
//! the PostgreSQL provider: soft-deleted stores are invisible, category
//! weights are upserted, duplicate food preferences conflict, and writes that
//! reference an unknown member, category or food are rejected.
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    error::{AppError, AppResult, ErrorCode},
    models::{
        CategoryId, CategoryPreference, CategoryWeight, Coordinate, FoodId, FoodPreference,
        MemberContext, MemberId, RecommendationType, Store, StoreId,
    },
    services::geo::BoundingBox,
};

use super::{MemberProvider, PreferenceProvider, StoreProvider};

#[derive(Debug, Clone)]
struct MemberRecord {
    recommendation_type: RecommendationType,
    primary_address: Option<Coordinate>,
}

#[derive(Default)]
struct Catalog {
    members: HashMap<MemberId, MemberRecord>,
    stores: BTreeMap<StoreId, Store>,
    categories: BTreeSet<CategoryId>,
    foods: BTreeSet<FoodId>,
    category_preferences: BTreeMap<(MemberId, CategoryId), CategoryWeight>,
    food_preferences: BTreeMap<(MemberId, FoodId), FoodPreference>,
}

#[derive(Clone, Default)]
pub struct InMemoryProvider {
    inner: Arc<RwLock<Catalog>>,
    store_queries: Arc<AtomicUsize>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a member; `primary_address` is `None` for members without one
    pub async fn insert_member(
        &self,
        member_id: MemberId,
        recommendation_type: RecommendationType,
        primary_address: Option<Coordinate>,
    ) {
        let mut inner = self.inner.write().await;
        inner.members.insert(
            member_id,
            MemberRecord {
                recommendation_type,
                primary_address,
            },
        );
    }

    /// Adds a store; its categories and menu foods join the catalog
    pub async fn insert_store(&self, store: Store) {
        let mut inner = self.inner.write().await;
        inner.categories.extend(store.category_ids.iter().copied());
        inner.foods.extend(store.food_ids.iter().copied());
        inner.stores.insert(store.id, store);
    }

    pub async fn insert_category(&self, category_id: CategoryId) {
        self.inner.write().await.categories.insert(category_id);
    }

    pub async fn insert_food(&self, food_id: FoodId) {
        self.inner.write().await.foods.insert(food_id);
    }

    /// Number of candidate-store queries served so far
    pub fn store_query_count(&self) -> usize {
        self.store_queries.load(Ordering::SeqCst)
    }
}

impl Catalog {
    fn ensure_member(&self, member_id: MemberId) -> AppResult<()> {
        if self.members.contains_key(&member_id) {
            Ok(())
        } else {
            Err(AppError::not_found(
                ErrorCode::MemberNotFound,
                format!("Member {} not found", member_id),
            ))
        }
    }
}

#[async_trait::async_trait]
impl MemberProvider for InMemoryProvider {
    async fn resolve_member(&self, member_id: MemberId) -> AppResult<MemberContext> {
        let inner = self.inner.read().await;
        let record = inner.members.get(&member_id).ok_or_else(|| {
            AppError::not_found(
                ErrorCode::MemberNotFound,
                format!("Member {} not found", member_id),
            )
        })?;
        let reference = record.primary_address.ok_or_else(|| {
            AppError::not_found(
                ErrorCode::AddressNotFound,
                format!("Member {} has no primary address", member_id),
            )
        })?;

        Ok(MemberContext {
            member_id,
            recommendation_type: record.recommendation_type,
            reference,
        })
    }
}

#[async_trait::async_trait]
impl PreferenceProvider for InMemoryProvider {
    async fn category_preferences(
        &self,
        member_id: MemberId,
    ) -> AppResult<Vec<CategoryPreference>> {
        let inner = self.inner.read().await;
        Ok(inner
            .category_preferences
            .range((member_id, CategoryId::MIN)..=(member_id, CategoryId::MAX))
            .map(|((member_id, category_id), weight)| CategoryPreference {
                member_id: *member_id,
                category_id: *category_id,
                weight: *weight,
            })
            .collect())
    }

    async fn food_preferences(&self, member_id: MemberId) -> AppResult<Vec<FoodPreference>> {
        let inner = self.inner.read().await;
        Ok(inner
            .food_preferences
            .range((member_id, FoodId::MIN)..=(member_id, FoodId::MAX))
            .map(|(_, pref)| pref.clone())
            .collect())
    }

    async fn upsert_category_preference(
        &self,
        member_id: MemberId,
        category_id: CategoryId,
        weight: CategoryWeight,
    ) -> AppResult<CategoryPreference> {
        let mut inner = self.inner.write().await;
        inner.ensure_member(member_id)?;
        if !inner.categories.contains(&category_id) {
            return Err(AppError::not_found(
                ErrorCode::CategoryNotFound,
                format!("Category {} not found", category_id),
            ));
        }
        inner
            .category_preferences
            .insert((member_id, category_id), weight);
        Ok(CategoryPreference {
            member_id,
            category_id,
            weight,
        })
    }

    async fn add_food_preference(
        &self,
        member_id: MemberId,
        food_id: FoodId,
        is_preferred: bool,
    ) -> AppResult<FoodPreference> {
        let mut inner = self.inner.write().await;
        inner.ensure_member(member_id)?;
        if !inner.foods.contains(&food_id) {
            return Err(AppError::not_found(
                ErrorCode::FoodNotFound,
                format!("Food {} not found", food_id),
            ));
        }
        if inner.food_preferences.contains_key(&(member_id, food_id)) {
            return Err(AppError::conflict(
                ErrorCode::FoodPreferenceExists,
                format!("Food {} already has a preference", food_id),
            ));
        }

        let now = Utc::now();
        let pref = FoodPreference {
            member_id,
            food_id,
            is_preferred,
            created_at: now,
            updated_at: now,
        };
        inner
            .food_preferences
            .insert((member_id, food_id), pref.clone());
        Ok(pref)
    }

    async fn remove_food_preference(&self, member_id: MemberId, food_id: FoodId) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        inner
            .food_preferences
            .remove(&(member_id, food_id))
            .map(|_| ())
            .ok_or_else(|| {
                AppError::not_found(
                    ErrorCode::FoodPreferenceNotFound,
                    format!("No preference recorded for food {}", food_id),
                )
            })
    }
}

#[async_trait::async_trait]
impl StoreProvider for InMemoryProvider {
    async fn stores_within_bounding_box(
        &self,
        center: Coordinate,
        radius_km: f64,
    ) -> AppResult<Vec<Store>> {
        self.store_queries.fetch_add(1, Ordering::SeqCst);
        let bbox = BoundingBox::around(&center, radius_km);
        let inner = self.inner.read().await;
        Ok(inner
            .stores
            .values()
            .filter(|store| !store.is_deleted() && bbox.contains(&store.location))
            .cloned()
            .collect())
    }

    async fn find_store(&self, store_id: StoreId) -> AppResult<Option<Store>> {
        let inner = self.inner.read().await;
        Ok(inner
            .stores
            .get(&store_id)
            .filter(|store| !store.is_deleted())
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StoreType;

    fn store(id: StoreId, lat: f64, lon: f64) -> Store {
        Store {
            id,
            name: format!("store-{}", id),
            category_ids: vec![1],
            food_ids: vec![],
            location: Coordinate::new(lat, lon),
            average_price: 10_000,
            review_count: 0,
            view_count: 0,
            favorite_count: 0,
            store_type: StoreType::Restaurant,
            registered_at: Utc::now(),
            deleted_at: None,
        }
    }

    #[tokio::test]
    async fn test_resolve_member_errors() {
        let provider = InMemoryProvider::new();
        provider
            .insert_member(1, RecommendationType::Saver, None)
            .await;

        let err = provider.resolve_member(1).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::AddressNotFound);

        let err = provider.resolve_member(2).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::MemberNotFound);
    }

    async fn provider_with_members() -> InMemoryProvider {
        let provider = InMemoryProvider::new();
        provider
            .insert_member(1, RecommendationType::Saver, None)
            .await;
        provider
            .insert_member(2, RecommendationType::Balanced, None)
            .await;
        provider.insert_category(5).await;
        provider.insert_food(9).await;
        provider
    }

    #[tokio::test]
    async fn test_category_upsert_last_write_wins() {
        let provider = provider_with_members().await;
        provider
            .upsert_category_preference(1, 5, CategoryWeight::Like)
            .await
            .unwrap();
        provider
            .upsert_category_preference(1, 5, CategoryWeight::Dislike)
            .await
            .unwrap();
        provider
            .upsert_category_preference(2, 5, CategoryWeight::Like)
            .await
            .unwrap();

        let prefs = provider.category_preferences(1).await.unwrap();
        assert_eq!(prefs.len(), 1);
        assert_eq!(prefs[0].weight, CategoryWeight::Dislike);
    }

    #[tokio::test]
    async fn test_duplicate_food_preference_conflicts() {
        let provider = provider_with_members().await;
        provider.add_food_preference(1, 9, true).await.unwrap();

        let err = provider.add_food_preference(1, 9, false).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::FoodPreferenceExists);

        let prefs = provider.food_preferences(1).await.unwrap();
        assert_eq!(prefs.len(), 1);
        assert!(prefs[0].is_preferred);

        provider.remove_food_preference(1, 9).await.unwrap();
        let err = provider.remove_food_preference(1, 9).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::FoodPreferenceNotFound);
    }

    #[tokio::test]
    async fn test_writes_with_unknown_references_are_not_found() {
        let provider = provider_with_members().await;

        let err = provider
            .upsert_category_preference(1, 999, CategoryWeight::Like)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::CategoryNotFound);

        let err = provider.add_food_preference(1, 999, true).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::FoodNotFound);

        let err = provider
            .upsert_category_preference(42, 5, CategoryWeight::Like)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::MemberNotFound);

        let err = provider.add_food_preference(42, 9, true).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::MemberNotFound);

        assert!(provider.category_preferences(1).await.unwrap().is_empty());
        assert!(provider.food_preferences(42).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_catalog_registers_categories_and_foods() {
        let provider = provider_with_members().await;
        let mut menu = store(7, 37.4783, 126.9516);
        menu.category_ids = vec![30];
        menu.food_ids = vec![300];
        provider.insert_store(menu).await;

        assert!(provider
            .upsert_category_preference(1, 30, CategoryWeight::Dislike)
            .await
            .is_ok());
        assert!(provider.add_food_preference(1, 300, false).await.is_ok());
    }

    #[tokio::test]
    async fn test_bounding_box_query_wraps_across_antimeridian() {
        let provider = InMemoryProvider::new();
        provider.insert_store(store(1, -17.0, -179.95)).await;
        provider.insert_store(store(2, -17.0, 179.0)).await;

        let center = Coordinate::new(-17.0, 179.95);
        let found = provider
            .stores_within_bounding_box(center, 20.0)
            .await
            .unwrap();
        assert_eq!(found.iter().map(|s| s.id).collect::<Vec<_>>(), vec![1]);
    }

    #[tokio::test]
    async fn test_soft_deleted_stores_are_hidden() {
        let provider = InMemoryProvider::new();
        let mut gone = store(2, 37.4783, 126.9516);
        gone.deleted_at = Some(Utc::now());
        provider.insert_store(store(1, 37.4783, 126.9516)).await;
        provider.insert_store(gone).await;
        provider.insert_store(store(3, 35.1796, 129.0756)).await;

        let center = Coordinate::new(37.4783, 126.9516);
        let found = provider
            .stores_within_bounding_box(center, 3.0)
            .await
            .unwrap();
        assert_eq!(found.iter().map(|s| s.id).collect::<Vec<_>>(), vec![1]);
        assert_eq!(provider.store_query_count(), 1);

        assert!(provider.find_store(2).await.unwrap().is_none());
        assert!(provider.find_store(1).await.unwrap().is_some());
    }
}
