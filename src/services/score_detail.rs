use crate::{
    error::{AppError, AppResult, ErrorCode},
    models::{Coordinate, MemberId, RankedStore, StoreId},
    services::{
        geo, preferences, query::ScoreDetailParams, scoring::ScoreCalculator, Providers,
    },
};

/// Recomputes the score breakdown for a single store.
///
/// Goes through the same profile load and [`ScoreCalculator::score`] call as
/// the list pipeline, so for the same coordinate both report identical numbers.
#[derive(Clone)]
pub struct ScoreDetailResolver {
    providers: Providers,
    calculator: ScoreCalculator,
}

impl ScoreDetailResolver {
    pub fn new(providers: Providers, calculator: ScoreCalculator) -> Self {
        Self {
            providers,
            calculator,
        }
    }

    pub async fn resolve(
        &self,
        member_id: MemberId,
        store_id: StoreId,
        params: &ScoreDetailParams,
    ) -> AppResult<RankedStore> {
        let coordinate = params.validate()?;
        self.detail(member_id, store_id, coordinate).await
    }

    /// Without a coordinate the member's primary address is used
    pub async fn detail(
        &self,
        member_id: MemberId,
        store_id: StoreId,
        coordinate: Option<Coordinate>,
    ) -> AppResult<RankedStore> {
        let member = self.providers.members.resolve_member(member_id).await?;
        let origin = coordinate.unwrap_or(member.reference);

        let (profile, store) = tokio::try_join!(
            preferences::load_profile(self.providers.preferences.as_ref(), member_id),
            self.providers.stores.find_store(store_id),
        )?;

        let store = store.ok_or_else(|| {
            AppError::not_found(
                ErrorCode::StoreNotFound,
                format!("Store {} not found", store_id),
            )
        })?;

        let distance_km = geo::distance_between(&origin, &store.location);
        let score = self
            .calculator
            .score(&store, &profile, member.recommendation_type, distance_km);

        tracing::debug!(
            member_id,
            store_id,
            final_score = score.final_score,
            distance_km,
            "Score detail computed"
        );

        Ok(RankedStore { store, score })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CategoryWeight, RecommendationType, SortBy, Store, StoreType};
    use crate::services::providers::{InMemoryProvider, PreferenceProvider};
    use crate::services::query::{Paging, RankQuery};
    use crate::services::ranking::RankingPipeline;
    use chrono::Utc;

    const HOME: Coordinate = Coordinate {
        latitude: 37.4783,
        longitude: 126.9516,
    };

    fn store(id: StoreId, lat: f64, lon: f64, categories: Vec<i64>, foods: Vec<i64>) -> Store {
        Store {
            id,
            name: format!("store-{}", id),
            category_ids: categories,
            food_ids: foods,
            location: Coordinate::new(lat, lon),
            average_price: 7_000 + id * 1_500,
            review_count: id,
            view_count: 0,
            favorite_count: 0,
            store_type: StoreType::Restaurant,
            registered_at: Utc::now(),
            deleted_at: None,
        }
    }

    async fn fixture() -> (InMemoryProvider, Providers) {
        let provider = InMemoryProvider::new();
        provider
            .insert_member(1, RecommendationType::Adventurer, Some(HOME))
            .await;
        provider
            .insert_member(2, RecommendationType::Balanced, None)
            .await;
        provider
            .insert_store(store(1, 37.4800, 126.9530, vec![1], vec![100, 101]))
            .await;
        provider
            .insert_store(store(2, 37.4760, 126.9490, vec![2], vec![]))
            .await;
        provider
            .insert_store(store(3, 37.4830, 126.9560, vec![1, 3], vec![101]))
            .await;
        provider
            .insert_store(store(4, 37.4700, 126.9600, vec![4], vec![100]))
            .await;

        provider
            .upsert_category_preference(1, 1, CategoryWeight::Like)
            .await
            .unwrap();
        provider
            .upsert_category_preference(1, 2, CategoryWeight::Dislike)
            .await
            .unwrap();
        provider.add_food_preference(1, 100, false).await.unwrap();

        let providers = Providers::from_shared(provider.clone());
        (provider, providers)
    }

    #[tokio::test]
    async fn test_detail_matches_list_scores() {
        let (_, providers) = fixture().await;
        let pipeline = RankingPipeline::new(providers.clone(), ScoreCalculator::default());
        let resolver = ScoreDetailResolver::new(providers, ScoreCalculator::default());

        let origin = Coordinate::new(37.4790, 126.9520);
        let mut query = RankQuery::new(origin);
        query.sort_by = SortBy::Score;
        query.paging = Paging::Offset { page: 0, size: 100 };
        let page = pipeline.rank(1, &query).await.unwrap();
        assert_eq!(page.entries.len(), 4);

        for entry in &page.entries {
            let detail = resolver
                .detail(1, entry.store.id, Some(origin))
                .await
                .unwrap();
            assert_eq!(detail.score, entry.score);
        }
    }

    #[tokio::test]
    async fn test_detail_defaults_to_primary_address() {
        let (_, providers) = fixture().await;
        let resolver = ScoreDetailResolver::new(providers, ScoreCalculator::default());

        let implicit = resolver.detail(1, 1, None).await.unwrap();
        let explicit = resolver.detail(1, 1, Some(HOME)).await.unwrap();
        assert_eq!(implicit.score, explicit.score);
        assert_eq!(implicit.score.recommendation_type, RecommendationType::Adventurer);
    }

    #[tokio::test]
    async fn test_detail_not_found_cases() {
        let (_, providers) = fixture().await;
        let resolver = ScoreDetailResolver::new(providers, ScoreCalculator::default());

        let err = resolver.detail(1, 999, None).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::StoreNotFound);

        let err = resolver.detail(2, 1, None).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::AddressNotFound);

        let err = resolver.detail(3, 1, None).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::MemberNotFound);
    }

    #[tokio::test]
    async fn test_detail_of_soft_deleted_store_is_not_found() {
        let (provider, providers) = fixture().await;
        let mut gone = store(9, HOME.latitude, HOME.longitude, vec![1], vec![]);
        gone.deleted_at = Some(Utc::now());
        provider.insert_store(gone).await;

        let resolver = ScoreDetailResolver::new(providers, ScoreCalculator::default());
        let err = resolver.detail(1, 9, None).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::StoreNotFound);
    }

    #[tokio::test]
    async fn test_resolve_rejects_half_coordinate() {
        let (_, providers) = fixture().await;
        let resolver = ScoreDetailResolver::new(providers, ScoreCalculator::default());
        let params = ScoreDetailParams {
            latitude: Some(37.0),
            longitude: None,
        };
        let err = resolver.resolve(1, 1, &params).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidLongitude);
    }
}
