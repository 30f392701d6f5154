//! Store ranking pipeline.
//!
//! `search` validates, resolves the member, loads the preference profile and
//! candidate stores, filters, scores every candidate, sorts and finally cuts
//! a page. Offset and cursor paging are two separate functions over the same
//! sorted sequence.

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Instant;

use crate::{
    error::{AppError, AppResult},
    models::{
        MemberId, PageInfo, PreferenceProfile, RankedPage, RankedStore, RecommendationType,
        SortBy, StoreId,
    },
    services::{
        filter::{filter_candidates, Candidate},
        preferences,
        query::{Paging, RankQuery, StoreSearchParams},
        scoring::ScoreCalculator,
        Providers,
    },
};

#[derive(Clone)]
pub struct RankingPipeline {
    providers: Providers,
    calculator: ScoreCalculator,
}

impl RankingPipeline {
    pub fn new(providers: Providers, calculator: ScoreCalculator) -> Self {
        Self {
            providers,
            calculator,
        }
    }

    /// Validates raw parameters, then ranks. Invalid input never touches a provider.
    pub async fn search(
        &self,
        member_id: MemberId,
        params: &StoreSearchParams,
    ) -> AppResult<RankedPage> {
        let query = params.validate()?;
        self.rank(member_id, &query).await
    }

    pub async fn rank(&self, member_id: MemberId, query: &RankQuery) -> AppResult<RankedPage> {
        let start = Instant::now();

        // Fails on a missing member or primary address before any scoring work
        let member = self.providers.members.resolve_member(member_id).await?;

        let (profile, stores) = tokio::try_join!(
            preferences::load_profile(self.providers.preferences.as_ref(), member_id),
            self.providers
                .stores
                .stores_within_bounding_box(query.origin, query.radius_km),
        )?;

        let fetched = stores.len();
        let candidates = filter_candidates(stores, &query.origin, query.radius_km, &query.filters);
        let candidate_count = candidates.len();

        let ranked = self
            .ranked_candidates(
                candidates,
                Arc::new(profile),
                member.recommendation_type,
                query.sort_by,
            )
            .await?;

        let page = match query.paging {
            Paging::Offset { page, size } => paginate_offset(ranked, page, size),
            Paging::Cursor { last_id, limit } => paginate_cursor(ranked, last_id, limit),
        };

        tracing::info!(
            member_id,
            recommendation_type = %member.recommendation_type,
            sort_by = %query.sort_by,
            radius_km = query.radius_km,
            fetched,
            candidates = candidate_count,
            returned = page.entries.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Stores ranked"
        );

        Ok(page)
    }

    /// Scores and sorts every candidate
    pub async fn ranked_candidates(
        &self,
        candidates: Vec<Candidate>,
        profile: Arc<PreferenceProfile>,
        recommendation_type: RecommendationType,
        sort_by: SortBy,
    ) -> AppResult<Vec<RankedStore>> {
        let mut ranked = self
            .score_candidates(candidates, profile, recommendation_type)
            .await?;
        sort_ranked(&mut ranked, sort_by);
        Ok(ranked)
    }

    /// Large candidate sets are split into chunks scored on blocking workers.
    ///
    /// Workers only read the shared profile. If the request is dropped the
    /// join handles go with it and any running chunk finishes without effect.
    async fn score_candidates(
        &self,
        candidates: Vec<Candidate>,
        profile: Arc<PreferenceProfile>,
        recommendation_type: RecommendationType,
    ) -> AppResult<Vec<RankedStore>> {
        let calculator = self.calculator;
        let chunk_size = calculator.config().parallel_threshold();

        if candidates.len() <= chunk_size {
            return Ok(score_chunk(
                &calculator,
                &profile,
                recommendation_type,
                candidates,
            ));
        }

        let total = candidates.len();
        let mut tasks = Vec::new();
        let mut remaining = candidates.into_iter();
        loop {
            let chunk: Vec<Candidate> = remaining.by_ref().take(chunk_size).collect();
            if chunk.is_empty() {
                break;
            }
            let profile = Arc::clone(&profile);
            tasks.push(tokio::task::spawn_blocking(move || {
                score_chunk(&calculator, &profile, recommendation_type, chunk)
            }));
        }

        tracing::debug!(
            candidates = total,
            workers = tasks.len(),
            "Scoring candidates in parallel"
        );

        let mut scored = Vec::with_capacity(total);
        for task in tasks {
            let chunk = task.await.map_err(|e| {
                tracing::error!(error = %e, "Scoring task failed");
                AppError::Internal(e.to_string())
            })?;
            scored.extend(chunk);
        }
        Ok(scored)
    }
}

fn score_chunk(
    calculator: &ScoreCalculator,
    profile: &PreferenceProfile,
    recommendation_type: RecommendationType,
    candidates: Vec<Candidate>,
) -> Vec<RankedStore> {
    candidates
        .into_iter()
        .map(|candidate| {
            let score = calculator.score(
                &candidate.store,
                profile,
                recommendation_type,
                candidate.distance_km,
            );
            RankedStore {
                store: candidate.store,
                score,
            }
        })
        .collect()
}

/// Primary ordering for a sort key, without the id tie-break
fn compare_by_key(sort_by: SortBy, a: &RankedStore, b: &RankedStore) -> Ordering {
    match sort_by {
        SortBy::Score => b.score.final_score.total_cmp(&a.score.final_score),
        SortBy::Distance => a.score.distance_km.total_cmp(&b.score.distance_km),
        SortBy::Review => b.store.review_count.cmp(&a.store.review_count),
        SortBy::Favorite => b.store.favorite_count.cmp(&a.store.favorite_count),
        SortBy::PriceLow => a.store.average_price.cmp(&b.store.average_price),
        SortBy::PriceHigh => b.store.average_price.cmp(&a.store.average_price),
        SortBy::InterestHigh => b
            .score
            .components
            .stability
            .total_cmp(&a.score.components.stability),
        SortBy::InterestLow => a
            .score
            .components
            .stability
            .total_cmp(&b.score.components.stability),
    }
}

/// Total order: the sort key, then store id ascending
pub fn compare(sort_by: SortBy, a: &RankedStore, b: &RankedStore) -> Ordering {
    compare_by_key(sort_by, a, b).then_with(|| a.store.id.cmp(&b.store.id))
}

pub fn sort_ranked(ranked: &mut [RankedStore], sort_by: SortBy) {
    ranked.sort_by(|a, b| compare(sort_by, a, b));
}

/// Zero-indexed page of `size` rows with total counts
pub fn paginate_offset(ranked: Vec<RankedStore>, page: u32, size: u32) -> RankedPage {
    let size = size.max(1) as usize;
    let total_count = ranked.len();
    let total_pages = total_count.div_ceil(size);
    let start = (page as usize).saturating_mul(size);

    let entries: Vec<RankedStore> = ranked.into_iter().skip(start).take(size).collect();
    let has_more = start.saturating_add(entries.len()) < total_count;

    RankedPage {
        entries,
        paging: PageInfo::Offset {
            page,
            size: size as u32,
            total_count,
            total_pages,
            has_more,
        },
    }
}

/// Up to `limit` rows after `last_id` in the sorted sequence
///
/// A cursor that no longer appears in the sequence yields an empty final page.
pub fn paginate_cursor(
    ranked: Vec<RankedStore>,
    last_id: Option<StoreId>,
    limit: u32,
) -> RankedPage {
    let limit_rows = limit.max(1) as usize;

    let start = match last_id {
        None => Some(0),
        Some(id) => ranked
            .iter()
            .position(|entry| entry.store.id == id)
            .map(|pos| pos + 1),
    };

    let Some(start) = start else {
        tracing::warn!(?last_id, "Cursor store not in ranked results");
        return RankedPage {
            entries: Vec::new(),
            paging: PageInfo::Cursor {
                limit,
                has_more: false,
                last_id: None,
            },
        };
    };

    let total = ranked.len();
    let entries: Vec<RankedStore> = ranked.into_iter().skip(start).take(limit_rows).collect();
    let has_more = start + entries.len() < total;
    let last_id = entries.last().map(|entry| entry.store.id);

    RankedPage {
        entries,
        paging: PageInfo::Cursor {
            limit,
            has_more,
            last_id,
        },
    }
}
