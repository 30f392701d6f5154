use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult, ErrorCode},
    middleware::request_id::RequestId,
    models::{
        CategoryId, CategoryPreference, FoodId, FoodPreference, PageInfo, RankedPage,
        RankedStore, RecommendationType, ScoreWeights, StoreId, StoreType,
    },
    services::{
        preferences,
        query::{ScoreDetailParams, StoreSearchParams},
    },
};

use super::{AppState, AuthenticatedMember};

// Request/Response types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreEntryResponse {
    pub store_id: StoreId,
    pub name: String,
    pub category_ids: Vec<CategoryId>,
    pub store_type: StoreType,
    pub average_price: i64,
    pub review_count: i64,
    pub favorite_count: i64,
    pub view_count: i64,
    /// Kilometres from the query coordinate
    pub distance: f64,
    pub final_score: f64,
    pub stability_score: f64,
    pub exploration_score: f64,
    pub budget_efficiency_score: f64,
    pub accessibility_score: f64,
}

impl From<&RankedStore> for StoreEntryResponse {
    fn from(entry: &RankedStore) -> Self {
        let store = &entry.store;
        let score = &entry.score;
        Self {
            store_id: store.id,
            name: store.name.clone(),
            category_ids: store.category_ids.clone(),
            store_type: store.store_type,
            average_price: store.average_price,
            review_count: store.review_count,
            favorite_count: store.favorite_count,
            view_count: store.view_count,
            distance: round_distance(score.distance_km),
            final_score: score.final_score,
            stability_score: score.components.stability,
            exploration_score: score.components.exploration,
            budget_efficiency_score: score.components.budget_efficiency,
            accessibility_score: score.components.accessibility,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum PagingResponse {
    #[serde(rename_all = "camelCase")]
    Offset {
        page: u32,
        size: u32,
        total_count: usize,
        total_pages: usize,
        has_more: bool,
    },
    #[serde(rename_all = "camelCase")]
    Cursor {
        limit: u32,
        has_more: bool,
        last_id: Option<StoreId>,
    },
}

impl From<&PageInfo> for PagingResponse {
    fn from(info: &PageInfo) -> Self {
        match *info {
            PageInfo::Offset {
                page,
                size,
                total_count,
                total_pages,
                has_more,
            } => PagingResponse::Offset {
                page,
                size,
                total_count,
                total_pages,
                has_more,
            },
            PageInfo::Cursor {
                limit,
                has_more,
                last_id,
            } => PagingResponse::Cursor {
                limit,
                has_more,
                last_id,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StoreListResponse {
    pub stores: Vec<StoreEntryResponse>,
    pub paging: PagingResponse,
}

impl From<&RankedPage> for StoreListResponse {
    fn from(page: &RankedPage) -> Self {
        Self {
            stores: page.entries.iter().map(StoreEntryResponse::from).collect(),
            paging: PagingResponse::from(&page.paging),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreDetailResponse {
    pub store_id: StoreId,
    pub store_name: String,
    pub recommendation_type: RecommendationType,
    pub distance: f64,
    pub weights: ScoreWeights,
    pub stability_score: f64,
    pub exploration_score: f64,
    pub budget_efficiency_score: f64,
    pub accessibility_score: f64,
    pub weighted_stability_score: f64,
    pub weighted_exploration_score: f64,
    pub weighted_budget_efficiency_score: f64,
    pub weighted_accessibility_score: f64,
    pub final_score: f64,
}

impl From<&RankedStore> for ScoreDetailResponse {
    fn from(entry: &RankedStore) -> Self {
        let score = &entry.score;
        Self {
            store_id: entry.store.id,
            store_name: entry.store.name.clone(),
            recommendation_type: score.recommendation_type,
            distance: round_distance(score.distance_km),
            weights: score.weights,
            stability_score: score.components.stability,
            exploration_score: score.components.exploration,
            budget_efficiency_score: score.components.budget_efficiency,
            accessibility_score: score.components.accessibility,
            weighted_stability_score: score.weighted.stability,
            weighted_exploration_score: score.weighted.exploration,
            weighted_budget_efficiency_score: score.weighted.budget_efficiency,
            weighted_accessibility_score: score.weighted.accessibility,
            final_score: score.final_score,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PreferencesResponse {
    pub categories: Vec<CategoryPreference>,
    pub foods: Vec<FoodPreference>,
}

#[derive(Debug, Deserialize)]
pub struct SetCategoryPreferenceRequest {
    pub weight: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddFoodPreferenceRequest {
    pub food_id: FoodId,
    pub is_preferred: bool,
}

fn round_distance(km: f64) -> f64 {
    (km * 1000.0).round() / 1000.0
}

fn invalid_request(rejection: impl std::fmt::Display) -> AppError {
    AppError::validation(ErrorCode::InvalidQuery, rejection.to_string())
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Ranked list of stores around a coordinate
pub async fn list_stores(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    AuthenticatedMember(member_id): AuthenticatedMember,
    query: Result<Query<StoreSearchParams>, QueryRejection>,
) -> AppResult<Json<StoreListResponse>> {
    let Query(params) = query.map_err(invalid_request)?;

    tracing::info!(
        request_id = %request_id,
        member_id,
        sort_by = params.sort_by.as_deref().unwrap_or("SCORE"),
        "Processing store list request"
    );

    let page = state.pipeline.search(member_id, &params).await?;

    Ok(Json(StoreListResponse::from(&page)))
}

/// Score breakdown for a single store
pub async fn store_score(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    AuthenticatedMember(member_id): AuthenticatedMember,
    path: Result<Path<StoreId>, PathRejection>,
    query: Result<Query<ScoreDetailParams>, QueryRejection>,
) -> AppResult<Json<ScoreDetailResponse>> {
    let Path(store_id) = path.map_err(invalid_request)?;
    let Query(params) = query.map_err(invalid_request)?;

    tracing::info!(
        request_id = %request_id,
        member_id,
        store_id,
        "Processing score detail request"
    );

    let detail = state
        .score_detail
        .resolve(member_id, store_id, &params)
        .await?;

    Ok(Json(ScoreDetailResponse::from(&detail)))
}

/// The caller's stored category and food preferences
pub async fn get_preferences(
    State(state): State<AppState>,
    AuthenticatedMember(member_id): AuthenticatedMember,
) -> AppResult<Json<PreferencesResponse>> {
    let rows = preferences::list_preferences(state.providers.preferences.as_ref(), member_id).await?;
    Ok(Json(PreferencesResponse {
        categories: rows.categories,
        foods: rows.foods,
    }))
}

/// Set the weight for one category
pub async fn set_category_preference(
    State(state): State<AppState>,
    AuthenticatedMember(member_id): AuthenticatedMember,
    path: Result<Path<CategoryId>, PathRejection>,
    body: Result<Json<SetCategoryPreferenceRequest>, JsonRejection>,
) -> AppResult<Json<CategoryPreference>> {
    let Path(category_id) = path.map_err(invalid_request)?;
    let Json(request) = body.map_err(invalid_request)?;

    let pref = preferences::set_category_weight(
        state.providers.preferences.as_ref(),
        member_id,
        category_id,
        request.weight,
    )
    .await?;

    Ok(Json(pref))
}

/// Record a like or dislike for a food
pub async fn add_food_preference(
    State(state): State<AppState>,
    AuthenticatedMember(member_id): AuthenticatedMember,
    body: Result<Json<AddFoodPreferenceRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<FoodPreference>)> {
    let Json(request) = body.map_err(invalid_request)?;

    let pref = preferences::add_food_preference(
        state.providers.preferences.as_ref(),
        member_id,
        request.food_id,
        request.is_preferred,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(pref)))
}

/// Forget the like or dislike for a food
pub async fn remove_food_preference(
    State(state): State<AppState>,
    AuthenticatedMember(member_id): AuthenticatedMember,
    path: Result<Path<FoodId>, PathRejection>,
) -> AppResult<StatusCode> {
    let Path(food_id) = path.map_err(invalid_request)?;

    state
        .providers
        .preferences
        .remove_food_preference(member_id, food_id)
        .await?;

    tracing::info!(member_id, food_id, "Food preference removed");

    Ok(StatusCode::NO_CONTENT)
}
