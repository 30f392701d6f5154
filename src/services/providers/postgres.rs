//! PostgreSQL provider
//!
//! Reads members, preferences and stores with plain runtime queries against
//! the schema in `migrations/`. Store categories and menu foods are gathered
//! with array subqueries so one round trip returns complete `Store` values.
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::{
    error::{AppError, AppResult, ErrorCode},
    models::{
        CategoryId, CategoryPreference, CategoryWeight, Coordinate, FoodId, FoodPreference,
        MemberContext, MemberId, RecommendationType, Store, StoreId, StoreType,
    },
    services::geo::BoundingBox,
};

use super::{MemberProvider, PreferenceProvider, StoreProvider};

const SQL_RESOLVE_MEMBER: &str = r#"
SELECT m.recommendation_type, a.latitude, a.longitude
FROM members m
LEFT JOIN member_addresses a ON a.member_id = m.id AND a.is_primary
WHERE m.id = $1
"#;

const SQL_CATEGORY_PREFERENCES: &str = r#"
SELECT member_id, category_id, weight
FROM category_preferences
WHERE member_id = $1
ORDER BY category_id
"#;

const SQL_FOOD_PREFERENCES: &str = r#"
SELECT member_id, food_id, is_preferred, created_at, updated_at
FROM food_preferences
WHERE member_id = $1
ORDER BY food_id
"#;

const SQL_UPSERT_CATEGORY_PREFERENCE: &str = r#"
INSERT INTO category_preferences (member_id, category_id, weight, updated_at)
VALUES ($1, $2, $3, NOW())
ON CONFLICT (member_id, category_id)
DO UPDATE SET weight = EXCLUDED.weight, updated_at = NOW()
"#;

const SQL_INSERT_FOOD_PREFERENCE: &str = r#"
INSERT INTO food_preferences (member_id, food_id, is_preferred)
VALUES ($1, $2, $3)
ON CONFLICT (member_id, food_id) DO NOTHING
RETURNING member_id, food_id, is_preferred, created_at, updated_at
"#;

const SQL_DELETE_FOOD_PREFERENCE: &str = r#"
DELETE FROM food_preferences
WHERE member_id = $1 AND food_id = $2
"#;

const SQL_STORE_COLUMNS: &str = r#"
SELECT
    s.id, s.name, s.latitude, s.longitude, s.average_price,
    s.review_count, s.view_count, s.favorite_count, s.store_type,
    s.registered_at, s.deleted_at,
    ARRAY(SELECT sc.category_id FROM store_categories sc
          WHERE sc.store_id = s.id ORDER BY sc.category_id) AS category_ids,
    ARRAY(SELECT sm.food_id FROM store_menus sm
          WHERE sm.store_id = s.id ORDER BY sm.food_id) AS food_ids
FROM stores s
WHERE s.deleted_at IS NULL
"#;

// $3 > $4 marks a box that wraps across the antimeridian
const SQL_BOUNDING_BOX_FILTER: &str = r#"
  AND s.latitude BETWEEN $1 AND $2
  AND (s.longitude BETWEEN $3 AND $4
       OR ($3 > $4 AND (s.longitude >= $3 OR s.longitude <= $4)))
"#;

#[derive(Debug, sqlx::FromRow)]
struct MemberRow {
    recommendation_type: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

#[derive(Debug, sqlx::FromRow)]
struct CategoryPreferenceRow {
    member_id: i64,
    category_id: i64,
    weight: i32,
}

#[derive(Debug, sqlx::FromRow)]
struct FoodPreferenceRow {
    member_id: i64,
    food_id: i64,
    is_preferred: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<FoodPreferenceRow> for FoodPreference {
    fn from(row: FoodPreferenceRow) -> Self {
        FoodPreference {
            member_id: row.member_id,
            food_id: row.food_id,
            is_preferred: row.is_preferred,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StoreRow {
    id: i64,
    name: String,
    latitude: f64,
    longitude: f64,
    average_price: i64,
    review_count: i64,
    view_count: i64,
    favorite_count: i64,
    store_type: String,
    registered_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
    category_ids: Vec<i64>,
    food_ids: Vec<i64>,
}

impl TryFrom<StoreRow> for Store {
    type Error = AppError;

    fn try_from(row: StoreRow) -> Result<Self, Self::Error> {
        let store_type: StoreType = row.store_type.parse().map_err(|e| {
            AppError::Internal(format!("store {} has invalid type: {}", row.id, e))
        })?;

        Ok(Store {
            id: row.id,
            name: row.name,
            category_ids: row.category_ids,
            food_ids: row.food_ids,
            location: Coordinate::new(row.latitude, row.longitude),
            average_price: row.average_price,
            review_count: row.review_count,
            view_count: row.view_count,
            favorite_count: row.favorite_count,
            store_type,
            registered_at: row.registered_at,
            deleted_at: row.deleted_at,
        })
    }
}

/// SQLSTATE `foreign_key_violation`
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// The row a preference write refers to besides the member
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PreferenceTarget {
    Category(CategoryId),
    Food(FoodId),
}

/// Turns a foreign-key violation on a preference write into a not-found error
fn map_write_error(err: sqlx::Error, member_id: MemberId, target: PreferenceTarget) -> AppError {
    let violated = match &err {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(FOREIGN_KEY_VIOLATION) => {
            Some(db.constraint().map(str::to_owned))
        }
        _ => None,
    };

    match violated {
        Some(constraint) => missing_reference(constraint.as_deref(), member_id, target),
        None => AppError::Database(err),
    }
}

fn missing_reference(
    constraint: Option<&str>,
    member_id: MemberId,
    target: PreferenceTarget,
) -> AppError {
    if constraint.is_some_and(|name| name.contains("member_id")) {
        return AppError::not_found(
            ErrorCode::MemberNotFound,
            format!("Member {} not found", member_id),
        );
    }
    match target {
        PreferenceTarget::Category(id) => AppError::not_found(
            ErrorCode::CategoryNotFound,
            format!("Category {} not found", id),
        ),
        PreferenceTarget::Food(id) => {
            AppError::not_found(ErrorCode::FoodNotFound, format!("Food {} not found", id))
        }
    }
}

#[derive(Clone)]
pub struct PgProvider {
    pool: PgPool,
}

impl PgProvider {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl MemberProvider for PgProvider {
    async fn resolve_member(&self, member_id: MemberId) -> AppResult<MemberContext> {
        let row = sqlx::query_as::<_, MemberRow>(SQL_RESOLVE_MEMBER)
            .bind(member_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| {
                AppError::not_found(
                    ErrorCode::MemberNotFound,
                    format!("Member {} not found", member_id),
                )
            })?;

        let recommendation_type: RecommendationType =
            row.recommendation_type.parse().map_err(|e| {
                AppError::Internal(format!("member {} has invalid type: {}", member_id, e))
            })?;

        let reference = match (row.latitude, row.longitude) {
            (Some(latitude), Some(longitude)) => Coordinate::new(latitude, longitude),
            _ => {
                return Err(AppError::not_found(
                    ErrorCode::AddressNotFound,
                    format!("Member {} has no primary address", member_id),
                ))
            }
        };

        Ok(MemberContext {
            member_id,
            recommendation_type,
            reference,
        })
    }
}

#[async_trait::async_trait]
impl PreferenceProvider for PgProvider {
    async fn category_preferences(
        &self,
        member_id: MemberId,
    ) -> AppResult<Vec<CategoryPreference>> {
        let rows = sqlx::query_as::<_, CategoryPreferenceRow>(SQL_CATEGORY_PREFERENCES)
            .bind(member_id)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| {
                let weight = CategoryWeight::try_from(row.weight).map_err(|w| {
                    AppError::Internal(format!(
                        "category preference ({}, {}) has invalid weight {}",
                        row.member_id, row.category_id, w
                    ))
                })?;
                Ok(CategoryPreference {
                    member_id: row.member_id,
                    category_id: row.category_id,
                    weight,
                })
            })
            .collect()
    }

    async fn food_preferences(&self, member_id: MemberId) -> AppResult<Vec<FoodPreference>> {
        let rows = sqlx::query_as::<_, FoodPreferenceRow>(SQL_FOOD_PREFERENCES)
            .bind(member_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(FoodPreference::from).collect())
    }

    async fn upsert_category_preference(
        &self,
        member_id: MemberId,
        category_id: CategoryId,
        weight: CategoryWeight,
    ) -> AppResult<CategoryPreference> {
        sqlx::query(SQL_UPSERT_CATEGORY_PREFERENCE)
            .bind(member_id)
            .bind(category_id)
            .bind(weight.value())
            .execute(&self.pool)
            .await
            .map_err(|e| map_write_error(e, member_id, PreferenceTarget::Category(category_id)))?;

        tracing::debug!(
            member_id,
            category_id,
            weight = weight.value(),
            "Category preference stored"
        );

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
        let row = sqlx::query_as::<_, FoodPreferenceRow>(SQL_INSERT_FOOD_PREFERENCE)
            .bind(member_id)
            .bind(food_id)
            .bind(is_preferred)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_write_error(e, member_id, PreferenceTarget::Food(food_id)))?;

        row.map(FoodPreference::from).ok_or_else(|| {
            AppError::conflict(
                ErrorCode::FoodPreferenceExists,
                format!("Food {} already has a preference", food_id),
            )
        })
    }

    async fn remove_food_preference(&self, member_id: MemberId, food_id: FoodId) -> AppResult<()> {
        let result = sqlx::query(SQL_DELETE_FOOD_PREFERENCE)
            .bind(member_id)
            .bind(food_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(
                ErrorCode::FoodPreferenceNotFound,
                format!("No preference recorded for food {}", food_id),
            ));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl StoreProvider for PgProvider {
    async fn stores_within_bounding_box(
        &self,
        center: Coordinate,
        radius_km: f64,
    ) -> AppResult<Vec<Store>> {
        let bbox = BoundingBox::around(&center, radius_km);
        let sql = format!("{}{}", SQL_STORE_COLUMNS, SQL_BOUNDING_BOX_FILTER);

        let rows = sqlx::query_as::<_, StoreRow>(&sql)
            .bind(bbox.min_latitude)
            .bind(bbox.max_latitude)
            .bind(bbox.min_longitude)
            .bind(bbox.max_longitude)
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!(rows = rows.len(), %center, radius_km, "Bounding box query");

        rows.into_iter().map(Store::try_from).collect()
    }

    async fn find_store(&self, store_id: StoreId) -> AppResult<Option<Store>> {
        let sql = format!("{} AND s.id = $1", SQL_STORE_COLUMNS);

        sqlx::query_as::<_, StoreRow>(&sql)
            .bind(store_id)
            .fetch_optional(&self.pool)
            .await?
            .map(Store::try_from)
            .transpose()
    }
}
