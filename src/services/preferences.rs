use crate::{
    error::{AppError, AppResult, ErrorCode},
    models::{
        CategoryId, CategoryPreference, CategoryWeight, FoodId, FoodPreference, MemberId,
        PreferenceProfile,
    },
    services::providers::PreferenceProvider,
};

/// Loads a member's preference profile
///
/// Category and food rows are fetched concurrently in one bulk read each.
/// A member with no rows gets an empty, all-neutral profile.
pub async fn load_profile(
    provider: &dyn PreferenceProvider,
    member_id: MemberId,
) -> AppResult<PreferenceProfile> {
    let (categories, foods) = tokio::try_join!(
        provider.category_preferences(member_id),
        provider.food_preferences(member_id),
    )?;

    tracing::debug!(
        member_id,
        categories = categories.len(),
        foods = foods.len(),
        "Preference profile loaded"
    );

    Ok(PreferenceProfile::from_rows(
        member_id,
        categories.into_iter().map(|c| (c.category_id, c.weight)),
        foods.into_iter().map(|f| (f.food_id, f.is_preferred)),
    ))
}

/// Stored preference rows for one member
#[derive(Debug, Clone, PartialEq)]
pub struct PreferenceRows {
    pub categories: Vec<CategoryPreference>,
    pub foods: Vec<FoodPreference>,
}

pub async fn list_preferences(
    provider: &dyn PreferenceProvider,
    member_id: MemberId,
) -> AppResult<PreferenceRows> {
    let (categories, foods) = tokio::try_join!(
        provider.category_preferences(member_id),
        provider.food_preferences(member_id),
    )?;
    Ok(PreferenceRows { categories, foods })
}

/// Sets a category weight; only -100, 0 and 100 are accepted
pub async fn set_category_weight(
    provider: &dyn PreferenceProvider,
    member_id: MemberId,
    category_id: CategoryId,
    weight: i32,
) -> AppResult<CategoryPreference> {
    if category_id <= 0 {
        return Err(AppError::validation(
            ErrorCode::InvalidCategoryIds,
            format!("Category id must be positive, got {}", category_id),
        ));
    }
    let weight = CategoryWeight::try_from(weight).map_err(|w| {
        AppError::validation(
            ErrorCode::InvalidWeight,
            format!("Weight must be -100, 0 or 100, got {}", w),
        )
    })?;

    let pref = provider
        .upsert_category_preference(member_id, category_id, weight)
        .await?;

    tracing::info!(member_id, category_id, weight = weight.value(), "Category preference set");

    Ok(pref)
}

pub async fn add_food_preference(
    provider: &dyn PreferenceProvider,
    member_id: MemberId,
    food_id: FoodId,
    is_preferred: bool,
) -> AppResult<FoodPreference> {
    if food_id <= 0 {
        return Err(AppError::validation(
            ErrorCode::InvalidQuery,
            format!("Food id must be positive, got {}", food_id),
        ));
    }

    let pref = provider
        .add_food_preference(member_id, food_id, is_preferred)
        .await?;

    tracing::info!(member_id, food_id, is_preferred, "Food preference added");

    Ok(pref)
}
