//! Per-store personalization score.
//!
//! Four components are computed independently, each clamped to `0..=100`,
//! then blended with the weight row of the member's recommendation type.
//! Both the list pipeline and the score-detail lookup go through
//! [`ScoreCalculator::score`], so the two always agree to the last digit.

use crate::models::{
    ComponentScores, FoodPreferenceKind, PreferenceProfile, RecommendationType, ScoreResult, Store,
};

/// Largest search radius a request may ask for, in kilometres.
/// Accessibility decays to zero here, so every in-radius store gets a score.
pub const MAX_RADIUS_KM: f64 = 50.0;

/// Score given to a store when nothing is known about the member's stance
const NEUTRAL_SCORE: f64 = 50.0;

/// Decimal places kept in published scores
const SCORE_PRECISION: i32 = 2;

/// Tunables for the scoring model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringConfig {
    price_lower_bound: i64,
    price_upper_bound: i64,
    parallel_threshold: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            price_lower_bound: 8_000,
            price_upper_bound: 30_000,
            parallel_threshold: 256,
        }
    }
}

impl ScoringConfig {
    pub fn new(
        price_lower_bound: i64,
        price_upper_bound: i64,
        parallel_threshold: usize,
    ) -> anyhow::Result<Self> {
        if price_lower_bound < 0 || price_lower_bound >= price_upper_bound {
            anyhow::bail!(
                "price band must satisfy 0 <= lower < upper (got {}..{})",
                price_lower_bound,
                price_upper_bound
            );
        }
        Ok(Self {
            price_lower_bound,
            price_upper_bound,
            parallel_threshold: parallel_threshold.max(1),
        })
    }

    pub fn price_lower_bound(&self) -> i64 {
        self.price_lower_bound
    }

    pub fn price_upper_bound(&self) -> i64 {
        self.price_upper_bound
    }

    pub fn parallel_threshold(&self) -> usize {
        self.parallel_threshold
    }
}

/// Pure scoring functions over a store, a profile and a distance
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreCalculator {
    config: ScoringConfig,
}

impl ScoreCalculator {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Full breakdown for one store
    pub fn score(
        &self,
        store: &Store,
        profile: &PreferenceProfile,
        recommendation_type: RecommendationType,
        distance_km: f64,
    ) -> ScoreResult {
        let weights = recommendation_type.weights();
        let raw = ComponentScores {
            stability: self.stability_score(store, profile),
            exploration: self.exploration_score(store, profile),
            budget_efficiency: self.budget_efficiency_score(store.average_price),
            accessibility: self.accessibility_score(distance_km),
        };
        // Weighted values are products of the rounded components
        let components = raw.map(round_score);
        let weighted = components.weighted(&weights);

        ScoreResult {
            store_id: store.id,
            recommendation_type,
            weights,
            components,
            weighted,
            final_score: round_score(weighted.sum()).clamp(0.0, 100.0),
            distance_km,
        }
    }

    /// Familiarity: high for liked categories, low for disliked ones, and
    /// dragged down by the share of the menu the member dislikes.
    pub fn stability_score(&self, store: &Store, profile: &PreferenceProfile) -> f64 {
        let base = match mean_category_weight(store, profile) {
            Some(mean) => NEUTRAL_SCORE + mean / 2.0,
            None => NEUTRAL_SCORE,
        };

        let menu_size = store.food_ids.len();
        let penalty = if menu_size == 0 {
            1.0
        } else {
            let disliked = store
                .food_ids
                .iter()
                .filter(|food| profile.food_preference(**food) == FoodPreferenceKind::Disliked)
                .count();
            1.0 - disliked as f64 / menu_size as f64
        };

        clamp_score(base * penalty)
    }

    /// Novelty: high for categories the member has never rated, low for
    /// categories with an explicit stance either way.
    pub fn exploration_score(&self, store: &Store, profile: &PreferenceProfile) -> f64 {
        if store.category_ids.is_empty() {
            return 100.0;
        }
        let total: f64 = store
            .category_ids
            .iter()
            .map(|id| 100.0 - f64::from(profile.category_weight(*id).abs()))
            .sum();
        clamp_score(total / store.category_ids.len() as f64)
    }

    /// Linear in price between the configured band, 100 below it and 0 above it
    pub fn budget_efficiency_score(&self, average_price: i64) -> f64 {
        let lower = self.config.price_lower_bound;
        let upper = self.config.price_upper_bound;
        if average_price <= lower {
            return 100.0;
        }
        if average_price >= upper {
            return 0.0;
        }
        let span = (upper - lower) as f64;
        clamp_score(100.0 * (upper - average_price) as f64 / span)
    }

    /// Linear decay from 100 at the member's position to 0 at [`MAX_RADIUS_KM`]
    pub fn accessibility_score(&self, distance_km: f64) -> f64 {
        if !distance_km.is_finite() {
            return 0.0;
        }
        clamp_score(100.0 * (1.0 - distance_km.max(0.0) / MAX_RADIUS_KM))
    }
}

fn mean_category_weight(store: &Store, profile: &PreferenceProfile) -> Option<f64> {
    if store.category_ids.is_empty() {
        return None;
    }
    let total: f64 = store
        .category_ids
        .iter()
        .map(|id| f64::from(profile.category_weight(*id)))
        .sum();
    Some(total / store.category_ids.len() as f64)
}

fn clamp_score(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

fn round_score(value: f64) -> f64 {
    let factor = 10f64.powi(SCORE_PRECISION);
    (value * factor).round() / factor
}
