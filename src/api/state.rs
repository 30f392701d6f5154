use crate::services::{
    providers::InMemoryProvider, Providers, RankingPipeline, ScoreCalculator,
    ScoreDetailResolver, ScoringConfig,
};

/// Shared application state
///
/// Everything in here is read-only for the lifetime of the process; ranking
/// requests never share mutable state.
#[derive(Clone)]
pub struct AppState {
    pub providers: Providers,
    pub pipeline: RankingPipeline,
    pub score_detail: ScoreDetailResolver,
}

impl AppState {
    pub fn new(providers: Providers, scoring: ScoringConfig) -> Self {
        let calculator = ScoreCalculator::new(scoring);
        Self {
            pipeline: RankingPipeline::new(providers.clone(), calculator),
            score_detail: ScoreDetailResolver::new(providers.clone(), calculator),
            providers,
        }
    }

    /// State backed by an in-process catalog with default scoring
    pub fn in_memory(provider: InMemoryProvider) -> Self {
        Self::new(Providers::from_shared(provider), ScoringConfig::default())
    }
}
