use std::sync::Arc;

pub mod filter;
pub mod geo;
pub mod preferences;
pub mod providers;
pub mod query;
pub mod ranking;
pub mod score_detail;
pub mod scoring;

pub use ranking::RankingPipeline;
pub use score_detail::ScoreDetailResolver;
pub use scoring::{ScoreCalculator, ScoringConfig};

use providers::{MemberProvider, PreferenceProvider, StoreProvider};

/// The external collaborators the engine reads from
#[derive(Clone)]
pub struct Providers {
    pub members: Arc<dyn MemberProvider>,
    pub preferences: Arc<dyn PreferenceProvider>,
    pub stores: Arc<dyn StoreProvider>,
}

impl Providers {
    /// Uses one backend for all three concerns
    pub fn from_shared<P>(provider: P) -> Self
    where
        P: MemberProvider + PreferenceProvider + StoreProvider + 'static,
    {
        let shared = Arc::new(provider);
        Self {
            members: shared.clone(),
            preferences: shared.clone(),
            stores: shared,
        }
    }
}
