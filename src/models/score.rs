use serde::Serialize;

use super::{RecommendationType, StoreId};

/// Per-component weights for one recommendation type
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreWeights {
    pub stability: f64,
    pub exploration: f64,
    pub budget_efficiency: f64,
    pub accessibility: f64,
}

/// The four scoring components, each in [0, 100]
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentScores {
    pub stability: f64,
    pub exploration: f64,
    pub budget_efficiency: f64,
    pub accessibility: f64,
}

impl ComponentScores {
    /// Component-wise product with `weights`
    pub fn weighted(&self, weights: &ScoreWeights) -> ComponentScores {
        ComponentScores {
            stability: self.stability * weights.stability,
            exploration: self.exploration * weights.exploration,
            budget_efficiency: self.budget_efficiency * weights.budget_efficiency,
            accessibility: self.accessibility * weights.accessibility,
        }
    }

    pub fn sum(&self) -> f64 {
        self.stability + self.exploration + self.budget_efficiency + self.accessibility
    }

    pub fn map(&self, f: impl Fn(f64) -> f64) -> ComponentScores {
        ComponentScores {
            stability: f(self.stability),
            exploration: f(self.exploration),
            budget_efficiency: f(self.budget_efficiency),
            accessibility: f(self.accessibility),
        }
    }
}

/// Score breakdown for one (member, store) pair. Computed per request, never cached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreResult {
    pub store_id: StoreId,
    pub recommendation_type: RecommendationType,
    pub weights: ScoreWeights,
    pub components: ComponentScores,
    pub weighted: ComponentScores,
    pub final_score: f64,
    pub distance_km: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weighted_components() {
        let components = ComponentScores {
            stability: 100.0,
            exploration: 40.0,
            budget_efficiency: 80.0,
            accessibility: 60.0,
        };
        let weighted = components.weighted(&RecommendationType::Saver.weights());
        assert!((weighted.stability - 20.0).abs() < 1e-9);
        assert!((weighted.exploration - 4.0).abs() < 1e-9);
        assert!((weighted.budget_efficiency - 40.0).abs() < 1e-9);
        assert!((weighted.accessibility - 12.0).abs() < 1e-9);
        assert!((weighted.sum() - 76.0).abs() < 1e-9);
    }
}
