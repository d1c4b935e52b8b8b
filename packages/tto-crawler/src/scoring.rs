//! Weighted due-diligence scoring.
//!
//! Each pillar is scored 0 to 5; the composite is the weighted mean
//! rescaled to 0-100 and banded.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Highest score a single pillar can take.
pub const MAX_PILLAR_SCORE: f64 = 5.0;

/// One row of the weight table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PillarWeight {
    pub pillar: String,
    pub weight: f64,
}

/// Ordered weight table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreWeights(Vec<PillarWeight>);

impl Default for ScoreWeights {
    fn default() -> Self {
        Self::new([
            ("clinical_evidence", 0.20),
            ("regulatory_clarity", 0.15),
            ("ip_strength", 0.15),
            ("market_attractiveness", 0.15),
            ("manufacturing_cmc_readiness", 0.10),
            ("competitive_moat", 0.10),
            ("team_inventor_quality", 0.10),
            ("source_quality", 0.05),
        ])
    }
}

impl ScoreWeights {
    pub fn new<I, S>(weights: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self(
            weights
                .into_iter()
                .map(|(pillar, weight)| PillarWeight {
                    pillar: pillar.into(),
                    weight: weight.max(0.0),
                })
                .collect(),
        )
    }

    pub fn pillars(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|w| w.pillar.as_str())
    }

    pub fn weight(&self, pillar: &str) -> Option<f64> {
        self.0.iter().find(|w| w.pillar == pillar).map(|w| w.weight)
    }

    pub fn total(&self) -> f64 {
        self.0.iter().map(|w| w.weight).sum()
    }

    /// Composite of `scores` under this table. Pillars missing from
    /// `scores` count as 0; pillars not in the table are ignored.
    pub fn composite(&self, scores: &PillarScores) -> CompositeScore {
        let total_weight = self.total();
        if total_weight <= 0.0 {
            return CompositeScore::from_percent(0.0);
        }

        let weighted: f64 = self
            .0
            .iter()
            .map(|w| scores.get(&w.pillar) / MAX_PILLAR_SCORE * w.weight)
            .sum();
        let percent = (weighted / total_weight * 1000.0).round() / 10.0;
        CompositeScore::from_percent(percent)
    }
}

/// Pillar scores, clamped to `0..=5` on insert.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PillarScores(HashMap<String, f64>);

impl PillarScores {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, pillar: impl Into<String>, score: f64) -> Self {
        self.set(pillar, score);
        self
    }

    pub fn set(&mut self, pillar: impl Into<String>, score: f64) {
        let score = if score.is_finite() {
            score.clamp(0.0, MAX_PILLAR_SCORE)
        } else {
            0.0
        };
        self.0.insert(pillar.into(), score);
    }

    pub fn get(&self, pillar: &str) -> f64 {
        self.0.get(pillar).copied().unwrap_or(0.0)
    }

    /// Read scores from a JSON object whose values are either numbers or
    /// objects with a `score` field. Unreadable values count as 0.
    pub fn from_json(value: &serde_json::Value) -> Self {
        let mut scores = Self::new();
        if let Some(map) = value.as_object() {
            for (pillar, v) in map {
                let score = v
                    .as_f64()
                    .or_else(|| v.get("score").and_then(score_value))
                    .or_else(|| score_value(v))
                    .unwrap_or(0.0);
                scores.set(pillar.clone(), score);
            }
        }
        scores
    }
}

fn score_value(v: &serde_json::Value) -> Option<f64> {
    v.as_f64()
        .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
}

/// Traffic-light band of a composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Band {
    Green,
    Amber,
    Red,
}

impl Band {
    /// Green from 75, Amber from 55, Red below.
    pub fn from_percent(percent: f64) -> Self {
        if percent >= 75.0 {
            Band::Green
        } else if percent >= 55.0 {
            Band::Amber
        } else {
            Band::Red
        }
    }
}

impl std::fmt::Display for Band {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Band::Green => "Green",
            Band::Amber => "Amber",
            Band::Red => "Red",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompositeScore {
    /// 0 to 100, one decimal
    pub score_0_100: f64,
    pub band: Band,
}

impl CompositeScore {
    fn from_percent(percent: f64) -> Self {
        Self {
            score_0_100: percent,
            band: Band::from_percent(percent),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_weights_sum_to_one() {
        let weights = ScoreWeights::default();
        assert_eq!(weights.pillars().count(), 8);
        assert!((weights.total() - 1.0).abs() < 1e-9);
        assert_eq!(weights.weight("clinical_evidence"), Some(0.20));
    }

    #[test]
    fn test_perfect_and_empty_scores() {
        let weights = ScoreWeights::default();

        let mut perfect = PillarScores::new();
        for pillar in weights.pillars() {
            perfect.set(pillar, 5.0);
        }
        let top = weights.composite(&perfect);
        assert_eq!(top.score_0_100, 100.0);
        assert_eq!(top.band, Band::Green);

        let bottom = weights.composite(&PillarScores::new());
        assert_eq!(bottom.score_0_100, 0.0);
        assert_eq!(bottom.band, Band::Red);
    }

    #[test]
    fn test_weighted_mean() {
        // 0.20 * 4/5 + 0.15 * 3/5 = 0.16 + 0.09 = 0.25 -> 25.0
        let scores = PillarScores::new()
            .with("clinical_evidence", 4.0)
            .with("regulatory_clarity", 3.0)
            .with("not_a_pillar", 5.0);
        let c = ScoreWeights::default().composite(&scores);
        assert_eq!(c.score_0_100, 25.0);
        assert_eq!(c.band, Band::Red);
    }

    #[test]
    fn test_bands() {
        assert_eq!(Band::from_percent(75.0), Band::Green);
        assert_eq!(Band::from_percent(74.9), Band::Amber);
        assert_eq!(Band::from_percent(55.0), Band::Amber);
        assert_eq!(Band::from_percent(54.9), Band::Red);
    }

    #[test]
    fn test_scores_are_clamped() {
        let scores = PillarScores::new().with("a", 9.0).with("b", -1.0).with("c", f64::NAN);
        assert_eq!(scores.get("a"), 5.0);
        assert_eq!(scores.get("b"), 0.0);
        assert_eq!(scores.get("c"), 0.0);
    }

    #[test]
    fn test_custom_table() {
        let weights = ScoreWeights::new([("ip_strength", 3.0), ("market_attractiveness", 1.0)]);
        let scores = PillarScores::new().with("ip_strength", 5.0);
        assert_eq!(weights.composite(&scores).score_0_100, 75.0);
    }

    #[test]
    fn test_from_json_forms() {
        let scores = PillarScores::from_json(&json!({
            "clinical_evidence": {"score": 4, "rationale": "phase II data"},
            "ip_strength": 3.5,
            "regulatory_clarity": "2",
            "market_attractiveness": {"rationale": "unknown"}
        }));
        assert_eq!(scores.get("clinical_evidence"), 4.0);
        assert_eq!(scores.get("ip_strength"), 3.5);
        assert_eq!(scores.get("regulatory_clarity"), 2.0);
        assert_eq!(scores.get("market_attractiveness"), 0.0);
    }
}
