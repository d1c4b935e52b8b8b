//! Keyword-scored life-sciences category classifier.

use async_trait::async_trait;

use crate::error::ClassifyResult;
use crate::pipeline::gate::word_text;
use crate::traits::classifier::{Classification, Classifier};

/// Label used when no category keyword matches.
pub const GENERAL_LIFE_SCIENCES: &str = "GENERAL_LIFE_SCIENCES";

const DIGITAL_DIAGNOSTIC: &str = "DIGITAL_DIAGNOSTIC";
const CONNECTED_MEDICAL_DEVICE: &str = "CONNECTED_MEDICAL_DEVICE";

/// Keywords longer than this count double.
const LONG_KEYWORD: usize = 5;

const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "SMALL_MOLECULE_DRUG",
        &["small molecule", "compound", "nce", "new chemical entity", "oral drug"],
    ),
    (
        "BIOLOGIC",
        &["antibody", "protein", "peptide", "biologic", "mab", "biosimilar", "fusion protein"],
    ),
    (
        "GENE_THERAPY",
        &["gene therapy", "gene editing", "crispr", "aav", "lentivirus", "car-t"],
    ),
    (
        "VACCINE",
        &["vaccine", "immunization", "prophylactic", "adjuvant", "antigen"],
    ),
    (
        "DIAGNOSTIC",
        &["diagnostic", "biomarker", "assay", "pcr", "elisa", "sequencing", "liquid biopsy"],
    ),
    (
        "MEDICAL_DEVICE",
        &["device", "implant", "surgical", "catheter", "stent", "510k", "510(k)", "pma"],
    ),
    (
        "DIGITAL_HEALTH",
        &["digital therapeutic", "dtx", "samd", "ai diagnostic", "telehealth", "mhealth"],
    ),
    (
        "AGRICULTURAL_BIOTECH",
        &["crop", "seed", "pesticide", "herbicide", "gmo", "plant", "soil", "yield", "trait"],
    ),
    (
        "VETERINARY",
        &[
            "veterinary", "animal health", "livestock", "aquaculture", "fish", "cattle",
            "poultry", "companion animal", "salmon", "louse", "parasite",
        ],
    ),
];

/// Score of one category against a text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryScore {
    pub category: &'static str,
    pub score: u32,
}

/// Per-category keyword scores, in category order, omitting zeros.
pub fn category_scores(text: &str) -> Vec<CategoryScore> {
    let words = word_text(text);
    CATEGORIES
        .iter()
        .filter_map(|(category, keywords)| {
            let score: u32 = keywords
                .iter()
                .filter(|k| words.contains(&word_text(k)))
                .map(|k| if k.len() > LONG_KEYWORD { 2 } else { 1 })
                .sum();
            (score > 0).then_some(CategoryScore {
                category: *category,
                score,
            })
        })
        .collect()
}

/// Classifies listing text into a life-sciences category without a model.
///
/// The highest-scoring category wins (earlier categories win ties).
/// Diagnostic or device matches that co-occur with digital-health terms
/// are reported as the combined categories.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify_text(&self, text: &str) -> Classification {
        let scores = category_scores(text);
        let total: u32 = scores.iter().map(|s| s.score).sum();
        if total == 0 {
            return Classification::new(GENERAL_LIFE_SCIENCES, 0.0);
        }

        let score_of = |name: &str| {
            scores
                .iter()
                .find(|s| s.category == name)
                .map(|s| s.score)
        };

        let combined = match (
            score_of("DIAGNOSTIC"),
            score_of("MEDICAL_DEVICE"),
            score_of("DIGITAL_HEALTH"),
        ) {
            (Some(diag), _, Some(digital)) => Some((DIGITAL_DIAGNOSTIC, diag + digital)),
            (None, Some(device), Some(digital)) => {
                Some((CONNECTED_MEDICAL_DEVICE, device + digital))
            }
            _ => None,
        };

        let (label, score) = combined.unwrap_or_else(|| {
            let mut best = &scores[0];
            for s in &scores[1..] {
                if s.score > best.score {
                    best = s;
                }
            }
            (best.category, best.score)
        });

        Classification::new(label, score as f32 / total as f32)
    }
}

#[async_trait]
impl Classifier for KeywordClassifier {
    async fn classify(&self, text: &str) -> ClassifyResult<Classification> {
        Ok(self.classify_text(text))
    }

    fn name(&self) -> &str {
        "heuristic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_category() {
        let c = KeywordClassifier::new()
            .classify_text("A humanized antibody and fusion protein for autoimmune disease");
        assert_eq!(c.label, "BIOLOGIC");
        assert!((c.confidence - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_long_keywords_weigh_double() {
        let scores = category_scores("CRISPR based gene editing with AAV");
        assert_eq!(
            scores,
            vec![CategoryScore {
                category: "GENE_THERAPY",
                score: 2 + 2 + 1
            }]
        );
    }

    #[test]
    fn test_digital_diagnostic_combination() {
        let c = KeywordClassifier::new()
            .classify_text("Smartphone biomarker assay delivered as telehealth SaMD");
        assert_eq!(c.label, "DIGITAL_DIAGNOSTIC");
    }

    #[test]
    fn test_connected_device_combination() {
        let c = KeywordClassifier::new()
            .classify_text("Implantable cardiac device with mHealth monitoring");
        assert_eq!(c.label, "CONNECTED_MEDICAL_DEVICE");
    }

    #[test]
    fn test_nothing_matches() {
        let c = KeywordClassifier::new().classify_text("A faster database index");
        assert_eq!(c.label, GENERAL_LIFE_SCIENCES);
        assert_eq!(c.confidence, 0.0);
    }

    #[test]
    fn test_whole_words_only() {
        // "plantar" must not count as "plant"
        assert!(category_scores("plantar fasciitis").is_empty());
    }
}
