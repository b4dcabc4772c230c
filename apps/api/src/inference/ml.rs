//! ML scorer: builds the model document, thresholds class probabilities, and backfills
//! short result lists with the next-best classes.

use crate::inference::classifier::ClassifierArtifact;
use crate::inference::normalizer::{clean_personal_info, normalize};
use crate::inference::{InferenceSettings, ModelError};
use crate::models::competency::{sort_by_level_desc, CompetencyScore, Source, WorkshopRecord};

pub const DEFAULT_THRESHOLD: f64 = 0.35;
pub const PRIMARY_CONFIDENCE: f64 = 0.9;
pub const BACKFILL_CONFIDENCE: f64 = 0.75;

/// Cleaned CV text followed by one `topic:<topic>` token per named workshop.
pub fn build_model_document(cv_text: Option<&str>, workshops: &[WorkshopRecord]) -> String {
    let cv = clean_personal_info(cv_text.unwrap_or_default());
    let topics: Vec<String> = workshops
        .iter()
        .map(|w| normalize(&w.topic))
        .filter(|t| !t.is_empty())
        .map(|t| format!("topic:{t}"))
        .collect();
    format!("{cv} {}", topics.join(" ")).trim().to_string()
}

pub struct MlScorer<'a> {
    artifact: &'a ClassifierArtifact,
    settings: &'a InferenceSettings,
}

impl<'a> MlScorer<'a> {
    pub fn new(artifact: &'a ClassifierArtifact, settings: &'a InferenceSettings) -> Self {
        Self { artifact, settings }
    }

    /// Threshold applied to classes without a stored per-class value:
    /// configured override, then artifact metadata, then 0.35.
    pub fn global_threshold(&self) -> f64 {
        self.settings
            .threshold_override
            .or_else(|| self.artifact.metadata().default_threshold())
            .unwrap_or(DEFAULT_THRESHOLD)
    }

    pub fn threshold_for(&self, class: &str) -> f64 {
        self.settings
            .threshold_override
            .or_else(|| self.artifact.class_threshold(class))
            .unwrap_or_else(|| self.global_threshold())
    }

    /// Profile path: CV plus workshop topics, completed up to the configured minimum.
    pub fn predict(
        &self,
        cv_text: Option<&str>,
        workshops: &[WorkshopRecord],
    ) -> Result<Vec<CompetencyScore>, ModelError> {
        let document = build_model_document(cv_text, workshops);
        self.predict_document(&document, self.settings.min_results)
    }

    /// Scores an already-built document, backfilling to `min_results` entries.
    pub fn predict_document(
        &self,
        document: &str,
        min_results: usize,
    ) -> Result<Vec<CompetencyScore>, ModelError> {
        let classes = self.artifact.classes();
        if classes.is_empty() {
            return Ok(Vec::new());
        }
        let probs = self.artifact.probabilities(document)?;

        let candidates: Vec<Candidate<'_>> = classes
            .iter()
            .zip(probs)
            .map(|(name, probability)| Candidate {
                name: name.as_str(),
                probability,
                threshold: self.threshold_for(name),
            })
            .collect();

        Ok(select_with_backfill(
            candidates,
            min_results,
            self.settings.min_prob_floor,
        ))
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate<'a> {
    name: &'a str,
    probability: f64,
    threshold: f64,
}

/// Keeps every candidate at or above its threshold. If that leaves fewer than
/// `min_results`, adds the best remaining ones until the minimum is met or the next
/// probability drops below `floor`.
fn select_with_backfill(
    candidates: Vec<Candidate<'_>>,
    min_results: usize,
    floor: f64,
) -> Vec<CompetencyScore> {
    let (mut primary, mut rest): (Vec<_>, Vec<_>) = candidates
        .into_iter()
        .partition(|c| c.probability >= c.threshold);
    primary.sort_by(|a, b| b.probability.total_cmp(&a.probability));
    rest.sort_by(|a, b| b.probability.total_cmp(&a.probability));

    let mut scored: Vec<CompetencyScore> = primary
        .iter()
        .map(|c| score(c, PRIMARY_CONFIDENCE))
        .collect();

    for candidate in rest {
        if scored.len() >= min_results || candidate.probability < floor {
            break;
        }
        scored.push(score(&candidate, BACKFILL_CONFIDENCE));
    }

    sort_by_level_desc(&mut scored);
    scored
}

fn score(candidate: &Candidate<'_>, confidence: f64) -> CompetencyScore {
    CompetencyScore::new(
        candidate.name,
        candidate.probability * 100.0,
        confidence,
        &[Source::Ml],
    )
}
