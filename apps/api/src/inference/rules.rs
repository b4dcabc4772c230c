//! Rule-based profile scorer: workshop attendance and CV term frequency fused with
//! fixed weights. Used whenever the classifier produces nothing.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::inference::catalog::RuleCatalog;
use crate::inference::normalizer::normalize;
use crate::models::competency::{round1, sort_by_level_desc, CompetencyScore, Source, WorkshopRecord};

/// Partial score map, competency → 0 – 100. Ordered so fusion output is deterministic.
pub type ScoreMap = BTreeMap<String, f64>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusionWeights {
    pub workshops: f64,
    pub cv: f64,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            workshops: 0.6,
            cv: 0.4,
        }
    }
}

const CONFIDENCE_BOTH: f64 = 0.85;
const CONFIDENCE_WORKSHOPS_ONLY: f64 = 0.75;
const CONFIDENCE_CV_ONLY: f64 = 0.65;

/// Accumulates `attendance × weight × 100` per competency, then rescales so the top
/// competency is exactly 100.
pub fn score_from_workshops(records: &[WorkshopRecord], catalog: &RuleCatalog) -> ScoreMap {
    let mut raw = ScoreMap::new();
    for record in records {
        let attendance = record.attendance_fraction;
        if !attendance.is_finite() || attendance <= 0.0 {
            continue;
        }
        let attendance = attendance.min(1.0);
        let topic = normalize(&record.topic);
        let Some(comps) = catalog.competencies_for_topic(&topic) else {
            continue;
        };
        for (name, weight) in comps {
            *raw.entry(name.clone()).or_insert(0.0) += attendance * weight * 100.0;
        }
    }
    rescale_to_max(raw)
}

/// Counts synonym occurrences per competency, dampens with `log2(1 + freq)`, and
/// rescales to 0 – 100. Competencies without any hit are left out.
pub fn score_from_text(text: &str, catalog: &RuleCatalog) -> ScoreMap {
    let text = normalize(text);
    if text.is_empty() {
        return ScoreMap::new();
    }

    let mut raw = ScoreMap::new();
    for (name, terms) in catalog.synonyms() {
        let freq: usize = terms.iter().map(|term| text.matches(term.as_str()).count()).sum();
        if freq > 0 {
            raw.insert(name.to_string(), (1.0 + freq as f64).log2());
        }
    }
    rescale_to_max(raw)
}

fn rescale_to_max(raw: ScoreMap) -> ScoreMap {
    let max = raw.values().copied().fold(0.0_f64, f64::max);
    if max <= 0.0 {
        return ScoreMap::new();
    }
    raw.into_iter()
        .map(|(name, value)| (name, round1(value / max * 100.0)))
        .collect()
}

/// Merges the two partial maps. Confidence reflects which sources agreed.
pub fn fuse_scores(
    workshop_scores: &ScoreMap,
    text_scores: &ScoreMap,
    weights: FusionWeights,
) -> Vec<CompetencyScore> {
    let names: BTreeSet<&String> = workshop_scores.keys().chain(text_scores.keys()).collect();

    let mut fused: Vec<CompetencyScore> = names
        .into_iter()
        .filter_map(|name| {
            let scored = match (workshop_scores.get(name), text_scores.get(name)) {
                (Some(ws), Some(ts)) => CompetencyScore::new(
                    name.as_str(),
                    weights.workshops * ws + weights.cv * ts,
                    CONFIDENCE_BOTH,
                    &[Source::Workshops, Source::Cv],
                ),
                (Some(ws), None) => CompetencyScore::new(
                    name.as_str(),
                    *ws,
                    CONFIDENCE_WORKSHOPS_ONLY,
                    &[Source::Workshops],
                ),
                (None, Some(ts)) => {
                    CompetencyScore::new(name.as_str(), *ts, CONFIDENCE_CV_ONLY, &[Source::Cv])
                }
                (None, None) => return None,
            };
            Some(scored)
        })
        .collect();

    sort_by_level_desc(&mut fused);
    fused
}
