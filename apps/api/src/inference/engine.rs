//! Orchestrates the scorers into the two public analyses.
//!
//! Profile: ML → (empty / unavailable / failed) → rules.
//! Job requirements: ML enriched with keywords, or keywords alone when ML is empty.
//! Neither path returns an error; failures degrade down the fallback chain.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::inference::catalog::{KeywordCatalog, RuleCatalog};
use crate::inference::keywords::predict_keywords;
use crate::inference::ml::MlScorer;
use crate::inference::normalizer::clean_personal_info;
use crate::inference::registry::ModelRegistry;
use crate::inference::rules::{fuse_scores, score_from_text, score_from_workshops, FusionWeights};
use crate::inference::InferenceSettings;
use crate::models::competency::{sort_by_level_desc, CompetencyScore, WorkshopRecord};

/// How a result was produced, plus the parameters that shaped it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode")]
pub enum AnalysisMeta {
    #[serde(rename = "ml")]
    Ml {
        threshold: f64,
        min_results: usize,
        min_prob_floor: f64,
    },
    #[serde(rename = "rules")]
    Rules { weights: FusionWeights },
    #[serde(rename = "keywords")]
    Keywords,
    #[serde(rename = "ml+keywords")]
    MlKeywords { threshold: f64 },
    #[serde(rename = "none")]
    None,
}

impl AnalysisMeta {
    pub fn mode(&self) -> &'static str {
        match self {
            AnalysisMeta::Ml { .. } => "ml",
            AnalysisMeta::Rules { .. } => "rules",
            AnalysisMeta::Keywords => "keywords",
            AnalysisMeta::MlKeywords { .. } => "ml+keywords",
            AnalysisMeta::None => "none",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub subject_id: Option<String>,
    pub competencies: Vec<CompetencyScore>,
    pub meta: AnalysisMeta,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobAnalysis {
    pub competencies: Vec<CompetencyScore>,
    pub meta: AnalysisMeta,
}

#[derive(Debug, Clone, Copy)]
pub struct ProfileOptions {
    pub use_ml: bool,
    pub include_workshops: bool,
}

impl Default for ProfileOptions {
    fn default() -> Self {
        Self {
            use_ml: true,
            include_workshops: true,
        }
    }
}

pub struct CompetencyEngine {
    registry: Arc<ModelRegistry>,
    settings: InferenceSettings,
    rules: RuleCatalog,
    keywords: KeywordCatalog,
}

impl CompetencyEngine {
    pub fn new(registry: Arc<ModelRegistry>, settings: InferenceSettings) -> Self {
        Self::with_catalogs(
            registry,
            settings,
            RuleCatalog::builtin().clone(),
            KeywordCatalog::builtin().clone(),
        )
    }

    pub fn with_catalogs(
        registry: Arc<ModelRegistry>,
        settings: InferenceSettings,
        rules: RuleCatalog,
        keywords: KeywordCatalog,
    ) -> Self {
        Self {
            registry,
            settings,
            rules,
            keywords,
        }
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    pub fn settings(&self) -> &InferenceSettings {
        &self.settings
    }

    /// Competency profile of a participant from CV text and workshop attendance.
    pub fn analyze_profile(
        &self,
        subject_id: Option<String>,
        cv_text: Option<&str>,
        workshops: Option<&[WorkshopRecord]>,
        options: ProfileOptions,
    ) -> AnalysisResult {
        let workshops: &[WorkshopRecord] = match workshops {
            Some(records) if options.include_workshops => records,
            _ => &[],
        };

        if options.use_ml {
            if let Some((competencies, meta)) = self.profile_from_ml(cv_text, workshops) {
                debug!(subject_id = ?subject_id, count = competencies.len(), "profile scored by classifier");
                return AnalysisResult {
                    subject_id,
                    competencies,
                    meta,
                };
            }
        }

        let cv = clean_personal_info(cv_text.unwrap_or_default());
        let workshop_scores = score_from_workshops(workshops, &self.rules);
        let text_scores = score_from_text(&cv, &self.rules);
        let weights = self.settings.fusion_weights;
        let competencies = fuse_scores(&workshop_scores, &text_scores, weights);
        debug!(subject_id = ?subject_id, count = competencies.len(), "profile scored by rules");

        AnalysisResult {
            subject_id,
            competencies,
            meta: AnalysisMeta::Rules { weights },
        }
    }

    fn profile_from_ml(
        &self,
        cv_text: Option<&str>,
        workshops: &[WorkshopRecord],
    ) -> Option<(Vec<CompetencyScore>, AnalysisMeta)> {
        let artifact = self.registry.get()?;
        let scorer = MlScorer::new(&artifact, &self.settings);
        let competencies = match scorer.predict(cv_text, workshops) {
            Ok(competencies) => competencies,
            Err(e) => {
                warn!(error = %e, "classifier failed on profile, using rules");
                return None;
            }
        };
        if competencies.is_empty() {
            return None;
        }
        let meta = AnalysisMeta::Ml {
            threshold: scorer.global_threshold(),
            min_results: self.settings.min_results,
            min_prob_floor: self.settings.min_prob_floor,
        };
        Some((competencies, meta))
    }

    /// Competencies a job description asks for, at most `top_k` (0 = unbounded).
    pub fn analyze_job_requirements(&self, job_text: &str, top_k: usize) -> JobAnalysis {
        let text = clean_personal_info(job_text);
        let keyword_results = predict_keywords(&text, top_k, &self.keywords);

        let Some((ml_results, threshold)) = self.job_from_ml(&text, top_k) else {
            let meta = if keyword_results.is_empty() {
                AnalysisMeta::None
            } else {
                AnalysisMeta::Keywords
            };
            debug!(mode = meta.mode(), count = keyword_results.len(), "job scored without classifier");
            return JobAnalysis {
                competencies: keyword_results,
                meta,
            };
        };

        let competencies = merge_unique(ml_results, keyword_results, top_k);
        debug!(count = competencies.len(), "job scored by classifier and keywords");
        JobAnalysis {
            competencies,
            meta: AnalysisMeta::MlKeywords { threshold },
        }
    }

    fn job_from_ml(&self, text: &str, top_k: usize) -> Option<(Vec<CompetencyScore>, f64)> {
        let artifact = self.registry.get()?;
        let scorer = MlScorer::new(&artifact, &self.settings);
        match scorer.predict_document(text, top_k) {
            Ok(results) if !results.is_empty() => Some((results, scorer.global_threshold())),
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "classifier failed on job text, using keywords");
                None
            }
        }
    }
}

/// Appends `extra` entries whose names are not already present, re-sorts, truncates.
fn merge_unique(
    primary: Vec<CompetencyScore>,
    extra: Vec<CompetencyScore>,
    top_k: usize,
) -> Vec<CompetencyScore> {
    let mut seen: HashSet<String> = primary.iter().map(|c| c.name.clone()).collect();
    let mut merged = primary;
    for candidate in extra {
        if seen.insert(candidate.name.clone()) {
            merged.push(candidate);
        }
    }
    sort_by_level_desc(&mut merged);
    if top_k > 0 {
        merged.truncate(top_k);
    }
    merged
}
