//! Classifier artifact: the trained multi-label model plus its class list and thresholds.
//!
//! Whether the model can emit probabilities natively is decided once, when the
//! artifact is built, and recorded in [`ClassifierModel`].

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::inference::ModelError;

/// A model that returns one probability per class.
pub trait ProbabilityModel: Send + Sync {
    fn predict_proba(&self, document: &str) -> Result<Vec<f64>, ModelError>;
}

/// A model that only exposes raw decision scores (margins / logits).
pub trait ScoreModel: Send + Sync {
    fn decision_function(&self, document: &str) -> Result<Vec<f64>, ModelError>;
}

/// The model behind an artifact, tagged by the output interface it supports.
pub enum ClassifierModel {
    Probability(Box<dyn ProbabilityModel>),
    Score(Box<dyn ScoreModel>),
}

impl ClassifierModel {
    /// Per-class probabilities. Score-only models go through the logistic function.
    pub fn probabilities(&self, document: &str) -> Result<Vec<f64>, ModelError> {
        match self {
            ClassifierModel::Probability(model) => model.predict_proba(document),
            ClassifierModel::Score(model) => Ok(model
                .decision_function(document)?
                .into_iter()
                .map(sigmoid)
                .collect()),
        }
    }

    pub fn variant(&self) -> &'static str {
        match self {
            ClassifierModel::Probability(_) => "probability",
            ClassifierModel::Score(_) => "decision_score",
        }
    }
}

impl std::fmt::Debug for ClassifierModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ClassifierModel::{}", self.variant())
    }
}

pub fn sigmoid(score: f64) -> f64 {
    1.0 / (1.0 + (-score).exp())
}

/// Optional training-time metadata stored alongside the model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    #[serde(default)]
    pub best_threshold: Option<f64>,
    #[serde(default)]
    pub threshold: Option<f64>,
    #[serde(default)]
    pub label_cardinality: Option<f64>,
}

impl ArtifactMetadata {
    /// Global threshold stored with the artifact, if a valid one exists.
    pub fn default_threshold(&self) -> Option<f64> {
        self.best_threshold
            .filter(|t| is_probability(*t))
            .or(self.threshold.filter(|t| is_probability(*t)))
    }
}

pub fn is_probability(value: f64) -> bool {
    value.is_finite() && (0.0..=1.0).contains(&value)
}

/// A loaded, immutable classifier with its stable index ↔ class mapping.
#[derive(Debug)]
pub struct ClassifierArtifact {
    model: ClassifierModel,
    classes: Vec<String>,
    thresholds: HashMap<String, f64>,
    metadata: ArtifactMetadata,
}

impl ClassifierArtifact {
    pub fn new(
        model: ClassifierModel,
        classes: Vec<String>,
        thresholds: HashMap<String, f64>,
        metadata: ArtifactMetadata,
    ) -> Result<Self, ModelError> {
        let mut seen = HashSet::new();
        if let Some(dup) = classes.iter().find(|c| !seen.insert(c.as_str())) {
            return Err(ModelError::Malformed(format!("duplicate class '{dup}'")));
        }

        let thresholds = thresholds
            .into_iter()
            .filter(|(class, t)| {
                let valid = is_probability(*t);
                if !valid {
                    warn!(class = %class, threshold = *t, "ignoring out-of-range class threshold");
                }
                valid
            })
            .collect();

        Ok(Self {
            model,
            classes,
            thresholds,
            metadata,
        })
    }

    /// Reads and validates an artifact file.
    pub fn from_path(path: &Path) -> Result<Self, ModelError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let file: ArtifactFile = serde_json::from_str(&raw)?;
        file.into_artifact()
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn class_threshold(&self, class: &str) -> Option<f64> {
        self.thresholds.get(class).copied()
    }

    pub fn metadata(&self) -> &ArtifactMetadata {
        &self.metadata
    }

    pub fn variant(&self) -> &'static str {
        self.model.variant()
    }

    /// Probability vector for a single document, checked against the class list.
    pub fn probabilities(&self, document: &str) -> Result<Vec<f64>, ModelError> {
        let probs = self.model.probabilities(document)?;
        if probs.len() != self.classes.len() {
            return Err(ModelError::Inference(format!(
                "model returned {} outputs for {} classes",
                probs.len(),
                self.classes.len()
            )));
        }
        if probs.iter().any(|p| !p.is_finite()) {
            return Err(ModelError::Inference("model returned a non-finite output".to_string()));
        }
        Ok(probs.into_iter().map(|p| p.clamp(0.0, 1.0)).collect())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// On-disk artifact
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelOutput {
    Probability,
    DecisionScore,
}

#[derive(Debug, Deserialize)]
struct ArtifactFile {
    classes: Vec<String>,
    #[serde(default)]
    thresholds: HashMap<String, f64>,
    #[serde(default)]
    metadata: ArtifactMetadata,
    model: LinearModelFile,
}

#[derive(Debug, Deserialize)]
struct LinearModelFile {
    output: ModelOutput,
    #[serde(default = "default_ngram_max")]
    ngram_max: usize,
    intercepts: Vec<f64>,
    coefficients: HashMap<String, Vec<f64>>,
}

fn default_ngram_max() -> usize {
    1
}

impl ArtifactFile {
    fn into_artifact(self) -> Result<ClassifierArtifact, ModelError> {
        let n = self.classes.len();
        let output = self.model.output;
        let model = LinearTermModel::new(
            self.model.intercepts,
            self.model.coefficients,
            self.model.ngram_max,
            n,
        )?;
        let model = match output {
            ModelOutput::Probability => {
                ClassifierModel::Probability(Box::new(LogisticTermModel(model)))
            }
            ModelOutput::DecisionScore => ClassifierModel::Score(Box::new(model)),
        };
        ClassifierArtifact::new(model, self.classes, self.thresholds, self.metadata)
    }
}

/// Linear model over document terms: `intercept[c] + Σ coefficient[t][c]` for every
/// distinct unigram (and bigram when `ngram_max >= 2`) present in the document.
#[derive(Debug, Clone)]
pub struct LinearTermModel {
    intercepts: Vec<f64>,
    coefficients: HashMap<String, Vec<f64>>,
    ngram_max: usize,
}

impl LinearTermModel {
    pub fn new(
        intercepts: Vec<f64>,
        coefficients: HashMap<String, Vec<f64>>,
        ngram_max: usize,
        class_count: usize,
    ) -> Result<Self, ModelError> {
        if intercepts.len() != class_count {
            return Err(ModelError::Malformed(format!(
                "{} intercepts for {class_count} classes",
                intercepts.len()
            )));
        }
        if let Some((term, row)) = coefficients.iter().find(|(_, row)| row.len() != class_count) {
            return Err(ModelError::Malformed(format!(
                "term '{term}' has {} coefficients for {class_count} classes",
                row.len()
            )));
        }
        if !(1..=2).contains(&ngram_max) {
            return Err(ModelError::Malformed(format!("unsupported ngram_max {ngram_max}")));
        }
        Ok(Self {
            intercepts,
            coefficients,
            ngram_max,
        })
    }

    fn terms(&self, document: &str) -> HashSet<String> {
        let tokens: Vec<&str> = document.split_whitespace().collect();
        let mut terms: HashSet<String> = tokens.iter().map(|t| t.to_string()).collect();
        if self.ngram_max >= 2 {
            terms.extend(tokens.windows(2).map(|pair| format!("{} {}", pair[0], pair[1])));
        }
        terms
    }
}

impl ScoreModel for LinearTermModel {
    fn decision_function(&self, document: &str) -> Result<Vec<f64>, ModelError> {
        let mut scores = self.intercepts.clone();
        for term in self.terms(document) {
            if let Some(row) = self.coefficients.get(&term) {
                for (score, weight) in scores.iter_mut().zip(row) {
                    *score += weight;
                }
            }
        }
        Ok(scores)
    }
}

/// Linear model trained with a logistic loss, exposing calibrated probabilities.
#[derive(Debug, Clone)]
pub struct LogisticTermModel(pub LinearTermModel);

impl ProbabilityModel for LogisticTermModel {
    fn predict_proba(&self, document: &str) -> Result<Vec<f64>, ModelError> {
        Ok(self
            .0
            .decision_function(document)?
            .into_iter()
            .map(sigmoid)
            .collect())
    }
}
