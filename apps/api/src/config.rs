use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use tracing::warn;

use crate::inference::classifier::is_probability;
use crate::inference::{InferenceSettings, MAX_TOP_K};

const DEFAULT_MODEL_PATH: &str = "models/pipeline_competencias.json";

/// Application configuration loaded from environment variables.
///
/// Only the listen port is fatal when invalid. Inference knobs that fail to parse or
/// fall outside their range are logged and replaced by their defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub model_path: PathBuf,
    pub inference: InferenceSettings,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = InferenceSettings::default();

        let inference = InferenceSettings {
            threshold_override: parse_optional(&lookup, "ML_THRESHOLD", |t: &f64| {
                is_probability(*t)
            }),
            min_results: parse_optional(&lookup, "ML_MIN_RESULTS", |_: &usize| true)
                .unwrap_or(defaults.min_results),
            min_prob_floor: parse_optional(&lookup, "ML_MIN_PROB_FLOOR", |f: &f64| {
                is_probability(*f)
            })
            .unwrap_or(defaults.min_prob_floor),
            default_top_k: parse_optional(&lookup, "ML_DEFAULT_TOP_K", |k: &usize| {
                (1..=MAX_TOP_K).contains(k)
            })
            .unwrap_or(defaults.default_top_k),
            fusion_weights: defaults.fusion_weights,
        };

        Ok(Config {
            port: lookup("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            model_path: lookup("MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH)),
            inference,
        })
    }
}

/// Reads `key` and parses it; unset yields `None` silently, unparseable or invalid
/// values yield `None` with a warning.
fn parse_optional<T, L, F>(lookup: &L, key: &str, valid: F) -> Option<T>
where
    T: FromStr,
    L: Fn(&str) -> Option<String>,
    F: Fn(&T) -> bool,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) if valid(&value) => Some(value),
        _ => {
            warn!(key, value = %raw, "ignoring invalid configuration value");
            None
        }
    }
}
