//! Process-wide classifier cache.
//!
//! Loaded at most once, lazily, then shared read-only. Readers go through an
//! `ArcSwapOption` and never block; they see either a fully built artifact or none.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwapOption;
use serde::Serialize;
use tracing::{info, warn};

use crate::inference::classifier::ClassifierArtifact;
use crate::inference::ModelError;

#[derive(Debug)]
enum ModelState {
    Ready(Arc<ClassifierArtifact>),
    /// A load was attempted and failed; kept so requests don't retry file I/O.
    Unavailable(String),
}

impl ModelState {
    fn artifact(&self) -> Option<Arc<ClassifierArtifact>> {
        match self {
            ModelState::Ready(artifact) => Some(Arc::clone(artifact)),
            ModelState::Unavailable(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ModelStatus {
    NotLoaded,
    Loaded { classes: usize, variant: &'static str },
    Unavailable { reason: String },
}

pub struct ModelRegistry {
    path: Option<PathBuf>,
    slot: ArcSwapOption<ModelState>,
    /// Serializes loads; never held by readers of an already-filled slot.
    load_lock: Mutex<()>,
}

impl ModelRegistry {
    /// Registry that lazily loads the artifact at `path` on first use.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            slot: ArcSwapOption::empty(),
            load_lock: Mutex::new(()),
        }
    }

    /// Registry seeded with an in-memory artifact and no backing file.
    #[cfg(test)]
    pub fn preloaded(artifact: ClassifierArtifact) -> Self {
        let registry = Self {
            path: None,
            slot: ArcSwapOption::empty(),
            load_lock: Mutex::new(()),
        };
        registry.install(artifact);
        registry
    }

    /// Registry with no model at all; every request takes the rule/keyword path.
    pub fn disabled() -> Self {
        Self {
            path: None,
            slot: ArcSwapOption::empty(),
            load_lock: Mutex::new(()),
        }
    }

    /// The shared artifact, loading it on first call. `None` means no model is usable.
    pub fn get(&self) -> Option<Arc<ClassifierArtifact>> {
        if let Some(state) = self.slot.load_full() {
            return state.artifact();
        }

        let _guard = self.load_lock.lock().unwrap_or_else(PoisonError::into_inner);
        // Another caller may have finished loading while we waited.
        if let Some(state) = self.slot.load_full() {
            return state.artifact();
        }

        let state = match self.load() {
            Ok(artifact) => ModelState::Ready(Arc::new(artifact)),
            Err(e) => {
                warn!(error = %e, "classifier unavailable, falling back to rules");
                ModelState::Unavailable(e.to_string())
            }
        };
        let artifact = state.artifact();
        self.slot.store(Some(Arc::new(state)));
        artifact
    }

    /// Loads a fresh artifact and swaps it in. On failure the current one stays active.
    pub fn reload(&self) -> Result<Arc<ClassifierArtifact>, ModelError> {
        let _guard = self.load_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let artifact = Arc::new(self.load()?);
        self.slot
            .store(Some(Arc::new(ModelState::Ready(Arc::clone(&artifact)))));
        Ok(artifact)
    }

    /// Drops the cached artifact; the next `get` loads again.
    pub fn clear(&self) {
        let _guard = self.load_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.slot.store(None);
    }

    /// Swaps in an already-built artifact.
    #[cfg(test)]
    pub fn install(&self, artifact: ClassifierArtifact) {
        self.slot
            .store(Some(Arc::new(ModelState::Ready(Arc::new(artifact)))));
    }

    pub fn status(&self) -> ModelStatus {
        match self.slot.load_full().as_deref() {
            None => ModelStatus::NotLoaded,
            Some(ModelState::Ready(artifact)) => ModelStatus::Loaded {
                classes: artifact.classes().len(),
                variant: artifact.variant(),
            },
            Some(ModelState::Unavailable(reason)) => ModelStatus::Unavailable {
                reason: reason.clone(),
            },
        }
    }

    fn load(&self) -> Result<ClassifierArtifact, ModelError> {
        let path = self.path.as_ref().ok_or(ModelError::NoSource)?;
        let artifact = ClassifierArtifact::from_path(path)?;
        info!(
            path = %path.display(),
            classes = artifact.classes().len(),
            variant = artifact.variant(),
            "classifier artifact loaded"
        );
        Ok(artifact)
    }
}
