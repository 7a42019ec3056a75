//! Classifier adapter.
//!
//! The trained model is an opaque artifact produced elsewhere and consumed
//! here as JSON: linear weights over the 30 canonical feature columns, an
//! optional pre-fit standardization transform, and a decision threshold.
//! The artifact is loaded once at startup into a `ClassifierHandle`; a
//! missing or malformed artifact is an explicit, reportable state, never a
//! silently defaulted prediction.

use crate::models::{FeatureName, FeatureVector, PredictionResult};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("Model artifact not found at {0}")]
    ArtifactMissing(String),

    #[error("Failed to read model artifact: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Malformed model artifact: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Model expects {expected} feature columns, artifact has {actual}")]
    WeightCount { expected: usize, actual: usize },

    #[error("Scaler parameter length {actual} does not match {expected} feature columns")]
    ScalerShape { expected: usize, actual: usize },

    #[error("Model unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, ClassifierError>;

/// Binary classifier over a feature vector.
pub trait Classifier: Send + Sync {
    /// Predict the class label: 0 = legit, 1 = fake.
    fn predict(&self, features: &FeatureVector) -> Result<u8>;

    fn name(&self) -> &str;
}

/// Pre-fit standardization bundled with the model.
#[derive(Debug, Clone, Deserialize)]
pub struct ScalerParams {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

fn default_threshold() -> f64 {
    0.5
}

/// Linear model artifact. Column order is the canonical feature order;
/// the artifact carries no column names, only positions.
#[derive(Debug, Clone, Deserialize)]
pub struct LinearModel {
    #[serde(default)]
    pub version: Option<String>,
    pub weights: Vec<f64>,
    pub bias: f64,
    #[serde(default)]
    pub scaler: Option<ScalerParams>,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

impl LinearModel {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ClassifierError::ArtifactMissing(
                path.display().to_string(),
            ));
        }
        let raw = std::fs::read_to_string(path)?;
        let model: LinearModel = serde_json::from_str(&raw)?;
        model.validate()?;
        Ok(model)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let model: LinearModel = serde_json::from_str(raw)?;
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> Result<()> {
        if self.weights.len() != FeatureName::COUNT {
            return Err(ClassifierError::WeightCount {
                expected: FeatureName::COUNT,
                actual: self.weights.len(),
            });
        }
        if let Some(scaler) = &self.scaler {
            for params in [&scaler.mean, &scaler.scale] {
                if params.len() != FeatureName::COUNT {
                    return Err(ClassifierError::ScalerShape {
                        expected: FeatureName::COUNT,
                        actual: params.len(),
                    });
                }
            }
        }
        Ok(())
    }

    fn decision(&self, row: &[f64]) -> f64 {
        let mut score = self.bias;
        for (i, &x) in row.iter().enumerate() {
            let x = match &self.scaler {
                // scale == 0 means a constant training column; leave it centered
                Some(s) if s.scale[i] != 0.0 => (x - s.mean[i]) / s.scale[i],
                Some(s) => x - s.mean[i],
                None => x,
            };
            score += self.weights[i] * x;
        }
        score
    }
}

impl Classifier for LinearModel {
    fn predict(&self, features: &FeatureVector) -> Result<u8> {
        let row = features.to_row();
        let score = self.decision(&row);
        let probability = 1.0 / (1.0 + (-score).exp());
        Ok((probability >= self.threshold) as u8)
    }

    fn name(&self) -> &str {
        self.version.as_deref().unwrap_or("linear-v1")
    }
}

enum HandleState {
    Ready(Box<dyn Classifier>),
    Failed(String),
}

/// Load-once handle passed to request handlers.
///
/// Construction never panics and never hides the failure: a handle that
/// failed to load answers every prediction with `Unavailable` carrying the
/// original load error.
pub struct ClassifierHandle {
    state: HandleState,
}

impl ClassifierHandle {
    pub fn load(path: &str) -> Self {
        match LinearModel::from_file(path) {
            Ok(model) => ClassifierHandle {
                state: HandleState::Ready(Box::new(model)),
            },
            Err(e) => ClassifierHandle {
                state: HandleState::Failed(e.to_string()),
            },
        }
    }

    pub fn from_classifier(classifier: Box<dyn Classifier>) -> Self {
        ClassifierHandle {
            state: HandleState::Ready(classifier),
        }
    }

    pub fn ready(&self) -> bool {
        matches!(self.state, HandleState::Ready(_))
    }

    pub fn status(&self) -> String {
        match &self.state {
            HandleState::Ready(classifier) => format!("loaded ({})", classifier.name()),
            HandleState::Failed(reason) => format!("unavailable: {}", reason),
        }
    }

    pub fn predict(&self, features: &FeatureVector) -> Result<PredictionResult> {
        match &self.state {
            HandleState::Ready(classifier) => classifier
                .predict(features)
                .map(PredictionResult::from_label),
            HandleState::Failed(reason) => Err(ClassifierError::Unavailable(reason.clone())),
        }
    }
}
