//! Trained tracker artifact and its persistence.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::TrackerConfig;
use crate::error::{Result, TrackError};
use crate::sampling::SamplePoints;
use crate::training::PredictorStage;
use crate::warp::WARP_DOF;

/// Everything the online tracker needs: the sample-point set, the learned
/// predictor cascade, the reference intensity vector, and the configuration
/// it was trained with.
///
/// Immutable after training; hand it to concurrent tracking sessions behind
/// an [`Arc`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerModel {
    samples: SamplePoints,
    stages: Vec<PredictorStage>,
    reference: Vec<f64>,
    template_size: (u32, u32),
    config: TrackerConfig,
}

impl TrackerModel {
    pub(crate) fn new(
        samples: SamplePoints,
        stages: Vec<PredictorStage>,
        reference: Vec<f64>,
        template_size: (u32, u32),
        config: TrackerConfig,
    ) -> Self {
        Self {
            samples,
            stages,
            reference,
            template_size,
            config,
        }
    }

    pub fn samples(&self) -> &SamplePoints {
        &self.samples
    }

    pub fn stages(&self) -> &[PredictorStage] {
        &self.stages
    }

    pub fn reference(&self) -> &[f64] {
        &self.reference
    }

    /// Width and height of the template patch this model was trained on.
    pub fn template_size(&self) -> (u32, u32) {
        self.template_size
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn into_shared(self) -> Arc<TrackerModel> {
        Arc::new(self)
    }

    /// Persist as pretty-printed JSON. The serialized form round-trips
    /// exactly: a reloaded model tracks identically.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Load a model persisted by [`save_to_file`](Self::save_to_file) and
    /// check its structural invariants.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<TrackerModel> {
        let content = fs::read_to_string(path)?;
        let model: TrackerModel = serde_json::from_str(&content)?;
        model.validate()?;
        Ok(model)
    }

    /// Structural invariants: every stage matrix is warp-DoF by
    /// sample-count, and the reference vector matches the sample count.
    pub fn validate(&self) -> Result<()> {
        if self.stages.is_empty() {
            return Err(TrackError::InvalidConfig(
                "model has no predictor stages".into(),
            ));
        }
        if self.reference.len() != self.samples.len() {
            return Err(TrackError::InvalidConfig(format!(
                "reference vector length {} does not match sample count {}",
                self.reference.len(),
                self.samples.len()
            )));
        }
        for (i, stage) in self.stages.iter().enumerate() {
            let (rows, cols) = stage.matrix.dim();
            if rows != WARP_DOF || cols != self.samples.len() {
                return Err(TrackError::InvalidConfig(format!(
                    "stage {i} matrix is {rows}x{cols}, expected {WARP_DOF}x{}",
                    self.samples.len()
                )));
            }
        }
        Ok(())
    }
}
