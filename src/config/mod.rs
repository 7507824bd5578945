use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Result, TrackError};
use crate::sampling::SamplingStrategy;
use crate::training::perturbation::ParameterBounds;

/// Full configuration surface of the tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[derive(Default)]
#[serde(default)]
pub struct TrackerConfig {
    pub sampling: SamplingConfig,
    pub training: TrainingConfig,
    pub convergence: ConvergenceConfig,
    pub monitor: MonitorConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Number of template-local sample points.
    pub sample_count: usize,
    pub strategy: SamplingStrategy,
    /// Seed for sampling and perturbation draws; fixed seed means
    /// reproducible training.
    pub seed: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Synthetic perturbations per cascade stage.
    pub perturbation_count: usize,
    pub bounds: ParameterBounds,
    /// Bound multipliers of the predictor cascade, coarse to fine. A single
    /// entry disables the cascade.
    pub motion_scales: Vec<f64>,
    /// Ridge strength of the least-squares solve. Larger values tolerate
    /// low-texture templates at the cost of a more biased predictor.
    pub regularization: f64,
    /// Condition-number ceiling above which training fails rather than
    /// producing an unstable predictor.
    pub condition_threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvergenceConfig {
    /// Update-magnitude threshold that ends the per-frame iteration.
    pub epsilon: f64,
    /// Iteration budget per frame.
    pub max_iterations: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// RMS residual at or below which a converged frame is accepted.
    pub accept_residual: f64,
    /// RMS residual of total mismatch; confidence reaches zero here.
    pub fail_residual: f64,
    /// Consecutive non-accepted frames before declaring `Lost`.
    pub consecutive_failure_limit: u32,
    /// Largest tolerated fraction of border-clamped sample points.
    pub max_oob_fraction: f64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            sample_count: 144,
            strategy: SamplingStrategy::GaussianInterior,
            seed: 17,
        }
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            perturbation_count: 400,
            bounds: ParameterBounds::default(),
            motion_scales: vec![1.0, 0.5, 0.25],
            regularization: 1e-3,
            condition_threshold: 1e8,
        }
    }
}

impl Default for ConvergenceConfig {
    fn default() -> Self {
        Self {
            epsilon: 1e-2,
            max_iterations: 10,
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            accept_residual: 0.12,
            fail_residual: 0.35,
            consecutive_failure_limit: 3,
            max_oob_fraction: 0.3,
        }
    }
}

impl TrackerConfig {
    /// Load from a TOML or JSON file (JSON is sniffed by a leading brace).
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;

        if content.trim_start().starts_with('{') {
            Ok(serde_json::from_str(&content)?)
        } else {
            toml::from_str(&content).map_err(|e| TrackError::InvalidConfig(e.to_string()))
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P, format: ConfigFormat) -> Result<()> {
        let content = match format {
            ConfigFormat::Json => serde_json::to_string_pretty(self)?,
            ConfigFormat::Toml => toml::to_string_pretty(self)
                .map_err(|e| TrackError::InvalidConfig(e.to_string()))?,
        };

        fs::write(path, content)?;
        Ok(())
    }

    /// Collect every constraint violation instead of stopping at the first.
    ///
    /// Sample and perturbation counts are not checked here; the sampler and
    /// perturbation generator enforce those preconditions with the typed
    /// `InsufficientSamples` error.
    pub fn validate(&self) -> std::result::Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.training.motion_scales.is_empty() {
            errors.push("motion_scales must not be empty".to_string());
        }

        if self.training.motion_scales.iter().any(|&s| s <= 0.0 || !s.is_finite()) {
            errors.push("motion_scales entries must be positive and finite".to_string());
        }

        if self.training.regularization < 0.0 {
            errors.push("regularization must be non-negative".to_string());
        }

        if self.training.condition_threshold <= 1.0 {
            errors.push("condition_threshold must be greater than 1".to_string());
        }

        if self.convergence.epsilon <= 0.0 {
            errors.push("convergence epsilon must be positive".to_string());
        }

        if self.convergence.max_iterations == 0 {
            errors.push("max_iterations must be at least 1".to_string());
        }

        if self.monitor.accept_residual <= 0.0 {
            errors.push("accept_residual must be positive".to_string());
        }

        if self.monitor.fail_residual <= self.monitor.accept_residual {
            errors.push("fail_residual must exceed accept_residual".to_string());
        }

        if self.monitor.consecutive_failure_limit == 0 {
            errors.push("consecutive_failure_limit must be at least 1".to_string());
        }

        if !(0.0..=1.0).contains(&self.monitor.max_oob_fraction) {
            errors.push("max_oob_fraction must be within [0, 1]".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone)]
pub enum ConfigFormat {
    Json,
    Toml,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(TrackerConfig::default().validate().is_ok());
    }

    #[test]
    fn validation_collects_all_violations() {
        let mut config = TrackerConfig::default();
        config.convergence.max_iterations = 0;
        config.monitor.fail_residual = 0.01;
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
