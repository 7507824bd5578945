//! Offline hyperplane training.
//!
//! For each synthetic perturbation the template is resampled under the
//! inverse perturbation warp; the resulting intensity-difference vector and
//! the perturbation parameters form one training pair. Stacking all pairs
//! gives a least-squares problem whose ridge solution is the hyperplane
//! matrix used by the online tracker.

pub mod perturbation;
mod ridge;

use instant::Instant;
use ndarray::Array2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::TrackerConfig;
use crate::error::{Result, TrackError};
use crate::model::TrackerModel;
use crate::sampling::{intensity_vector, SamplePoints};
use crate::template::Template;
use crate::warp::{Warp, WARP_DOF};

pub use perturbation::{ParameterBounds, PerturbationGenerator, MIN_PERTURBATIONS};

/// One learned predictor of the coarse-to-fine cascade.
///
/// Each stage is trained on perturbations drawn at its own motion scale; at
/// tracking time every stage proposes an update and the proposal with the
/// lowest residual wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictorStage {
    /// Multiplier applied to the perturbation bounds this stage was
    /// trained with.
    pub scale: f64,
    /// Hyperplane matrix: rows = warp DoF, columns = sample count.
    pub matrix: Array2<f64>,
    /// Condition number of the regularized regression that produced it.
    pub condition: f64,
}

/// Learn a tracker model for `template`.
///
/// Fails before producing any model when the sampler precondition is
/// violated (`InsufficientSamples`) or the template cannot support a stable
/// regression (`IllConditionedTemplate`). A returned model is always
/// complete and usable.
pub fn train(template: &Template, config: &TrackerConfig) -> Result<TrackerModel> {
    if let Err(errors) = config.validate() {
        return Err(TrackError::InvalidConfig(errors.join("; ")));
    }

    let start = Instant::now();
    let samples = SamplePoints::generate(
        config.sampling.sample_count,
        template.width(),
        template.height(),
        config.sampling.strategy,
        config.sampling.seed,
    )?;

    let (reference, _) = intensity_vector(template.patch(), &samples, &Warp::identity());
    if variance(&reference) < 1e-9 {
        return Err(TrackError::IllConditionedTemplate {
            condition: f64::INFINITY,
            threshold: config.training.condition_threshold,
        });
    }

    let mut stages = Vec::with_capacity(config.training.motion_scales.len());
    for (index, &scale) in config.training.motion_scales.iter().enumerate() {
        tracing::info!(
            stage = index,
            scale,
            count = config.training.perturbation_count,
            "synthesizing training set"
        );
        let perturbations = PerturbationGenerator::new(
            &config.training.bounds,
            scale,
            config.sampling.seed.wrapping_add(index as u64 + 1),
        )
        .generate(config.training.perturbation_count)?;

        let (x, y) = synthesize(template, &samples, &reference, &perturbations)?;
        let solution = ridge::solve_ridge(
            &x,
            &y,
            config.training.regularization,
            config.training.condition_threshold,
        )?;
        tracing::debug!(stage = index, condition = solution.condition, "stage solved");

        stages.push(PredictorStage {
            scale,
            matrix: solution.matrix,
            condition: solution.condition,
        });
    }

    tracing::info!(
        stages = stages.len(),
        samples = samples.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "training complete"
    );

    Ok(TrackerModel::new(
        samples,
        stages,
        reference,
        (template.width(), template.height()),
        config.clone(),
    ))
}

/// Build the design and target matrices for one cascade stage.
///
/// Each perturbation's sampling is independent, so synthesis fans out across
/// the thread pool; the subsequent solve is the single synchronization
/// point.
fn synthesize(
    template: &Template,
    samples: &SamplePoints,
    reference: &[f64],
    perturbations: &[[f64; WARP_DOF]],
) -> Result<(Array2<f64>, Array2<f64>)> {
    let rows: Vec<Vec<f64>> = perturbations
        .par_iter()
        .map(|p| -> Result<Vec<f64>> {
            let disturb = Warp::from_params(p).inverse()?;
            let (values, _) = intensity_vector(template.patch(), samples, &disturb);
            Ok(values
                .iter()
                .zip(reference.iter())
                .map(|(v, r)| v - r)
                .collect())
        })
        .collect::<Result<_>>()?;

    let mut x = Array2::zeros((perturbations.len(), samples.len()));
    let mut y = Array2::zeros((perturbations.len(), WARP_DOF));
    for (i, row) in rows.iter().enumerate() {
        for (j, &value) in row.iter().enumerate() {
            x[[i, j]] = value;
        }
        for (j, &value) in perturbations[i].iter().enumerate() {
            y[[i, j]] = value;
        }
    }
    Ok((x, y))
}

fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64
}
