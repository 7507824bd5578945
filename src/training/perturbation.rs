//! Synthetic warp perturbations for training-set synthesis.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackError};
use crate::warp::WARP_DOF;

/// Minimum perturbations per predictor stage: ten equations per unknown.
pub const MIN_PERTURBATIONS: usize = 10 * WARP_DOF;

/// Symmetric half-widths of the uniform perturbation ranges, grouped by the
/// physical role of each homography parameter.
///
/// Wider bounds tolerate faster inter-frame motion but increase the residual
/// of the linear approximation; the trainer scales these per cascade stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterBounds {
    /// Scale/rotation/shear entries (h00, h01, h10, h11), unitless.
    pub linear: f64,
    /// Translation entries (h02, h12), template-local pixels.
    pub translation: f64,
    /// Projective entries (h20, h21), inverse pixels.
    pub projective: f64,
}

impl Default for ParameterBounds {
    fn default() -> Self {
        Self {
            linear: 0.05,
            translation: 3.0,
            projective: 1e-4,
        }
    }
}

impl ParameterBounds {
    /// Per-parameter half-widths in warp parameter order.
    pub fn half_widths(&self) -> [f64; WARP_DOF] {
        [
            self.linear,
            self.linear,
            self.translation,
            self.linear,
            self.linear,
            self.translation,
            self.projective,
            self.projective,
        ]
    }
}

/// Draws warp-parameter offsets independently and uniformly within
/// symmetric per-parameter bounds around identity.
pub struct PerturbationGenerator {
    half_widths: [f64; WARP_DOF],
    rng: StdRng,
}

impl PerturbationGenerator {
    /// `scale` multiplies every bound; cascade stages pass decreasing scales.
    pub fn new(bounds: &ParameterBounds, scale: f64, seed: u64) -> Self {
        let mut half_widths = bounds.half_widths();
        for hw in &mut half_widths {
            *hw *= scale;
        }
        Self {
            half_widths,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Draw `count` perturbation parameter vectors.
    ///
    /// Deterministic for a fixed seed. Fails with `InsufficientSamples` when
    /// `count` is below [`MIN_PERTURBATIONS`].
    pub fn generate(&mut self, count: usize) -> Result<Vec<[f64; WARP_DOF]>> {
        if count < MIN_PERTURBATIONS {
            return Err(TrackError::InsufficientSamples {
                required: MIN_PERTURBATIONS,
                actual: count,
            });
        }

        let mut perturbations = Vec::with_capacity(count);
        for _ in 0..count {
            let mut p = [0.0; WARP_DOF];
            for (value, &hw) in p.iter_mut().zip(self.half_widths.iter()) {
                if hw > 0.0 {
                    *value = self.rng.gen_range(-hw..=hw);
                }
            }
            perturbations.push(p);
        }
        Ok(perturbations)
    }
}
