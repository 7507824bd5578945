//! Sample-point selection inside the template region.
//!
//! Both training and tracking read image intensity at the same fixed set of
//! template-local points. The set is generated once per template and never
//! mutated afterwards.

pub mod interpolate;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackError};
use crate::warp::WARP_DOF;

pub use interpolate::{bilinear, intensity_vector};

/// Minimum number of sample points for a well-posed regression: the warp
/// degrees of freedom plus an equal safety margin.
pub const MIN_SAMPLES: usize = 2 * WARP_DOF;

/// Point-selection strategy inside the template rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingStrategy {
    /// Uniform grid covering the whole template.
    Grid,
    /// Normally distributed points concentrated toward the template
    /// interior, which empirically reduces sensitivity to warp noise near
    /// the template boundary.
    GaussianInterior,
}

/// An ordered, immutable set of template-local sample coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplePoints {
    points: Vec<[f64; 2]>,
}

impl SamplePoints {
    /// Generate `count` sample points inside a `width` x `height` template.
    ///
    /// Generation is deterministic for a fixed `seed`. Fails with
    /// `InsufficientSamples` when `count` is below [`MIN_SAMPLES`].
    pub fn generate(
        count: usize,
        width: u32,
        height: u32,
        strategy: SamplingStrategy,
        seed: u64,
    ) -> Result<SamplePoints> {
        if count < MIN_SAMPLES {
            return Err(TrackError::InsufficientSamples {
                required: MIN_SAMPLES,
                actual: count,
            });
        }

        let points = match strategy {
            SamplingStrategy::Grid => grid_points(count, width, height),
            SamplingStrategy::GaussianInterior => {
                gaussian_interior_points(count, width, height, seed)
            }
        };
        Ok(SamplePoints { points })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, [f64; 2]> {
        self.points.iter()
    }

    pub fn as_slice(&self) -> &[[f64; 2]] {
        &self.points
    }
}

fn grid_points(count: usize, width: u32, height: u32) -> Vec<[f64; 2]> {
    let w = (width.max(2) - 1) as f64;
    let h = (height.max(2) - 1) as f64;
    let aspect = width as f64 / height as f64;

    // Grid shape close to the template aspect ratio with at least `count`
    // cells; surplus cells are dropped from the tail row.
    let cols = ((count as f64 * aspect).sqrt().ceil() as usize).max(1);
    let rows = count.div_ceil(cols);

    let mut points = Vec::with_capacity(count);
    'outer: for iy in 0..rows {
        for ix in 0..cols {
            if points.len() == count {
                break 'outer;
            }
            let x = (ix as f64 + 0.5) / cols as f64 * w;
            let y = (iy as f64 + 0.5) / rows as f64 * h;
            points.push([x, y]);
        }
    }
    points
}

fn gaussian_interior_points(count: usize, width: u32, height: u32, seed: u64) -> Vec<[f64; 2]> {
    let w = (width.max(2) - 1) as f64;
    let h = (height.max(2) - 1) as f64;
    let center = [w / 2.0, h / 2.0];
    // One-sigma covers the central half of the template in each axis.
    let dist_x = Normal::new(center[0], w / 4.0).expect("finite std");
    let dist_y = Normal::new(center[1], h / 4.0).expect("finite std");

    let mut rng = StdRng::seed_from_u64(seed);
    let mut points = Vec::with_capacity(count);
    while points.len() < count {
        let mut x = dist_x.sample(&mut rng);
        let mut y = dist_y.sample(&mut rng);
        // Bounded rejection; falls back to uniform inside the template.
        let mut attempts = 0;
        while !(0.0..=w).contains(&x) || !(0.0..=h).contains(&y) {
            if attempts >= 16 {
                x = rng.gen_range(0.0..=w);
                y = rng.gen_range(0.0..=h);
                break;
            }
            x = dist_x.sample(&mut rng);
            y = dist_y.sample(&mut rng);
            attempts += 1;
        }
        points.push([x, y]);
    }
    points
}
