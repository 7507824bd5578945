//! Online per-frame tracking runtime.
//!
//! Each frame is refined by a bounded iterative loop: extract the intensity
//! vector under the current warp, apply the learned predictor cascade to the
//! difference against the stored reference, compose the winning update into
//! the warp, and stop on convergence, budget exhaustion, or a degenerate
//! warp. Per-frame problems never escape as errors; they resolve to a
//! `Degraded`/`Lost` status the caller can act on.

pub mod monitor;

use std::sync::Arc;

use image::GrayImage;
use instant::Instant;
use ndarray::Array1;

use crate::error::Result;
use crate::model::TrackerModel;
use crate::sampling::intensity_vector;
use crate::warp::{Warp, WARP_DOF};

pub use monitor::{FailureMonitor, FrameStatus};

/// Session-level tracker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    Tracking,
    Lost,
}

/// Per-frame tracking output.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TrackResult {
    /// Warp parameters mapping template-local to frame coordinates.
    pub params: [f64; WARP_DOF],
    /// Template rectangle corners mapped into the frame.
    pub corners: [[f64; 2]; 4],
    pub status: FrameStatus,
    /// RMS intensity residual against the reference vector.
    pub residual: f64,
    pub confidence: f64,
    /// Refinement iterations spent on this frame.
    pub iterations: u32,
    /// Fraction of sample points clamped to the frame border.
    pub oob_fraction: f64,
    pub processing_time_ms: f32,
}

/// Online tracker for one video sequence.
///
/// Owns the mutable tracking state; the trained model is shared read-only,
/// so several sequences can track the same template concurrently from one
/// model. Frames are processed strictly sequentially; cancel between frames
/// by simply not calling [`track`](Self::track) again.
pub struct HyperplaneTracker {
    model: Arc<TrackerModel>,
    warp: Warp,
    state: TrackerState,
    monitor: FailureMonitor,
    last_confidence: f64,
}

impl HyperplaneTracker {
    /// Start a session at the identity warp (template-local coordinates).
    pub fn new(model: Arc<TrackerModel>) -> Self {
        Self::with_initial_warp(model, Warp::identity())
    }

    /// Start a session from an externally supplied initial pose.
    pub fn with_initial_warp(model: Arc<TrackerModel>, warp: Warp) -> Self {
        let monitor = FailureMonitor::new(
            model.config().monitor.clone(),
            &model.config().convergence,
        );
        Self {
            model,
            warp,
            state: TrackerState::Tracking,
            monitor,
            last_confidence: 0.0,
        }
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    pub fn warp(&self) -> &Warp {
        &self.warp
    }

    pub fn last_confidence(&self) -> f64 {
        self.last_confidence
    }

    pub fn model(&self) -> &Arc<TrackerModel> {
        &self.model
    }

    /// Restart tracking from `warp`: restores `Tracking` and clears the
    /// consecutive-failure streak.
    pub fn reset(&mut self, warp: Warp) {
        self.warp = warp;
        self.state = TrackerState::Tracking;
        self.monitor.reset();
        self.last_confidence = 0.0;
        tracing::info!("tracker reset");
    }

    /// Restart tracking at a bounding quadrilateral in frame coordinates.
    pub fn reset_to_quad(&mut self, corners: &[[f64; 2]; 4]) -> Result<()> {
        let (width, height) = self.model.template_size();
        let warp = Warp::rect_to_quad(width, height, corners)?;
        self.reset(warp);
        Ok(())
    }

    /// Process one frame and report the refined warp with its confidence
    /// state. While `Lost`, reports immediately without iterating.
    pub fn track(&mut self, frame: &GrayImage) -> TrackResult {
        let start = Instant::now();
        if self.state == TrackerState::Lost {
            return self.result(FrameStatus::Lost, f64::INFINITY, 0.0, 0, 0.0, start);
        }

        let convergence = &self.model.config().convergence;
        let reference = self.model.reference();
        let samples = self.model.samples();

        let (values, mut oob_fraction) = intensity_vector(frame, samples, &self.warp);
        let mut diff = difference(&values, reference);
        let mut residual = rms(&diff);
        let mut update_magnitude = f64::INFINITY;
        let mut iterations = 0u32;
        let mut degenerate = false;

        while iterations < convergence.max_iterations {
            // Every cascade stage proposes an update; greedily keep the one
            // with the lowest residual under the candidate warp.
            let mut best: Option<Candidate> = None;
            for stage in self.model.stages() {
                let p = predict(&stage.matrix, &diff);
                let Ok(candidate_warp) = self.warp.compose(&Warp::from_params(&p)) else {
                    continue;
                };
                let (candidate_values, candidate_oob) =
                    intensity_vector(frame, samples, &candidate_warp);
                let candidate_diff = difference(&candidate_values, reference);
                let score = rms(&candidate_diff);
                if best.as_ref().map_or(true, |b| score < b.residual) {
                    best = Some(Candidate {
                        warp: candidate_warp,
                        params: p,
                        diff: candidate_diff,
                        residual: score,
                        oob_fraction: candidate_oob,
                    });
                }
            }

            // Every stage composed into a singular warp: the frame is
            // unrecoverable.
            let Some(winner) = best else {
                degenerate = true;
                break;
            };

            self.warp = winner.warp;
            update_magnitude = Warp::update_magnitude(&winner.params);
            diff = winner.diff;
            residual = winner.residual;
            oob_fraction = winner.oob_fraction;
            iterations += 1;

            if update_magnitude <= convergence.epsilon {
                break;
            }
        }

        let (status, confidence) = if degenerate {
            (self.monitor.force_lost(), 0.0)
        } else {
            let status = self.monitor.evaluate(residual, update_magnitude, oob_fraction);
            (status, self.monitor.confidence(residual, oob_fraction))
        };

        if status == FrameStatus::Lost {
            self.state = TrackerState::Lost;
            tracing::warn!(residual, iterations, "tracking lost");
        } else {
            tracing::debug!(?status, residual, iterations, "frame tracked");
        }

        self.last_confidence = confidence;
        self.result(status, residual, confidence, iterations, oob_fraction, start)
    }

    fn result(
        &self,
        status: FrameStatus,
        residual: f64,
        confidence: f64,
        iterations: u32,
        oob_fraction: f64,
        start: Instant,
    ) -> TrackResult {
        let (width, height) = self.model.template_size();
        TrackResult {
            params: self.warp.params(),
            corners: self.warp.quad(width, height),
            status,
            residual,
            confidence,
            iterations,
            oob_fraction,
            processing_time_ms: start.elapsed().as_secs_f32() * 1000.0,
        }
    }
}

struct Candidate {
    warp: Warp,
    params: [f64; WARP_DOF],
    diff: Vec<f64>,
    residual: f64,
    oob_fraction: f64,
}

fn predict(matrix: &ndarray::Array2<f64>, diff: &[f64]) -> [f64; WARP_DOF] {
    let d = Array1::from_iter(diff.iter().copied());
    let update = matrix.dot(&d);
    let mut p = [0.0; WARP_DOF];
    for (target, value) in p.iter_mut().zip(update.iter()) {
        *target = *value;
    }
    p
}

fn difference(values: &[f64], reference: &[f64]) -> Vec<f64> {
    values
        .iter()
        .zip(reference.iter())
        .map(|(v, r)| v - r)
        .collect()
}

fn rms(diff: &[f64]) -> f64 {
    if diff.is_empty() {
        return 0.0;
    }
    (diff.iter().map(|v| v * v).sum::<f64>() / diff.len() as f64).sqrt()
}
