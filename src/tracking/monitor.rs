//! Confidence and failure monitoring with hysteresis.

use serde::{Deserialize, Serialize};

use crate::config::{ConvergenceConfig, MonitorConfig};

/// Per-frame verdict of the confidence monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameStatus {
    /// Converged with a residual below the acceptance threshold.
    Accepted,
    /// Bad frame, but within the hysteresis window.
    Degraded,
    /// Tracking is lost; only a reset resumes it.
    Lost,
}

/// Decides frame acceptance from residual error, update magnitude, and the
/// clamped-sample fraction.
///
/// A single bad frame only degrades; `Lost` is declared after a configured
/// number of consecutive non-accepted frames, which suppresses flicker from
/// transient noise while still bounding drift.
#[derive(Debug, Clone)]
pub struct FailureMonitor {
    monitor: MonitorConfig,
    convergence_epsilon: f64,
    consecutive_failures: u32,
}

impl FailureMonitor {
    pub fn new(monitor: MonitorConfig, convergence: &ConvergenceConfig) -> Self {
        Self {
            monitor,
            convergence_epsilon: convergence.epsilon,
            consecutive_failures: 0,
        }
    }

    /// Classify one frame outcome and update the failure streak.
    pub fn evaluate(&mut self, residual: f64, update_magnitude: f64, oob_fraction: f64) -> FrameStatus {
        let converged = update_magnitude <= self.convergence_epsilon;
        let accepted = converged
            && residual <= self.monitor.accept_residual
            && oob_fraction <= self.monitor.max_oob_fraction;

        if accepted {
            self.consecutive_failures = 0;
            return FrameStatus::Accepted;
        }

        self.consecutive_failures += 1;
        if self.consecutive_failures >= self.monitor.consecutive_failure_limit {
            FrameStatus::Lost
        } else {
            FrameStatus::Degraded
        }
    }

    /// Immediate loss, bypassing hysteresis (degenerate warp).
    pub fn force_lost(&mut self) -> FrameStatus {
        self.consecutive_failures = self.monitor.consecutive_failure_limit.max(1);
        FrameStatus::Lost
    }

    /// Confidence in `[0, 1]`: residual headroom below the failure
    /// threshold, down-weighted by the clamped-sample fraction.
    pub fn confidence(&self, residual: f64, oob_fraction: f64) -> f64 {
        let headroom = 1.0 - residual / self.monitor.fail_residual;
        headroom.clamp(0.0, 1.0) * (1.0 - oob_fraction).clamp(0.0, 1.0)
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn reset(&mut self) {
        self.consecutive_failures = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor(limit: u32) -> FailureMonitor {
        let config = MonitorConfig {
            accept_residual: 0.1,
            fail_residual: 0.3,
            consecutive_failure_limit: limit,
            max_oob_fraction: 0.5,
        };
        FailureMonitor::new(config, &ConvergenceConfig::default())
    }

    #[test]
    fn single_bad_frame_only_degrades() {
        let mut m = monitor(3);
        assert_eq!(m.evaluate(0.5, 0.0, 0.0), FrameStatus::Degraded);
        assert_eq!(m.consecutive_failures(), 1);
    }

    #[test]
    fn acceptance_clears_the_failure_streak() {
        let mut m = monitor(3);
        assert_eq!(m.evaluate(0.5, 0.0, 0.0), FrameStatus::Degraded);
        assert_eq!(m.evaluate(0.05, 0.0, 0.0), FrameStatus::Accepted);
        assert_eq!(m.consecutive_failures(), 0);
    }

    #[test]
    fn consecutive_failures_reach_lost() {
        let mut m = monitor(3);
        assert_eq!(m.evaluate(0.5, 0.0, 0.0), FrameStatus::Degraded);
        assert_eq!(m.evaluate(0.5, 0.0, 0.0), FrameStatus::Degraded);
        assert_eq!(m.evaluate(0.5, 0.0, 0.0), FrameStatus::Lost);
    }

    #[test]
    fn unconverged_update_is_a_failure_even_with_low_residual() {
        let mut m = monitor(1);
        assert_eq!(m.evaluate(0.01, 10.0, 0.0), FrameStatus::Lost);
    }

    #[test]
    fn excessive_oob_fraction_is_a_failure() {
        let mut m = monitor(2);
        assert_eq!(m.evaluate(0.01, 0.0, 0.9), FrameStatus::Degraded);
    }

    #[test]
    fn confidence_is_down_weighted_by_oob() {
        let m = monitor(3);
        assert!(m.confidence(0.0, 0.0) > 0.99);
        assert!(m.confidence(0.3, 0.0) < 1e-9);
        let half = m.confidence(0.0, 0.5);
        assert!((half - 0.5).abs() < 1e-9);
    }
}
