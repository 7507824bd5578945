//! 8-DoF homography warp model.
//!
//! A warp maps template-local coordinates into frame coordinates. Warps are
//! stored as 3x3 homography matrices normalized so the bottom-right entry is
//! one; the 8 remaining entries, expressed as deviations from the identity,
//! form the parameter vector the trainer regresses against.

use nalgebra::{Matrix3, SMatrix, SVector};

use crate::error::{Result, TrackError};

/// Degrees of freedom of the homography parametrization.
pub const WARP_DOF: usize = 8;

/// Threshold below which a normalizing denominator or determinant is
/// considered vanishing.
const SINGULARITY_EPS: f64 = 1e-12;

/// A normalized planar homography (bottom-right entry fixed to one).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Warp {
    h: Matrix3<f64>,
}

impl Warp {
    /// The identity warp.
    pub fn identity() -> Self {
        Self {
            h: Matrix3::identity(),
        }
    }

    /// Build a warp from its 8-element parameter vector (row-major deviation
    /// from the identity matrix).
    pub fn from_params(p: &[f64; WARP_DOF]) -> Self {
        Self {
            h: Matrix3::new(
                1.0 + p[0],
                p[1],
                p[2],
                p[3],
                1.0 + p[4],
                p[5],
                p[6],
                p[7],
                1.0,
            ),
        }
    }

    /// The 8-element parameter vector of this warp.
    pub fn params(&self) -> [f64; WARP_DOF] {
        [
            self.h[(0, 0)] - 1.0,
            self.h[(0, 1)],
            self.h[(0, 2)],
            self.h[(1, 0)],
            self.h[(1, 1)] - 1.0,
            self.h[(1, 2)],
            self.h[(2, 0)],
            self.h[(2, 1)],
        ]
    }

    /// Wrap a raw homography matrix, renormalizing so `h22 == 1`.
    pub fn from_matrix(h: Matrix3<f64>) -> Result<Self> {
        let scale = h[(2, 2)];
        if scale.abs() < SINGULARITY_EPS {
            return Err(TrackError::DegenerateWarp);
        }
        let normalized = h / scale;
        if normalized.determinant().abs() < SINGULARITY_EPS {
            return Err(TrackError::DegenerateWarp);
        }
        Ok(Self { h: normalized })
    }

    /// The underlying normalized homography matrix.
    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.h
    }

    /// Compose two warps: the result applies `other` first, then `self`.
    pub fn compose(&self, other: &Warp) -> Result<Warp> {
        Warp::from_matrix(self.h * other.h)
    }

    /// The inverse warp.
    pub fn inverse(&self) -> Result<Warp> {
        let inv = self.h.try_inverse().ok_or(TrackError::DegenerateWarp)?;
        Warp::from_matrix(inv)
    }

    /// Map a template-local point into frame coordinates.
    ///
    /// Points on the projective horizon (vanishing denominator) map to
    /// non-finite coordinates; the sampling layer treats those as
    /// out-of-bounds and clamps them.
    pub fn apply(&self, point: [f64; 2]) -> [f64; 2] {
        let [x, y] = point;
        let w = self.h[(2, 0)] * x + self.h[(2, 1)] * y + self.h[(2, 2)];
        [
            (self.h[(0, 0)] * x + self.h[(0, 1)] * y + self.h[(0, 2)]) / w,
            (self.h[(1, 0)] * x + self.h[(1, 1)] * y + self.h[(1, 2)]) / w,
        ]
    }

    /// Magnitude of a parameter update, used for convergence checks.
    pub fn update_magnitude(p: &[f64; WARP_DOF]) -> f64 {
        p.iter().map(|v| v * v).sum::<f64>().sqrt()
    }

    /// Fit the homography mapping the axis-aligned rectangle
    /// `(0,0)..(width-1,height-1)` onto a bounding quadrilateral given in
    /// clockwise corner order starting at the top-left.
    ///
    /// This is the standard four-point direct linear transform; the 8x8
    /// system is solved by LU decomposition and near-singular quads (e.g.
    /// three collinear corners) fail with `DegenerateWarp`.
    pub fn rect_to_quad(width: u32, height: u32, corners: &[[f64; 2]; 4]) -> Result<Warp> {
        let w = (width.max(2) - 1) as f64;
        let h = (height.max(2) - 1) as f64;
        let src = [[0.0, 0.0], [w, 0.0], [w, h], [0.0, h]];

        let mut a = SMatrix::<f64, 8, 8>::zeros();
        let mut b = SVector::<f64, 8>::zeros();
        for i in 0..4 {
            let [x, y] = src[i];
            let [u, v] = corners[i];
            if !u.is_finite() || !v.is_finite() {
                return Err(TrackError::DegenerateWarp);
            }
            let rows = [
                [x, y, 1.0, 0.0, 0.0, 0.0, -x * u, -y * u],
                [0.0, 0.0, 0.0, x, y, 1.0, -x * v, -y * v],
            ];
            for (k, row) in rows.iter().enumerate() {
                for (j, value) in row.iter().enumerate() {
                    a[(i * 2 + k, j)] = *value;
                }
            }
            b[i * 2] = u;
            b[i * 2 + 1] = v;
        }

        let solution = a.lu().solve(&b).ok_or(TrackError::DegenerateWarp)?;
        Warp::from_matrix(Matrix3::new(
            solution[0],
            solution[1],
            solution[2],
            solution[3],
            solution[4],
            solution[5],
            solution[6],
            solution[7],
            1.0,
        ))
    }

    /// Map the template rectangle corners into frame coordinates.
    pub fn quad(&self, width: u32, height: u32) -> [[f64; 2]; 4] {
        let w = (width.max(2) - 1) as f64;
        let h = (height.max(2) - 1) as f64;
        [
            self.apply([0.0, 0.0]),
            self.apply([w, 0.0]),
            self.apply([w, h]),
            self.apply([0.0, h]),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn params_round_trip() {
        let p = [0.02, -0.01, 1.5, 0.005, -0.03, -2.25, 1e-4, -2e-4];
        let warp = Warp::from_params(&p);
        let q = warp.params();
        for i in 0..WARP_DOF {
            assert_abs_diff_eq!(p[i], q[i], epsilon = 1e-15);
        }
    }

    #[test]
    fn compose_with_inverse_is_identity() {
        let p = [0.05, 0.01, 3.0, -0.02, 0.04, -1.0, 2e-4, -1e-4];
        let warp = Warp::from_params(&p);
        let round_trip = warp.compose(&warp.inverse().unwrap()).unwrap();
        for v in round_trip.params() {
            assert_abs_diff_eq!(v, 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn compose_applies_right_operand_first() {
        let translate = Warp::from_params(&[0.0, 0.0, 5.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let scale = Warp::from_params(&[1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0]);
        // scale o translate: translation happens before scaling
        let composed = scale.compose(&translate).unwrap();
        let mapped = composed.apply([1.0, 1.0]);
        assert_abs_diff_eq!(mapped[0], 12.0, epsilon = 1e-12);
        assert_abs_diff_eq!(mapped[1], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn from_matrix_rejects_vanishing_scale() {
        let mut h = Matrix3::<f64>::identity();
        h[(2, 2)] = 0.0;
        assert!(matches!(
            Warp::from_matrix(h),
            Err(TrackError::DegenerateWarp)
        ));
    }

    #[test]
    fn rect_to_quad_maps_corners_exactly() {
        let corners = [[10.0, 20.0], [80.0, 18.0], [85.0, 90.0], [8.0, 88.0]];
        let warp = Warp::rect_to_quad(64, 64, &corners).unwrap();
        let quad = warp.quad(64, 64);
        for i in 0..4 {
            assert_abs_diff_eq!(quad[i][0], corners[i][0], epsilon = 1e-8);
            assert_abs_diff_eq!(quad[i][1], corners[i][1], epsilon = 1e-8);
        }
    }

    #[test]
    fn rect_to_quad_rejects_collapsed_quad() {
        let corners = [[5.0, 5.0], [5.0, 5.0], [5.0, 5.0], [5.0, 5.0]];
        assert!(matches!(
            Warp::rect_to_quad(64, 64, &corners),
            Err(TrackError::DegenerateWarp)
        ));
    }
}
