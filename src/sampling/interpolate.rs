//! Sub-pixel intensity extraction.
//!
//! Out-of-bounds policy: sampling coordinates are clamped to the image
//! border before interpolation. The intensity vector therefore always has
//! one entry per sample point, and the learned predictor applies unchanged;
//! the fraction of clamped points is reported so the confidence monitor can
//! down-weight frames where much of the template left the image.

use image::GrayImage;

use crate::sampling::SamplePoints;
use crate::warp::Warp;

/// Bilinear interpolation at `(x, y)`, clamping to the image border.
///
/// Non-finite coordinates (projective horizon) clamp like far out-of-bounds
/// points. Returns intensity in `[0, 255]`.
pub fn bilinear(image: &GrayImage, x: f64, y: f64) -> f64 {
    let max_x = (image.width() - 1) as f64;
    let max_y = (image.height() - 1) as f64;
    let x = if x.is_finite() { x.clamp(0.0, max_x) } else { 0.0 };
    let y = if y.is_finite() { y.clamp(0.0, max_y) } else { 0.0 };

    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;

    let x0 = x0 as u32;
    let y0 = y0 as u32;
    let x1 = (x0 + 1).min(image.width() - 1);
    let y1 = (y0 + 1).min(image.height() - 1);

    let p00 = image.get_pixel(x0, y0)[0] as f64;
    let p10 = image.get_pixel(x1, y0)[0] as f64;
    let p01 = image.get_pixel(x0, y1)[0] as f64;
    let p11 = image.get_pixel(x1, y1)[0] as f64;

    let top = p00 * (1.0 - fx) + p10 * fx;
    let bottom = p01 * (1.0 - fx) + p11 * fx;
    top * (1.0 - fy) + bottom * fy
}

/// Extract the min-max normalized intensity vector at the warped sample
/// points, together with the fraction of points that fell outside the image
/// and were clamped.
pub fn intensity_vector(
    image: &GrayImage,
    points: &SamplePoints,
    warp: &Warp,
) -> (Vec<f64>, f64) {
    let max_x = (image.width() - 1) as f64;
    let max_y = (image.height() - 1) as f64;

    let mut clamped = 0usize;
    let mut values = Vec::with_capacity(points.len());
    for point in points.iter() {
        let [x, y] = warp.apply(*point);
        if !x.is_finite() || !y.is_finite() || x < 0.0 || x > max_x || y < 0.0 || y > max_y {
            clamped += 1;
        }
        values.push(bilinear(image, x, y));
    }

    normalize_minmax(&mut values);
    let oob_fraction = if points.is_empty() {
        0.0
    } else {
        clamped as f64 / points.len() as f64
    };
    (values, oob_fraction)
}

/// Rescale intensities to `[0, 1]`. A constant vector (no dynamic range)
/// collapses to all zeros.
pub(crate) fn normalize_minmax(values: &mut [f64]) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &v in values.iter() {
        min = min.min(v);
        max = max.max(v);
    }
    let range = max - min;
    if range < 1e-12 {
        values.iter_mut().for_each(|v| *v = 0.0);
    } else {
        values.iter_mut().for_each(|v| *v = (*v - min) / range);
    }
}
