//! Immutable reference patch definition.

use image::GrayImage;

use crate::error::{Result, TrackError};
use crate::sampling::bilinear;
use crate::warp::Warp;

/// Smallest usable template edge, in pixels.
const MIN_TEMPLATE_EDGE: u32 = 8;

/// The reference patch the tracker aligns against: a fixed-size grayscale
/// image plus its bounding quadrilateral in first-frame coordinates.
///
/// Created once at initialization and never mutated.
#[derive(Debug, Clone)]
pub struct Template {
    patch: GrayImage,
    corners: [[f64; 2]; 4],
}

impl Template {
    /// Build a template directly from a patch image; the bounding quad is
    /// the patch rectangle itself.
    pub fn from_patch(patch: GrayImage) -> Result<Template> {
        validate_patch_size(patch.width(), patch.height())?;
        let w = (patch.width() - 1) as f64;
        let h = (patch.height() - 1) as f64;
        Ok(Template {
            patch,
            corners: [[0.0, 0.0], [w, 0.0], [w, h], [0.0, h]],
        })
    }

    /// Rectify a bounding quadrilateral of `frame` into a `patch_size`
    /// template patch.
    ///
    /// Corners are given clockwise starting at the top-left. Quad pixels are
    /// resampled bilinearly under the rectangle-to-quad homography.
    pub fn from_frame(
        frame: &GrayImage,
        corners: [[f64; 2]; 4],
        patch_size: (u32, u32),
    ) -> Result<Template> {
        let (width, height) = patch_size;
        validate_patch_size(width, height)?;

        let warp = Warp::rect_to_quad(width, height, &corners)
            .map_err(|_| TrackError::InvalidTemplate("degenerate bounding quad".into()))?;

        let patch = GrayImage::from_fn(width, height, |x, y| {
            let [u, v] = warp.apply([x as f64, y as f64]);
            image::Luma([bilinear(frame, u, v).round().clamp(0.0, 255.0) as u8])
        });

        Ok(Template { patch, corners })
    }

    /// The rectified template patch.
    pub fn patch(&self) -> &GrayImage {
        &self.patch
    }

    /// Bounding quadrilateral in first-frame coordinates.
    pub fn corners(&self) -> &[[f64; 2]; 4] {
        &self.corners
    }

    pub fn width(&self) -> u32 {
        self.patch.width()
    }

    pub fn height(&self) -> u32 {
        self.patch.height()
    }

    /// The warp placing this template at its first-frame quad; the natural
    /// initial pose when tracking the sequence the template came from.
    pub fn initial_warp(&self) -> Result<Warp> {
        Warp::rect_to_quad(self.width(), self.height(), &self.corners)
    }
}

fn validate_patch_size(width: u32, height: u32) -> Result<()> {
    if width < MIN_TEMPLATE_EDGE || height < MIN_TEMPLATE_EDGE {
        return Err(TrackError::InvalidTemplate(format!(
            "template patch must be at least {MIN_TEMPLATE_EDGE}x{MIN_TEMPLATE_EDGE}, got {width}x{height}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn from_patch_rejects_tiny_images() {
        let patch = GrayImage::new(4, 4);
        assert!(matches!(
            Template::from_patch(patch),
            Err(TrackError::InvalidTemplate(_))
        ));
    }

    #[test]
    fn from_frame_rectifies_axis_aligned_quad() {
        let frame = GrayImage::from_fn(64, 64, |x, y| Luma([((x + y) * 2) as u8]));
        let corners = [[8.0, 8.0], [23.0, 8.0], [23.0, 23.0], [8.0, 23.0]];
        let template = Template::from_frame(&frame, corners, (16, 16)).unwrap();
        // Axis-aligned unit-scale quad: rectification is a pure translation.
        assert_eq!(template.patch().get_pixel(0, 0)[0], 32);
        assert_eq!(template.patch().get_pixel(15, 15)[0], 92);
    }

    #[test]
    fn initial_warp_places_patch_on_quad() {
        let frame = GrayImage::from_fn(64, 64, |x, y| Luma([(x * 3 + y) as u8]));
        let corners = [[10.0, 12.0], [41.0, 12.0], [41.0, 43.0], [10.0, 43.0]];
        let template = Template::from_frame(&frame, corners, (32, 32)).unwrap();
        let warp = template.initial_warp().unwrap();
        let mapped = warp.apply([0.0, 0.0]);
        assert!((mapped[0] - 10.0).abs() < 1e-9);
        assert!((mapped[1] - 12.0).abs() < 1e-9);
    }
}
