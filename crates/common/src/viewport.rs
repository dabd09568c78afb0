use serde::{Deserialize, Serialize};

/// Upper bound on the rendering pixel ratio. Higher device ratios are clamped
/// to bound fill cost.
pub const MAX_PIXEL_RATIO: f32 = 2.0;

/// Clamp a platform device pixel ratio to `(0, MAX_PIXEL_RATIO]`.
///
/// Non-finite or non-positive ratios fall back to 1.0.
pub fn clamp_pixel_ratio(device_pixel_ratio: f64) -> f32 {
    let dpr = device_pixel_ratio as f32;
    if !dpr.is_finite() || dpr <= 0.0 {
        return 1.0;
    }
    dpr.min(MAX_PIXEL_RATIO)
}

/// Logical size of the display surface plus the pixel ratio used for
/// rendering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            pixel_ratio: 1.0,
        }
    }
}

impl Viewport {
    pub fn new(width: u32, height: u32, device_pixel_ratio: f64) -> Self {
        Self {
            width,
            height,
            pixel_ratio: clamp_pixel_ratio(device_pixel_ratio),
        }
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Drawing-buffer size in physical pixels.
    pub fn buffer_size(&self) -> (u32, u32) {
        (
            ((self.width as f32 * self.pixel_ratio).round() as u32).max(1),
            ((self.height as f32 * self.pixel_ratio).round() as u32).max(1),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_ratio_is_capped() {
        assert_eq!(clamp_pixel_ratio(1.0), 1.0);
        assert_eq!(clamp_pixel_ratio(1.5), 1.5);
        assert_eq!(clamp_pixel_ratio(3.0), 2.0);
        assert_eq!(clamp_pixel_ratio(0.0), 1.0);
        assert_eq!(clamp_pixel_ratio(f64::NAN), 1.0);
    }

    #[test]
    fn aspect_and_buffer_size() {
        let vp = Viewport::new(1920, 1080, 3.0);
        assert!((vp.aspect() - 16.0 / 9.0).abs() < 1e-6);
        assert_eq!(vp.pixel_ratio, 2.0);
        assert_eq!(vp.buffer_size(), (3840, 2160));
    }

    #[test]
    fn empty_viewport() {
        assert!(Viewport::new(0, 600, 1.0).is_empty());
        assert!(!Viewport::default().is_empty());
    }
}
