//! Post-processing chain description.
//!
//! The chain is the scene pass followed by bloom. This module holds the
//! backend-independent parts: parameters, buffer sizes for each bloom level
//! and the per-level blend weights. The GPU backend consumes them.

use crate::viewport::SurfaceTarget;

/// Number of blur levels in the bloom chain.
pub const BLOOM_MIPS: usize = 5;

/// Base contribution of each bloom level before radius weighting.
const BLOOM_FACTORS: [f32; BLOOM_MIPS] = [1.0, 0.8, 0.6, 0.4, 0.2];

/// Blur kernel radius per level, in texels.
pub const BLOOM_KERNEL_RADII: [u32; BLOOM_MIPS] = [3, 5, 7, 9, 11];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BloomSettings {
    pub strength: f32,
    pub radius: f32,
    /// Luminance below which pixels do not bloom.
    pub threshold: f32,
}

impl Default for BloomSettings {
    fn default() -> Self {
        Self {
            strength: 2.0,
            radius: 0.2,
            threshold: 0.5,
        }
    }
}

impl BloomSettings {
    /// Weight of each level in the final blend. Radius 0 keeps the base
    /// factors; radius 1 inverts them towards the wide levels.
    pub fn level_weights(&self) -> [f32; BLOOM_MIPS] {
        BLOOM_FACTORS.map(|f| f + (1.2 - f - f) * self.radius)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    /// Draws the scene into the HDR target.
    Scene,
    /// Adds blurred bright areas back on top.
    Bloom,
}

/// Ordered pass list plus the render-target size shared by all passes.
#[derive(Debug, Clone, PartialEq)]
pub struct PostChain {
    pub passes: Vec<Pass>,
    pub bloom: BloomSettings,
    /// ACES filmic exposure.
    pub exposure: f32,
    width: u32,
    height: u32,
    pixel_ratio: f32,
}

impl PostChain {
    pub fn new(bloom: BloomSettings, exposure: f32) -> Self {
        Self {
            passes: vec![Pass::Scene, Pass::Bloom],
            bloom,
            exposure,
            width: 1,
            height: 1,
            pixel_ratio: 1.0,
        }
    }

    pub fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    /// Render-target size in physical pixels.
    pub fn buffer_size(&self) -> (u32, u32) {
        (
            ((self.width as f32 * self.pixel_ratio).round() as u32).max(1),
            ((self.height as f32 * self.pixel_ratio).round() as u32).max(1),
        )
    }

    /// Size of each bloom level; each halves the previous, starting from
    /// half the render target.
    pub fn bloom_mip_sizes(&self) -> [(u32, u32); BLOOM_MIPS] {
        let (mut w, mut h) = self.buffer_size();
        let mut sizes = [(1, 1); BLOOM_MIPS];
        for size in &mut sizes {
            w = w.div_ceil(2).max(1);
            h = h.div_ceil(2).max(1);
            *size = (w, h);
        }
        sizes
    }

    pub fn has_bloom(&self) -> bool {
        self.passes.contains(&Pass::Bloom) && self.bloom.strength > 0.0
    }
}

impl SurfaceTarget for PostChain {
    fn set_pixel_ratio(&mut self, pixel_ratio: f32) {
        self.pixel_ratio = pixel_ratio;
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_at_zero_radius_are_base_factors() {
        let s = BloomSettings {
            radius: 0.0,
            ..BloomSettings::default()
        };
        assert_eq!(s.level_weights(), BLOOM_FACTORS);
    }

    #[test]
    fn weights_mirror_at_full_radius() {
        let s = BloomSettings {
            radius: 1.0,
            ..BloomSettings::default()
        };
        let w = s.level_weights();
        assert!((w[0] - 0.2).abs() < 1e-6);
        assert!((w[4] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn default_radius_weights() {
        let w = BloomSettings::default().level_weights();
        // 1.0 + (1.2 - 2.0) * 0.2
        assert!((w[0] - 0.84).abs() < 1e-6);
    }

    #[test]
    fn mip_sizes_halve() {
        let mut chain = PostChain::new(BloomSettings::default(), 1.0);
        chain.set_pixel_ratio(2.0);
        chain.set_size(640, 360);
        assert_eq!(chain.buffer_size(), (1280, 720));
        let sizes = chain.bloom_mip_sizes();
        assert_eq!(sizes[0], (640, 360));
        assert_eq!(sizes[4], (40, 23));
    }

    #[test]
    fn zero_strength_skips_bloom() {
        let mut chain = PostChain::new(BloomSettings::default(), 1.0);
        assert!(chain.has_bloom());
        chain.bloom.strength = 0.0;
        assert!(!chain.has_bloom());
    }
}
