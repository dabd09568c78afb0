use starscape_common::Color;

/// Omnidirectional light at the node's position.
///
/// With physically based falloff the contribution is
/// `intensity / max(d^decay, 0.01)`, faded to zero at `distance`
/// (0 means no cutoff).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub color: Color,
    pub intensity: f32,
    pub distance: f32,
    pub decay: f32,
}

impl PointLight {
    /// Light reaching a surface `d` units away, before colour.
    pub fn attenuation(&self, d: f32) -> f32 {
        let falloff = d.powf(self.decay).max(0.01).recip();
        if self.distance > 0.0 {
            let ratio = (d / self.distance).powi(4);
            let window = (1.0 - ratio).clamp(0.0, 1.0);
            falloff * window * window
        } else {
            falloff
        }
    }
}

/// Parallel light shining from the node's position towards the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub color: Color,
    pub intensity: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn light() -> PointLight {
        PointLight {
            color: Color::WHITE,
            intensity: 5.0,
            distance: 2.0,
            decay: 1.0,
        }
    }

    #[test]
    fn falloff_is_inverse_distance_for_decay_one() {
        let l = light();
        // (1 - (0.5/2)^4)^2 window
        let window = (1.0f32 - 0.25f32.powi(4)).powi(2);
        assert!((l.attenuation(0.5) - 2.0 * window).abs() < 1e-5);
    }

    #[test]
    fn nothing_past_cutoff() {
        let l = light();
        assert_eq!(l.attenuation(2.0), 0.0);
        assert_eq!(l.attenuation(3.5), 0.0);
    }

    #[test]
    fn zero_distance_means_no_cutoff() {
        let l = PointLight {
            distance: 0.0,
            ..light()
        };
        assert!((l.attenuation(10.0) - 0.1).abs() < 1e-6);
    }
}
