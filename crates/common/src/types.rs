use glam::{EulerRot, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Opaque handle to a node in the scene graph.
///
/// Ids are handed out sequentially by the scene, so iteration in id order is
/// insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Spatial transform: position, Euler rotation (radians, XYZ order), scale.
///
/// Rotation is kept as Euler angles because the animation loop writes a
/// single axis (`rotation.y`) every frame while the other axes keep their
/// authored values (the planet's tilt lives in `rotation.z`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    /// Rotation as a quaternion, applying X then Y then Z about the local axes.
    pub fn quat(&self) -> Quat {
        Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        )
    }

    /// Local-to-world matrix.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.quat(), self.position)
    }
}

/// Errors from colour parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ColorError {
    #[error("colour must look like #rrggbb, got {0:?}")]
    Malformed(String),
}

/// Linear RGB colour with components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl Color {
    pub const WHITE: Self = Self {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Build a colour from a packed `0xRRGGBB` value.
    pub fn from_rgb_u32(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as f32 / 255.0,
            g: ((hex >> 8) & 0xff) as f32 / 255.0,
            b: (hex & 0xff) as f32 / 255.0,
        }
    }

    /// Parse a `#rrggbb` string.
    pub fn from_hex(s: &str) -> Result<Self, ColorError> {
        let digits = s
            .strip_prefix('#')
            .ok_or_else(|| ColorError::Malformed(s.to_string()))?;
        if digits.len() != 6 {
            return Err(ColorError::Malformed(s.to_string()));
        }
        let hex =
            u32::from_str_radix(digits, 16).map_err(|_| ColorError::Malformed(s.to_string()))?;
        Ok(Self::from_rgb_u32(hex))
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    pub fn to_rgba(self, alpha: f32) -> [f32; 4] {
        [self.r, self.g, self.b, alpha]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_default_is_identity() {
        let t = Transform::default();
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.rotation, Vec3::ZERO);
        assert_eq!(t.scale, Vec3::ONE);
        assert_eq!(t.matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn yaw_only_rotation_matches_axis_angle() {
        let t = Transform::default().with_rotation(Vec3::new(0.0, 0.5, 0.0));
        let expected = Quat::from_rotation_y(0.5);
        assert!(t.quat().abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn translation_lands_in_matrix() {
        let t = Transform::from_position(Vec3::new(0.4, -6.0, 0.0));
        let p = t.matrix().transform_point3(Vec3::ZERO);
        assert!(p.abs_diff_eq(Vec3::new(0.4, -6.0, 0.0), 1e-6));
    }

    #[test]
    fn parse_hex_colour() {
        let c = Color::from_hex("#306258").unwrap();
        assert!((c.r - 0x30 as f32 / 255.0).abs() < 1e-6);
        assert!((c.g - 0x62 as f32 / 255.0).abs() < 1e-6);
        assert!((c.b - 0x58 as f32 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn reject_malformed_colour() {
        assert!(Color::from_hex("306258").is_err());
        assert!(Color::from_hex("#3062").is_err());
        assert!(Color::from_hex("#zzzzzz").is_err());
    }

    #[test]
    fn packed_white() {
        assert_eq!(Color::from_rgb_u32(0xffffff), Color::WHITE);
    }
}
