use glam::{Vec2, Vec3};
use starscape_common::Viewport;

/// Map a cursor position in logical pixels to `[-1, 1]` on both axes, with
/// +Y up. Returns `None` for a zero-area viewport.
pub fn normalize_pointer(client_x: f32, client_y: f32, viewport: &Viewport) -> Option<Vec2> {
    if viewport.is_empty() {
        return None;
    }
    let x = client_x / viewport.width as f32 * 2.0 - 1.0;
    let y = -((client_y / viewport.height as f32) * 2.0 - 1.0);
    Some(Vec2::new(x, y))
}

/// Last pointer position, and the light position derived from it.
///
/// Every move overwrites the previous value; there is no smoothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerLight {
    depth: f32,
    pointer: Vec2,
}

impl PointerLight {
    /// `depth` is the fixed Z the light sits at.
    pub fn new(depth: f32) -> Self {
        Self {
            depth,
            pointer: Vec2::ZERO,
        }
    }

    /// Record a pointer move and return the new light position. A zero-area
    /// viewport leaves the previous position in place.
    pub fn on_pointer_move(&mut self, client_x: f32, client_y: f32, viewport: &Viewport) -> Vec3 {
        match normalize_pointer(client_x, client_y, viewport) {
            Some(p) => self.pointer = p,
            None => tracing::trace!(client_x, client_y, "pointer move on empty viewport"),
        }
        self.light_position()
    }

    /// Normalized pointer coordinates.
    pub fn pointer(&self) -> Vec2 {
        self.pointer
    }

    pub fn light_position(&self) -> Vec3 {
        self.pointer.extend(self.depth)
    }
}
