use starscape_common::Viewport;

use crate::camera::PerspectiveCamera;

/// Anything with a drawing buffer that follows the window size.
pub trait SurfaceTarget {
    fn set_pixel_ratio(&mut self, pixel_ratio: f32);

    /// Logical size; the buffer is `size * pixel_ratio`.
    fn set_size(&mut self, width: u32, height: u32);
}

/// Owns the current [`Viewport`] and pushes every change to the camera and
/// all surface targets in one call.
#[derive(Debug, Clone, Default)]
pub struct ViewportSynchronizer {
    viewport: Viewport,
}

impl ViewportSynchronizer {
    pub fn new(viewport: Viewport) -> Self {
        Self { viewport }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Apply the current viewport to the camera and targets without a size
    /// change, e.g. right after they are created.
    pub fn sync(&self, camera: &mut PerspectiveCamera, targets: &mut [&mut dyn SurfaceTarget]) {
        let vp = self.viewport;
        camera.aspect = vp.aspect();
        camera.update_projection_matrix();
        for target in targets.iter_mut() {
            target.set_pixel_ratio(vp.pixel_ratio);
            target.set_size(vp.width, vp.height);
        }
    }

    /// Handle a window resize. Returns false and changes nothing for a
    /// zero-area size (minimized window).
    pub fn on_resize(
        &mut self,
        width: u32,
        height: u32,
        device_pixel_ratio: f64,
        camera: &mut PerspectiveCamera,
        targets: &mut [&mut dyn SurfaceTarget],
    ) -> bool {
        let next = Viewport::new(width, height, device_pixel_ratio);
        if next.is_empty() {
            tracing::debug!(width, height, "ignoring zero-area resize");
            return false;
        }
        self.viewport = next;
        tracing::debug!(
            width,
            height,
            pixel_ratio = next.pixel_ratio,
            "viewport resized"
        );
        self.sync(camera, targets);
        true
    }
}
