use glam::Vec2;

/// Mouse buttons that drive the orbit controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragButton {
    /// Rotates around the target.
    Primary,
    /// Pans the target.
    Secondary,
}

/// A high-level action produced from window input.
///
/// The app state consumes actions, never raw window events.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Cursor moved to a position in logical pixels.
    PointerMoved { x: f32, y: f32 },
    /// Window resized to a logical size.
    Resized {
        width: u32,
        height: u32,
        device_pixel_ratio: f64,
    },
    /// Drag delta in logical pixels with the primary button held.
    Orbit(Vec2),
    /// Drag delta in logical pixels with the secondary button held.
    Pan(Vec2),
    /// Scroll steps; positive moves the camera closer.
    Zoom(f32),
    TogglePanel,
    Quit,
}

/// Tracks held buttons and the last cursor position to turn raw pointer
/// events into drag actions.
#[derive(Debug, Clone, Default)]
pub struct InputMapper {
    primary: bool,
    secondary: bool,
    last_cursor: Option<Vec2>,
}

impl InputMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the pointer move plus an orbit or pan delta if a button is held.
    pub fn cursor_moved(&mut self, x: f32, y: f32) -> Vec<Action> {
        let pos = Vec2::new(x, y);
        let mut actions = vec![Action::PointerMoved { x, y }];
        if let Some(last) = self.last_cursor {
            let delta = pos - last;
            if delta != Vec2::ZERO {
                if self.primary {
                    actions.push(Action::Orbit(delta));
                } else if self.secondary {
                    actions.push(Action::Pan(delta));
                }
            }
        }
        self.last_cursor = Some(pos);
        actions
    }

    pub fn button(&mut self, button: DragButton, pressed: bool) {
        match button {
            DragButton::Primary => self.primary = pressed,
            DragButton::Secondary => self.secondary = pressed,
        }
    }

    /// The cursor left the window; the next move starts a fresh drag.
    pub fn cursor_left(&mut self) {
        self.last_cursor = None;
    }

    pub fn scroll(&self, steps: f32) -> Option<Action> {
        (steps != 0.0).then_some(Action::Zoom(steps))
    }

    pub fn is_dragging(&self) -> bool {
        self.primary || self.secondary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_move_is_only_pointer() {
        let mut m = InputMapper::new();
        assert_eq!(m.cursor_moved(10.0, 20.0), vec![Action::PointerMoved { x: 10.0, y: 20.0 }]);
        assert_eq!(m.cursor_moved(15.0, 20.0).len(), 1);
    }

    #[test]
    fn primary_drag_orbits() {
        let mut m = InputMapper::new();
        m.cursor_moved(10.0, 10.0);
        m.button(DragButton::Primary, true);
        let actions = m.cursor_moved(14.0, 7.0);
        assert_eq!(actions[1], Action::Orbit(Vec2::new(4.0, -3.0)));
        m.button(DragButton::Primary, false);
        assert!(!m.is_dragging());
        assert_eq!(m.cursor_moved(20.0, 7.0).len(), 1);
    }

    #[test]
    fn secondary_drag_pans() {
        let mut m = InputMapper::new();
        m.cursor_moved(0.0, 0.0);
        m.button(DragButton::Secondary, true);
        assert_eq!(m.cursor_moved(2.0, 2.0)[1], Action::Pan(Vec2::new(2.0, 2.0)));
    }

    #[test]
    fn leaving_resets_drag_origin() {
        let mut m = InputMapper::new();
        m.button(DragButton::Primary, true);
        m.cursor_moved(0.0, 0.0);
        m.cursor_left();
        assert_eq!(m.cursor_moved(100.0, 100.0).len(), 1);
    }

    #[test]
    fn zero_scroll_is_ignored() {
        let m = InputMapper::new();
        assert_eq!(m.scroll(0.0), None);
        assert_eq!(m.scroll(-1.0), Some(Action::Zoom(-1.0)));
    }
}
