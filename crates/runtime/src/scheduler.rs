use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use starscape_common::NodeId;
use starscape_render::{OrbitControls, PerspectiveCamera, Renderer};
use starscape_scene::Scene;

use crate::clock::TimeSource;
use crate::timer::FrameTimer;

/// Shared stop flag. Cloning yields another handle to the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Constant rotation about Y: `rotation.y = elapsed * rate`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spin {
    pub node: NodeId,
    /// Radians per second.
    pub rate: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome<T> {
    /// A frame was rendered; schedule the next tick.
    Continue(T),
    /// The token was cancelled; do not reschedule.
    Stopped,
}

/// Drives one frame per display refresh until cancelled.
#[derive(Debug)]
pub struct FrameScheduler<C> {
    clock: C,
    token: CancellationToken,
    spins: Vec<Spin>,
    timer: FrameTimer,
    last_elapsed: Option<Duration>,
}

impl<C: TimeSource> FrameScheduler<C> {
    pub fn new(clock: C, token: CancellationToken) -> Self {
        Self {
            clock,
            token,
            spins: Vec::new(),
            timer: FrameTimer::default(),
            last_elapsed: None,
        }
    }

    pub fn add_spin(&mut self, node: NodeId, rate: f32) {
        self.spins.push(Spin { node, rate });
    }

    pub fn spins(&self) -> &[Spin] {
        &self.spins
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn timer(&self) -> &FrameTimer {
        &self.timer
    }

    pub fn elapsed_secs(&self) -> f32 {
        self.clock.elapsed_secs()
    }

    /// Advance one frame: spin animated nodes, update the controls, render.
    pub fn tick<R: Renderer>(
        &mut self,
        scene: &mut Scene,
        camera: &mut PerspectiveCamera,
        controls: &mut OrbitControls,
        renderer: &mut R,
    ) -> TickOutcome<R::Output> {
        if self.token.is_cancelled() {
            return TickOutcome::Stopped;
        }
        let _span = tracing::trace_span!("frame_tick").entered();

        let elapsed = self.clock.elapsed();
        let t = elapsed.as_secs_f32();
        for spin in &self.spins {
            match scene.get_mut(spin.node) {
                Some(node) => node.transform.rotation.y = t * spin.rate,
                None => tracing::trace!(node = %spin.node, "spin target missing"),
            }
        }

        controls.update(camera);
        let output = renderer.render(scene, camera);

        if let Some(last) = self.last_elapsed {
            self.timer.record(elapsed.saturating_sub(last));
        }
        self.last_elapsed = Some(elapsed);

        TickOutcome::Continue(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use starscape_render::DebugTextRenderer;
    use starscape_scene::{NodeKind, SceneNode};

    fn setup() -> (Scene, NodeId, PerspectiveCamera, OrbitControls) {
        let mut scene = Scene::new();
        let node = scene.add(SceneNode::new("spinner", NodeKind::Group));
        (
            scene,
            node,
            PerspectiveCamera::default().with_position(glam::Vec3::new(0.0, 0.0, 4.0)),
            OrbitControls::new(true),
        )
    }

    #[test]
    fn spin_follows_elapsed_time() {
        let (mut scene, node, mut cam, mut controls) = setup();
        let clock = ManualClock::new();
        let mut sched = FrameScheduler::new(clock.clone(), CancellationToken::new());
        sched.add_spin(node, 0.05);

        clock.set(Duration::from_secs(4));
        let out = sched.tick(&mut scene, &mut cam, &mut controls, &mut DebugTextRenderer::new());
        assert!(matches!(out, TickOutcome::Continue(_)));
        assert!((scene.get(node).unwrap().transform.rotation.y - 0.2).abs() < 1e-6);
    }

    #[test]
    fn cancelled_tick_touches_nothing() {
        let (mut scene, node, mut cam, mut controls) = setup();
        let clock = ManualClock::new();
        let token = CancellationToken::new();
        let mut sched = FrameScheduler::new(clock.clone(), token.clone());
        sched.add_spin(node, 1.0);
        let mut renderer = DebugTextRenderer::new();

        clock.set(Duration::from_secs(2));
        token.cancel();
        let out = sched.tick(&mut scene, &mut cam, &mut controls, &mut renderer);
        assert_eq!(out, TickOutcome::Stopped);
        assert_eq!(scene.get(node).unwrap().transform.rotation.y, 0.0);
        assert_eq!(renderer.frames(), 0);
        assert!(sched.timer().is_empty());
    }

    #[test]
    fn frame_times_are_recorded_between_ticks() {
        let (mut scene, _, mut cam, mut controls) = setup();
        let clock = ManualClock::new();
        let mut sched = FrameScheduler::new(clock.clone(), CancellationToken::new());
        let mut renderer = DebugTextRenderer::new();
        for _ in 0..3 {
            sched.tick(&mut scene, &mut cam, &mut controls, &mut renderer);
            clock.advance(Duration::from_millis(16));
        }
        assert_eq!(sched.timer().len(), 2);
        assert_eq!(sched.timer().average(), Duration::from_millis(16));
    }

    #[test]
    fn missing_spin_target_is_skipped() {
        let (mut scene, _, mut cam, mut controls) = setup();
        let mut sched = FrameScheduler::new(ManualClock::new(), CancellationToken::new());
        sched.add_spin(NodeId(99), 1.0);
        let out = sched.tick(&mut scene, &mut cam, &mut controls, &mut DebugTextRenderer::new());
        assert!(matches!(out, TickOutcome::Continue(_)));
    }
}
