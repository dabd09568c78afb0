//! Frame loop: elapsed-time clock, the per-frame scheduler and frame timing.
//!
//! # Invariants
//! - The clock starts once and is never reset; every animated rotation is a
//!   pure function of its elapsed time.
//! - A cancelled scheduler touches nothing.

mod clock;
mod scheduler;
mod timer;

pub use clock::{Clock, ManualClock, TimeSource};
pub use scheduler::{CancellationToken, FrameScheduler, Spin, TickOutcome};
pub use timer::FrameTimer;
