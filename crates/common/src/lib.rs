//! Shared types used across the starscape crates.

mod types;
mod viewport;

pub use types::{Color, ColorError, NodeId, Transform};
pub use viewport::{MAX_PIXEL_RATIO, Viewport, clamp_pixel_ratio};
