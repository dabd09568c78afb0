//! Input handling: raw window events become [`Action`]s, and pointer motion
//! drives the point light through [`PointerLight`].
//!
//! Nothing here depends on the windowing library, so the mapping can be
//! tested without a window.

pub mod action;
pub mod pointer;

pub use action::{Action, DragButton, InputMapper};
pub use pointer::{PointerLight, normalize_pointer};
