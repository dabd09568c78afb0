//! Developer tooling: the debug parameter panel and the scene inspector.
//!
//! # Invariants
//! - Panel values never bind directly to scene fields; every change goes
//!   through a [`ParamObserver`].
//! - Inspection is read-only.

pub mod inspector;
pub mod panel;

pub use inspector::{AssetState, AssetStatus, SceneInspector, SceneSummary};
pub use panel::{DebugPanel, Param, ParamChange, ParamId, ParamObserver, SceneParamTarget, StockParams};
