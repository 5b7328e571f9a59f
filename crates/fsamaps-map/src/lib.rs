//! Map-side logic: keeping the visible business set in step with the
//! viewport, and projecting it into markers.

pub mod markers;
pub mod orchestrator;
pub mod source;

pub use markers::{Marker, MarkerIcon, MarkerLayer, PopupContent};
pub use orchestrator::{
    FlyToTarget, LoadState, OrchestratorSettings, ViewportOrchestrator, ViewportSnapshot,
};
pub use source::BusinessSource;
