//! Off-screen render target management

pub mod rain_targets;
pub mod scene_targets;

pub use rain_targets::{ParticleTarget, RainBuffers, RainState, Slot};
pub use scene_targets::SceneTargets;
