//! Scene-level state: configuration and lights

pub mod config;
pub mod lights;

pub use config::{RegenScope, SceneConfig};
pub use lights::{Light, LightField, LightKind};
