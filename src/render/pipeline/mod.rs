//! Render pipelines for the deferred scene.

pub mod geometry;
pub mod light_volumes;
pub mod rain;
pub mod window_effect;

pub use geometry::{GeometryPipeline, Instance, InstanceBuffer};
pub use light_volumes::{LightInstance, LightVolumePipeline};
pub use rain::{RainDrawPipeline, RainUpdateParams, RainUpdatePipeline};
pub use window_effect::{WindowEffectParams, WindowEffectPipeline};
