//! Pluvia - procedural rain-soaked tree scene
//!
//! A stochastic L-system grows a tree, a turtle walk places its geometry,
//! rain particles live in GPU ping-pong buffers, and a deferred pipeline
//! lights the result with a field of colored point lights.

pub mod core;
pub mod render;
pub mod scene;
pub mod tree;
