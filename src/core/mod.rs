//! Core types and utilities

pub mod camera;
pub mod error;
pub mod logging;
pub mod rng;
pub mod time;
pub mod types;

pub use error::Error;
pub use rng::Rng;
pub use types::*;
