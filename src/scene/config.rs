//! Scene configuration and regeneration scoping.
//!
//! The render loop holds a read snapshot of [`SceneConfig`] per frame; a UI
//! or config layer mutates its own copy between frames and hands the new
//! value to the renderer, which diffs it against the snapshot to decide what
//! to regenerate.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::error::Error;
use crate::core::types::Result;

/// All tunable scene parameters. Read-only to the rendering core.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneConfig {
    // Tree
    pub branch_length: f32,
    pub branch_radius: f32,
    /// Radians per rotation operator
    pub branch_angle: f32,
    pub leaf_size: f32,
    pub leaf_width: f32,

    // Lights
    pub light_count: u32,
    /// Fixed light color, 0-255 per channel (used when `random_light_colors` is off)
    pub light_color: [u8; 3],
    pub random_light_colors: bool,
    pub light_radius: f32,
    pub light_brightness: f32,

    // Rain
    pub rain_enabled: bool,
    pub rain_particle_count: i32,
    pub rain_on_window: bool,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            branch_length: 1.0,
            branch_radius: 0.4,
            branch_angle: 0.5,
            leaf_size: 0.5,
            leaf_width: 0.25,
            light_count: 8,
            light_color: [255, 180, 120],
            random_light_colors: true,
            light_radius: 3.0,
            light_brightness: 1.5,
            rain_enabled: true,
            rain_particle_count: 2000,
            rain_on_window: true,
        }
    }
}

impl SceneConfig {
    /// Particle count actually allocated: clamped to at least 1 so the
    /// ping-pong buffers always have a valid size, and collapsed to 1 while
    /// rain is disabled.
    pub fn adjusted_particle_count(&self) -> u32 {
        if self.rain_enabled {
            self.rain_particle_count.max(1) as u32
        } else {
            1
        }
    }

    /// Tree generation parameters view of this config.
    pub fn tree_params(&self) -> crate::tree::TreeParams {
        crate::tree::TreeParams {
            branch_length: self.branch_length,
            branch_radius: self.branch_radius,
            branch_angle: self.branch_angle,
            leaf_size: self.leaf_size,
        }
    }

    /// Fixed light color mapped to [0, 1] RGB with zero alpha.
    pub fn fixed_light_color(&self) -> glam::Vec4 {
        glam::Vec4::new(
            self.light_color[0] as f32 / 255.0,
            self.light_color[1] as f32 / 255.0,
            self.light_color[2] as f32 / 255.0,
            0.0,
        )
    }

    /// What a change from `self` to `next` requires regenerating.
    pub fn diff(&self, next: &SceneConfig) -> RegenScope {
        RegenScope {
            tree: self.branch_length != next.branch_length
                || self.branch_radius != next.branch_radius
                || self.branch_angle != next.branch_angle
                || self.leaf_size != next.leaf_size
                || self.leaf_width != next.leaf_width,
            light_count: self.light_count != next.light_count,
            light_colors: self.random_light_colors != next.random_light_colors
                || self.light_color != next.light_color,
            rain_buffers: self.adjusted_particle_count() != next.adjusted_particle_count(),
        }
    }

    /// Load a JSON settings snapshot.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|e| Error::Config(e.to_string()))
    }

    /// Save a JSON settings snapshot.
    pub fn save(&self, path: &Path) -> Result<()> {
        let text =
            serde_json::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        std::fs::write(path, text)?;
        Ok(())
    }
}

/// Which structures a settings change invalidates. Applied atomically at the
/// start of the next frame's relevant step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RegenScope {
    /// Re-run grammar + turtle
    pub tree: bool,
    /// Rebuild the light list (positions and colors)
    pub light_count: bool,
    /// Recolor lights in place (positions untouched)
    pub light_colors: bool,
    /// Reallocate particle buffers and force a reset
    pub rain_buffers: bool,
}

impl RegenScope {
    /// Everything: used at startup.
    pub fn all() -> Self {
        Self {
            tree: true,
            light_count: true,
            light_colors: true,
            rain_buffers: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Accumulate another scope into this one.
    pub fn merge(&mut self, other: RegenScope) {
        self.tree |= other.tree;
        self.light_count |= other.light_count;
        self.light_colors |= other.light_colors;
        self.rain_buffers |= other.rain_buffers;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_only_change_scopes_tree() {
        let a = SceneConfig::default();
        let mut b = a.clone();
        b.branch_angle = 0.7;
        let scope = a.diff(&b);
        assert!(scope.tree);
        assert!(!scope.light_count && !scope.light_colors && !scope.rain_buffers);
    }

    #[test]
    fn test_light_color_change_scopes_recolor_only() {
        let a = SceneConfig::default();
        let mut b = a.clone();
        b.random_light_colors = false;
        b.light_color = [255, 0, 0];
        let scope = a.diff(&b);
        assert!(scope.light_colors);
        assert!(!scope.tree && !scope.light_count && !scope.rain_buffers);
    }

    #[test]
    fn test_identical_config_scopes_nothing() {
        let a = SceneConfig::default();
        assert!(a.diff(&a.clone()).is_empty());
    }

    #[test]
    fn test_rain_toggle_changes_buffer_scope() {
        let a = SceneConfig::default();
        let mut b = a.clone();
        b.rain_enabled = false;
        // Disabling rain collapses the adjusted count to 1.
        assert!(a.diff(&b).rain_buffers);
    }

    #[test]
    fn test_particle_count_clamped_to_one() {
        let mut config = SceneConfig::default();
        config.rain_particle_count = -5;
        assert_eq!(config.adjusted_particle_count(), 1);
        config.rain_particle_count = 0;
        assert_eq!(config.adjusted_particle_count(), 1);
    }

    #[test]
    fn test_rain_disabled_uses_single_particle() {
        let mut config = SceneConfig::default();
        config.rain_enabled = false;
        config.rain_particle_count = 5000;
        assert_eq!(config.adjusted_particle_count(), 1);
    }

    #[test]
    fn test_json_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let mut config = SceneConfig::default();
        config.light_count = 3;
        config.rain_particle_count = 777;
        config.save(&path).unwrap();
        let loaded = SceneConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
