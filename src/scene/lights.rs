//! Deferred point-light field.
//!
//! Point lights are regenerated as a set sized to the configured count, each
//! with an integer-step random position inside a bounded cube and either a
//! random or fixed color. Recoloring without repositioning is a separate,
//! cheaper operation used when only the color mode changes.

use glam::{Vec3, Vec4};

use crate::core::rng::Rng;
use crate::scene::config::SceneConfig;

/// Light source kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LightKind {
    Point,
    Directional,
}

/// One light source.
#[derive(Clone, Copy, Debug)]
pub struct Light {
    pub id: u32,
    pub kind: LightKind,
    /// Position (w = 1), unused for directional lights
    pub position: Vec4,
    pub color: Vec4,
    /// Direction (w = 0), unused for point lights
    pub direction: Vec4,
}

impl Light {
    /// The fixed white fill light used by the forward geometry pass.
    pub fn directional_fill() -> Self {
        Self {
            id: 0,
            kind: LightKind::Directional,
            position: Vec4::ZERO,
            color: Vec4::ONE,
            direction: Vec4::new(1.0, -0.8, -1.2, 0.0).normalize(),
        }
    }
}

/// The set of active deferred point lights.
#[derive(Clone, Debug, Default)]
pub struct LightField {
    lights: Vec<Light>,
}

impl LightField {
    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn len(&self) -> usize {
        self.lights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    /// Rebuild the full set: `light_count` point lights at integer-step
    /// positions in the bounded cube, colored per the current mode.
    pub fn regenerate(&mut self, config: &SceneConfig, rng: &mut Rng) {
        self.lights.clear();
        for id in 0..config.light_count {
            self.lights.push(Light {
                id,
                kind: LightKind::Point,
                position: random_position(rng),
                color: pick_color(config, rng),
                direction: Vec4::ZERO,
            });
        }
    }

    /// Reassign colors in place; positions are untouched.
    pub fn recolor(&mut self, config: &SceneConfig, rng: &mut Rng) {
        for light in &mut self.lights {
            light.color = pick_color(config, rng);
        }
    }
}

fn pick_color(config: &SceneConfig, rng: &mut Rng) -> Vec4 {
    if config.random_light_colors {
        random_color(rng).extend(0.0)
    } else {
        config.fixed_light_color()
    }
}

/// Integer-step position in the bounded cube (each axis in [-5, 6]).
fn random_position(rng: &mut Rng) -> Vec4 {
    let x = (rng.next_u32_below(12) + 1) as f32 - 6.0;
    let y = (rng.next_u32_below(12) + 1) as f32 - 6.0;
    let z = (rng.next_u32_below(12) + 1) as f32 - 6.0;
    Vec4::new(x, y, z, 1.0)
}

/// Uniform random RGB, each channel independent in [0, 1].
fn random_color(rng: &mut Rng) -> Vec3 {
    Vec3::new(rng.next_f32(), rng.next_f32(), rng.next_f32())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regenerate_produces_exact_count() {
        let mut field = LightField::default();
        let mut config = SceneConfig::default();
        config.light_count = 13;
        field.regenerate(&config, &mut Rng::new(1));
        assert_eq!(field.len(), 13);
        for (i, light) in field.lights().iter().enumerate() {
            assert_eq!(light.id, i as u32);
            assert_eq!(light.kind, LightKind::Point);
        }
    }

    #[test]
    fn test_positions_inside_cube() {
        let mut field = LightField::default();
        let config = SceneConfig::default();
        field.regenerate(&config, &mut Rng::new(77));
        for light in field.lights() {
            let p = light.position;
            for axis in [p.x, p.y, p.z] {
                assert!((-5.0..=6.0).contains(&axis), "out of cube: {:?}", p);
                assert_eq!(axis.fract(), 0.0, "not integer-step: {:?}", p);
            }
            assert_eq!(p.w, 1.0);
        }
    }

    #[test]
    fn test_recolor_keeps_positions() {
        let mut field = LightField::default();
        let mut config = SceneConfig::default();
        config.random_light_colors = true;
        field.regenerate(&config, &mut Rng::new(4));
        let positions: Vec<Vec4> = field.lights().iter().map(|l| l.position).collect();
        let colors: Vec<Vec4> = field.lights().iter().map(|l| l.color).collect();

        config.random_light_colors = false;
        config.light_color = [255, 0, 0];
        field.recolor(&config, &mut Rng::new(5));

        for (i, light) in field.lights().iter().enumerate() {
            assert_eq!(light.position, positions[i], "position moved on recolor");
            assert_eq!(light.color, Vec4::new(1.0, 0.0, 0.0, 0.0));
        }
        assert_ne!(field.lights()[0].color, colors[0]);
    }

    #[test]
    fn test_random_colors_in_unit_range() {
        let mut field = LightField::default();
        let mut config = SceneConfig::default();
        config.random_light_colors = true;
        config.light_count = 32;
        field.regenerate(&config, &mut Rng::new(8));
        for light in field.lights() {
            for c in [light.color.x, light.color.y, light.color.z] {
                assert!((0.0..=1.0).contains(&c));
            }
        }
    }

    #[test]
    fn test_directional_fill_is_normalized() {
        let fill = Light::directional_fill();
        assert_eq!(fill.kind, LightKind::Directional);
        assert!((fill.direction.length() - 1.0).abs() < 1e-6);
    }
}
