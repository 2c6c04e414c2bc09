//! Ping-pong particle buffers for the rain simulation.
//!
//! Two off-screen targets each hold particle positions and velocities in a
//! pair of `count x 1` float textures. Every frame the update pass reads the
//! "current" target and writes the other, then the roles flip. The draw pass
//! only ever reads the current target, never the one being written.
//!
//! [`RainState`] carries the CPU-side invariants (alternation, reset flag,
//! count clamp, reallocation generation) and is testable without a device.

use wgpu::{Device, Texture, TextureView};

pub const PARTICLE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;

/// Which of the two targets a role currently maps to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slot {
    Even,
    Odd,
}

/// CPU-side ping-pong bookkeeping.
#[derive(Clone, Debug)]
pub struct RainState {
    use_even: bool,
    reset: bool,
    count: u32,
    generation: u64,
}

impl RainState {
    /// New state; the first update always initializes from scratch.
    pub fn new(count: u32) -> Self {
        Self {
            use_even: true,
            reset: true,
            count: count.max(1),
            generation: 0,
        }
    }

    /// The readable target this frame.
    pub fn current(&self) -> Slot {
        if self.use_even { Slot::Even } else { Slot::Odd }
    }

    /// The target the update pass writes this frame.
    pub fn next(&self) -> Slot {
        if self.use_even { Slot::Odd } else { Slot::Even }
    }

    pub fn reset_pending(&self) -> bool {
        self.reset
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Force the next update to initialize rather than integrate.
    pub fn force_reset(&mut self) {
        self.reset = true;
    }

    /// Record a count change. Returns true when a reallocation is required;
    /// the caller must then rebuild both targets. A changed count always
    /// forces a reset — old particle state is never migrated.
    pub fn resize(&mut self, count: u32) -> bool {
        let count = count.max(1);
        if count == self.count {
            return false;
        }
        self.count = count;
        self.generation += 1;
        self.reset = true;
        true
    }

    /// Flip roles after an update. Alternation is unconditional: it happens
    /// every update whether or not this one was a reset.
    pub fn after_update(&mut self) {
        self.use_even = !self.use_even;
        self.reset = false;
    }
}

/// One target: position + velocity attachments.
pub struct ParticleTarget {
    #[allow(dead_code)]
    position: Texture,
    #[allow(dead_code)]
    velocity: Texture,
    position_view: TextureView,
    velocity_view: TextureView,
}

impl ParticleTarget {
    fn new(device: &Device, label: &str, count: u32) -> Self {
        let make = |suffix: &str| {
            device.create_texture(&wgpu::TextureDescriptor {
                label: Some(&format!("{label}_{suffix}")),
                size: wgpu::Extent3d {
                    width: count,
                    height: 1,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: PARTICLE_FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                    | wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            })
        };
        let position = make("positions");
        let velocity = make("velocities");
        let position_view = position.create_view(&wgpu::TextureViewDescriptor::default());
        let velocity_view = velocity.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            position,
            velocity,
            position_view,
            velocity_view,
        }
    }

    pub fn position_view(&self) -> &TextureView {
        &self.position_view
    }

    pub fn velocity_view(&self) -> &TextureView {
        &self.velocity_view
    }
}

/// The ping-pong pair plus its state.
pub struct RainBuffers {
    even: ParticleTarget,
    odd: ParticleTarget,
    state: RainState,
}

impl RainBuffers {
    pub fn new(device: &Device, count: u32) -> Self {
        let state = RainState::new(count);
        Self {
            even: ParticleTarget::new(device, "rain_even", state.count()),
            odd: ParticleTarget::new(device, "rain_odd", state.count()),
            state,
        }
    }

    /// Reallocate both targets if the particle count changed. Returns true
    /// when buffers were rebuilt (bind groups referencing them are stale).
    pub fn resize(&mut self, device: &Device, count: u32) -> bool {
        if !self.state.resize(count) {
            return false;
        }
        self.even = ParticleTarget::new(device, "rain_even", self.state.count());
        self.odd = ParticleTarget::new(device, "rain_odd", self.state.count());
        true
    }

    pub fn state(&self) -> &RainState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut RainState {
        &mut self.state
    }

    pub fn target(&self, slot: Slot) -> &ParticleTarget {
        match slot {
            Slot::Even => &self.even,
            Slot::Odd => &self.odd,
        }
    }

    /// The target the update pass writes this frame.
    pub fn next_target(&self) -> &ParticleTarget {
        self.target(self.state.next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alternation_is_strict() {
        let mut state = RainState::new(100);
        // Current slot is even/odd exactly by update parity, regardless of
        // resets in between.
        for n in 0..16 {
            let expected = if n % 2 == 0 { Slot::Even } else { Slot::Odd };
            assert_eq!(state.current(), expected, "frame {}", n);
            assert_ne!(state.current(), state.next());
            if n == 5 {
                state.force_reset();
            }
            state.after_update();
        }
    }

    #[test]
    fn test_first_update_resets() {
        let mut state = RainState::new(10);
        assert!(state.reset_pending());
        state.after_update();
        assert!(!state.reset_pending());
    }

    #[test]
    fn test_resize_same_count_is_noop() {
        let mut state = RainState::new(64);
        state.after_update();
        let generation = state.generation();
        assert!(!state.resize(64));
        assert_eq!(state.generation(), generation);
        assert!(!state.reset_pending());
    }

    #[test]
    fn test_resize_changes_generation_and_forces_reset() {
        let mut state = RainState::new(64);
        state.after_update();
        assert!(state.resize(128));
        assert_eq!(state.count(), 128);
        assert_eq!(state.generation(), 1);
        assert!(state.reset_pending());
    }

    #[test]
    fn test_count_clamped_to_one() {
        let state = RainState::new(0);
        assert_eq!(state.count(), 1);
        let mut state = RainState::new(10);
        state.resize(0);
        assert_eq!(state.count(), 1);
    }

    #[test]
    fn test_resize_does_not_disturb_alternation() {
        let mut state = RainState::new(4);
        state.after_update();
        assert_eq!(state.current(), Slot::Odd);
        state.resize(8);
        assert_eq!(state.current(), Slot::Odd);
        state.after_update();
        assert_eq!(state.current(), Slot::Even);
    }
}
