//! Small seedable pseudorandom generator.
//!
//! Generation code takes an explicit `Rng` instance rather than touching any
//! process-global random state, so tests can seed deterministically and
//! two runs with the same seed grow the same tree.

/// Splitmix64-based generator. Cheap, deterministic, good enough for
/// geometry jitter; not for anything cryptographic.
#[derive(Clone, Debug)]
pub struct Rng {
    state: u64,
}

impl Rng {
    /// Create a generator from a seed. Any seed is valid, including 0.
    pub fn new(seed: u64) -> Self {
        Self {
            state: seed.wrapping_add(0x9E37_79B9_7F4A_7C15),
        }
    }

    /// Seed from the wall clock, for the interactive binary.
    pub fn from_entropy() -> Self {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        Self::new(nanos)
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform f32 in [0, 1).
    pub fn next_f32(&mut self) -> f32 {
        // 24 mantissa bits
        (self.next_u64() >> 40) as f32 / (1u32 << 24) as f32
    }

    /// Uniform f32 in [lo, hi).
    pub fn range_f32(&mut self, lo: f32, hi: f32) -> f32 {
        lo + (hi - lo) * self.next_f32()
    }

    /// Uniform sample in [center - spread, center + spread).
    pub fn jitter(&mut self, center: f32, spread: f32) -> f32 {
        self.range_f32(center - spread, center + spread)
    }

    /// Uniform index in [0, len). `len` must be nonzero.
    pub fn index(&mut self, len: usize) -> usize {
        (self.next_u64() % len as u64) as usize
    }

    /// Uniform u32 in [0, bound).
    pub fn next_u32_below(&mut self, bound: u32) -> u32 {
        (self.next_u64() % bound as u64) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = Rng::new(42);
        let mut b = Rng::new(42);
        for _ in 0..100 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn test_next_f32_in_unit_range() {
        let mut rng = Rng::new(7);
        for _ in 0..10_000 {
            let v = rng.next_f32();
            assert!((0.0..1.0).contains(&v), "out of range: {}", v);
        }
    }

    #[test]
    fn test_jitter_bounds() {
        let mut rng = Rng::new(3);
        for _ in 0..1_000 {
            let v = rng.jitter(1.0, 0.15);
            assert!((0.85..1.15).contains(&v));
        }
    }

    #[test]
    fn test_index_bounds() {
        let mut rng = Rng::new(0);
        for _ in 0..1_000 {
            assert!(rng.index(7) < 7);
        }
    }
}
