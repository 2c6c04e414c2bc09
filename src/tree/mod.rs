//! Procedural tree generation: stochastic L-system grammar + turtle walk.
//!
//! The builder expands the axiom with the grammar, then interprets the
//! resulting symbol string into branch and leaf placement matrices. Both
//! stages draw randomness from an injected generator, so a seed fully
//! determines the tree.

pub mod grammar;
pub mod turtle;

pub use grammar::{AXIOM, DEFAULT_ITERATIONS, Grammar};
pub use turtle::{TreeGeometry, TreeParams, interpret};

use crate::core::rng::Rng;
use crate::core::types::Result;

/// Expands and interprets trees with a fixed grammar.
pub struct TreeBuilder {
    grammar: Grammar,
    iterations: u32,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self {
            grammar: Grammar::default(),
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

impl TreeBuilder {
    pub fn new(grammar: Grammar, iterations: u32) -> Self {
        Self { grammar, iterations }
    }

    /// Generate a tree: grammar expansion followed by the turtle walk.
    pub fn build(&self, params: &TreeParams, rng: &mut Rng) -> Result<TreeGeometry> {
        let symbols = self.grammar.expand(AXIOM, self.iterations, rng)?;
        log::debug!(
            "expanded {} iterations -> {} symbols",
            self.iterations,
            symbols.len()
        );
        interpret(&symbols, params, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_default_tree() {
        let builder = TreeBuilder::default();
        let geo = builder
            .build(&TreeParams::default(), &mut Rng::new(2024))
            .unwrap();
        assert!(!geo.branches.is_empty());
        assert!(!geo.leaves.is_empty());
    }

    #[test]
    fn test_build_is_seed_deterministic() {
        let builder = TreeBuilder::default();
        let a = builder
            .build(&TreeParams::default(), &mut Rng::new(9))
            .unwrap();
        let b = builder
            .build(&TreeParams::default(), &mut Rng::new(9))
            .unwrap();
        assert_eq!(a.branches.len(), b.branches.len());
        assert_eq!(a.leaves.len(), b.leaves.len());
        assert_eq!(a.branches[0], b.branches[0]);
    }
}
