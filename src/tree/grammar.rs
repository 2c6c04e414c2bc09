//! Stochastic L-system grammar expansion.
//!
//! Rewrites a symbol string with weighted production rules for a fixed
//! iteration count. Each iteration is a single left-to-right pass: when a
//! symbol has a rule, one production is spliced in place of that symbol and
//! the scan index jumps past the inserted text. Freshly inserted symbols are
//! therefore never re-expanded within the same pass. This is deliberate (it
//! is not a fixpoint rewrite) and the tree shapes depend on it.

use std::collections::HashMap;

use crate::core::error::Error;
use crate::core::rng::Rng;
use crate::core::types::Result;

/// Seed string: three independently bracketed trunks.
pub const AXIOM: &str = "[X][X][X]";

/// Default expansion depth.
pub const DEFAULT_ITERATIONS: u32 = 4;

/// Mapping from a symbol to its ordered set of productions.
///
/// Constructed once at startup, immutable afterwards. Productions are
/// sampled uniformly.
#[derive(Clone, Debug)]
pub struct Grammar {
    rules: HashMap<char, Vec<String>>,
}

impl Default for Grammar {
    /// The bushy-tree rule set: `F` elongates with occasional kinks, `X`
    /// spawns bracketed side branches in varying arrangements.
    fn default() -> Self {
        let mut rules = HashMap::new();
        rules.insert(
            'F',
            vec![
                "F", "F&F^", "F+F-", "F-F+", "F^F&", "F/F\\", "F\\F/",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        );
        rules.insert(
            'X',
            vec![
                "F[-&X]+F[-/X]+F[^\\X]+[+\\X]+X",
                "F[+^X]-F[+\\X]-[&/X]-F[^\\X]&X",
                "F[/&X]\\[/^X]\\F[&+X]\\F[^X]\\X",
                "F[\\-X]/F[+X]/F[&-X]/[^\\X]+X",
                "F[/+X]&F[^-X]&F[^/X]&F[+\\X]^X",
                "F[&-X]^F[\\X]^F[++X]^F[/-X]&X",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        );
        Self { rules }
    }
}

impl Grammar {
    /// Build a grammar from explicit rules.
    pub fn new(rules: HashMap<char, Vec<String>>) -> Self {
        Self { rules }
    }

    /// Productions for a symbol, if any.
    pub fn productions(&self, symbol: char) -> Option<&[String]> {
        self.rules.get(&symbol).map(|v| v.as_slice())
    }

    /// Expand `seed` for `iterations` passes.
    ///
    /// All grammar symbols are ASCII, so the rewrite works on byte indices.
    /// A symbol with an empty production list is a configuration error and
    /// fails fast with [`Error::MalformedGrammar`].
    pub fn expand(&self, seed: &str, iterations: u32, rng: &mut Rng) -> Result<String> {
        let mut symbols = seed.to_string();
        for _ in 0..iterations {
            symbols = self.expand_once(&symbols, rng)?;
        }
        Ok(symbols)
    }

    /// One left-to-right rewrite pass.
    fn expand_once(&self, symbols: &str, rng: &mut Rng) -> Result<String> {
        let mut out = symbols.to_string();
        let mut i = 0;
        while i < out.len() {
            let symbol = out.as_bytes()[i] as char;
            match self.rules.get(&symbol) {
                Some(productions) if productions.is_empty() => {
                    return Err(Error::MalformedGrammar(symbol));
                }
                Some(productions) => {
                    let pick = &productions[rng.index(productions.len())];
                    out.replace_range(i..i + 1, pick);
                    // Skip the spliced production; handles empty and
                    // multi-symbol replacements alike.
                    i += pick.len();
                }
                None => i += 1,
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_iterations_is_identity() {
        let grammar = Grammar::default();
        let mut rng = Rng::new(1);
        let out = grammar.expand(AXIOM, 0, &mut rng).unwrap();
        assert_eq!(out, AXIOM);
    }

    #[test]
    fn test_length_monotone_in_iterations() {
        let grammar = Grammar::default();
        let mut prev = AXIOM.len();
        for iters in 1..=5 {
            let mut rng = Rng::new(99);
            let out = grammar.expand(AXIOM, iters, &mut rng).unwrap();
            assert!(
                out.len() >= prev,
                "length shrank at iteration {}: {} < {}",
                iters,
                out.len(),
                prev
            );
            prev = out.len();
        }
    }

    #[test]
    fn test_deterministic_for_seed() {
        let grammar = Grammar::default();
        let a = grammar.expand(AXIOM, 4, &mut Rng::new(5)).unwrap();
        let b = grammar.expand(AXIOM, 4, &mut Rng::new(5)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_expansion_is_bracket_balanced() {
        // Every default production is internally balanced, so any expansion
        // of a balanced seed must stay balanced or the turtle would fail.
        let grammar = Grammar::default();
        let out = grammar.expand(AXIOM, 4, &mut Rng::new(123)).unwrap();
        let mut depth: i32 = 0;
        for c in out.chars() {
            match c {
                '[' => depth += 1,
                ']' => {
                    depth -= 1;
                    assert!(depth >= 0, "pop before push in {}", out);
                }
                _ => {}
            }
        }
        assert_eq!(depth, 0, "unbalanced expansion: {}", out);
    }

    #[test]
    fn test_empty_productions_fail_fast() {
        let mut rules = HashMap::new();
        rules.insert('F', Vec::new());
        let grammar = Grammar::new(rules);
        let err = grammar.expand("F", 1, &mut Rng::new(0)).unwrap_err();
        assert!(matches!(err, Error::MalformedGrammar('F')));
    }

    #[test]
    fn test_single_production_rule_replaces_every_symbol() {
        // F -> FF doubles the F count each pass.
        let mut rules = HashMap::new();
        rules.insert('F', vec!["FF".to_string()]);
        let grammar = Grammar::new(rules);
        let out = grammar.expand("F", 3, &mut Rng::new(0)).unwrap();
        assert_eq!(out, "FFFFFFFF");
    }

    #[test]
    fn test_replacement_skips_inserted_text() {
        // F -> GF would loop forever if the scan re-visited the inserted F.
        // One pass must produce exactly one G per original F.
        let mut rules = HashMap::new();
        rules.insert('F', vec!["GF".to_string()]);
        let grammar = Grammar::new(rules);
        let out = grammar.expand("FF", 1, &mut Rng::new(0)).unwrap();
        assert_eq!(out, "GFGF");
    }

    #[test]
    fn test_empty_replacement_adjusts_index() {
        let mut rules = HashMap::new();
        rules.insert('D', vec!["".to_string()]);
        let grammar = Grammar::new(rules);
        let out = grammar.expand("FDFDF", 1, &mut Rng::new(0)).unwrap();
        assert_eq!(out, "FFF");
    }
}
