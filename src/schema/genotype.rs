//! Genotype representation: an L-system grammar.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Draw a segment and move forward.
pub const FORWARD: char = 'F';
/// Placeholder symbol, rewritten but never drawn.
pub const PLACEHOLDER: char = 'X';
pub const TURN_LEFT: char = '+';
pub const TURN_RIGHT: char = '-';
pub const PUSH: char = '[';
pub const POP: char = ']';

/// Default starting string.
pub const DEFAULT_AXIOM: &str = "X";

/// An evolvable grammar: axiom plus one production per symbol.
///
/// Genotypes are value-like. Every operator returns a new instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genotype {
    /// Starting string before any rewriting.
    pub axiom: String,
    /// Production for each rewritten symbol.
    pub rules: BTreeMap<char, String>,
}

impl Genotype {
    /// Create a genotype with the default axiom.
    pub fn new(rules: BTreeMap<char, String>) -> Self {
        Self {
            axiom: DEFAULT_AXIOM.to_string(),
            rules,
        }
    }

    /// Create a genotype from `(symbol, production)` pairs.
    pub fn from_rules<'a>(rules: impl IntoIterator<Item = (char, &'a str)>) -> Self {
        Self::new(
            rules
                .into_iter()
                .map(|(symbol, production)| (symbol, production.to_string()))
                .collect(),
        )
    }

    /// Replace the axiom.
    pub fn with_axiom(mut self, axiom: impl Into<String>) -> Self {
        self.axiom = axiom.into();
        self
    }

    /// Symbols that have a production.
    pub fn symbols(&self) -> BTreeSet<char> {
        self.rules.keys().copied().collect()
    }

    /// Production for a symbol, if any.
    pub fn production(&self, symbol: char) -> Option<&str> {
        self.rules.get(&symbol).map(String::as_str)
    }

    /// True when the axiom and every production have balanced brackets.
    pub fn is_well_formed(&self) -> bool {
        is_balanced(&self.axiom) && self.rules.values().all(|p| is_balanced(p))
    }
}

impl fmt::Display for Genotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "axiom: {}", self.axiom)?;
        for (symbol, production) in &self.rules {
            write!(f, ", {} -> {}", symbol, production)?;
        }
        Ok(())
    }
}

/// Check that `[`/`]` are properly nested.
pub fn is_balanced(s: &str) -> bool {
    let mut depth = 0usize;
    for c in s.chars() {
        match c {
            PUSH => depth += 1,
            POP => {
                if depth == 0 {
                    return false;
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    depth == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balanced() {
        assert!(is_balanced("F[+F][-F[+X]]F"));
        assert!(is_balanced(""));
        assert!(!is_balanced("F[+F"));
        assert!(!is_balanced("F]+F["));
    }

    #[test]
    fn test_symbols() {
        let g = Genotype::from_rules([('F', "FF"), ('X', "F[+X]F[-X]+X")]);
        assert_eq!(g.symbols().into_iter().collect::<Vec<_>>(), vec!['F', 'X']);
        assert_eq!(g.production('X'), Some("F[+X]F[-X]+X"));
        assert!(g.is_well_formed());
    }

    #[test]
    fn test_display() {
        let g = Genotype::from_rules([('F', "FF"), ('X', "F-X")]).with_axiom("FX");
        assert_eq!(g.to_string(), "axiom: FX, F -> FF, X -> F-X");
    }
}
