//! Genome manipulation utilities for evolutionary search.
//!
//! Provides random grammar generation, crossover, and mutation. All operators
//! take the random source explicitly so runs are reproducible from a seed,
//! and all of them keep brackets balanced.

use std::collections::BTreeMap;

use rand::prelude::*;
use rand_distr::Geometric;

use crate::schema::{FORWARD, Genotype, PLACEHOLDER, POP, PUSH, TURN_LEFT, TURN_RIGHT};

/// Symbols drawn for plain tokens. `F` is listed twice to favour stems.
const TOKEN_SYMBOLS: [char; 5] = [FORWARD, FORWARD, PLACEHOLDER, TURN_LEFT, TURN_RIGHT];

/// Symbols a replacement edit may write.
const REPLACE_SYMBOLS: [char; 4] = [FORWARD, PLACEHOLDER, TURN_LEFT, TURN_RIGHT];

/// Axioms a random grammar may start from.
const AXIOMS: [&str; 2] = ["X", "FX"];

/// Probability that crossover splices a shared production instead of
/// inheriting it whole.
const SPLICE_PROBABILITY: f64 = 0.5;

/// Success probability of the geometric draw for extra mutation edits.
const EXTRA_EDIT_PROBABILITY: f64 = 0.5;

/// Hard cap on edits per mutation.
const MAX_EDITS: u64 = 8;

/// Produces random seed grammars for population initialization.
#[derive(Debug, Clone)]
pub struct RuleGenerator {
    /// Maximum tokens in a sequence (top-level or inside a branch).
    pub max_tokens: usize,
    /// Maximum bracket nesting.
    pub max_depth: usize,
    /// Probability that a token opens a branch (when depth allows).
    pub branch_probability: f64,
}

impl Default for RuleGenerator {
    fn default() -> Self {
        Self {
            max_tokens: 6,
            max_depth: 2,
            branch_probability: 0.3,
        }
    }
}

impl RuleGenerator {
    /// Generate a random grammar with productions for `F` and `X`.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Genotype {
        let axiom = AXIOMS[rng.gen_range(0..AXIOMS.len())];
        let mut rules = BTreeMap::new();
        rules.insert(FORWARD, self.production(rng));
        rules.insert(PLACEHOLDER, self.production(rng));
        Genotype::new(rules).with_axiom(axiom)
    }

    /// Generate one random, balanced production.
    pub fn production<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        let mut out = String::new();
        self.push_sequence(rng, &mut out, 0);
        out
    }

    /// Generate a single token: a symbol or a bracketed branch.
    pub fn token<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        let mut out = String::new();
        self.push_token(rng, &mut out, 0);
        out
    }

    fn push_sequence<R: Rng + ?Sized>(&self, rng: &mut R, out: &mut String, depth: usize) {
        let count = rng.gen_range(1..=self.max_tokens.max(1));
        for _ in 0..count {
            self.push_token(rng, out, depth);
        }
    }

    fn push_token<R: Rng + ?Sized>(&self, rng: &mut R, out: &mut String, depth: usize) {
        if depth < self.max_depth && rng.gen_bool(self.branch_probability.clamp(0.0, 1.0)) {
            out.push(PUSH);
            self.push_sequence(rng, out, depth + 1);
            out.push(POP);
        } else {
            out.push(TOKEN_SYMBOLS[rng.gen_range(0..TOKEN_SYMBOLS.len())]);
        }
    }
}

impl Genotype {
    /// Combine two parents symbol by symbol.
    ///
    /// The child has a production for every symbol of either parent. Shared
    /// symbols inherit one parent's production whole, or a bracket-safe
    /// one-point splice of both.
    pub fn crossover<R: Rng + ?Sized>(&self, other: &Genotype, rng: &mut R) -> Genotype {
        let mut rules = BTreeMap::new();

        for (&symbol, a) in &self.rules {
            let production = match other.rules.get(&symbol) {
                Some(b) => crossover_production(a, b, rng),
                None => a.clone(),
            };
            rules.insert(symbol, production);
        }
        for (&symbol, b) in &other.rules {
            rules.entry(symbol).or_insert_with(|| b.clone());
        }

        let axiom = if rng.gen_bool(0.5) {
            self.axiom.clone()
        } else {
            other.axiom.clone()
        };

        Genotype { axiom, rules }
    }

    /// Return a copy with one or more productions randomly edited.
    pub fn mutate<R: Rng + ?Sized>(&self, rng: &mut R) -> Genotype {
        let generator = RuleGenerator::default();
        let mut child = self.clone();

        if child.rules.is_empty() {
            child
                .rules
                .insert(PLACEHOLDER, generator.production(rng));
            return child;
        }

        let extra = Geometric::new(EXTRA_EDIT_PROBABILITY).map_or(0, |g| g.sample(rng));
        let edits = 1 + extra.min(MAX_EDITS - 1);

        for _ in 0..edits {
            let idx = rng.gen_range(0..child.rules.len());
            if let Some(production) = child.rules.values_mut().nth(idx) {
                mutate_production(production, &generator, rng);
            }
        }
        child
    }
}

fn crossover_production<R: Rng + ?Sized>(a: &str, b: &str, rng: &mut R) -> String {
    if rng.gen_bool(SPLICE_PROBABILITY) {
        let cuts_a = top_level_cuts(a);
        let cuts_b = top_level_cuts(b);
        let i = cuts_a[rng.gen_range(0..cuts_a.len())];
        let j = cuts_b[rng.gen_range(0..cuts_b.len())];
        let mut child = String::with_capacity(i + b.len() - j);
        child.push_str(&a[..i]);
        child.push_str(&b[j..]);
        child
    } else if rng.gen_bool(0.5) {
        a.to_string()
    } else {
        b.to_string()
    }
}

/// Byte offsets at which a production can be cut without splitting a branch.
///
/// Always contains `0` and `s.len()`.
pub fn top_level_cuts(s: &str) -> Vec<usize> {
    let mut cuts = vec![0];
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            PUSH => depth += 1,
            POP => depth = depth.saturating_sub(1),
            _ => {}
        }
        if depth == 0 {
            cuts.push(i + c.len_utf8());
        }
    }
    if cuts.last() != Some(&s.len()) {
        cuts.push(s.len());
    }
    cuts
}

/// Kinds of single edits applied by mutation.
#[derive(Debug, Clone, Copy)]
enum Edit {
    Insert,
    Delete,
    Replace,
    FlipTurn,
}

const EDITS: [Edit; 4] = [Edit::Insert, Edit::Delete, Edit::Replace, Edit::FlipTurn];

fn mutate_production<R: Rng + ?Sized>(
    production: &mut String,
    generator: &RuleGenerator,
    rng: &mut R,
) {
    let mut symbols: Vec<char> = production.chars().collect();

    let applied = match EDITS[rng.gen_range(0..EDITS.len())] {
        Edit::Insert => false,
        Edit::Delete => delete_symbol(&mut symbols, rng),
        Edit::Replace => replace_symbol(&mut symbols, rng),
        Edit::FlipTurn => flip_turn(&mut symbols, rng),
    };
    // Inserting always changes the production, so it is the fallback.
    if !applied {
        let at = rng.gen_range(0..=symbols.len());
        let token: Vec<char> = generator.token(rng).chars().collect();
        symbols.splice(at..at, token);
    }

    *production = symbols.into_iter().collect();
}

fn delete_symbol<R: Rng + ?Sized>(symbols: &mut Vec<char>, rng: &mut R) -> bool {
    if symbols.is_empty() {
        return false;
    }
    let k = rng.gen_range(0..symbols.len());
    match symbols[k] {
        PUSH => match matching_pop(symbols, k) {
            Some(end) => {
                symbols.drain(k..=end);
            }
            None => {
                symbols.remove(k);
            }
        },
        POP => match matching_push(symbols, k) {
            Some(start) => {
                symbols.drain(start..=k);
            }
            None => {
                symbols.remove(k);
            }
        },
        _ => {
            symbols.remove(k);
        }
    }
    true
}

fn replace_symbol<R: Rng + ?Sized>(symbols: &mut [char], rng: &mut R) -> bool {
    let candidates: Vec<usize> = symbols
        .iter()
        .enumerate()
        .filter(|&(_, &c)| c != PUSH && c != POP)
        .map(|(i, _)| i)
        .collect();
    if candidates.is_empty() {
        return false;
    }
    let k = candidates[rng.gen_range(0..candidates.len())];
    let options: Vec<char> = REPLACE_SYMBOLS
        .iter()
        .copied()
        .filter(|&c| c != symbols[k])
        .collect();
    symbols[k] = options[rng.gen_range(0..options.len())];
    true
}

fn flip_turn<R: Rng + ?Sized>(symbols: &mut [char], rng: &mut R) -> bool {
    let turns: Vec<usize> = symbols
        .iter()
        .enumerate()
        .filter(|&(_, &c)| c == TURN_LEFT || c == TURN_RIGHT)
        .map(|(i, _)| i)
        .collect();
    if turns.is_empty() {
        return false;
    }
    let k = turns[rng.gen_range(0..turns.len())];
    symbols[k] = if symbols[k] == TURN_LEFT {
        TURN_RIGHT
    } else {
        TURN_LEFT
    };
    true
}

fn matching_pop(symbols: &[char], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, &c) in symbols.iter().enumerate().skip(open) {
        match c {
            PUSH => depth += 1,
            POP => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn matching_push(symbols: &[char], close: usize) -> Option<usize> {
    let mut depth = 0usize;
    for i in (0..=close).rev() {
        match symbols[i] {
            POP => depth += 1,
            PUSH => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}
