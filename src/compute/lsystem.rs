//! Parallel rewriting of L-system grammars.
//!
//! Every round replaces each symbol by its production simultaneously; symbols
//! without a production are copied unchanged. Growth is bounded by the
//! environment: the round limit, the program length limit, and the plant's
//! drawn extent (`max_height` / `max_width`).

use crate::schema::{Environment, Genotype};

use super::turtle::measure;

/// Outcome of expanding a genotype.
#[derive(Debug, Clone, PartialEq)]
pub struct Expansion {
    /// Expanded program.
    pub code: String,
    /// Rewriting rounds that were kept.
    pub iterations: usize,
}

/// Apply one rewriting round.
pub fn rewrite(code: &str, genotype: &Genotype) -> String {
    let mut out = String::with_capacity(rewritten_len(code, genotype));
    for symbol in code.chars() {
        match genotype.rules.get(&symbol) {
            Some(production) => out.push_str(production),
            None => out.push(symbol),
        }
    }
    out
}

/// Length (in bytes) of `rewrite(code, genotype)` without building it.
pub fn rewritten_len(code: &str, genotype: &Genotype) -> usize {
    code.chars()
        .map(|symbol| {
            genotype
                .rules
                .get(&symbol)
                .map_or(symbol.len_utf8(), String::len)
        })
        .sum()
}

/// Rewrite the axiom until a growth bound is reached.
///
/// A round whose result would exceed `max_code_len`, or whose drawing would
/// exceed `max_height` / `max_width`, is discarded and expansion stops.
pub fn expand(genotype: &Genotype, env: &Environment) -> Expansion {
    let mut code = genotype.axiom.clone();
    let mut iterations = 0;

    while iterations < env.max_iterations {
        if rewritten_len(&code, genotype) > env.max_code_len {
            break;
        }
        let next = rewrite(&code, genotype);
        if next == code {
            break;
        }

        let bounds = measure(&next, env.step, env.angle);
        if bounds.height() > env.max_height || bounds.width() > env.max_width {
            break;
        }

        code = next;
        iterations += 1;
    }

    Expansion { code, iterations }
}
