//! Evolutionary search over L-system grammars.
//!
//! # Overview
//!
//! The evolutionary search system consists of:
//!
//! - **Genome Operations** (`genome`): Random grammar generation, crossover, and mutation
//! - **Fitness Scoring** (`fitness`): Population-relative, softmax-normalized scoring
//! - **Search Loop** (`search`): Elitism plus softmax-roulette breeding as a lazy iterator
//!
//! # Example
//!
//! ```rust,no_run
//! use plant_evo::compute::evolution::run_evolution;
//! use plant_evo::schema::EvolutionRequest;
//!
//! let request = EvolutionRequest {
//!     generations: 5,
//!     random_seed: Some(42),
//!     ..Default::default()
//! };
//!
//! for result in run_evolution(&request).expect("valid request") {
//!     let generation = result.expect("finite scores");
//!     println!("best score {:.4}: {}", generation.scores[0], generation.results[0]);
//! }
//! ```
//!
//! # Generation Step
//!
//! With `n = floor(elitism_rate * pop_size)`:
//!
//! 1. The `n` lowest-ranked individuals are dropped.
//! 2. The remaining pool gets selection probabilities `softmax(scores)`.
//! 3. The top `n` of the pool survive unchanged.
//! 4. `pop_size - n` offspring are bred from two roulette-selected parents,
//!    crossed over and mutated with probability `mutation_rate`.
//! 5. The whole new population is re-scored and ranked.

mod fitness;
mod genome;
mod search;

pub use fitness::{Evaluation, EvolutionError, FitnessScorer, score_features};
pub use genome::{RuleGenerator, top_level_cuts};
pub use search::{Evolution, EvolutionPhase, Individual, run_evolution};
