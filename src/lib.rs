//! Plant Evo - Evolving L-system plant grammars against environmental growth fitness.
//!
//! This crate grows plant-like forms from rewriting grammars ("L-systems")
//! and evolves populations of grammars toward forms that suit a given
//! environment (humidity, light, wind, nutrients).
//!
//! # Architecture
//!
//! The crate is split into three modules:
//!
//! - `schema`: Environment, grammar, request and result types
//! - `compute`: Growth (rewriting, turtle interpretation, features) and evolution
//! - `render`: SVG output of grown plants
//!
//! # Example
//!
//! ```rust,no_run
//! use plant_evo::{
//!     compute::evolution::run_evolution,
//!     schema::{EvolutionParams, EvolutionRequest, GrowthConditions},
//! };
//!
//! let request = EvolutionRequest {
//!     generations: 10,
//!     conditions: GrowthConditions {
//!         humidity: 0.5,
//!         light: 1.0,
//!         wind: 0.1,
//!         nutrients: 1.0,
//!     },
//!     params: EvolutionParams::default(),
//!     random_seed: Some(42),
//! };
//!
//! let results = run_evolution(&request)
//!     .expect("valid request")
//!     .run()
//!     .expect("finite scores");
//!
//! let last = results.last().unwrap();
//! println!("Best plant after {} generations: {}", results.len(), last.results[0]);
//! ```

pub mod compute;
pub mod render;
pub mod schema;

// Re-export commonly used types
pub use compute::evolution::{Evolution, EvolutionError, run_evolution};
pub use compute::{Phenotype, interpret};
pub use schema::{Environment, EvolutionRequest, GenerationResult, Genotype, GrowthConditions};
