//! Schema module - Environment, grammar and request types for plant evolution.

mod environment;
mod genotype;
mod request;

pub use environment::*;
pub use genotype::*;
pub use request::*;
