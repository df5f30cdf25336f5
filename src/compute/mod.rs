//! Compute module - Growth, measurement and evolution of plant grammars.

mod lsystem;
mod phenotype;
mod softmax;
mod turtle;

pub mod evolution;

pub use lsystem::*;
pub use phenotype::*;
pub use softmax::*;
pub use turtle::*;
