//! Population-relative fitness scoring.
//!
//! Features of the whole population are stacked into an `n x 5` matrix and
//! softmax-normalized down each column, so every feature is judged relative
//! to the current peers. The scalar score is the dot product of a normalized
//! row with the environment's weights. Because the normalization is
//! recomputed for every population, identical grammars can score differently
//! from one generation to the next.

use std::sync::Arc;

#[cfg(not(target_arch = "wasm32"))]
use rayon::prelude::*;

use rand::distributions::WeightedError;

use crate::compute::{Feature, FeatureVector, Phenotype, column_softmax};
use crate::schema::{Environment, Genotype};

/// Scores populations against one environment.
#[derive(Debug, Clone)]
pub struct FitnessScorer {
    env: Environment,
}

/// Scores of a population plus the programs they were computed from,
/// index-aligned with the input.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub codes: Vec<String>,
    pub features: Vec<FeatureVector>,
    pub scores: Vec<f64>,
}

impl FitnessScorer {
    /// Create a scorer for an environment.
    pub fn new(env: Environment) -> Self {
        Self { env }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Grow every individual.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn evaluate(&self, population: &[Arc<Genotype>]) -> Vec<Phenotype> {
        // Each phenotype depends only on its genotype and the environment.
        population
            .par_iter()
            .map(|genotype| genotype.generate(&self.env))
            .collect()
    }

    #[cfg(target_arch = "wasm32")]
    pub fn evaluate(&self, population: &[Arc<Genotype>]) -> Vec<Phenotype> {
        population
            .iter()
            .map(|genotype| genotype.generate(&self.env))
            .collect()
    }

    /// Score a population. Output is aligned index-for-index with the input.
    pub fn score(&self, population: &[Arc<Genotype>]) -> Result<Evaluation, EvolutionError> {
        let phenotypes = self.evaluate(population);
        let features: Vec<FeatureVector> = phenotypes.iter().map(|p| p.features).collect();
        let scores = score_features(&features, &self.env.weights)?;
        let codes = phenotypes.into_iter().map(|p| p.code).collect();

        Ok(Evaluation {
            codes,
            features,
            scores,
        })
    }
}

/// Normalize features per column and reduce each row to a weighted score.
pub fn score_features(
    features: &[FeatureVector],
    weights: &FeatureVector,
) -> Result<Vec<f64>, EvolutionError> {
    for (index, row) in features.iter().enumerate() {
        if let Some(feature) = Feature::ALL.iter().find(|f| !row[f.index()].is_finite()) {
            log::warn!("Individual {} has non-finite {} feature", index, feature);
            return Err(EvolutionError::NumericDegenerate {
                index,
                detail: format!("non-finite {} feature", feature),
            });
        }
    }

    let normalized = column_softmax(features);
    let mut scores = Vec::with_capacity(normalized.len());
    for (index, row) in normalized.iter().enumerate() {
        let score: f64 = row.iter().zip(weights).map(|(f, w)| f * w).sum();
        if !score.is_finite() {
            return Err(EvolutionError::NumericDegenerate {
                index,
                detail: "non-finite score".to_string(),
            });
        }
        scores.push(score);
    }
    Ok(scores)
}

/// Errors that abort an evolution run.
#[derive(Debug, thiserror::Error)]
pub enum EvolutionError {
    #[error("Numeric degeneracy at individual {index}: {detail}")]
    NumericDegenerate { index: usize, detail: String },
    #[error("Invalid selection weights: {0}")]
    Selection(#[from] WeightedError),
}
