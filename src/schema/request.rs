//! Request and result types at the evolution boundary.

use serde::{Deserialize, Serialize};

use super::{Environment, EnvironmentError, EvolutionParams, GrowthConditions};

/// A request to evolve plants under given conditions.
///
/// JSON shape is flat:
/// `{"generations": 10, "humidity": 0.5, "light": 1.0, "wind": 0.1, "nutrients": 1.0}`
/// with optional tuning keys (`pop_size`, `elitism_rate`, `mutation_rate`,
/// `max_iterations`, `max_code_len`, `random_seed`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionRequest {
    /// Number of generations to run.
    pub generations: usize,
    #[serde(flatten)]
    pub conditions: GrowthConditions,
    #[serde(flatten)]
    pub params: EvolutionParams,
    /// Random seed for reproducibility.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

impl Default for EvolutionRequest {
    fn default() -> Self {
        Self {
            generations: 10,
            conditions: GrowthConditions {
                humidity: 0.5,
                light: 1.0,
                wind: 0.1,
                nutrients: 1.0,
            },
            params: EvolutionParams::default(),
            random_seed: None,
        }
    }
}

impl EvolutionRequest {
    /// Parse and validate a request from JSON.
    pub fn from_json(json: &str) -> Result<Self, RequestError> {
        let request: Self = serde_json::from_str(json)?;
        request.validate()?;
        Ok(request)
    }

    /// Check request-level fields.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.generations < 1 {
            return Err(RequestError::InvalidRequest(
                "generations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Validate and build the run environment.
    pub fn environment(&self) -> Result<Environment, RequestError> {
        self.validate()?;
        Ok(Environment::with_params(&self.conditions, &self.params)?)
    }
}

/// One generation's ranked output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    /// Forward step used to draw every program.
    pub step: f64,
    /// Turning angle used to draw every program.
    pub angle: f64,
    /// Expanded program per individual, best first.
    pub results: Vec<String>,
    /// Score per individual, same order as `results`.
    pub scores: Vec<f64>,
}

/// Request validation errors.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Malformed request: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Invalid environment: {0}")]
    Environment(#[from] EnvironmentError),
}
