//! Growth environment derived from raw environmental conditions.
//!
//! An [`Environment`] is built once per run and never mutated. It holds the
//! fitness weight vector, turtle constants and growth bounds that every
//! phenotype evaluation and generation step reads.

use serde::{Deserialize, Serialize};

/// Number of fitness features (and weights).
pub const FEATURE_COUNT: usize = 5;

/// Fixed turning angle in radians.
pub const TURN_ANGLE: f64 = 0.396;

/// Raw environmental inputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrowthConditions {
    /// Relative humidity, must be positive.
    pub humidity: f64,
    /// Light intensity, must be positive.
    pub light: f64,
    /// Wind strength, must be non-negative.
    pub wind: f64,
    /// Soil nutrients, must be positive.
    pub nutrients: f64,
}

/// Run tuning that is not derived from the conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionParams {
    /// Individuals per generation.
    #[serde(default = "default_pop_size")]
    pub pop_size: usize,
    /// Fraction of the population eliminated and carried over as elites.
    #[serde(default = "default_elitism_rate")]
    pub elitism_rate: f64,
    /// Probability that an offspring is mutated after crossover.
    #[serde(default = "default_mutation_rate")]
    pub mutation_rate: f64,
    /// Upper bound on rewriting rounds.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    /// Upper bound on expanded program length (symbols).
    #[serde(default = "default_max_code_len")]
    pub max_code_len: usize,
}

impl Default for EvolutionParams {
    fn default() -> Self {
        Self {
            pop_size: default_pop_size(),
            elitism_rate: default_elitism_rate(),
            mutation_rate: default_mutation_rate(),
            max_iterations: default_max_iterations(),
            max_code_len: default_max_code_len(),
        }
    }
}

fn default_pop_size() -> usize {
    500
}
fn default_elitism_rate() -> f64 {
    0.25
}
fn default_mutation_rate() -> f64 {
    0.2
}
fn default_max_iterations() -> usize {
    5
}
fn default_max_code_len() -> usize {
    20_000
}

/// Immutable growth environment for one evolution run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Environment {
    /// Forward movement per `F`.
    pub step: f64,
    /// Turning angle in radians.
    pub angle: f64,
    /// Feature weights (efficiency, phototropism, symmetry, light, branching).
    /// Sums to 1.0.
    pub weights: [f64; FEATURE_COUNT],
    pub elitism_rate: f64,
    pub mutation_rate: f64,
    pub pop_size: usize,
    /// Maximum vertical extent of a grown plant.
    pub max_height: f64,
    /// Maximum horizontal extent of a grown plant.
    pub max_width: f64,
    /// Leaf diameter, also the light-competition column width.
    pub leaf_size: f64,
    pub max_iterations: usize,
    pub max_code_len: usize,
}

impl Environment {
    /// Build an environment with default run tuning.
    pub fn new(conditions: &GrowthConditions) -> Result<Self, EnvironmentError> {
        Self::with_params(conditions, &EvolutionParams::default())
    }

    /// Build an environment from conditions and explicit run tuning.
    pub fn with_params(
        conditions: &GrowthConditions,
        params: &EvolutionParams,
    ) -> Result<Self, EnvironmentError> {
        conditions.validate()?;
        params.validate()?;

        let GrowthConditions {
            humidity,
            light,
            wind,
            nutrients,
        } = *conditions;

        // Efficiency is not part of fitness yet; its weight stays zero.
        let mut weights = [
            0.0,
            humidity / (light + wind),
            1.0,
            1.0 / light,
            humidity,
        ];
        let total: f64 = weights.iter().sum();
        if !total.is_finite() || total <= 0.0 {
            return Err(EnvironmentError::invalid(
                "weights",
                total,
                "raw weight total must be finite and positive",
            ));
        }
        for w in &mut weights {
            *w /= total;
        }

        let env = Self {
            step: 5.0 * humidity,
            angle: TURN_ANGLE,
            weights,
            elitism_rate: params.elitism_rate,
            mutation_rate: params.mutation_rate,
            pop_size: params.pop_size,
            max_height: 300.0 * nutrients * humidity,
            max_width: 500.0 * nutrients * humidity,
            leaf_size: 10.0 * humidity / light,
            max_iterations: params.max_iterations,
            max_code_len: params.max_code_len,
        };
        env.validate()?;
        Ok(env)
    }

    /// Check the derived constants and run tuning.
    ///
    /// Finite inputs can still overflow or underflow once combined, so the
    /// derived values are checked on their own.
    pub fn validate(&self) -> Result<(), EnvironmentError> {
        let derived = [
            ("step", self.step),
            ("angle", self.angle),
            ("max_height", self.max_height),
            ("max_width", self.max_width),
            ("leaf_size", self.leaf_size),
        ];
        for (name, value) in derived {
            if !value.is_finite() || value <= 0.0 {
                return Err(EnvironmentError::invalid(
                    name,
                    value,
                    "must be finite and positive",
                ));
            }
        }

        for &w in &self.weights {
            if !w.is_finite() || w < 0.0 {
                return Err(EnvironmentError::invalid(
                    "weights",
                    w,
                    "must be finite and non-negative",
                ));
            }
        }
        let sum: f64 = self.weights.iter().sum();
        if (sum - 1.0).abs() > 1e-9 {
            return Err(EnvironmentError::invalid("weights", sum, "must sum to 1"));
        }

        self.params().validate()
    }

    /// Run tuning this environment was built with.
    pub fn params(&self) -> EvolutionParams {
        EvolutionParams {
            pop_size: self.pop_size,
            elitism_rate: self.elitism_rate,
            mutation_rate: self.mutation_rate,
            max_iterations: self.max_iterations,
            max_code_len: self.max_code_len,
        }
    }

    /// Number of individuals eliminated (and kept as elites) each generation.
    pub fn elite_count(&self) -> usize {
        (self.elitism_rate * self.pop_size as f64).floor() as usize
    }
}

impl GrowthConditions {
    /// Validate the raw inputs.
    pub fn validate(&self) -> Result<(), EnvironmentError> {
        let fields = [
            ("humidity", self.humidity),
            ("light", self.light),
            ("wind", self.wind),
            ("nutrients", self.nutrients),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(EnvironmentError::invalid(name, value, "must be finite"));
            }
        }

        if self.light <= 0.0 {
            return Err(EnvironmentError::invalid(
                "light",
                self.light,
                "must be positive",
            ));
        }
        if self.wind < 0.0 {
            return Err(EnvironmentError::invalid(
                "wind",
                self.wind,
                "must be non-negative",
            ));
        }
        if self.light + self.wind <= 0.0 {
            return Err(EnvironmentError::invalid(
                "light + wind",
                self.light + self.wind,
                "must be positive",
            ));
        }
        if self.humidity <= 0.0 {
            return Err(EnvironmentError::invalid(
                "humidity",
                self.humidity,
                "must be positive",
            ));
        }
        if self.nutrients <= 0.0 {
            return Err(EnvironmentError::invalid(
                "nutrients",
                self.nutrients,
                "must be positive",
            ));
        }
        Ok(())
    }
}

impl EvolutionParams {
    /// Validate run tuning.
    pub fn validate(&self) -> Result<(), EnvironmentError> {
        if self.pop_size < 1 {
            return Err(EnvironmentError::EmptyPopulation);
        }
        // Elites come from the breeding pool, so they can never outnumber it.
        if !(0.0..=0.5).contains(&self.elitism_rate) {
            return Err(EnvironmentError::invalid(
                "elitism_rate",
                self.elitism_rate,
                "must be within [0, 0.5]",
            ));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(EnvironmentError::invalid(
                "mutation_rate",
                self.mutation_rate,
                "must be within [0, 1]",
            ));
        }
        if self.max_iterations == 0 {
            return Err(EnvironmentError::invalid(
                "max_iterations",
                0.0,
                "must be at least 1",
            ));
        }
        if self.max_code_len == 0 {
            return Err(EnvironmentError::invalid(
                "max_code_len",
                0.0,
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Environment construction errors.
#[derive(Debug, thiserror::Error)]
pub enum EnvironmentError {
    #[error("Invalid parameter {name} = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },
    #[error("Population size must be at least 1")]
    EmptyPopulation,
}

impl EnvironmentError {
    fn invalid(name: &'static str, value: f64, reason: &'static str) -> Self {
        Self::InvalidParameter {
            name,
            value,
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn conditions(humidity: f64, light: f64, wind: f64, nutrients: f64) -> GrowthConditions {
        GrowthConditions {
            humidity,
            light,
            wind,
            nutrients,
        }
    }

    #[test]
    fn test_reference_scenario() {
        let env = Environment::new(&conditions(0.5, 1.0, 0.1, 1.0)).unwrap();

        assert!((env.step - 2.5).abs() < 1e-12);
        assert!((env.angle - 0.396).abs() < 1e-12);
        assert_eq!(env.pop_size, 500);

        // raw = [0, 0.4545.., 1, 1, 0.5]
        let phototropism_raw: f64 = 0.5 / 1.1;
        assert!((phototropism_raw - 0.4545).abs() < 1e-4);
        let total = phototropism_raw + 1.0 + 1.0 + 0.5;
        assert!((env.weights[1] - phototropism_raw / total).abs() < 1e-12);
        assert_eq!(env.weights[0], 0.0);
        assert!((env.weights.iter().sum::<f64>() - 1.0).abs() < 1e-9);

        assert!((env.max_height - 150.0).abs() < 1e-9);
        assert!((env.max_width - 250.0).abs() < 1e-9);
        assert!((env.leaf_size - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_light_rejected() {
        let result = Environment::new(&conditions(0.5, 0.0, 0.1, 1.0));
        assert!(matches!(
            result,
            Err(EnvironmentError::InvalidParameter { name: "light", .. })
        ));
    }

    #[test]
    fn test_negative_wind_rejected() {
        let result = Environment::new(&conditions(0.5, 1.0, -0.5, 1.0));
        assert!(matches!(
            result,
            Err(EnvironmentError::InvalidParameter { name: "wind", .. })
        ));
    }

    #[test]
    fn test_non_finite_rejected() {
        let result = Environment::new(&conditions(f64::NAN, 1.0, 0.0, 1.0));
        assert!(matches!(
            result,
            Err(EnvironmentError::InvalidParameter {
                name: "humidity",
                ..
            })
        ));
    }

    #[test]
    fn test_empty_population_rejected() {
        let params = EvolutionParams {
            pop_size: 0,
            ..Default::default()
        };
        let result = Environment::with_params(&conditions(0.5, 1.0, 0.1, 1.0), &params);
        assert!(matches!(result, Err(EnvironmentError::EmptyPopulation)));
    }

    #[test]
    fn test_elitism_rate_bounded() {
        let params = EvolutionParams {
            elitism_rate: 0.75,
            ..Default::default()
        };
        let result = Environment::with_params(&conditions(0.5, 1.0, 0.1, 1.0), &params);
        assert!(matches!(
            result,
            Err(EnvironmentError::InvalidParameter {
                name: "elitism_rate",
                ..
            })
        ));
    }

    #[test]
    fn test_elite_count_floors() {
        let params = EvolutionParams {
            pop_size: 10,
            ..Default::default()
        };
        let env = Environment::with_params(&conditions(0.5, 1.0, 0.1, 1.0), &params).unwrap();
        assert_eq!(env.elite_count(), 2);
    }

    #[test]
    fn test_vanishing_light_rejected() {
        // 1/light overflows to infinity.
        let result = Environment::new(&conditions(0.5, 1e-310, 0.0, 1.0));
        assert!(matches!(
            result,
            Err(EnvironmentError::InvalidParameter { name: "weights", .. })
        ));
    }

    #[test]
    fn test_overflowing_humidity_rejected() {
        let result = Environment::new(&conditions(1e308, 1.0, 0.1, 1.0));
        assert!(matches!(
            result,
            Err(EnvironmentError::InvalidParameter { name: "weights", .. })
        ));

        // Weights survive, but 300 * humidity does not.
        let result = Environment::new(&conditions(1e307, 1.0, 0.1, 1.0));
        assert!(matches!(
            result,
            Err(EnvironmentError::InvalidParameter {
                name: "max_height",
                ..
            })
        ));
    }

    #[test]
    fn test_hand_built_environment_validated() {
        let mut env = Environment::new(&conditions(0.5, 1.0, 0.1, 1.0)).unwrap();
        assert!(env.validate().is_ok());
        assert_eq!(env.params(), EvolutionParams::default());

        env.elitism_rate = 0.9;
        assert!(matches!(
            env.validate(),
            Err(EnvironmentError::InvalidParameter {
                name: "elitism_rate",
                ..
            })
        ));

        env.elitism_rate = 0.25;
        env.weights = [0.0; FEATURE_COUNT];
        assert!(matches!(
            env.validate(),
            Err(EnvironmentError::InvalidParameter { name: "weights", .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_weights_sum_to_one(
            humidity in 1e-3f64..100.0,
            light in 1e-3f64..100.0,
            wind in 0.0f64..100.0,
            nutrients in 1e-3f64..100.0,
        ) {
            let env = Environment::new(&conditions(humidity, light, wind, nutrients)).unwrap();
            let sum: f64 = env.weights.iter().sum();
            prop_assert!((sum - 1.0).abs() < 1e-9);
            prop_assert!(env.weights.iter().all(|w| *w >= 0.0));
        }
    }
}
