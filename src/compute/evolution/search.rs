//! Generational search: elitism plus softmax-roulette breeding.
//!
//! [`Evolution`] is a lazy, finite iterator. Each call to `next` runs one
//! generation and yields its ranked [`GenerationResult`]; dropping the
//! iterator abandons the run.

use std::iter::FusedIterator;
use std::sync::Arc;

use rand::distributions::WeightedIndex;
use rand::prelude::*;

use crate::compute::softmax;
use crate::schema::{
    Environment, EnvironmentError, EvolutionRequest, GenerationResult, Genotype, RequestError,
};

use super::fitness::{EvolutionError, FitnessScorer};
use super::genome::RuleGenerator;

/// A genotype paired with its current program and score.
///
/// The pairing is carried through every sort and truncation, so equal
/// grammars never get confused with one another.
#[derive(Debug, Clone)]
pub struct Individual {
    pub genotype: Arc<Genotype>,
    /// Expanded program in the run's environment.
    pub code: String,
    /// Score relative to the population it was last ranked in.
    pub score: f64,
}

/// Lifecycle of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvolutionPhase {
    /// Population not seeded yet.
    #[default]
    Initializing,
    /// Generations remain.
    Running,
    /// All generations emitted, or the run failed.
    Done,
}

/// One evolution run over a fixed environment.
pub struct Evolution {
    scorer: FitnessScorer,
    generator: RuleGenerator,
    rng: StdRng,
    population: Vec<Individual>,
    generation: usize,
    generations: usize,
    phase: EvolutionPhase,
}

/// Validate a request and prepare its run.
///
/// All validation happens here, before any generation executes.
pub fn run_evolution(request: &EvolutionRequest) -> Result<Evolution, RequestError> {
    let env = request.environment()?;
    Ok(Evolution::new(
        env,
        request.generations,
        request.random_seed,
    )?)
}

impl Evolution {
    /// Create a run of `generations` steps. `seed` fixes the random source.
    ///
    /// The environment is re-validated, since its fields can be set directly.
    pub fn new(
        env: Environment,
        generations: usize,
        seed: Option<u64>,
    ) -> Result<Self, EnvironmentError> {
        env.validate()?;
        let seed = seed.unwrap_or_else(rand::random);

        Ok(Self {
            scorer: FitnessScorer::new(env),
            generator: RuleGenerator::default(),
            rng: StdRng::seed_from_u64(seed),
            population: Vec::new(),
            generation: 0,
            generations,
            phase: EvolutionPhase::Initializing,
        })
    }

    /// Use a custom generator for the initial population.
    pub fn with_rule_generator(mut self, generator: RuleGenerator) -> Self {
        self.generator = generator;
        self
    }

    pub fn env(&self) -> &Environment {
        self.scorer.env()
    }

    pub fn phase(&self) -> EvolutionPhase {
        self.phase
    }

    /// Generations emitted so far.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Current population, best first.
    pub fn population(&self) -> &[Individual] {
        &self.population
    }

    /// Seed and rank the initial population.
    fn initialize(&mut self) -> Result<(), EvolutionError> {
        let env = self.scorer.env();
        log::debug!("Environment: {:?}", env);

        let genotypes: Vec<Arc<Genotype>> = (0..env.pop_size)
            .map(|_| Arc::new(self.generator.generate(&mut self.rng)))
            .collect();

        self.population = rank(&self.scorer, genotypes)?;
        if let Some(best) = self.population.first() {
            log::debug!(
                "Initialized {} individuals, best score {:.6}",
                self.population.len(),
                best.score
            );
        }
        Ok(())
    }

    /// Run one generation on the ranked population.
    fn step_generation(&mut self) -> Result<GenerationResult, EvolutionError> {
        let env = self.scorer.env();
        let elites = env.elite_count();
        let offspring = env.pop_size.saturating_sub(elites);

        // Elimination: the bottom `elites` neither survive nor breed.
        let pool_size = self.population.len().saturating_sub(elites);
        self.population.truncate(pool_size);
        let pool = &self.population;

        let scores: Vec<f64> = pool.iter().map(|i| i.score).collect();
        let selector = WeightedIndex::new(softmax(&scores))?;

        let mut next: Vec<Arc<Genotype>> = Vec::with_capacity(env.pop_size);
        next.extend(pool.iter().take(elites).map(|i| Arc::clone(&i.genotype)));

        for _ in 0..offspring {
            let parent1 = &pool[selector.sample(&mut self.rng)].genotype;
            let parent2 = &pool[selector.sample(&mut self.rng)].genotype;

            let child = parent1.crossover(parent2, &mut self.rng);
            let child = if self.rng.gen_bool(env.mutation_rate) {
                child.mutate(&mut self.rng)
            } else {
                child
            };
            next.push(Arc::new(child));
        }

        self.population = rank(&self.scorer, next)?;

        if let Some(best) = self.population.first() {
            log::info!(
                "Generation {}: best score {:.6}, best rules {}",
                self.generation,
                best.score,
                best.genotype
            );
        }

        Ok(self.snapshot())
    }

    /// Current ranking as an emitted record.
    fn snapshot(&self) -> GenerationResult {
        let env = self.scorer.env();
        GenerationResult {
            step: env.step,
            angle: env.angle,
            results: self.population.iter().map(|i| i.code.clone()).collect(),
            scores: self.population.iter().map(|i| i.score).collect(),
        }
    }

    fn advance(&mut self) -> Option<Result<GenerationResult, EvolutionError>> {
        if self.generation >= self.generations {
            self.phase = EvolutionPhase::Done;
            return None;
        }

        match self.step_generation() {
            Ok(result) => {
                self.generation += 1;
                if self.generation >= self.generations {
                    self.phase = EvolutionPhase::Done;
                }
                Some(Ok(result))
            }
            Err(e) => {
                self.phase = EvolutionPhase::Done;
                Some(Err(e))
            }
        }
    }

    /// Run all remaining generations, calling `callback` after each one.
    pub fn run_with_callback<F>(
        mut self,
        mut callback: F,
    ) -> Result<Vec<GenerationResult>, EvolutionError>
    where
        F: FnMut(&GenerationResult),
    {
        let mut results = Vec::with_capacity(self.generations - self.generation);
        for result in &mut self {
            let result = result?;
            callback(&result);
            results.push(result);
        }
        Ok(results)
    }

    /// Run all remaining generations (blocking).
    pub fn run(self) -> Result<Vec<GenerationResult>, EvolutionError> {
        self.run_with_callback(|_| {})
    }
}

impl Iterator for Evolution {
    type Item = Result<GenerationResult, EvolutionError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.phase {
            EvolutionPhase::Done => None,
            EvolutionPhase::Initializing => {
                if self.generations == 0 {
                    self.phase = EvolutionPhase::Done;
                    return None;
                }
                if let Err(e) = self.initialize() {
                    self.phase = EvolutionPhase::Done;
                    return Some(Err(e));
                }
                self.phase = EvolutionPhase::Running;
                self.advance()
            }
            EvolutionPhase::Running => self.advance(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.phase {
            EvolutionPhase::Done => (0, Some(0)),
            _ => (0, Some(self.generations - self.generation)),
        }
    }
}

impl FusedIterator for Evolution {}

/// Score genotypes and pair them with their results, best first.
fn rank(
    scorer: &FitnessScorer,
    genotypes: Vec<Arc<Genotype>>,
) -> Result<Vec<Individual>, EvolutionError> {
    let evaluation = scorer.score(&genotypes)?;

    let mut individuals: Vec<Individual> = genotypes
        .into_iter()
        .zip(evaluation.codes)
        .zip(evaluation.scores)
        .map(|((genotype, code), score)| Individual {
            genotype,
            code,
            score,
        })
        .collect();

    individuals.sort_by(|a, b| b.score.total_cmp(&a.score));
    Ok(individuals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{EvolutionParams, GrowthConditions};

    fn small_request(generations: usize, pop_size: usize, seed: u64) -> EvolutionRequest {
        EvolutionRequest {
            generations,
            conditions: GrowthConditions {
                humidity: 0.5,
                light: 1.0,
                wind: 0.1,
                nutrients: 1.0,
            },
            params: EvolutionParams {
                pop_size,
                max_iterations: 4,
                max_code_len: 4_000,
                ..Default::default()
            },
            random_seed: Some(seed),
        }
    }

    fn assert_descending(scores: &[f64]) {
        for pair in scores.windows(2) {
            assert!(pair[0] + 1e-9 >= pair[1], "not descending: {:?}", pair);
        }
    }

    #[test]
    fn test_generation_invariants() {
        let evolution = run_evolution(&small_request(3, 20, 42)).unwrap();
        let results = evolution.run().unwrap();

        assert_eq!(results.len(), 3);
        for result in &results {
            assert_eq!(result.results.len(), 20);
            assert_eq!(result.scores.len(), 20);
            assert_descending(&result.scores);
            assert!((result.step - 2.5).abs() < 1e-12);
            assert!((result.angle - 0.396).abs() < 1e-12);
        }
    }

    #[test]
    fn test_reference_single_generation() {
        let mut evolution = run_evolution(&small_request(1, 12, 1)).unwrap();

        let first = evolution.next().unwrap().unwrap();
        assert_eq!(first.step, 2.5);
        assert_eq!(first.results.len(), 12);
        assert!(evolution.next().is_none());
        assert!(evolution.next().is_none());
        assert_eq!(evolution.phase(), EvolutionPhase::Done);
    }

    #[test]
    fn test_population_matches_emitted_record() {
        let mut evolution = run_evolution(&small_request(2, 16, 5)).unwrap();
        let record = evolution.next().unwrap().unwrap();

        assert_eq!(evolution.population().len(), 16);
        for (individual, (code, score)) in evolution
            .population()
            .iter()
            .zip(record.results.iter().zip(&record.scores))
        {
            assert_eq!(&individual.code, code);
            assert_eq!(individual.score, *score);
        }
    }

    #[test]
    fn test_elites_are_retained_instances() {
        let mut evolution = run_evolution(&small_request(2, 20, 7)).unwrap();
        evolution.next().unwrap().unwrap();

        let elites = evolution.env().elite_count();
        assert_eq!(elites, 5);
        let carried: Vec<Arc<Genotype>> = evolution.population()[..elites]
            .iter()
            .map(|i| Arc::clone(&i.genotype))
            .collect();

        evolution.next().unwrap().unwrap();

        for elite in &carried {
            assert!(
                evolution
                    .population()
                    .iter()
                    .any(|i| Arc::ptr_eq(&i.genotype, elite)),
                "elite {} was not carried over",
                elite
            );
        }
    }

    #[test]
    fn test_eliminated_never_carried_over() {
        let mut evolution = run_evolution(&small_request(2, 20, 11)).unwrap();
        evolution.next().unwrap().unwrap();

        let elites = evolution.env().elite_count();
        let before: Vec<Arc<Genotype>> = evolution
            .population()
            .iter()
            .map(|i| Arc::clone(&i.genotype))
            .collect();
        let (kept, eliminated) = (&before[..elites], &before[before.len() - elites..]);

        evolution.next().unwrap().unwrap();

        // Offspring are fresh allocations, so only carried-over elites can
        // share a pointer with the previous generation.
        let carried: Vec<&Arc<Genotype>> = evolution
            .population()
            .iter()
            .map(|i| &i.genotype)
            .filter(|g| before.iter().any(|b| Arc::ptr_eq(b, g)))
            .collect();
        assert_eq!(carried.len(), elites);
        for genotype in carried {
            assert!(kept.iter().any(|k| Arc::ptr_eq(k, genotype)));
            assert!(!eliminated.iter().any(|e| Arc::ptr_eq(e, genotype)));
        }
    }

    #[test]
    fn test_unchecked_environment_rejected() {
        let mut env = small_request(1, 10, 0).environment().unwrap();
        env.elitism_rate = 0.9;

        let result = Evolution::new(env, 1, Some(1));
        assert!(matches!(
            result,
            Err(EnvironmentError::InvalidParameter {
                name: "elitism_rate",
                ..
            })
        ));
    }

    #[test]
    fn test_same_seed_same_run() {
        let a = run_evolution(&small_request(2, 12, 99)).unwrap().run().unwrap();
        let b = run_evolution(&small_request(2, 12, 99)).unwrap().run().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_tiny_population_without_elites() {
        let evolution = run_evolution(&small_request(2, 3, 4)).unwrap();
        assert_eq!(evolution.env().elite_count(), 0);

        let results = evolution.run().unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.scores.len() == 3));
    }

    #[test]
    fn test_early_abandonment() {
        let evolution = run_evolution(&small_request(50, 10, 3)).unwrap();
        let taken: Vec<_> = evolution.take(1).collect();
        assert_eq!(taken.len(), 1);
    }

    #[test]
    fn test_callback_sees_every_generation() {
        let evolution = run_evolution(&small_request(3, 8, 8)).unwrap();
        let mut seen = 0;
        let results = evolution.run_with_callback(|_| seen += 1).unwrap();
        assert_eq!(seen, 3);
        assert_eq!(results.len(), 3);
    }

    #[test]
    fn test_invalid_environment_fails_before_running() {
        let mut request = small_request(1, 10, 0);
        request.conditions.light = 0.0;
        request.conditions.wind = 0.0;

        let result = run_evolution(&request);
        assert!(matches!(
            result,
            Err(RequestError::Environment(
                EnvironmentError::InvalidParameter { .. }
            ))
        ));
    }

    #[test]
    fn test_zero_generations_yields_nothing() {
        let env = small_request(1, 10, 0).environment().unwrap();
        let mut evolution = Evolution::new(env, 0, Some(1)).unwrap();
        assert!(evolution.next().is_none());
        assert!(evolution.population().is_empty());
    }
}
