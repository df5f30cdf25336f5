//! Benchmarks for plant growth and evolution.

use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::StdRng;

use plant_evo::{
    compute::evolution::{Evolution, FitnessScorer, RuleGenerator},
    schema::{Environment, EvolutionParams, Genotype, GrowthConditions},
};

fn environment(pop_size: usize) -> Environment {
    let conditions = GrowthConditions {
        humidity: 0.5,
        light: 1.0,
        wind: 0.1,
        nutrients: 1.0,
    };
    let params = EvolutionParams {
        pop_size,
        ..Default::default()
    };
    Environment::with_params(&conditions, &params).expect("valid environment")
}

fn bench_generate(c: &mut Criterion) {
    let env = environment(1);
    let genotype = Genotype::from_rules([('F', "FF"), ('X', "F[+X]F[-X]+X")]);

    c.bench_function("generate_classic_plant", |b| {
        b.iter(|| black_box(genotype.generate(black_box(&env))));
    });
}

fn bench_scoring(c: &mut Criterion) {
    let mut group = c.benchmark_group("score_population");
    group.sample_size(10);

    for pop_size in [50, 200, 500] {
        let env = environment(pop_size);
        let generator = RuleGenerator::default();
        let mut rng = StdRng::seed_from_u64(42);
        let population: Vec<Arc<Genotype>> = (0..pop_size)
            .map(|_| Arc::new(generator.generate(&mut rng)))
            .collect();
        let scorer = FitnessScorer::new(env);

        group.bench_with_input(
            BenchmarkId::from_parameter(pop_size),
            &population,
            |b, population| {
                b.iter(|| black_box(scorer.score(population).expect("finite scores")));
            },
        );
    }

    group.finish();
}

fn bench_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("evolution_run");
    group.sample_size(10);

    for pop_size in [50, 200] {
        group.bench_with_input(
            BenchmarkId::from_parameter(pop_size),
            &pop_size,
            |b, &pop_size| {
                b.iter(|| {
                    let evolution = Evolution::new(environment(pop_size), 2, Some(7))
                        .expect("valid environment");
                    black_box(evolution.run().expect("finite scores"))
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_generate, bench_scoring, bench_generation);
criterion_main!(benches);
