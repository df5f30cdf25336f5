//! Plant Evo CLI - Run plant evolution from a JSON request.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use plant_evo::{
    compute::evolution::run_evolution,
    render::save_svg,
    schema::{EvolutionRequest, GenerationResult},
};

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage(&args[0]);
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_request();
        return;
    }

    let request_path = PathBuf::from(&args[1]);
    let mut stream = false;
    let mut save_dir: Option<PathBuf> = None;

    let mut rest = args[2..].iter();
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--stream" => stream = true,
            "--save-best" => match rest.next() {
                Some(dir) => save_dir = Some(PathBuf::from(dir)),
                None => {
                    eprintln!("--save-best requires a directory");
                    std::process::exit(1);
                }
            },
            other => {
                eprintln!("Unknown argument: {}", other);
                print_usage(&args[0]);
                std::process::exit(1);
            }
        }
    }

    // Load request
    let request_str = fs::read_to_string(&request_path).unwrap_or_else(|e| {
        eprintln!("Error reading request file: {}", e);
        std::process::exit(1);
    });

    let request = EvolutionRequest::from_json(&request_str).unwrap_or_else(|e| {
        eprintln!("Error parsing request: {}", e);
        std::process::exit(1);
    });

    let mut evolution = run_evolution(&request).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });
    log::info!("Environment: {:?}", evolution.env());

    let start = Instant::now();
    let mut results: Vec<GenerationResult> = Vec::with_capacity(request.generations);

    while let Some(result) = evolution.next() {
        let result = result.unwrap_or_else(|e| {
            eprintln!("Evolution aborted: {}", e);
            std::process::exit(1);
        });

        if let Some(dir) = &save_dir
            && let Some(best) = evolution.population().first()
        {
            let phenotype = best.genotype.generate(evolution.env());
            let id = format!("gen_{:02}", evolution.generation() - 1);
            if let Err(e) = save_svg(&phenotype, evolution.env(), dir, &id) {
                eprintln!("Error saving {}: {}", id, e);
                std::process::exit(1);
            }
        }

        if stream {
            print_json(&result);
        } else {
            results.push(result);
        }
    }

    if !stream {
        print_json(&results);
    }

    log::info!(
        "Completed {} generations of {} individuals in {:.2}s",
        evolution.generation(),
        evolution.env().pop_size,
        start.elapsed().as_secs_f32()
    );
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing results: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_usage(program: &str) {
    eprintln!(
        "Usage: {} <request.json> [--stream] [--save-best <dir>]",
        program
    );
    eprintln!();
    eprintln!("Evolve L-system plants for the conditions in a JSON request.");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  request.json       Path to the evolution request");
    eprintln!("  --stream           Print one JSON line per generation");
    eprintln!("  --save-best <dir>  Save the best plant of each generation as SVG");
    eprintln!();
    eprintln!("An example request is printed with --example.");
}

fn print_example_request() {
    let request = EvolutionRequest::default();
    match serde_json::to_string_pretty(&request) {
        Ok(json) => {
            println!("Example request (request.json):");
            println!("{}", json);
        }
        Err(e) => {
            eprintln!("Error serializing example: {}", e);
            std::process::exit(1);
        }
    }
}
