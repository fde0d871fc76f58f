//! GA of Life CLI - Evolve a seed from JSON configuration, then play it.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::path::PathBuf;
use std::time::Instant;

use ga_of_life::{
    control::{Command, RunLoop, SeedBinding, SeedSync},
    engine::{EvolutionEngineFactory, LifeEngineFactory},
    schema::{ControlConfig, Metric, Observation, SimulationConfig},
};

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 && args[1] == "--example" {
        print_example_config();
        return;
    }

    if args.len() < 2 {
        eprintln!("Usage: {} <config.json> [generations] [ca-steps]", args[0]);
        eprintln!();
        eprintln!("Evolve a Game of Life seed, then run it on the full grid.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  config.json  Path to simulation configuration file");
        eprintln!("  generations  Number of generations to evolve (default: 100)");
        eprintln!("  ca-steps     Number of Game of Life steps to play (default: 500)");
        eprintln!();
        eprintln!("Example configuration is generated with --example flag.");
        std::process::exit(1);
    }

    let config_path = PathBuf::from(&args[1]);
    let generations: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(100);
    let ca_steps: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(500);

    let config = SimulationConfig::from_json_file(&config_path).unwrap_or_else(|e| {
        eprintln!("Error loading config: {}", e);
        std::process::exit(1);
    });
    if let Err(e) = config.validate() {
        eprintln!("Invalid config: {}", e);
        std::process::exit(1);
    }

    println!("GA of Life");
    println!("==========");
    println!(
        "Grid: {}x{} ({:?} border)",
        config.ca.width, config.ca.height, config.ca.border
    );
    println!(
        "Seed patch: {}x{}, population {}",
        config.ca.seed_size, config.ca.seed_size, config.ea.population_size
    );
    println!("Generations: {}", generations);
    println!();

    let origin = Instant::now();
    let clock = move || origin.elapsed();

    // Evolve on the worker thread with auto-run.
    println!("Evolving...");
    let mut evolution = RunLoop::new(EvolutionEngineFactory, ControlConfig::evolution());
    evolution.dispatch(Command::Initialize(config.clone()), clock());

    let report_every = (generations / 10).max(1);
    let mut reported = 0;
    let start = Instant::now();
    evolution.run_blocking(&clock, |state| {
        let done = state.steps_executed >= generations || state.error.is_some();
        if state.steps_executed > reported
            && (state.steps_executed % report_every == 0 || done)
            && let Some(observation) = &state.last_observation
        {
            reported = state.steps_executed;
            let elapsed = start.elapsed().as_secs_f32();
            println!(
                "  Generation {}/{}: max={:.2}, avg={:.2}, evals={}, {:.1} gen/s",
                observation.step,
                generations,
                observation.max_fitness.unwrap_or_default(),
                observation.avg_fitness.unwrap_or_default(),
                observation.evaluations,
                state.steps_executed as f32 / elapsed
            );
        }
        done
    });

    let state = evolution.state();
    if let Some(error) = &state.error {
        eprintln!("Evolution failed: {}", error);
        std::process::exit(1);
    }
    let Some(best) = state.last_observation.clone() else {
        eprintln!("Evolution produced no observation");
        std::process::exit(1);
    };
    drop(evolution);

    println!();
    print_best(&best, config.ca.seed_size);

    // Play the best phenotype on the full grid.
    let control = ControlConfig {
        auto_run: true,
        step_delay_ms: 0,
        ..ControlConfig::life()
    };
    let mut life = RunLoop::new(LifeEngineFactory, control);
    let mut binding = SeedBinding::new(config);
    if binding.sync_from(&best, &mut life, clock()) == SeedSync::Missing {
        eprintln!("No seed to play");
        std::process::exit(1);
    }

    println!("Playing {} steps...", ca_steps);
    let start = Instant::now();
    life.run_blocking(&clock, |state| {
        state.steps_executed >= ca_steps || state.error.is_some()
    });
    let elapsed = start.elapsed();

    let state = life.state();
    if let Some(error) = &state.error {
        eprintln!("Game of Life failed: {}", error);
        std::process::exit(1);
    }

    println!();
    println!("Final state:");
    if let Some(observation) = &state.last_observation {
        println!("  Step: {}", observation.step);
        println!("  Active cells: {}", observation.active_cells);
    }
    println!("  Cells ever active: {}", state.cells_ever_active);
    if let Some(series) = life.series(Metric::ActiveCells)
        && let Some(peak) = series.points().map(|p| p.y).reduce(f64::max)
    {
        println!("  Peak active cells: {}", peak);
    }
    println!(
        "Time: {:.2}s ({:.1} steps/s)",
        elapsed.as_secs_f32(),
        state.steps_executed as f32 / elapsed.as_secs_f32()
    );
}

fn print_best(observation: &Observation, size: usize) {
    println!("Best seed (fitness {:.2}):", observation.max_fitness.unwrap_or_default());
    if let Some(phenotype) = &observation.best_phenotype {
        let cells: Vec<char> = phenotype.chars().collect();
        for row in cells.chunks(size.max(1)) {
            let line: String = row
                .iter()
                .map(|&c| if c == '1' { '#' } else { '.' })
                .collect();
            println!("  {}", line);
        }
    }
    println!();
}

fn print_example_config() {
    let config = SimulationConfig::default();
    match serde_json::to_string_pretty(&config) {
        Ok(json) => {
            println!("Example configuration (config.json):");
            println!("{}", json);
        }
        Err(e) => eprintln!("Error serializing config: {}", e),
    }
}
