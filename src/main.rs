use clap::Parser;

use grid_replan::config::Config;
use grid_replan::simulation::Simulation;

fn main() {
    env_logger::init();
    let config = Config::parse();

    if let Err(e) = config.validate() {
        eprintln!("{}", e);
        std::process::exit(2);
    }

    println!("Starting pathfinding simulation...");
    println!("Grid size: {}x{}", config.rows, config.cols);
    println!(
        "Obstacle density: {:.2}, Spawn probability: {:.2}",
        config.density, config.spawn_probability
    );
    if let Some(seed) = config.seed {
        println!("Seed: {} (for reproducibility)", seed);
    }

    if config.no_visualization {
        println!("Visualization disabled - running in fast mode");
    } else {
        println!("Visualization enabled with {}ms delay", config.delay_ms);
        println!("Press Ctrl+C to stop the simulation");
    }
    println!();

    if config.compare {
        match Simulation::run_comparison(config) {
            Ok(results) => Simulation::print_comparison_results(&results),
            Err(e) => {
                eprintln!("Error running comparison: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    let mut simulation = match Simulation::new(config) {
        Ok(simulation) => simulation,
        Err(e) => {
            eprintln!("Failed to create simulation: {}", e);
            std::process::exit(1);
        }
    };
    let report = simulation.run();

    println!("\n=== FINAL RESULTS ===");
    println!("Algorithm: {}", report.name());
    println!("Outcome: {}", report.final_state);
    println!("{}", report.statistics);
    if let Some(initial) = &report.initial_search {
        println!(
            "Initial search: {} nodes visited, cost {}, {:.2?}",
            initial.nodes_visited, initial.path_cost, initial.duration
        );
    }

    println!("\n=== TIMING ANALYSIS ===");
    println!("Total pathfinding calls: {}", report.timing_data.total_calls());
    println!(
        "Average search time: {:.2?}",
        report.timing_data.average_search_time()
    );
    println!(
        "Total time in search: {:.2?}",
        report.timing_data.total_search_time()
    );
}
