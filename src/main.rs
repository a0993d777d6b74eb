use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use clap::Parser;
use strip_packer::input::Problem;
use strip_packer::output::write_solution;
use strip_packer::render;
use strip_packer::{Algorithm, AnnealConfig, SearchLimits, Solver, SolverConfig};
use tracing::Level;

#[derive(Parser)]
#[command(
    name = "strip_packer",
    about = "Pack rectangles onto a fixed-width roll using the least length"
)]
struct Cli {
    /// Problem file: `W N` then `count width height` groups (default: stdin)
    input: Option<PathBuf>,

    /// Result file (default: stdout)
    output: Option<PathBuf>,

    /// Algorithm: exhaustive, greedy, or annealing
    #[arg(long, default_value = "exhaustive", value_parser = parse_algorithm)]
    algorithm: Algorithm,

    /// Stop the search after this many milliseconds
    #[arg(long)]
    time_limit_ms: Option<u64>,

    /// Stop the exhaustive search after this many nodes
    #[arg(long)]
    node_limit: Option<u64>,

    /// Disable area-bound pruning in the exhaustive search
    #[arg(long)]
    no_prune: bool,

    /// Random seed for annealing
    #[arg(long)]
    seed: Option<u64>,

    /// Annealing iterations
    #[arg(long)]
    iterations: Option<u64>,

    /// Annealing start temperature
    #[arg(long)]
    temperature: Option<f64>,

    /// Annealing cooling factor per iteration, in 0..=1
    #[arg(long)]
    cooling: Option<f64>,

    /// Draw the packed roll on stderr
    #[arg(long)]
    layout: bool,

    /// Print the solution as JSON instead of the plain format
    #[arg(long)]
    json: bool,

    /// Log search progress
    #[arg(short, long)]
    verbose: bool,
}

fn parse_algorithm(s: &str) -> Result<Algorithm, String> {
    match s {
        "exhaustive" => Ok(Algorithm::Exhaustive),
        "greedy" => Ok(Algorithm::Greedy),
        "annealing" => Ok(Algorithm::Annealing),
        _ => Err(format!(
            "invalid algorithm '{}', expected: exhaustive, greedy, or annealing",
            s
        )),
    }
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", message);
    std::process::exit(1);
}

fn read_input(path: Option<&PathBuf>) -> io::Result<String> {
    match path {
        Some(path) => fs::read_to_string(path),
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_target(false)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    let text = read_input(cli.input.as_ref()).unwrap_or_else(|e| fail(e));
    let problem: Problem = text.parse().unwrap_or_else(|e| fail(e));

    let mut limits = SearchLimits::unbounded();
    if let Some(ms) = cli.time_limit_ms {
        limits = limits.with_time_limit_ms(ms);
    }
    if let Some(nodes) = cli.node_limit {
        limits = limits.with_node_limit(nodes);
    }
    let mut anneal = AnnealConfig::default();
    if let Some(seed) = cli.seed {
        anneal = anneal.with_seed(seed);
    }
    if let Some(iterations) = cli.iterations {
        anneal = anneal.with_iterations(iterations);
    }
    if let Some(temperature) = cli.temperature {
        anneal = anneal.with_initial_temperature(temperature);
    }
    if let Some(cooling) = cli.cooling {
        anneal = anneal.with_cooling(cooling);
    }
    let config = SolverConfig::new()
        .with_algorithm(cli.algorithm)
        .with_limits(limits)
        .with_anneal(anneal)
        .with_pruning(!cli.no_prune);

    let solver = Solver::new(problem.width, problem.demands, config);
    let solution = solver.solve().unwrap_or_else(|e| fail(e));

    let mut out: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(fs::File::create(path).unwrap_or_else(|e| fail(e))),
        None => Box::new(io::stdout().lock()),
    };
    let written = if cli.json {
        serde_json::to_writer_pretty(&mut out, &solution)
            .map_err(io::Error::from)
            .and_then(|()| writeln!(out))
    } else {
        write_solution(&mut out, &solution)
    };
    written.and_then(|()| out.flush()).unwrap_or_else(|e| fail(e));

    if cli.layout {
        eprint!(
            "{}",
            render::render_roll(solution.width, solution.length, &solution.placements)
        );
    }
}
