use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use std::fs;
use std::path::PathBuf;
use wolsim_core::bacteria::BacteriaPattern;
use wolsim_core::config::SimConfig;
use wolsim_core::world::{World, BARRIER_SEED_CELL, DEFAULT_SEED_CELL};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Pattern {
    /// Random Wolbachia in the top-left 15x15 block, virus seeded at (15, 15).
    Random,
    /// Wolbachia band across rows 7-12, virus seeded at (2, 10).
    Barrier,
}

/// Run a Wolbachia / virus spread simulation and print a JSON run summary.
#[derive(Parser, Debug)]
#[command(name = "wolsim", version)]
struct Args {
    /// JSON file with a `SimConfig`; flags below override its grid and model.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    width: Option<usize>,

    #[arg(long)]
    height: Option<usize>,

    /// "signalling" or "genetic".
    #[arg(long)]
    model: Option<String>,

    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, default_value_t = 50)]
    steps: usize,

    #[arg(long, default_value_t = 1)]
    sample_every: usize,

    #[arg(long, default_value_t = 1.5)]
    diffuse_rate: f64,

    #[arg(long, default_value_t = 1.6)]
    growth_rate: f64,

    #[arg(long, default_value_t = 1.7)]
    carrying_capacity: f64,

    #[arg(long, value_enum, default_value_t = Pattern::Random)]
    pattern: Pattern,

    /// Wolbachia probability per cell for the random pattern.
    #[arg(long, default_value_t = 0.3)]
    probability: f64,

    /// Write the summary here instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,
}

fn load_config(args: &Args) -> Result<SimConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            SimConfig::from_json_str(&json)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => SimConfig::default(),
    };
    if let Some(width) = args.width {
        config.n_x = width;
    }
    if let Some(height) = args.height {
        config.n_y = height;
    }
    if let Some(model) = &args.model {
        config.model = model.parse()?;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    if args.sample_every == 0 {
        bail!("--sample-every must be positive");
    }

    let config = load_config(&args)?;
    log::info!(
        "running {} model on {}x{} grid for {} steps (seed {})",
        config.model,
        config.n_x,
        config.n_y,
        args.steps,
        config.seed
    );

    let mut world = World::try_new(config)?;
    for k in 0..world.num_virus() {
        world
            .set_virus_parameters(k, args.diffuse_rate, args.growth_rate, args.carrying_capacity)
            .with_context(|| format!("configuring virus variant {k}"))?;
    }
    let (pattern, seed_cell) = match args.pattern {
        Pattern::Random => (
            BacteriaPattern::RandomPatch {
                p: args.probability,
            },
            DEFAULT_SEED_CELL,
        ),
        Pattern::Barrier => (BacteriaPattern::Barrier, BARRIER_SEED_CELL),
    };
    world.initialize_bacteria(pattern)?;
    world
        .seed_virus(0, seed_cell)
        .with_context(|| format!("seeding virus at {seed_cell:?}"))?;

    let summary = world.try_run_experiment(args.steps, args.sample_every)?;
    log::info!(
        "finished: final totals {:?}, {} individuals left the grid",
        summary.final_virus_totals,
        summary.total_exited
    );

    let json = serde_json::to_string_pretty(&summary)?;
    match &args.output {
        Some(path) => fs::write(path, json)
            .with_context(|| format!("writing summary to {}", path.display()))?,
        None => println!("{json}"),
    }
    Ok(())
}
