//! Headless probe: run the field for a number of ticks at fixed control
//! values and print how the swarm settles.

use clap::Parser;
use particle_field::{ControlSignal, FieldConfig, ParticleField};

#[derive(Parser, Debug)]
#[command(name = "field_probe", about = "Run the particle field headless and print statistics")]
struct Cli {
    /// Chaos level 0–1
    #[arg(long, default_value_t = 0.1)]
    chaos: f32,

    /// Scale level 0–1
    #[arg(long, default_value_t = 0.5)]
    scale: f32,

    /// Number of ticks to run
    #[arg(short, long, default_value_t = 300)]
    ticks: usize,

    /// Print a line every N ticks
    #[arg(long, default_value_t = 30)]
    every: usize,

    /// Pool size
    #[arg(short, long, default_value_t = particle_field::DEFAULT_PARTICLE_COUNT)]
    particles: usize,

    /// Canvas width and height
    #[arg(long, default_value_t = 960.0)]
    width: f32,
    #[arg(long, default_value_t = 640.0)]
    height: f32,

    /// RNG seed
    #[arg(long, default_value_t = 1)]
    seed: u64,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let config = FieldConfig { count: cli.particles, ..FieldConfig::default() };
    if let Some(problem) = config.problem() {
        log::error!("{}", problem);
        std::process::exit(1);
    }
    if !(cli.width.is_finite() && cli.height.is_finite()) || cli.width <= 0.0 || cli.height <= 0.0 {
        log::error!("canvas must be positive, got {}×{}", cli.width, cli.height);
        std::process::exit(1);
    }

    let signal = ControlSignal::new(cli.chaos, cli.scale, true);
    let mut field = ParticleField::new(&config, cli.width, cli.height, cli.seed);

    println!();
    println!("  ┌─ particle field  {}×{}  n={}  seed={}",
             cli.width, cli.height, field.len(), cli.seed);
    println!("  │  chaos={:.2}  scale={:.2}", signal.chaos(), signal.scale());
    println!("  │");
    println!("  │  {:>6}  {:>11}  {:>10}  {:>9}", "tick", "mean radius", "max radius", "mean lag");

    let every = cli.every.max(1);
    for t in 1..=cli.ticks {
        field.tick(&signal, cli.width, cli.height);
        if t % every == 0 || t == cli.ticks {
            let s = field.stats(signal.scale(), cli.width, cli.height);
            println!("  │  {:>6}  {:>11.2}  {:>10.2}  {:>9.2}", t, s.mean_radius, s.max_radius, s.mean_lag);
            if !s.all_finite {
                log::error!("non-finite particle position at tick {}", t);
                std::process::exit(1);
            }
        }
    }
    println!("  └─ ({} ticks)", cli.ticks);
    println!();
}
