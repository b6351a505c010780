//! gesture_field: interactive entry point.

use std::path::PathBuf;

use clap::Parser;
use gesture_field::app::run;
use gesture_field::config::{AppConfig, DetectorKind};

#[derive(Parser, Debug)]
#[command(name = "gesture_field", about = "Hand-controlled particle field")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of particles
    #[arg(long)]
    particles: Option<usize>,

    /// Seed for the particle pool
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    width: Option<usize>,

    #[arg(long)]
    height: Option<usize>,

    /// Landmark detector command line, e.g. "python3 hand_detect.py"
    #[arg(long)]
    detector_cmd: Option<String>,

    /// Disable the analysis panel
    #[arg(long)]
    no_analysis: bool,

    /// Question sent with every analysis request
    #[arg(long)]
    query: Option<String>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    dump_config: bool,
}

impl Cli {
    fn apply(self, cfg: &mut AppConfig) {
        if let Some(n) = self.particles { cfg.field.count = n; }
        if let Some(s) = self.seed      { cfg.seed = Some(s); }
        if let Some(w) = self.width     { cfg.window.width = w; }
        if let Some(h) = self.height    { cfg.window.height = h; }
        if let Some(cmd) = self.detector_cmd {
            cfg.detector.kind = DetectorKind::Pipe;
            cfg.detector.command = cmd.split_whitespace().map(str::to_string).collect();
        }
        if self.no_analysis { cfg.analysis.enabled = false; }
        if self.query.is_some() { cfg.analysis.query = self.query; }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let mut cfg = match &cli.config {
        Some(path) => match AppConfig::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                log::error!("{}", e);
                std::process::exit(1);
            }
        },
        None => AppConfig::default(),
    };
    let dump = cli.dump_config;
    cli.apply(&mut cfg);

    if let Err(e) = cfg.validate() {
        log::error!("{}", e);
        std::process::exit(1);
    }

    if dump {
        match toml::to_string_pretty(&cfg) {
            Ok(text) => print!("{}", text),
            Err(e) => {
                log::error!("cannot serialize config: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║          Gesture Field - Hand-Controlled Particles           ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
    match cfg.detector.kind {
        DetectorKind::Simulated => println!("  Mode: Keyboard simulation  (1/2 hands, W/S and Up/Down pinch)"),
        DetectorKind::Pipe      => println!("  Mode: Landmark detector `{}`", cfg.detector.command.join(" ")),
    }
    println!("  Particles: {}", cfg.field.count);
    println!();
    println!("  Opening visualizer window…");
    println!();

    if let Err(e) = run(cfg) {
        log::error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
