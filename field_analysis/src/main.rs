//! One-shot analysis of a field state from the command line.

use clap::{Parser, ValueEnum};
use field_analysis::{AnalysisClient, LocalAnalyst, Voice};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum VoiceArg {
    Terse,
    Telemetry,
}

#[derive(Parser, Debug)]
#[command(name = "field_analyst", about = "Describe a chaos/scale field state")]
struct Cli {
    /// Chaos level 0–1
    chaos: f32,

    /// Scale level 0–1
    scale: f32,

    /// Optional question to answer alongside the reading
    #[arg(short, long)]
    query: Option<String>,

    #[arg(long, value_enum, default_value_t = VoiceArg::Telemetry)]
    voice: VoiceArg,

    /// Show raw values as percentages
    #[arg(long)]
    percent: bool,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let voice = match cli.voice {
        VoiceArg::Terse     => Voice::Terse,
        VoiceArg::Telemetry => Voice::Telemetry,
    };
    let mut client = AnalysisClient::new(LocalAnalyst::new().voice(voice).percentages(cli.percent));

    println!("{}", client.generate_analysis(cli.chaos, cli.scale, cli.query.as_deref()));
}
