//! Replay a recorded detector session (JSON lines) through the interpreter
//! and print the control signal for every frame.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use clap::Parser;
use hand_signal::wire::parse_detection;
use hand_signal::GestureInterpreter;

#[derive(Parser, Debug)]
#[command(name = "signal_replay", about = "Replay detector JSON lines into chaos/scale signals")]
struct Cli {
    /// Recorded session; reads stdin when omitted
    input: Option<PathBuf>,

    /// Minimum detector confidence for a hand to count
    #[arg(long, default_value_t = 0.5)]
    min_score: f32,

    /// Initial chaos before any hand is seen
    #[arg(long, default_value_t = 0.1)]
    chaos: f32,

    /// Initial scale before any hand is seen
    #[arg(long, default_value_t = 0.5)]
    scale: f32,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let reader: Box<dyn BufRead> = match &cli.input {
        Some(path) => match File::open(path) {
            Ok(f) => Box::new(BufReader::new(f)),
            Err(e) => {
                log::error!("cannot open {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => Box::new(BufReader::new(io::stdin())),
    };

    let mut interpreter = GestureInterpreter::with_initial(cli.chaos, cli.scale);
    println!("{:>6}  {:>8}  {:>6}  {:>6}  {}", "frame", "ts(ms)", "chaos", "scale", "hands");

    for (frame, line) in reader.lines().enumerate() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                log::error!("read failed at line {}: {}", frame + 1, e);
                std::process::exit(1);
            }
        };
        if line.trim().is_empty() { continue; }

        // A bad line is a missed frame: the interpreter sees no hands.
        let (ts, hands) = match parse_detection(&line) {
            Ok(msg) => {
                if let Some(err) = &msg.error {
                    log::warn!("frame {}: detector reported {}", frame, err);
                }
                (msg.timestamp_ms, msg.observations(cli.min_score))
            }
            Err(e) => {
                log::warn!("frame {}: {}", frame, e);
                (None, Vec::new())
            }
        };

        let signal = interpreter.interpret(&hands);
        let labels: Vec<&str> = hands.iter().map(|h| h.handedness.name()).collect();
        println!(
            "{:>6}  {:>8}  {:>6.3}  {:>6.3}  {}",
            frame,
            ts.map(|t| t.to_string()).unwrap_or_else(|| "-".to_string()),
            signal.chaos(),
            signal.scale(),
            if signal.is_active() { labels.join("+") } else { "idle".to_string() },
        );
    }
}
