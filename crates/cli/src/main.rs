//! Out-of-order pipeline simulator CLI.
//!
//! This binary is the command-line shell around `oosim_core`. It performs:
//! 1. **Configuration:** built-in defaults, optional JSON config file, and
//!    per-field flag overrides (validated before the simulator is built).
//! 2. **Trace input:** a trace file or stdin.
//! 3. **Run:** drives the pipeline to completion, streaming stage events to
//!    stdout (or a file), then prints the statistics block.

use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::process;

use oosim_core::events::StreamSink;
use oosim_core::trace::TraceReader;
use oosim_core::{SimConfig, Simulator};

#[derive(Parser, Debug)]
#[command(
    name = "oosim",
    author,
    version,
    about = "Cycle-accurate out-of-order superscalar pipeline simulator",
    long_about = "Feed a trace of decoded instructions through a Tomasulo-style \
pipeline and report per-cycle stage events plus aggregate statistics.\n\n\
Examples:\n  oosim run -t traces/gcc.trace\n  oosim run -t traces/gcc.trace -r 2 --k0 1 --k1 1 --k2 1 -f 2\n  \
cat traces/gcc.trace | oosim run -o events.out"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a trace through the pipeline.
    Run {
        /// Trace file; stdin if omitted.
        #[arg(short = 't', long)]
        trace: Option<String>,

        /// JSON configuration file. Flags below override its fields.
        #[arg(long)]
        config: Option<String>,

        /// Result buses (state updates per cycle).
        #[arg(short = 'r', long)]
        result_buses: Option<usize>,

        /// Class-0 function unit count.
        #[arg(long)]
        k0: Option<usize>,

        /// Class-1 function unit count.
        #[arg(long)]
        k1: Option<usize>,

        /// Class-2 function unit count.
        #[arg(long)]
        k2: Option<usize>,

        /// Instructions fetched per cycle.
        #[arg(short = 'f', long)]
        fetch_rate: Option<usize>,

        /// Write the event stream to a file instead of stdout.
        #[arg(short = 'o', long)]
        output: Option<String>,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run {
            trace,
            config,
            result_buses,
            k0,
            k1,
            k2,
            fetch_rate,
            output,
        }) => {
            let mut sim_config = match config {
                Some(path) => load_config(&path),
                None => SimConfig::default(),
            };
            if let Some(r) = result_buses {
                sim_config.result_buses = r;
            }
            if let Some(k) = k0 {
                sim_config.k0 = k;
            }
            if let Some(k) = k1 {
                sim_config.k1 = k;
            }
            if let Some(k) = k2 {
                sim_config.k2 = k;
            }
            if let Some(f) = fetch_rate {
                sim_config.fetch_rate = f;
            }
            if let Err(e) = sim_config.validate() {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
            cmd_run(sim_config, trace, output);
        }
        None => {
            eprintln!("oosim: out-of-order pipeline simulator");
            eprintln!();
            eprintln!("  oosim run -t <trace>         Run a trace file");
            eprintln!("  oosim run -t <trace> -r 2    Override result buses (also --k0/--k1/--k2/-f)");
            eprintln!("  cat <trace> | oosim run      Read the trace from stdin");
            eprintln!();
            eprintln!("  oosim --help  for full options");
            process::exit(1);
        }
    }
}

/// Runs the simulator over the given trace, streaming events, then prints
/// the statistics block to stdout.
fn cmd_run(config: SimConfig, trace: Option<String>, output: Option<String>) {
    let input: Box<dyn BufRead> = match trace {
        Some(path) => match File::open(&path) {
            Ok(file) => Box::new(BufReader::new(file)),
            Err(e) => {
                eprintln!("Error opening trace {}: {}", path, e);
                process::exit(1);
            }
        },
        None => Box::new(BufReader::new(io::stdin())),
    };

    let out: Box<dyn Write> = match output {
        Some(path) => match File::create(&path) {
            Ok(file) => Box::new(file),
            Err(e) => {
                eprintln!("Error creating output {}: {}", path, e);
                process::exit(1);
            }
        },
        None => Box::new(io::stdout()),
    };

    let mut reader = TraceReader::new(input);
    let mut sink = StreamSink::new(BufWriter::new(out));
    let mut sim = Simulator::new(config);

    if let Err(e) = sim.run(&mut reader, &mut sink) {
        eprintln!("Error writing event stream: {}", e);
        process::exit(1);
    }

    sim.report().print();
}

/// Loads a `SimConfig` from a JSON file. Exits with code 1 on I/O or parse
/// errors.
fn load_config(path: &str) -> SimConfig {
    let text = std::fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading config {}: {}", path, e);
        process::exit(1);
    });
    serde_json::from_str(&text).unwrap_or_else(|e| {
        eprintln!("Error parsing config {}: {}", path, e);
        process::exit(1);
    })
}
