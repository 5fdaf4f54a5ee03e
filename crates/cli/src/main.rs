//! Load/store unit simulator CLI.
//!
//! This binary replays a JSON memory-operation trace through the LSU model.
//! It performs:
//! 1. **Trace run:** Load a trace (and optional config), simulate, report.
//! 2. **Logging:** `RUST_LOG=debug` exposes dispatch decisions and group
//!    dependency edges; `--dump` adds a per-cycle state dump.

use clap::{Parser, Subcommand};
use std::{fs, process};

use lsu_core::config::Config;
use lsu_core::sim::{Simulator, load_trace};

#[derive(Parser, Debug)]
#[command(
    name = "lsusim",
    author,
    version,
    about = "Cycle-accurate load/store unit simulator",
    long_about = "Replay a JSON memory-operation trace through the load/store unit model.\n\nExamples:\n  lsusim run -f traces/mixed.json\n  lsusim run -f traces/mixed.json -c config.json --max-cycles 100000\n  RUST_LOG=debug lsusim run -f traces/mixed.json --dump"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a trace file and print run statistics.
    Run {
        /// Trace file (JSON array of memory operations).
        #[arg(short, long)]
        file: String,

        /// Configuration file (JSON); defaults apply when omitted.
        #[arg(short, long)]
        config: Option<String>,

        /// Abort the run after this many cycles.
        #[arg(long, default_value_t = 1_000_000)]
        max_cycles: u64,

        /// Dump unit state after every cycle (at debug log level).
        #[arg(long)]
        dump: bool,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            file,
            config,
            max_cycles,
            dump,
        } => cmd_run(&file, config.as_deref(), max_cycles, dump),
    }
}

/// Runs the simulator: loads trace and config, then loops on `tick` until the
/// program drains or the cycle limit is hit.
fn cmd_run(trace_path: &str, config_path: Option<&str>, max_cycles: u64, dump: bool) {
    let config = match config_path {
        Some(path) => load_config(path),
        None => Config::default(),
    };

    let ops = load_trace(trace_path).unwrap_or_else(|e| {
        eprintln!("[!] {e}");
        process::exit(1);
    });
    println!("[*] trace: {} ({} ops)", trace_path, ops.len());

    let mut sim = Simulator::from_trace(&ops, &config);
    sim.dump_each_cycle = dump;
    let cycles = sim.run(max_cycles);

    if !sim.is_done() {
        eprintln!("[!] trace did not drain within {max_cycles} cycles");
        sim.stats.print();
        process::exit(1);
    }

    println!("[*] drained in {cycles} cycles");
    println!();
    sim.stats.print();
}

/// Reads and parses a JSON configuration file; exits on failure.
fn load_config(path: &str) -> Config {
    let text = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("[!] cannot read config {path}: {e}");
        process::exit(1);
    });
    serde_json::from_str(&text).unwrap_or_else(|e| {
        eprintln!("[!] malformed config {path}: {e}");
        process::exit(1);
    })
}
