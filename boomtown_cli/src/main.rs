// CLI entry point for the Boomtown driver.
//
// Loads (or seeds) a world, polls the engine on an interval, and prints each
// news item as it is written. See `driver.rs` for the loop and `host.rs` for
// the single-writer discipline.
//
// Usage:
//   boomtown [OPTIONS]
//     --world <PATH>          World snapshot JSON (created on first save)
//     --config <PATH>         GameConfig JSON (default: built-in)
//     --catalog <PATH>        Catalog JSON (default: built-in)
//     --seed <N>              Random seed (default: 1)
//     --interval-ms <N>       Poll interval in milliseconds (default: 1000)
//     --polls <N>             Stop after N polls (default: run forever)
//     --simulated             Advance a virtual clock instead of sleeping
//     --demo                  Seed a demo town when no world is stored
//     --log <LEVEL>           Log filter when RUST_LOG is unset (default: info)

use std::path::PathBuf;

use boomtown_cli::driver::{self, DriverConfig};
use boomtown_cli::telemetry::init_tracing;

fn main() {
    let config = parse_args();
    init_tracing(&config.log_level);

    if let Err(e) = driver::run(&config) {
        eprintln!("boomtown: {e}");
        std::process::exit(1);
    }
}

/// Parse command-line arguments into a `DriverConfig`. Uses simple
/// `std::env::args()` matching, no clap dependency.
fn parse_args() -> DriverConfig {
    let mut config = DriverConfig::default();
    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--world" => {
                i += 1;
                config.world_path = Some(path_arg(&args, i, "--world"));
            }
            "--config" => {
                i += 1;
                config.config_path = Some(path_arg(&args, i, "--config"));
            }
            "--catalog" => {
                i += 1;
                config.catalog_path = Some(path_arg(&args, i, "--catalog"));
            }
            "--seed" => {
                i += 1;
                config.seed = args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                    eprintln!("--seed requires a valid number");
                    std::process::exit(1);
                });
            }
            "--interval-ms" => {
                i += 1;
                config.interval_ms =
                    args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                        eprintln!("--interval-ms requires a valid number");
                        std::process::exit(1);
                    });
            }
            "--polls" => {
                i += 1;
                config.polls = args.get(i).and_then(|s| s.parse().ok()).or_else(|| {
                    eprintln!("--polls requires a valid number");
                    std::process::exit(1);
                });
            }
            "--log" => {
                i += 1;
                config.log_level = args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--log requires a value");
                    std::process::exit(1);
                });
            }
            "--simulated" => config.simulated = true,
            "--demo" => config.demo = true,
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {other}");
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    config
}

fn path_arg(args: &[String], i: usize, flag: &str) -> PathBuf {
    args.get(i).map(PathBuf::from).unwrap_or_else(|| {
        eprintln!("{flag} requires a path");
        std::process::exit(1);
    })
}

fn print_usage() {
    println!("Usage: boomtown [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --world <PATH>          World snapshot JSON (created on first save)");
    println!("  --config <PATH>         GameConfig JSON (default: built-in)");
    println!("  --catalog <PATH>        Catalog JSON (default: built-in)");
    println!("  --seed <N>              Random seed (default: 1)");
    println!("  --interval-ms <N>       Poll interval in milliseconds (default: 1000)");
    println!("  --polls <N>             Stop after N polls (default: run forever)");
    println!("  --simulated             Advance a virtual clock instead of sleeping");
    println!("  --demo                  Seed a demo town when no world is stored");
    println!("  --log <LEVEL>           Log filter when RUST_LOG is unset (default: info)");
    println!("  --help, -h              Show this help");
}
