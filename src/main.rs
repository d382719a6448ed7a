//! Energy policy entry point: CLI wiring, one-shot evaluation and day replay.

use std::path::Path;
use std::process;

use tracing::{error, info};

use home_energy_policy::config::SnapshotConfig;
use home_energy_policy::io::export::export_csv;
use home_energy_policy::logging;
use home_energy_policy::sim::kpi::ReplayKpis;
use home_energy_policy::sim::replay::Replay;

/// Parsed CLI arguments.
struct CliArgs {
    snapshot_path: Option<String>,
    preset: Option<String>,
    replay: bool,
    json: bool,
    telemetry_out: Option<String>,
    #[cfg(feature = "api")]
    serve: bool,
    #[cfg(feature = "api")]
    port: u16,
}

fn print_help() {
    eprintln!("home-energy-policy — smart-home energy policy engine");
    eprintln!();
    eprintln!("Usage: home-energy-policy [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --snapshot <path>        Load snapshot from TOML config file");
    eprintln!("  --preset <name>          Use a built-in preset (baseline, peak_price, night, over_quota)");
    eprintln!("  --json                   Print the evaluation result as JSON");
    eprintln!("  --replay                 Replay a full day of evaluation cycles");
    eprintln!("  --telemetry-out <path>   Export replay steps to CSV (implies --replay)");
    #[cfg(feature = "api")]
    {
        eprintln!("  --serve                  Start REST API server (implies --replay)");
        eprintln!("  --port <u16>             API server port (default: 3000)");
    }
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("If no --snapshot or --preset is given, the baseline preset is used.");
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        snapshot_path: None,
        preset: None,
        replay: false,
        json: false,
        telemetry_out: None,
        #[cfg(feature = "api")]
        serve: false,
        #[cfg(feature = "api")]
        port: 3000,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--snapshot" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --snapshot requires a path argument");
                    process::exit(1);
                }
                cli.snapshot_path = Some(args[i].clone());
            }
            "--preset" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --preset requires a name argument");
                    process::exit(1);
                }
                cli.preset = Some(args[i].clone());
            }
            "--json" => {
                cli.json = true;
            }
            "--replay" => {
                cli.replay = true;
            }
            "--telemetry-out" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --telemetry-out requires a path argument");
                    process::exit(1);
                }
                cli.telemetry_out = Some(args[i].clone());
                cli.replay = true;
            }
            #[cfg(feature = "api")]
            "--serve" => {
                cli.serve = true;
                cli.replay = true;
            }
            #[cfg(feature = "api")]
            "--port" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --port requires a u16 argument");
                    process::exit(1);
                }
                if let Ok(p) = args[i].parse::<u16>() {
                    cli.port = p;
                } else {
                    eprintln!("error: --port value \"{}\" is not a valid u16", args[i]);
                    process::exit(1);
                }
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    if cli.snapshot_path.is_some() && cli.preset.is_some() {
        eprintln!("error: --snapshot and --preset are mutually exclusive");
        process::exit(1);
    }

    cli
}

fn load_config(cli: &CliArgs) -> SnapshotConfig {
    let loaded = if let Some(ref path) = cli.snapshot_path {
        SnapshotConfig::from_toml_file(Path::new(path))
    } else if let Some(ref name) = cli.preset {
        SnapshotConfig::from_preset(name)
    } else {
        Ok(SnapshotConfig::baseline())
    };

    let config = loaded.unwrap_or_else(|e| {
        eprintln!("{e}");
        process::exit(1);
    });

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }
    config
}

fn main() {
    logging::init();
    let cli = parse_args();
    let config = load_config(&cli);

    let snapshot = config.build_snapshot().unwrap_or_else(|e| {
        eprintln!("{e}");
        process::exit(1);
    });
    let result = config.energy_policy().evaluate(&snapshot);

    if cli.json {
        match serde_json::to_string_pretty(&result) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                error!("failed to serialize result: {e}");
                process::exit(1);
            }
        }
    } else {
        println!("Evaluation at {}", snapshot.current_time);
        print!("{result}");
    }

    if !cli.replay {
        return;
    }

    let mut replay = Replay::from_config(&config).unwrap_or_else(|e| {
        eprintln!("{e}");
        process::exit(1);
    });
    let records = replay.run();
    let kpis = ReplayKpis::from_records(&records);

    println!();
    for r in &records {
        println!("{r}");
    }
    println!("\n{kpis}");

    if let Some(ref path) = cli.telemetry_out {
        if let Err(e) = export_csv(&records, Path::new(path)) {
            error!("failed to write CSV: {e}");
            process::exit(1);
        }
        info!(path = %path, "telemetry written");
    }

    #[cfg(feature = "api")]
    if cli.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        let state = Arc::new(home_energy_policy::api::AppState {
            config,
            kpis,
            records,
        });
        let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
        let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
            error!("failed to create tokio runtime: {e}");
            process::exit(1);
        });
        if let Err(e) = rt.block_on(home_energy_policy::api::serve(state, addr)) {
            error!("API server stopped: {e}");
            process::exit(1);
        }
    }
}
