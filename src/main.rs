//! FastLED WASM build flags CLI
//!
//! Entry point for the `fastled-wasm-flags` command-line tool.

use clap::{Parser, Subcommand};
use fastled_wasm_flags::layers::{BuildMode, LayerSource, LayerStore, Phase, Target};
use fastled_wasm_flags::view::{render_cmake, LayerSummary};
use fastled_wasm_flags::{Composer, Environment, FlagError};
use std::fs;
use std::path::PathBuf;
use std::process;

/// Composition or validation refused the request.
const EXIT_REJECTED: i32 = 1;

/// The flag document or arguments could not be used.
const EXIT_USAGE: i32 = 2;

#[derive(Parser)]
#[command(name = "fastled-wasm-flags")]
#[command(about = "Compose FastLED WASM compiler and linker flags", version)]
struct Cli {
    /// Path to build_flags.toml (default: FastLED source tree, then bundled)
    #[arg(long, global = true)]
    flags: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the flags for a target and build mode
    Compose {
        /// sketch or library
        #[arg(long, short = 't')]
        target: Target,

        /// debug, quick or release
        #[arg(long, short = 'm', default_value = "quick")]
        mode: BuildMode,

        /// compile or link (ignored with --json, which prints both)
        #[arg(long, short = 'p', default_value = "compile")]
        phase: Phase,

        /// Print the full composition payload as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check sketch/library flag parity
    Validate {
        /// Build mode to check (default: all)
        #[arg(long, short = 'm')]
        mode: Option<BuildMode>,
    },

    /// Render the CMake flag view
    Cmake {
        /// Write to a file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Load the flag document and print a summary
    Check {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let env = Environment::from_process();
    let store = match open_store(cli.flags.as_ref(), &env) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Error loading build flags: {}", e);
            process::exit(EXIT_USAGE);
        }
    };

    match cli.command {
        Commands::Compose {
            target,
            mode,
            phase,
            json,
        } => run_compose(&store, &env, target, mode, phase, json),
        Commands::Validate { mode } => run_validate(&store, &env, mode),
        Commands::Cmake { output } => run_cmake(&store, output),
        Commands::Check { json } => run_check(&store, json),
    }
}

fn setup_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp_secs()
        .init();
}

fn open_store(flags: Option<&PathBuf>, env: &Environment) -> Result<LayerStore, FlagError> {
    let source = LayerSource::discover(flags.map(PathBuf::as_path), env)?;
    LayerStore::open(&source)
}

fn exit_code(err: &FlagError) -> i32 {
    match err {
        FlagError::Mismatch { .. }
        | FlagError::UnresolvedPlaceholder { .. }
        | FlagError::ArchiveConflict { .. } => EXIT_REJECTED,
        _ => EXIT_USAGE,
    }
}

fn run_compose(
    store: &LayerStore,
    env: &Environment,
    target: Target,
    mode: BuildMode,
    phase: Phase,
    json: bool,
) {
    let set = store.snapshot();
    let composer = Composer::new(&set);

    if json {
        match composer.compose_request(target, mode, env) {
            Ok(payload) => match payload.to_json() {
                Ok(text) => println!("{}", text),
                Err(e) => {
                    eprintln!("Error serializing output: {}", e);
                    process::exit(EXIT_USAGE);
                }
            },
            Err(e) => {
                eprintln!("Error [{}]: {}", e.code(), e);
                process::exit(exit_code(&e));
            }
        }
        return;
    }

    match composer.compose(target, mode, phase, env) {
        Ok(composition) => {
            for token in &composition.tokens {
                println!("{}", token);
            }
        }
        Err(e) => {
            eprintln!("Error [{}]: {}", e.code(), e);
            process::exit(exit_code(&e));
        }
    }
}

fn run_validate(store: &LayerStore, env: &Environment, mode: Option<BuildMode>) {
    let set = store.snapshot();
    let composer = Composer::new(&set);
    let modes: Vec<BuildMode> = match mode {
        Some(m) => vec![m],
        None => BuildMode::ALL.to_vec(),
    };

    let mut failed = false;
    for mode in modes {
        match composer.validate(mode, env) {
            Ok(result) => {
                println!("{}: ok ({} keys)", mode, result.matched.len());
            }
            Err(e) => {
                failed = true;
                println!("{}: FAILED {}", mode, e);
            }
        }
    }

    if failed {
        process::exit(EXIT_REJECTED);
    }
}

fn run_cmake(store: &LayerStore, output: Option<PathBuf>) {
    let set = store.snapshot();
    let text = render_cmake(&set);

    match output {
        Some(path) => {
            if let Err(e) = fs::write(&path, text) {
                eprintln!("Error writing {}: {}", path.display(), e);
                process::exit(EXIT_USAGE);
            }
            log::info!("Wrote CMake flags to {}", path.display());
        }
        None => print!("{}", text),
    }
}

fn run_check(store: &LayerStore, json: bool) {
    let set = store.snapshot();
    let summary = LayerSummary::of(&set);

    if json {
        match serde_json::to_string_pretty(&summary) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error serializing output: {}", e);
                process::exit(EXIT_USAGE);
            }
        }
    } else {
        println!("{}", summary.to_human());
    }
}
