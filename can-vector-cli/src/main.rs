//! CAN Test Vector Generator CLI
//!
//! Command-line front end for the can-vector-gen library:
//! - Loads DBC catalogues given on the command line or in config.toml
//! - Sweeps every selected signal with a seeded random source
//! - Writes one JSON object per test vector (JSON lines)

use anyhow::{bail, Context, Result};
use can_vector_gen::{GeneratorConfig, VectorGenerator};
use clap::Parser;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

mod config;

use config::{parse_can_id, AppConfig};

/// CAN Test Vector Generator - Produce decoder test vectors from DBC files
#[derive(Parser, Debug)]
#[command(name = "can-vector-cli")]
#[command(about = "Generate multiplexer-aware CAN test vectors from DBC files", long_about = None)]
#[command(version)]
struct Args {
    /// Path to DBC file(s) (can be repeated)
    #[arg(long, value_name = "FILE")]
    dbc: Vec<PathBuf>,

    /// Seed for the random source
    #[arg(long, value_name = "N")]
    seed: Option<u64>,

    /// Frames to generate per signal
    #[arg(long, value_name = "N")]
    iters: Option<usize>,

    /// Stop after this many signals (0 = no limit)
    #[arg(long, value_name = "N")]
    max_signals: Option<usize>,

    /// Only cover these CAN IDs, decimal or 0x hex (can be repeated)
    #[arg(long = "can-id", value_name = "ID", value_parser = parse_can_id)]
    can_ids: Vec<u32>,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output file for test vectors (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    log::info!("CAN Vector Generator CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using generator library v{}", can_vector_gen::VERSION);

    let file_config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };
    let app = merge_args(file_config, &args);

    if app.input.dbc_files.is_empty() {
        bail!("No DBC files given (use --dbc or [input] dbc_files in --config)");
    }

    let mut generator = VectorGenerator::new();
    for dbc_path in &app.input.dbc_files {
        generator
            .add_dbc(dbc_path)
            .with_context(|| format!("Error loading DBC: {:?}", dbc_path))?;
    }

    let stats = generator.database_stats();
    log::info!(
        "Signal database: {} messages, {} signals, {} multiplexed",
        stats.num_messages,
        stats.num_signals,
        stats.num_multiplexed
    );

    let written = match &app.output.file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {:?}", path))?;
            write_vectors(&generator, app.generator, BufWriter::new(file))?
        }
        None => write_vectors(&generator, app.generator, io::stdout().lock())?,
    };

    log::info!("Wrote {} test vectors", written);
    Ok(())
}

/// Apply command-line flags on top of the file configuration
fn merge_args(mut app: AppConfig, args: &Args) -> AppConfig {
    app.input.dbc_files.extend(args.dbc.iter().cloned());

    if let Some(seed) = args.seed {
        app.generator.seed = seed;
    }
    if let Some(iters) = args.iters {
        app.generator.iters_per_signal = iters;
    }
    if let Some(max_signals) = args.max_signals {
        app.generator.max_signals = max_signals;
    }
    if !args.can_ids.is_empty() {
        app.generator.can_ids = Some(args.can_ids.clone());
    }
    if let Some(output) = &args.output {
        app.output.file = Some(output.clone());
    }
    app
}

/// Sweep the catalogue and write one JSON line per vector. Returns the count.
fn write_vectors<W: Write>(
    generator: &VectorGenerator,
    config: GeneratorConfig,
    mut writer: W,
) -> Result<usize> {
    let mut count = 0;
    for vector in generator.generate(config) {
        let vector = vector?;
        serde_json::to_writer(&mut writer, &vector)?;
        writer.write_all(b"\n")?;
        count += 1;
    }
    writer.flush()?;
    Ok(count)
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    // Logs go to stderr so stdout carries only JSON lines
    Builder::new()
        .filter_level(level)
        .target(env_logger::Target::Stderr)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
