use std::error::Error;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use log::debug;

use fixture_gen::check::{check_dir, FixtureStats};
use fixture_gen::config::{
    FixtureConfig, DEFAULT_OUTPUT_DIR, DEFAULT_SEED, DEFAULT_TARGET_MB, DEFAULT_TRADE_SHARE, MIB,
};
use fixture_gen::driver::{run, to_mib, LEVEL_FILE_NAME, TRADE_FILE_NAME};
use fixture_gen::error::FixtureError;

/// Generates synthetic BTCUSDT trade and order book level CSV fixtures
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[clap(subcommand)]
    command: Option<Command>,

    #[clap(flatten)]
    generate: GenerateArgs,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Directory the fixture files are written to
    #[clap(long, parse(from_os_str), default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,
    /// Combined size of both files, in MB
    #[clap(long, default_value_t = DEFAULT_TARGET_MB)]
    size_mb: u64,
    /// Fraction of the size given to the trade file
    #[clap(long, default_value_t = DEFAULT_TRADE_SHARE)]
    trade_share: f64,
    /// Seed of the random stream
    #[clap(long, default_value_t = DEFAULT_SEED)]
    seed: u64,
}

#[derive(Subcommand)]
enum Command {
    /// Verify previously generated fixtures
    Check {
        /// Directory holding the fixture files
        #[clap(long, parse(from_os_str), default_value = DEFAULT_OUTPUT_DIR)]
        output_dir: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Some(Command::Check { output_dir }) => check(&output_dir),
        None => generate(cli.generate),
    }
}

fn generate(args: GenerateArgs) -> Result<(), Box<dyn Error>> {
    debug!("{:?}", args);
    let total_bytes = args.size_mb.checked_mul(MIB).ok_or_else(|| {
        FixtureError::InvalidConfig(format!("{} MB does not fit in u64 bytes", args.size_mb))
    })?;
    let config = FixtureConfig {
        output_dir: args.output_dir,
        total_bytes,
        trade_share: args.trade_share,
        seed: args.seed,
        ..FixtureConfig::default()
    };

    let summary = run(&config)?;
    println!(
        "\nDone! Total: {:.1} MB in {}",
        to_mib(summary.total_size()),
        summary.output_dir.display()
    );
    Ok(())
}

fn check(output_dir: &Path) -> Result<(), Box<dyn Error>> {
    let (trades, levels) = check_dir(output_dir)?;
    print_stats(TRADE_FILE_NAME, &trades);
    print_stats(LEVEL_FILE_NAME, &levels);
    println!("\nOK: {}", output_dir.display());
    Ok(())
}

fn print_stats(name: &str, stats: &FixtureStats) {
    println!("{}: {} records", name, stats.records);
    if stats.batches > 0 {
        println!("  batches:  {}", stats.batches);
    }
    if let (Some(min), Some(max)) = (stats.min_price, stats.max_price) {
        println!("  price:    {} .. {}", min, max);
    }
    if let (Some(first), Some(last)) = (stats.first_receive_ts, stats.last_receive_ts) {
        println!("  receive:  {} .. {}", first, last);
    }
}
