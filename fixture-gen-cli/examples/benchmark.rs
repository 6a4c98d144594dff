//! Times both generators against a sink that discards everything.
//! can be run with `cargo run --release --example benchmark`

use std::error::Error;
use std::io;
use std::time::Instant;

use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

use fixture_gen::config::{LevelConfig, StreamConfig, DEFAULT_SEED, MIB};
use fixture_gen::driver::to_mib;
use fixture_gen::generator::{generate_levels, generate_trades};

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut rng = StdRng::seed_from_u64(DEFAULT_SEED);

    let start = Instant::now();
    let written = generate_trades(io::sink(), &StreamConfig::trades(50 * MIB), &mut rng)?;
    let elapsed = start.elapsed();
    info!(
        "Trades: {:.1} MB in {:.2?} ({:.1} MB/s)",
        to_mib(written),
        elapsed,
        to_mib(written) / elapsed.as_secs_f64()
    );

    let start = Instant::now();
    let written = generate_levels(io::sink(), &LevelConfig::levels(50 * MIB), &mut rng)?;
    let elapsed = start.elapsed();
    info!(
        "Levels: {:.1} MB in {:.2?} ({:.1} MB/s)",
        to_mib(written),
        elapsed,
        to_mib(written) / elapsed.as_secs_f64()
    );

    Ok(())
}
