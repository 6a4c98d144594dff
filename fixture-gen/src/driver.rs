use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::{FixtureConfig, LevelConfig, StreamConfig, MIB};
use crate::error::FixtureError;
use crate::generator::{generate_levels, generate_trades};

pub const TRADE_FILE_NAME: &str = "btcusdt_trade_2024.csv";
pub const LEVEL_FILE_NAME: &str = "btcusdt_level_2024.csv";

const WRITE_BUFFER_SIZE: usize = 1 << 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub path: PathBuf,
    pub bytes_written: u64,
    pub size_on_disk: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub output_dir: PathBuf,
    pub trade: FileReport,
    pub level: FileReport,
}

impl Summary {
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.trade.size_on_disk + self.level.size_on_disk
    }
}

/// Splits `total` into `(trade_bytes, level_bytes)`, the trade side rounded down.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn split_target(total: u64, trade_share: f64) -> (u64, u64) {
    let trade = ((total as f64 * trade_share) as u64).min(total);
    (trade, total - trade)
}

#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn to_mib(bytes: u64) -> f64 {
    bytes as f64 / MIB as f64
}

/// Creates the output directory and writes the trade file, then the level file, from a single
/// random stream seeded with `config.seed`.
///
/// # Errors
/// Errors when `config` is invalid, or on any filesystem failure. A file being written when the
/// error happens is left on disk as is.
pub fn run(config: &FixtureConfig) -> Result<Summary, FixtureError> {
    config.validate()?;
    fs::create_dir_all(&config.output_dir)?;

    let (trade_bytes, level_bytes) = split_target(config.total_bytes, config.trade_share);
    debug!(
        "Splitting {} bytes into {} trade / {} level",
        config.total_bytes, trade_bytes, level_bytes
    );
    let trade_config = StreamConfig {
        target_bytes: trade_bytes,
        ..config.trade.clone()
    };
    let level_config = LevelConfig {
        stream: StreamConfig {
            target_bytes: level_bytes,
            ..config.level.stream.clone()
        },
        ..config.level.clone()
    };

    let mut rng = StdRng::seed_from_u64(config.seed);
    let trade = write_file(&config.output_dir.join(TRADE_FILE_NAME), |sink| {
        generate_trades(sink, &trade_config, &mut rng)
    })?;
    let level = write_file(&config.output_dir.join(LEVEL_FILE_NAME), |sink| {
        generate_levels(sink, &level_config, &mut rng)
    })?;

    Ok(Summary {
        output_dir: config.output_dir.clone(),
        trade,
        level,
    })
}

fn write_file<F>(path: &Path, generate: F) -> Result<FileReport, FixtureError>
where
    F: FnOnce(BufWriter<File>) -> Result<u64, FixtureError>,
{
    let name = path.file_name().unwrap_or(path.as_os_str()).to_string_lossy();
    info!("Generating {}...", name);

    let file = File::create(path)?;
    let bytes_written = generate(BufWriter::with_capacity(WRITE_BUFFER_SIZE, file))?;
    let size_on_disk = fs::metadata(path)?.len();
    info!("  -> {}: {:.1} MB", name, to_mib(size_on_disk));

    Ok(FileReport {
        path: path.to_path_buf(),
        bytes_written,
        size_on_disk,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config(dir: &Path, total_bytes: u64) -> FixtureConfig {
        FixtureConfig {
            output_dir: dir.to_path_buf(),
            total_bytes,
            ..FixtureConfig::default()
        }
    }

    #[test]
    fn test_split_target() {
        assert_eq!(split_target(100, 0.5), (50, 50));
        assert_eq!(split_target(101, 0.5), (50, 51));
        assert_eq!(split_target(100, 0.0), (0, 100));
        assert_eq!(split_target(100, 1.0), (100, 0));
        assert_eq!(split_target(0, 0.5), (0, 0));
        assert_eq!(split_target(1000, 0.333), (333, 667));
    }

    #[test]
    fn test_to_mib() {
        assert!((to_mib(MIB) - 1.0).abs() < f64::EPSILON);
        assert!((to_mib(MIB / 2) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_run_writes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let output_dir = dir.path().join("nested").join("input");
        let summary = run(&small_config(&output_dir, 32 * 1024)).unwrap();

        assert_eq!(summary.trade.path, output_dir.join(TRADE_FILE_NAME));
        assert_eq!(summary.level.path, output_dir.join(LEVEL_FILE_NAME));
        for report in [&summary.trade, &summary.level] {
            assert!(report.bytes_written >= 16 * 1024);
            assert_eq!(report.bytes_written, report.size_on_disk);
            assert_eq!(fs::metadata(&report.path).unwrap().len(), report.size_on_disk);
        }
        assert!(summary.total_size() >= 32 * 1024);
    }

    #[test]
    fn test_run_truncates_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        let big = run(&small_config(dir.path(), 64 * 1024)).unwrap();
        let small = run(&small_config(dir.path(), 0)).unwrap();
        assert!(small.trade.size_on_disk < big.trade.size_on_disk);
        assert_eq!(
            fs::metadata(dir.path().join(TRADE_FILE_NAME)).unwrap().len(),
            small.trade.size_on_disk
        );
    }

    #[test]
    fn test_run_invalid_config_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output_dir = dir.path().join("input");
        let config = FixtureConfig {
            trade_share: 2.0,
            ..small_config(&output_dir, 1024)
        };
        assert!(matches!(run(&config), Err(FixtureError::InvalidConfig(_))));
        assert!(!output_dir.exists());
    }
}
