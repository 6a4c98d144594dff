use std::ops::RangeInclusive;
use std::path::PathBuf;

use crate::error::FixtureError;

pub const DEFAULT_TARGET_MB: u64 = 100;
pub const DEFAULT_TRADE_SHARE: f64 = 0.5;
pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_OUTPUT_DIR: &str = "resources/input";

pub const BASE_PRICE: f64 = 68_000.0;
pub const PRICE_VOLATILITY: f64 = 0.0005;
/// Microseconds since the Unix epoch
pub const START_TS: u64 = 1_716_810_808_000_000;
pub const TS_STEP: RangeInclusive<u64> = 100..=5_000;
pub const LATENCY: RangeInclusive<u64> = 500..=3_000;
pub const TRADE_QUANTITY: RangeInclusive<f64> = 0.001..=5.0;
pub const LEVEL_QUANTITY: RangeInclusive<f64> = 0.001..=20.0;
pub const LEVEL_START_JITTER: u64 = 10_000;
pub const LEVEL_BATCH_SIZE: RangeInclusive<usize> = 1..=5;
pub const LEVEL_SPREAD: f64 = 50.0;

pub const MIB: u64 = 1024 * 1024;

/// Parameters shared by the trade and level streams.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamConfig {
    /// The stream stops once at least this many bytes (header included) have been written
    pub target_bytes: u64,
    pub base_price: f64,
    /// Largest relative price move per step
    pub volatility: f64,
    pub start_ts: u64,
    pub ts_step: RangeInclusive<u64>,
    /// Subtracted from `receive_ts` to obtain `exchange_ts`
    pub latency: RangeInclusive<u64>,
    pub quantity: RangeInclusive<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LevelConfig {
    pub stream: StreamConfig,
    /// Upper bound of the random offset added to `stream.start_ts`
    pub start_jitter: u64,
    pub batch_size: RangeInclusive<usize>,
    /// Largest absolute distance of a level from the walked price
    pub level_spread: f64,
}

/// Everything the driver needs to produce both fixture files.
#[derive(Debug, Clone, PartialEq)]
pub struct FixtureConfig {
    pub output_dir: PathBuf,
    pub total_bytes: u64,
    /// Fraction of `total_bytes` given to the trade file, the rest goes to the level file
    pub trade_share: f64,
    pub seed: u64,
    /// `target_bytes` is replaced by the driver's split
    pub trade: StreamConfig,
    /// `stream.target_bytes` is replaced by the driver's split
    pub level: LevelConfig,
}

impl StreamConfig {
    #[must_use]
    pub fn trades(target_bytes: u64) -> Self {
        StreamConfig {
            target_bytes,
            base_price: BASE_PRICE,
            volatility: PRICE_VOLATILITY,
            start_ts: START_TS,
            ts_step: TS_STEP,
            latency: LATENCY,
            quantity: TRADE_QUANTITY,
        }
    }

    /// # Errors
    /// Errors when a range is empty or a parameter would break the ordering of timestamps or
    /// the positivity of prices
    pub fn validate(&self) -> Result<(), FixtureError> {
        if !self.base_price.is_finite() || self.base_price <= 0.0 {
            return Err(invalid(format!(
                "base price must be positive, got {}",
                self.base_price
            )));
        }
        if !(0.0..1.0).contains(&self.volatility) {
            return Err(invalid(format!(
                "volatility must be in [0, 1), got {}",
                self.volatility
            )));
        }
        if self.ts_step.is_empty() || *self.ts_step.start() == 0 {
            return Err(invalid(format!(
                "timestamp step must be a non-empty range of positive values, got {:?}",
                self.ts_step
            )));
        }
        if self.latency.is_empty() || *self.latency.start() == 0 {
            return Err(invalid(format!(
                "latency must be a non-empty range of positive values, got {:?}",
                self.latency
            )));
        }
        if *self.latency.end() >= self.start_ts {
            return Err(invalid(format!(
                "latency {:?} reaches past start timestamp {}",
                self.latency, self.start_ts
            )));
        }
        let (low, high) = (*self.quantity.start(), *self.quantity.end());
        if !low.is_finite() || !high.is_finite() || low < 0.0 || low > high {
            return Err(invalid(format!(
                "quantity must be a non-empty, non-negative range, got {:?}",
                self.quantity
            )));
        }
        Ok(())
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        StreamConfig::trades(0)
    }
}

impl LevelConfig {
    #[must_use]
    pub fn levels(target_bytes: u64) -> Self {
        LevelConfig {
            stream: StreamConfig {
                quantity: LEVEL_QUANTITY,
                ..StreamConfig::trades(target_bytes)
            },
            start_jitter: LEVEL_START_JITTER,
            batch_size: LEVEL_BATCH_SIZE,
            level_spread: LEVEL_SPREAD,
        }
    }

    /// # Errors
    /// Errors when the underlying [`StreamConfig`] is invalid, or the batch shape is
    pub fn validate(&self) -> Result<(), FixtureError> {
        self.stream.validate()?;
        if self.batch_size.is_empty() || *self.batch_size.start() == 0 {
            return Err(invalid(format!(
                "batch size must be a non-empty range of positive values, got {:?}",
                self.batch_size
            )));
        }
        if !self.level_spread.is_finite() || self.level_spread < 0.0 {
            return Err(invalid(format!(
                "level spread must be non-negative, got {}",
                self.level_spread
            )));
        }
        self.stream
            .start_ts
            .checked_add(self.start_jitter)
            .ok_or(FixtureError::TimestampOverflow)?;
        Ok(())
    }
}

impl Default for LevelConfig {
    fn default() -> Self {
        LevelConfig::levels(0)
    }
}

impl FixtureConfig {
    /// # Errors
    /// Errors when the share is outside `[0, 1]` or either stream configuration is invalid
    pub fn validate(&self) -> Result<(), FixtureError> {
        if !(0.0..=1.0).contains(&self.trade_share) {
            return Err(invalid(format!(
                "trade share must be in [0, 1], got {}",
                self.trade_share
            )));
        }
        self.trade.validate()?;
        self.level.validate()
    }
}

impl Default for FixtureConfig {
    fn default() -> Self {
        FixtureConfig {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            total_bytes: DEFAULT_TARGET_MB * MIB,
            trade_share: DEFAULT_TRADE_SHARE,
            seed: DEFAULT_SEED,
            trade: StreamConfig::default(),
            level: LevelConfig::default(),
        }
    }
}

fn invalid(reason: String) -> FixtureError {
    FixtureError::InvalidConfig(reason)
}
