//! Trade and order book level streams.
//!
//! Both generators keep writing until the byte target is reached. The size check runs after a
//! record (or a whole level batch) has been written, so a file always holds the header and at
//! least one row, and may overshoot the target by up to one row or batch.

use std::io::Write;

use csv::{ByteRecord, QuoteStyle, Terminator, WriterBuilder};
use log::debug;
use rand::Rng;
use rust_decimal::prelude::*;

use crate::config::{LevelConfig, StreamConfig};
use crate::error::FixtureError;
use crate::record::{to_fixed, FixtureRecord, LevelRecord, TradeRecord};

pub const DELIMITER: u8 = b';';

/// Writes fixture rows and keeps track of how many bytes they take up.
pub struct RecordSink<W: Write> {
    writer: csv::Writer<W>,
    scratch: ByteRecord,
    written: u64,
}

impl<W: Write> RecordSink<W> {
    /// Wraps `inner` and writes the header of `T`.
    ///
    /// # Errors
    /// Errors when the header cannot be written
    pub fn new<T: FixtureRecord>(inner: W) -> Result<Self, FixtureError> {
        let writer = WriterBuilder::new()
            .has_headers(false)
            .delimiter(DELIMITER)
            .terminator(Terminator::Any(b'\n'))
            .quote_style(QuoteStyle::Never)
            .from_writer(inner);
        let mut sink = RecordSink {
            writer,
            scratch: ByteRecord::from(T::HEADER.to_vec()),
            written: 0,
        };
        sink.write_scratch()?;
        Ok(sink)
    }

    /// # Errors
    /// Errors when the underlying writer fails
    pub fn write<T: FixtureRecord>(&mut self, record: &T) -> Result<(), FixtureError> {
        record.fill(&mut self.scratch);
        self.write_scratch()
    }

    /// Bytes written so far, header included
    #[must_use]
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Flushes everything to the inner writer and returns the total byte count.
    ///
    /// # Errors
    /// Errors when the final flush fails
    pub fn finish(mut self) -> Result<u64, FixtureError> {
        self.writer.flush()?;
        Ok(self.written)
    }

    fn write_scratch(&mut self) -> Result<(), FixtureError> {
        self.writer.write_byte_record(&self.scratch)?;
        // Nothing is quoted, so a line is its fields, one delimiter between each and a newline.
        self.written += (self.scratch.as_slice().len() + self.scratch.len()) as u64;
        Ok(())
    }
}

/// Multiplicative random walk, rounded to fixed precision after every step.
#[derive(Debug, Clone)]
pub struct PriceWalk {
    price: f64,
    volatility: f64,
}

impl PriceWalk {
    #[must_use]
    pub fn new(base_price: f64, volatility: f64) -> Self {
        PriceWalk {
            price: base_price,
            volatility,
        }
    }

    /// Moves the price by a uniform factor in `[-volatility, volatility]` and returns it.
    ///
    /// # Errors
    /// Errors when the new price cannot be represented as a decimal
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Decimal, FixtureError> {
        let raw = self.price * (1.0 + rng.gen_range(-self.volatility..=self.volatility));
        let price = to_fixed(raw)?;
        self.price = price.to_f64().ok_or(FixtureError::Unrepresentable(raw))?;
        Ok(price)
    }

    #[must_use]
    pub fn current(&self) -> f64 {
        self.price
    }
}

fn advance<R: Rng + ?Sized>(
    ts: u64,
    config: &StreamConfig,
    rng: &mut R,
) -> Result<(u64, u64), FixtureError> {
    let receive_ts = ts
        .checked_add(rng.gen_range(config.ts_step.clone()))
        .ok_or(FixtureError::TimestampOverflow)?;
    // validated: latency stays below start_ts <= receive_ts
    let exchange_ts = receive_ts - rng.gen_range(config.latency.clone());
    Ok((receive_ts, exchange_ts))
}

/// Writes trade ticks into `sink` until `config.target_bytes` is reached.
/// Returns the number of bytes written, header included.
///
/// # Errors
/// Errors when `config` is invalid or the sink fails
pub fn generate_trades<W, R>(
    sink: W,
    config: &StreamConfig,
    rng: &mut R,
) -> Result<u64, FixtureError>
where
    W: Write,
    R: Rng + ?Sized,
{
    config.validate()?;
    let mut sink = RecordSink::new::<TradeRecord>(sink)?;
    let mut walk = PriceWalk::new(config.base_price, config.volatility);
    let mut ts = config.start_ts;
    let mut count: u64 = 0;

    loop {
        let price = walk.step(rng)?;
        let (receive_ts, exchange_ts) = advance(ts, config, rng)?;
        ts = receive_ts;
        let trade = TradeRecord {
            receive_ts,
            exchange_ts,
            price,
            quantity: to_fixed(rng.gen_range(config.quantity.clone()))?,
            side: rng.gen(),
        };
        sink.write(&trade)?;
        count += 1;

        if sink.written() >= config.target_bytes {
            break;
        }
    }

    debug!("Wrote {} trades, last price {}", count, walk.current());
    sink.finish()
}

/// Writes batches of order book levels into `sink` until `config.stream.target_bytes` is
/// reached. Returns the number of bytes written, header included.
///
/// # Errors
/// Errors when `config` is invalid or the sink fails
pub fn generate_levels<W, R>(
    sink: W,
    config: &LevelConfig,
    rng: &mut R,
) -> Result<u64, FixtureError>
where
    W: Write,
    R: Rng + ?Sized,
{
    config.validate()?;
    let stream = &config.stream;
    let mut sink = RecordSink::new::<LevelRecord>(sink)?;
    let mut walk = PriceWalk::new(stream.base_price, stream.volatility);
    // validated not to overflow
    let mut ts = stream.start_ts + rng.gen_range(0..=config.start_jitter);
    let mut batches: u64 = 0;

    loop {
        walk.step(rng)?;
        let levels = rng.gen_range(config.batch_size.clone());
        let (receive_ts, exchange_ts) = advance(ts, stream, rng)?;
        ts = receive_ts;

        for i in 0..levels {
            let offset = rng.gen_range(-config.level_spread..=config.level_spread);
            let level = LevelRecord {
                receive_ts,
                exchange_ts,
                price: to_fixed(walk.current() + offset)?,
                quantity: to_fixed(rng.gen_range(stream.quantity.clone()))?,
                side: rng.gen(),
                rebuild: i == 0,
            };
            sink.write(&level)?;
        }
        batches += 1;

        if sink.written() >= stream.target_bytes {
            break;
        }
    }

    debug!("Wrote {} level batches, last price {}", batches, walk.current());
    sink.finish()
}
