//! Reads fixture files back and verifies the invariants the generators guarantee.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;

use crate::driver::{LEVEL_FILE_NAME, TRADE_FILE_NAME};
use crate::error::FixtureError;
use crate::generator::DELIMITER;
use crate::record::{FixtureRecord, LevelRecord, TradeRecord};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FixtureStats {
    pub records: u64,
    /// Level files only, always 0 for trades
    pub batches: u64,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub first_receive_ts: Option<u64>,
    pub last_receive_ts: Option<u64>,
}

impl FixtureStats {
    fn observe(
        &mut self,
        line: u64,
        receive_ts: u64,
        exchange_ts: u64,
        price: Decimal,
    ) -> Result<(), FixtureError> {
        if exchange_ts > receive_ts {
            return Err(violation(
                line,
                format!("exchange_ts {exchange_ts} is after receive_ts {receive_ts}"),
            ));
        }
        if let Some(last) = self.last_receive_ts {
            if receive_ts < last {
                return Err(violation(
                    line,
                    format!("receive_ts {receive_ts} goes back from {last}"),
                ));
            }
        }
        self.records += 1;
        self.first_receive_ts.get_or_insert(receive_ts);
        self.last_receive_ts = Some(receive_ts);
        self.min_price = Some(self.min_price.map_or(price, |min| min.min(price)));
        self.max_price = Some(self.max_price.map_or(price, |max| max.max(price)));
        Ok(())
    }
}

fn violation(line: u64, reason: String) -> FixtureError {
    FixtureError::Invariant { line, reason }
}

/// Iterates the data rows of a fixture, checking the header and the field count on the way.
/// Yields `(line, record)` pairs, `line` being 1-based.
fn rows<T, R>(
    reader: R,
) -> Result<impl Iterator<Item = Result<(u64, T), FixtureError>>, FixtureError>
where
    T: FixtureRecord + DeserializeOwned,
    R: Read,
{
    let mut reader = ReaderBuilder::new()
        .delimiter(DELIMITER)
        .flexible(true)
        .from_reader(reader);
    let headers = reader.headers()?.clone();
    if headers.iter().ne(T::HEADER.iter().copied()) {
        return Err(violation(
            1,
            format!("expected header {:?}, got {:?}", T::HEADER, headers),
        ));
    }

    Ok(reader.into_records().map(move |result| {
        let record: StringRecord = result?;
        let line = record.position().map_or(0, csv::Position::line);
        if record.len() != T::HEADER.len() {
            return Err(violation(
                line,
                format!("expected {} fields, got {}", T::HEADER.len(), record.len()),
            ));
        }
        let row: T = record
            .deserialize(Some(&headers))
            .map_err(|e| violation(line, e.to_string()))?;
        Ok((line, row))
    }))
}

/// # Errors
/// Errors with [`FixtureError::Invariant`] on the first row that breaks an invariant, or when
/// reading fails
pub fn check_trades<R: Read>(reader: R) -> Result<FixtureStats, FixtureError> {
    let mut stats = FixtureStats::default();
    for row in rows::<TradeRecord, _>(reader)? {
        let (line, trade) = row?;
        stats.observe(line, trade.receive_ts, trade.exchange_ts, trade.price)?;
    }
    Ok(stats)
}

/// Besides the trade checks, every run of rows sharing `(receive_ts, exchange_ts)` must start
/// with `rebuild = 1` and carry `rebuild = 0` afterwards.
///
/// # Errors
/// Errors with [`FixtureError::Invariant`] on the first row that breaks an invariant, or when
/// reading fails
pub fn check_levels<R: Read>(reader: R) -> Result<FixtureStats, FixtureError> {
    let mut stats = FixtureStats::default();
    let mut batch: Option<(u64, u64)> = None;
    for row in rows::<LevelRecord, _>(reader)? {
        let (line, level) = row?;
        stats.observe(line, level.receive_ts, level.exchange_ts, level.price)?;

        let key = (level.receive_ts, level.exchange_ts);
        match (batch == Some(key), level.rebuild) {
            (false, true) => stats.batches += 1,
            (true, false) => {}
            (false, false) => {
                return Err(violation(line, "batch does not start with rebuild = 1".into()));
            }
            (true, true) => {
                return Err(violation(line, "rebuild = 1 in the middle of a batch".into()));
            }
        }
        batch = Some(key);
    }
    Ok(stats)
}

/// Checks both fixture files inside `dir`, returning `(trade, level)` statistics.
///
/// # Errors
/// Errors when a file is missing or fails its checks
pub fn check_dir(dir: &Path) -> Result<(FixtureStats, FixtureStats), FixtureError> {
    let trades = check_trades(BufReader::new(File::open(dir.join(TRADE_FILE_NAME))?))?;
    let levels = check_levels(BufReader::new(File::open(dir.join(LEVEL_FILE_NAME))?))?;
    Ok((trades, levels))
}
