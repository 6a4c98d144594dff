use csv::ByteRecord;
use rand::distributions::{Distribution, Standard};
use rand::Rng;
use rust_decimal::prelude::*;
use serde::{de, Deserialize, Deserializer};

use crate::error::FixtureError;

pub const NUM_DECIMAL_PLACES: u32 = 8;

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Bid,
    Ask,
}

impl Side {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Bid => "bid",
            Side::Ask => "ask",
        }
    }
}

impl Distribution<Side> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Side {
        if rng.gen::<bool>() {
            Side::Bid
        } else {
            Side::Ask
        }
    }
}

/// Rounds `value` to [`NUM_DECIMAL_PLACES`] and pins the scale, so the result always renders
/// with exactly that many fractional digits.
///
/// # Errors
/// Errors when `value` is not finite or too large for a [`Decimal`]
pub fn to_fixed(value: f64) -> Result<Decimal, FixtureError> {
    let mut decimal = Decimal::from_f64(value)
        .ok_or(FixtureError::Unrepresentable(value))?
        .round_dp(NUM_DECIMAL_PLACES);
    decimal.rescale(NUM_DECIMAL_PLACES);
    Ok(decimal)
}

/// A row of a fixture file.
pub trait FixtureRecord {
    /// Column names, in file order
    const HEADER: &'static [&'static str];

    /// Replaces the contents of `record` with this row's fields.
    fn fill(&self, record: &mut ByteRecord);
}

/// A single executed trade.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TradeRecord {
    pub receive_ts: u64,
    pub exchange_ts: u64,
    pub price: Decimal,
    pub quantity: Decimal,
    pub side: Side,
}

/// One price level of an order book batch. Every level of a batch shares the same timestamps.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LevelRecord {
    pub receive_ts: u64,
    pub exchange_ts: u64,
    pub price: Decimal,
    pub quantity: Decimal,
    pub side: Side,
    /// Set on the first level of a batch (full book snapshot)
    #[serde(deserialize_with = "deserialize_flag")]
    pub rebuild: bool,
}

fn push_common(
    record: &mut ByteRecord,
    receive_ts: u64,
    exchange_ts: u64,
    price: Decimal,
    quantity: Decimal,
    side: Side,
) {
    record.clear();
    record.push_field(receive_ts.to_string().as_bytes());
    record.push_field(exchange_ts.to_string().as_bytes());
    record.push_field(price.to_string().as_bytes());
    record.push_field(quantity.to_string().as_bytes());
    record.push_field(side.as_str().as_bytes());
}

impl FixtureRecord for TradeRecord {
    const HEADER: &'static [&'static str] =
        &["receive_ts", "exchange_ts", "price", "quantity", "side"];

    fn fill(&self, record: &mut ByteRecord) {
        push_common(
            record,
            self.receive_ts,
            self.exchange_ts,
            self.price,
            self.quantity,
            self.side,
        );
    }
}

impl FixtureRecord for LevelRecord {
    const HEADER: &'static [&'static str] = &[
        "receive_ts",
        "exchange_ts",
        "price",
        "quantity",
        "side",
        "rebuild",
    ];

    fn fill(&self, record: &mut ByteRecord) {
        push_common(
            record,
            self.receive_ts,
            self.exchange_ts,
            self.price,
            self.quantity,
            self.side,
        );
        record.push_field(if self.rebuild { b"1" } else { b"0" });
    }
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match u8::deserialize(deserializer)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(de::Error::custom(format!(
            "rebuild must be 0 or 1, got {other}"
        ))),
    }
}
