//! Trades: feed rows and stored ledger rows.
//!
//! Prices and volumes never pass through floating point. They are kept as
//! the exact text the feed sent, and two amounts are equal only when their
//! text is equal.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{RecordError, Result};
use crate::query::TradeCursor;

/// An exact decimal amount in its canonical textual form.
///
/// Accepted grammar: optional sign, digits with at most one `.`, at least one
/// digit, optional exponent (`e`/`E`, optional sign, digits).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecimalText(String);

impl DecimalText {
    /// Validate and wrap a decimal literal.
    pub fn parse(field: &'static str, value: &str) -> Result<Self> {
        if is_decimal_literal(value) {
            Ok(Self(value.to_owned()))
        } else {
            Err(RecordError::InvalidDecimal {
                field,
                value: value.to_owned(),
            })
        }
    }

    /// Wrap text already known to be a valid literal (e.g. read back from the ledger).
    pub fn from_trusted(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Debug for DecimalText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for DecimalText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DecimalText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn is_decimal_literal(s: &str) -> bool {
    let bytes = s.as_bytes();
    let mut i = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }

    let mut digits = 0;
    let mut seen_dot = false;
    while i < bytes.len() {
        match bytes[i] {
            b'0'..=b'9' => digits += 1,
            b'.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        i += 1;
    }
    if digits == 0 {
        return false;
    }

    if i < bytes.len() && matches!(bytes[i], b'e' | b'E') {
        i += 1;
        if matches!(bytes.get(i), Some(b'+' | b'-')) {
            i += 1;
        }
        let start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == start {
            return false;
        }
    }

    i == bytes.len()
}

/// One `(time, price, volume)` record as delivered by the feed.
///
/// The feed never carries the symbol; the caller attaches it when the row
/// is appended to the ledger.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TradeRow {
    /// Seconds since the Unix epoch.
    pub time: i64,
    pub price: DecimalText,
    pub volume: DecimalText,
}

impl TradeRow {
    /// Number of fields in a feed record.
    pub const FIELDS: usize = 3;

    /// Build a row from already validated parts.
    pub fn new(time: i64, price: DecimalText, volume: DecimalText) -> Self {
        Self {
            time,
            price,
            volume,
        }
    }

    /// Parse a row from the tokenized fields of one feed line.
    pub fn from_fields<'a, I>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let fields: Vec<&str> = fields.into_iter().collect();
        if fields.len() != Self::FIELDS {
            return Err(RecordError::FieldCount {
                expected: Self::FIELDS,
                got: fields.len(),
            });
        }

        let time = fields[0]
            .trim()
            .parse::<i64>()
            .map_err(|_| RecordError::InvalidTime(fields[0].to_owned()))?;

        Ok(Self {
            time,
            price: DecimalText::parse("price", fields[1])?,
            volume: DecimalText::parse("volume", fields[2])?,
        })
    }
}

impl fmt::Debug for TradeRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.time, self.price, self.volume)
    }
}

/// A trade stored in the ledger.
///
/// `id` is assigned at insertion and strictly increases; together with
/// `time` it defines the ledger order `(time, id)`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub id: i64,
    pub symbol: String,
    pub time: i64,
    pub price: DecimalText,
    pub volume: DecimalText,
}

impl Trade {
    /// Whether this stored trade has the same `(time, price, volume)` as a feed row.
    pub fn matches(&self, row: &TradeRow) -> bool {
        self.time == row.time && self.price == row.price && self.volume == row.volume
    }

    /// The feed-shaped view of this trade.
    pub fn row(&self) -> TradeRow {
        TradeRow::new(self.time, self.price.clone(), self.volume.clone())
    }

    /// Keyset position of this trade in `(time, id)` order.
    pub fn cursor(&self) -> TradeCursor {
        TradeCursor {
            time: self.time,
            id: self.id,
        }
    }
}

impl fmt::Debug for Trade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Trade#{}[{} ({}, {}, {})]",
            self.id, self.symbol, self.time, self.price, self.volume
        )
    }
}
