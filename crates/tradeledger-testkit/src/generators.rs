//! Proptest generators for property-based testing.

use proptest::prelude::*;

use tradeledger_core::{DecimalText, TradeRow};

/// First timestamp of generated histories.
pub const EPOCH: i64 = 1_300_000_000;

/// A positive decimal with up to eight fraction digits, trailing zeros kept.
pub fn decimal_text() -> impl Strategy<Value = DecimalText> {
    (0u32..100_000, 0u32..4, 0u32..100_000_000).prop_map(|(int, style, frac)| {
        let text = match style {
            0 => int.to_string(),
            1 => format!("{int}.{frac:08}"),
            _ => format!("{int}.{}", frac % 1000),
        };
        DecimalText::from_trusted(text)
    })
}

/// A single row with time in `[EPOCH, EPOCH + span)`.
pub fn trade_row(span: i64) -> impl Strategy<Value = TradeRow> {
    (EPOCH..EPOCH + span.max(1), decimal_text(), decimal_text())
        .prop_map(|(time, price, volume)| TradeRow::new(time, price, volume))
}

/// A time-ordered history of up to `max_len` rows.
///
/// Consecutive rows often share a timestamp, and some repeat the previous
/// row exactly, as real archives do.
pub fn history(max_len: usize) -> impl Strategy<Value = Vec<TradeRow>> {
    prop::collection::vec((0i64..3, any::<bool>(), decimal_text(), decimal_text()), 0..=max_len)
        .prop_map(|steps| {
            let mut time = EPOCH;
            let mut out: Vec<TradeRow> = Vec::with_capacity(steps.len());
            for (gap, repeat, price, volume) in steps {
                time += gap;
                let repeated = if repeat && gap == 0 {
                    out.last().cloned()
                } else {
                    None
                };
                out.push(repeated.unwrap_or_else(|| TradeRow::new(time, price, volume)));
            }
            out
        })
}

/// Like [`history`], without exact repeats.
pub fn distinct_history(max_len: usize) -> impl Strategy<Value = Vec<TradeRow>> {
    history(max_len).prop_map(|mut rows| {
        rows.dedup();
        rows
    })
}

/// A network chunk size, small enough to split every line.
pub fn chunk_size() -> impl Strategy<Value = usize> {
    1usize..=64
}
