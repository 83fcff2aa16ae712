//! Ledger range queries.

use serde::{Deserialize, Serialize};

/// Upper time bound used when a query leaves `end` open.
pub const MAX_TRADE_TIME: i64 = 1 << 50;

/// Which trades a query selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TradeScope {
    All,
    Symbol(String),
    /// Every symbol whose exchange is listed in this currency.
    Currency(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Keyset position in `(time, id)` order, used to page through the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TradeCursor {
    pub time: i64,
    pub id: i64,
}

/// A time-bounded, ordered selection of ledger rows.
///
/// Both bounds are inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeQuery {
    pub scope: TradeScope,
    pub start: i64,
    pub end: i64,
    pub order: SortOrder,
}

impl TradeQuery {
    pub fn new(scope: TradeScope) -> Self {
        Self {
            scope,
            start: 0,
            end: MAX_TRADE_TIME,
            order: SortOrder::Ascending,
        }
    }

    pub fn all() -> Self {
        Self::new(TradeScope::All)
    }

    pub fn symbol(symbol: impl Into<String>) -> Self {
        Self::new(TradeScope::Symbol(symbol.into()))
    }

    pub fn currency(currency: impl Into<String>) -> Self {
        Self::new(TradeScope::Currency(currency.into()))
    }

    pub fn between(mut self, start: i64, end: i64) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn descending(mut self) -> Self {
        self.order = SortOrder::Descending;
        self
    }

    /// Whether a trade at `cursor` lies strictly after `after` in this query's order.
    pub fn is_past(&self, cursor: TradeCursor, after: TradeCursor) -> bool {
        match self.order {
            SortOrder::Ascending => cursor > after,
            SortOrder::Descending => cursor < after,
        }
    }
}
