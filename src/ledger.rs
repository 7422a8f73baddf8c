//! Append-only trade ledger.
//!
//! Source of truth for executions and the last-traded price. A [`Trade`] is
//! immutable once appended and never removed.

use crate::types::{InstrumentId, OrderId, OwnerId, TradeId};
use rust_decimal::Decimal;

/// One execution between a taker and a maker.
///
/// `price` is always the maker's limit price: the resting order sets the
/// execution price, the taker does not improve on it. Buy/sell ids are
/// derived from which side took.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Trade {
    pub id: TradeId,
    pub instrument_id: InstrumentId,
    pub taker_order_id: OrderId,
    pub maker_order_id: OrderId,
    pub buy_order_id: OrderId,
    pub sell_order_id: OrderId,
    pub buy_owner_id: OwnerId,
    pub sell_owner_id: OwnerId,
    pub price: Decimal,
    pub quantity: u64,
    pub timestamp_ms: u64,
}

/// Per-instrument, append-only record of executions.
#[derive(Debug, Default)]
pub struct TradeLedger {
    trades: Vec<Trade>,
}

impl TradeLedger {
    pub fn new() -> Self {
        Self { trades: Vec::new() }
    }

    pub fn append(&mut self, trade: Trade) {
        self.trades.push(trade);
    }

    /// Price of the most recent trade, or None if nothing has traded yet.
    pub fn last_price(&self) -> Option<Decimal> {
        self.trades.last().map(|t| t.price)
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    /// Trades in which `owner` was the buyer or the seller.
    pub fn trades_for_owner(&self, owner: OwnerId) -> Vec<Trade> {
        self.trades
            .iter()
            .filter(|t| t.buy_owner_id == owner || t.sell_owner_id == owner)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trade(id: u64, price: i64, buyer: u64, seller: u64) -> Trade {
        Trade {
            id: TradeId(id),
            instrument_id: InstrumentId(1),
            taker_order_id: OrderId(id),
            maker_order_id: OrderId(id + 100),
            buy_order_id: OrderId(id),
            sell_order_id: OrderId(id + 100),
            buy_owner_id: OwnerId(buyer),
            sell_owner_id: OwnerId(seller),
            price: Decimal::from(price),
            quantity: 1,
            timestamp_ms: id,
        }
    }

    #[test]
    fn last_price_is_most_recent_trade() {
        let mut ledger = TradeLedger::new();
        assert!(ledger.last_price().is_none());
        ledger.append(trade(1, 100, 1, 2));
        ledger.append(trade(2, 101, 2, 3));
        assert_eq!(ledger.last_price(), Some(Decimal::from(101)));
        assert_eq!(ledger.trades().len(), 2);
    }

    #[test]
    fn trades_for_owner_matches_either_side() {
        let mut ledger = TradeLedger::new();
        ledger.append(trade(1, 100, 1, 2));
        ledger.append(trade(2, 100, 3, 1));
        ledger.append(trade(3, 100, 4, 5));
        let mine = ledger.trades_for_owner(OwnerId(1));
        assert_eq!(mine.len(), 2);
        assert!(ledger.trades_for_owner(OwnerId(9)).is_empty());
    }
}
