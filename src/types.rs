//! Core identifiers and the order data model.
//!
//! All identifiers are newtype wrappers. [`Order`] carries the immutable
//! identity fields of one accepted order plus the execution state mutated by
//! the matching engine; [`OrderRequest`] is the id-less client submission.

use rust_decimal::Decimal;

/// Unique order identifier, assigned when an order is accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct OrderId(pub u64);

/// Trade identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct TradeId(pub u64);

/// Instrument identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct InstrumentId(pub u64);

/// Order owner. Opaque to the core: ownership checks belong to the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct OwnerId(pub u64);

/// Order side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Order kind: limit (with price) or market (take best available).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum OrderKind {
    Limit,
    Market,
}

/// Order lifecycle status.
///
/// `Filled` and `Cancelled` are terminal: no transition leaves them and the
/// engine never mutates a terminal order again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum OrderStatus {
    Pending,
    PartiallyFilled,
    Filled,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Filled | OrderStatus::Cancelled)
    }
}

/// Tradable instrument listed on the exchange. The registry is fixed at
/// construction.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Instrument {
    pub id: InstrumentId,
    pub ticker: String,
    pub name: String,
}

/// Client order submission. The engine assigns id and sequence on acceptance.
///
/// `limit_price` is required (and must be positive) for limit orders; it is
/// ignored for market orders.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct OrderRequest {
    pub instrument_id: InstrumentId,
    pub owner_id: OwnerId,
    pub side: Side,
    pub kind: OrderKind,
    pub quantity: u64,
    #[serde(default)]
    pub limit_price: Option<Decimal>,
}

/// One accepted order: identity plus execution state.
///
/// `limit_price` is `Some` iff the order is a limit order. `sequence` is a
/// per-instrument monotonic counter assigned once at acceptance and used only
/// for FIFO tie-break; it is never mutated. `executed_quantity` only grows,
/// and never past `quantity`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub instrument_id: InstrumentId,
    pub owner_id: OwnerId,
    pub side: Side,
    pub kind: OrderKind,
    pub quantity: u64,
    pub executed_quantity: u64,
    pub limit_price: Option<Decimal>,
    pub status: OrderStatus,
    pub sequence: u64,
    pub timestamp_ms: u64,
}

impl Order {
    /// Unfilled quantity still open for matching.
    pub fn remaining(&self) -> u64 {
        self.quantity - self.executed_quantity
    }

    pub fn is_limit(&self) -> bool {
        matches!(self.kind, OrderKind::Limit)
    }

    pub fn is_market(&self) -> bool {
        matches!(self.kind, OrderKind::Market)
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remaining_tracks_executed_quantity() {
        let mut order = Order {
            id: OrderId(1),
            instrument_id: InstrumentId(1),
            owner_id: OwnerId(1),
            side: Side::Buy,
            kind: OrderKind::Limit,
            quantity: 10,
            executed_quantity: 0,
            limit_price: Some(Decimal::from(100)),
            status: OrderStatus::Pending,
            sequence: 1,
            timestamp_ms: 0,
        };
        assert_eq!(order.remaining(), 10);
        order.executed_quantity = 4;
        assert_eq!(order.remaining(), 6);
    }

    #[test]
    fn terminal_statuses() {
        assert!(OrderStatus::Filled.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::PartiallyFilled.is_terminal());
    }

    #[test]
    fn side_opposite() {
        assert_eq!(Side::Buy.opposite(), Side::Sell);
        assert_eq!(Side::Sell.opposite(), Side::Buy);
    }
}
