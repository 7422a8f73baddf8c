//! Depth snapshot: bounded, price-aggregated view of one book for
//! market-data publication.

use crate::ledger::TradeLedger;
use crate::order_book::{OrderBook, PriceLevel};
use crate::types::{InstrumentId, Side};
use rust_decimal::Decimal;

/// Top `depth` price levels per side plus the last-traded price.
/// Bids are highest-price-first, asks lowest-price-first.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BookSnapshot {
    pub instrument_id: InstrumentId,
    pub bids: Vec<PriceLevel>,
    pub asks: Vec<PriceLevel>,
    pub last_price: Option<Decimal>,
}

/// Builds a snapshot from a consistent view of the book and ledger.
///
/// Pure read. The caller must hold the instrument's serialization domain for
/// the duration of the call so the snapshot never reflects a half-applied
/// submission.
pub fn snapshot(book: &OrderBook, ledger: &TradeLedger, depth: usize) -> BookSnapshot {
    BookSnapshot {
        instrument_id: book.instrument_id(),
        bids: book.top_levels(Side::Buy, depth),
        asks: book.top_levels(Side::Sell, depth),
        last_price: ledger.last_price(),
    }
}
