//! Price-time priority matching.
//!
//! [`match_order`] runs one incoming order against the book: walks
//! opposite-side candidates best price first (FIFO within a level), fills at
//! each maker's limit price, updates maker records in the arena, and rests
//! any limit remainder. An unmatched market remainder is discarded.

use crate::ledger::Trade;
use crate::order_book::OrderBook;
use crate::types::{Order, OrderId, OrderStatus, Side, TradeId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Runs matching for one incoming order. The taker's execution state and
/// status are finalized in place; maker records in `orders` and their book
/// entries are updated as fills land. Returns the trades generated, in
/// execution order.
pub fn match_order(
    book: &mut OrderBook,
    orders: &mut HashMap<OrderId, Order>,
    taker: &mut Order,
    trade_ids: &AtomicU64,
    timestamp_ms: u64,
) -> Vec<Trade> {
    let candidates = book.best_opposite(taker.side, taker.limit_price);
    let mut trades = Vec::new();

    for candidate in candidates {
        if taker.remaining() == 0 {
            break;
        }
        let Some(maker) = orders.get_mut(&candidate.order_id) else {
            continue;
        };
        if maker.remaining() == 0 {
            continue;
        }
        let fill = taker.remaining().min(maker.remaining());
        maker.executed_quantity += fill;
        maker.status = if maker.remaining() == 0 {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };
        book.apply_fill(candidate.order_id, fill);
        taker.executed_quantity += fill;

        let (buy_order_id, sell_order_id, buy_owner_id, sell_owner_id) = match taker.side {
            Side::Buy => (taker.id, maker.id, taker.owner_id, maker.owner_id),
            Side::Sell => (maker.id, taker.id, maker.owner_id, taker.owner_id),
        };
        trades.push(Trade {
            id: TradeId(trade_ids.fetch_add(1, Ordering::Relaxed)),
            instrument_id: taker.instrument_id,
            taker_order_id: taker.id,
            maker_order_id: candidate.order_id,
            buy_order_id,
            sell_order_id,
            buy_owner_id,
            sell_owner_id,
            // The resting order sets the execution price.
            price: candidate.price,
            quantity: fill,
            timestamp_ms,
        });
    }

    if taker.remaining() == 0 {
        taker.status = OrderStatus::Filled;
    } else if taker.is_market() {
        // A market remainder never rests; it is discarded.
        taker.status = OrderStatus::Cancelled;
    } else {
        taker.status = if taker.executed_quantity > 0 {
            OrderStatus::PartiallyFilled
        } else {
            OrderStatus::Pending
        };
        // Infallible here: the taker is a limit order with remaining > 0.
        let _ = book.insert(taker);
    }

    trades
}
