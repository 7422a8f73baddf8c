//! Single-instrument order book: bids and asks, price-time priority.
//!
//! Each price level is a FIFO queue of resting limit orders; best bid is the
//! highest price, best ask the lowest. Entries carry the resting order's
//! remaining quantity; the order records themselves live in the engine's
//! arena, so the book only ever hands out ids and quantities.

use crate::error::EngineError;
use crate::types::{InstrumentId, Order, OrderId, Side};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};

/// One resting entry at a price level: (order id, remaining quantity).
type BookEntry = (OrderId, u64);
/// Price -> FIFO queue of resting entries.
type BookSide = BTreeMap<Decimal, Vec<BookEntry>>;

/// Candidate maker returned by [`OrderBook::best_opposite`]: best price first,
/// FIFO within a price level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub order_id: OrderId,
    pub price: Decimal,
    pub remaining: u64,
}

/// One aggregated price level: price and summed remaining quantity.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PriceLevel {
    pub price: Decimal,
    pub quantity: u64,
}

/// Single-instrument order book.
#[derive(Debug)]
pub struct OrderBook {
    instrument_id: InstrumentId,
    bids: BookSide,
    asks: BookSide,
    /// Resting orders by id: (side, price) for removal and fills.
    index: HashMap<OrderId, (Side, Decimal)>,
}

impl OrderBook {
    pub fn new(instrument_id: InstrumentId) -> Self {
        Self {
            instrument_id,
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            index: HashMap::new(),
        }
    }

    pub fn instrument_id(&self) -> InstrumentId {
        self.instrument_id
    }

    /// Adds a limit order to the back of its price level's FIFO queue.
    ///
    /// Only limit orders with remaining quantity may rest; anything else is
    /// rejected without touching the book.
    pub fn insert(&mut self, order: &Order) -> Result<(), EngineError> {
        if order.is_market() {
            return Err(EngineError::InvalidOrderParameters(
                "market orders never rest on the book".into(),
            ));
        }
        let price = order.limit_price.ok_or_else(|| {
            EngineError::InvalidOrderParameters("limit order requires a limit price".into())
        })?;
        if order.remaining() == 0 {
            return Err(EngineError::InvalidOrderParameters(
                "resting order must have remaining quantity".into(),
            ));
        }
        let levels = match order.side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        levels
            .entry(price)
            .or_default()
            .push((order.id, order.remaining()));
        self.index.insert(order.id, (order.side, price));
        Ok(())
    }

    /// Removes a resting order by id. Returns false if the order is not
    /// resting (no-op).
    pub fn remove(&mut self, order_id: OrderId) -> bool {
        let Some((side, price)) = self.index.remove(&order_id) else {
            return false;
        };
        let levels = match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        if let Some(queue) = levels.get_mut(&price) {
            queue.retain(|&(id, _)| id != order_id);
            if queue.is_empty() {
                levels.remove(&price);
            }
        }
        true
    }

    /// Opposite-side candidates for a taker on `taker_side`, price priority
    /// first then FIFO within a level.
    ///
    /// `bound` keeps only prices acceptable to a limit taker: a buy crosses
    /// asks priced at or below its bound, a sell crosses bids at or above.
    /// `None` (market taker) accepts every level, best price first.
    pub fn best_opposite(&self, taker_side: Side, bound: Option<Decimal>) -> Vec<Candidate> {
        let mut out = Vec::new();
        match taker_side {
            Side::Buy => {
                for (&price, queue) in self.asks.iter() {
                    if bound.is_some_and(|b| price > b) {
                        break;
                    }
                    for &(order_id, remaining) in queue {
                        out.push(Candidate {
                            order_id,
                            price,
                            remaining,
                        });
                    }
                }
            }
            Side::Sell => {
                for (&price, queue) in self.bids.iter().rev() {
                    if bound.is_some_and(|b| price < b) {
                        break;
                    }
                    for &(order_id, remaining) in queue {
                        out.push(Candidate {
                            order_id,
                            price,
                            remaining,
                        });
                    }
                }
            }
        }
        out
    }

    /// Applies a fill to a resting entry: decrements its remaining quantity,
    /// removing the entry (and an emptied price level) when it reaches zero.
    /// FIFO position is preserved on partial fills.
    pub fn apply_fill(&mut self, order_id: OrderId, quantity: u64) {
        let Some(&(side, price)) = self.index.get(&order_id) else {
            return;
        };
        let levels = match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        if let Some(queue) = levels.get_mut(&price) {
            if let Some(pos) = queue.iter().position(|&(id, _)| id == order_id) {
                if quantity >= queue[pos].1 {
                    queue.remove(pos);
                    self.index.remove(&order_id);
                } else {
                    queue[pos].1 -= quantity;
                }
            }
            if queue.is_empty() {
                levels.remove(&price);
            }
        }
    }

    /// Up to `n` aggregated price levels on one side, best price first:
    /// bids highest-first, asks lowest-first.
    pub fn top_levels(&self, side: Side, n: usize) -> Vec<PriceLevel> {
        let level = |(&price, queue): (&Decimal, &Vec<BookEntry>)| PriceLevel {
            price,
            quantity: queue.iter().map(|&(_, remaining)| remaining).sum(),
        };
        match side {
            Side::Buy => self.bids.iter().rev().take(n).map(level).collect(),
            Side::Sell => self.asks.iter().take(n).map(level).collect(),
        }
    }

    /// Best bid price (None if empty).
    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.keys().next_back().copied()
    }

    /// Best ask price (None if empty).
    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.keys().next().copied()
    }

    /// Whether the order currently rests on the book.
    pub fn is_resting(&self, order_id: OrderId) -> bool {
        self.index.contains_key(&order_id)
    }
}
