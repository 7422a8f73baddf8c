//! Per-instrument matching engine and the multi-instrument exchange facade.
//!
//! [`Exchange`] is the single entry point: it validates submissions, assigns
//! order ids, and routes each call to the owning instrument's engine. Every
//! engine sits behind its own mutex, so submissions and cancels for one
//! instrument are serialized while different instruments match in parallel.

use crate::aggregator::{snapshot, BookSnapshot};
use crate::error::EngineError;
use crate::ledger::{Trade, TradeLedger};
use crate::matching::match_order;
use crate::order_book::OrderBook;
use crate::types::{
    Instrument, InstrumentId, Order, OrderId, OrderKind, OrderRequest, OrderStatus, OwnerId,
};
use log::info;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Outcome of a submission: the incoming order's final state and the trades
/// it produced, in execution order.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct SubmitOutcome {
    pub order: Order,
    pub trades: Vec<Trade>,
}

/// Single-instrument engine: order arena, book, and ledger.
///
/// Orders are never destroyed; terminal records stay in the arena as history
/// and only leave the *book*. Not internally synchronized — [`Exchange`]
/// wraps each engine in a mutex.
#[derive(Debug)]
pub(crate) struct Engine {
    instrument: Instrument,
    book: OrderBook,
    orders: HashMap<OrderId, Order>,
    ledger: TradeLedger,
    next_sequence: u64,
    trade_ids: Arc<AtomicU64>,
}

impl Engine {
    fn new(instrument: Instrument, trade_ids: Arc<AtomicU64>) -> Self {
        let book = OrderBook::new(instrument.id);
        Self {
            instrument,
            book,
            orders: HashMap::new(),
            ledger: TradeLedger::new(),
            next_sequence: 1,
            trade_ids,
        }
    }

    /// Accepts a validated request under `order_id` and runs matching.
    fn submit(&mut self, request: &OrderRequest, order_id: OrderId) -> SubmitOutcome {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        let limit_price = match request.kind {
            OrderKind::Limit => request.limit_price,
            OrderKind::Market => None,
        };
        let mut order = Order {
            id: order_id,
            instrument_id: self.instrument.id,
            owner_id: request.owner_id,
            side: request.side,
            kind: request.kind,
            quantity: request.quantity,
            executed_quantity: 0,
            limit_price,
            status: OrderStatus::Pending,
            sequence,
            timestamp_ms: now_millis(),
        };
        info!(
            "order accepted id={} instrument={} side={:?} kind={:?} quantity={} price={:?}",
            order.id.0, self.instrument.id.0, order.side, order.kind, order.quantity, order.limit_price
        );

        let order_timestamp_ms = order.timestamp_ms;
        let trades = match_order(
            &mut self.book,
            &mut self.orders,
            &mut order,
            &self.trade_ids,
            order_timestamp_ms,
        );
        for trade in &trades {
            info!(
                "trade id={} instrument={} buy_order={} sell_order={} price={} quantity={}",
                trade.id.0,
                trade.instrument_id.0,
                trade.buy_order_id.0,
                trade.sell_order_id.0,
                trade.price,
                trade.quantity
            );
            self.ledger.append(trade.clone());
        }
        info!(
            "order settled id={} status={:?} executed={} remaining={}",
            order.id.0,
            order.status,
            order.executed_quantity,
            order.remaining()
        );
        self.orders.insert(order.id, order.clone());
        SubmitOutcome { order, trades }
    }

    /// Cancels a pending or partially filled order and removes it from the
    /// book. Terminal orders are left untouched.
    fn cancel(&mut self, order_id: OrderId) -> Result<Order, EngineError> {
        let order = self
            .orders
            .get_mut(&order_id)
            .ok_or(EngineError::OrderNotFound)?;
        if order.is_terminal() {
            return Err(EngineError::OrderNotCancellable);
        }
        order.status = OrderStatus::Cancelled;
        self.book.remove(order_id);
        info!("order cancelled id={} instrument={}", order_id.0, self.instrument.id.0);
        Ok(order.clone())
    }

    fn snapshot(&self, depth: usize) -> BookSnapshot {
        snapshot(&self.book, &self.ledger, depth)
    }

    fn last_price(&self) -> Option<Decimal> {
        self.ledger.last_price()
    }

    fn order(&self, order_id: OrderId) -> Option<Order> {
        self.orders.get(&order_id).cloned()
    }

    fn orders(&self) -> Vec<Order> {
        let mut out: Vec<Order> = self.orders.values().cloned().collect();
        out.sort_by_key(|o| o.sequence);
        out
    }

    fn orders_for_owner(&self, owner: OwnerId) -> Vec<Order> {
        let mut out: Vec<Order> = self
            .orders
            .values()
            .filter(|o| o.owner_id == owner)
            .cloned()
            .collect();
        out.sort_by_key(|o| o.sequence);
        out
    }

    fn trades(&self) -> Vec<Trade> {
        self.ledger.trades().to_vec()
    }

    fn trades_for_owner(&self, owner: OwnerId) -> Vec<Trade> {
        self.ledger.trades_for_owner(owner)
    }
}

/// Multi-instrument exchange facade.
///
/// Holds a fixed instrument registry and one mutex-guarded [`Engine`] per
/// instrument. All boundary operations are synchronous: each completes
/// deterministically or fails with a typed [`EngineError`] before any state
/// changes.
#[derive(Debug)]
pub struct Exchange {
    instruments: Vec<Instrument>,
    engines: HashMap<InstrumentId, Mutex<Engine>>,
    /// Which instrument an accepted order belongs to, for cancel routing.
    order_index: RwLock<HashMap<OrderId, InstrumentId>>,
    next_order_id: AtomicU64,
}

impl Exchange {
    pub fn new(instruments: Vec<Instrument>) -> Self {
        let trade_ids = Arc::new(AtomicU64::new(1));
        let engines = instruments
            .iter()
            .map(|instrument| {
                (
                    instrument.id,
                    Mutex::new(Engine::new(instrument.clone(), trade_ids.clone())),
                )
            })
            .collect();
        Self {
            instruments,
            engines,
            order_index: RwLock::new(HashMap::new()),
            next_order_id: AtomicU64::new(1),
        }
    }

    pub fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }

    fn engine(&self, instrument_id: InstrumentId) -> Result<&Mutex<Engine>, EngineError> {
        self.engines
            .get(&instrument_id)
            .ok_or(EngineError::InstrumentNotFound)
    }

    /// Validates and submits an order: assigns its id, runs matching under
    /// the instrument's lock, and returns the final order state plus trades.
    ///
    /// Rejections (`InstrumentNotFound`, `InvalidOrderParameters`) happen
    /// before the order exists, with no side effects.
    pub fn submit(&self, request: OrderRequest) -> Result<SubmitOutcome, EngineError> {
        let engine = self.engine(request.instrument_id)?;
        validate(&request)?;
        let order_id = OrderId(self.next_order_id.fetch_add(1, Ordering::Relaxed));
        self.order_index
            .write()
            .expect("lock")
            .insert(order_id, request.instrument_id);
        let mut engine = engine.lock().expect("lock");
        Ok(engine.submit(&request, order_id))
    }

    /// Cancels a pending or partially filled order.
    ///
    /// Serialized against matching on the same instrument, so a cancel can
    /// never race a fill of the same order. Ownership is the caller's check.
    pub fn cancel(&self, order_id: OrderId) -> Result<Order, EngineError> {
        let instrument_id = self
            .order_index
            .read()
            .expect("lock")
            .get(&order_id)
            .copied()
            .ok_or(EngineError::OrderNotFound)?;
        let engine = self.engine(instrument_id)?;
        let mut engine = engine.lock().expect("lock");
        engine.cancel(order_id)
    }

    /// Depth snapshot of one instrument's book plus its last-traded price.
    /// Taken under the instrument's lock, so it always reflects a complete
    /// sequence of submissions.
    pub fn snapshot(&self, instrument_id: InstrumentId, depth: usize) -> Result<BookSnapshot, EngineError> {
        let engine = self.engine(instrument_id)?;
        let engine = engine.lock().expect("lock");
        Ok(engine.snapshot(depth))
    }

    /// Most recent trade price for the instrument, or None before any trade.
    pub fn last_price(&self, instrument_id: InstrumentId) -> Result<Option<Decimal>, EngineError> {
        let engine = self.engine(instrument_id)?;
        let engine = engine.lock().expect("lock");
        Ok(engine.last_price())
    }

    pub fn order(&self, order_id: OrderId) -> Result<Order, EngineError> {
        let instrument_id = self
            .order_index
            .read()
            .expect("lock")
            .get(&order_id)
            .copied()
            .ok_or(EngineError::OrderNotFound)?;
        let engine = self.engine(instrument_id)?;
        let engine = engine.lock().expect("lock");
        engine.order(order_id).ok_or(EngineError::OrderNotFound)
    }

    /// All orders for one instrument, in acceptance order.
    pub fn orders(&self, instrument_id: InstrumentId) -> Result<Vec<Order>, EngineError> {
        let engine = self.engine(instrument_id)?;
        let engine = engine.lock().expect("lock");
        Ok(engine.orders())
    }

    /// All of one owner's orders, across instruments.
    pub fn orders_for_owner(&self, owner: OwnerId) -> Vec<Order> {
        let mut out = Vec::new();
        for instrument in &self.instruments {
            if let Some(engine) = self.engines.get(&instrument.id) {
                out.extend(engine.lock().expect("lock").orders_for_owner(owner));
            }
        }
        out
    }

    /// All trades for one instrument, in execution order.
    pub fn trades(&self, instrument_id: InstrumentId) -> Result<Vec<Trade>, EngineError> {
        let engine = self.engine(instrument_id)?;
        let engine = engine.lock().expect("lock");
        Ok(engine.trades())
    }

    /// All trades in which `owner` was buyer or seller, across instruments.
    pub fn trades_for_owner(&self, owner: OwnerId) -> Vec<Trade> {
        let mut out = Vec::new();
        for instrument in &self.instruments {
            if let Some(engine) = self.engines.get(&instrument.id) {
                out.extend(engine.lock().expect("lock").trades_for_owner(owner));
            }
        }
        out
    }
}

fn validate(request: &OrderRequest) -> Result<(), EngineError> {
    if request.quantity == 0 {
        return Err(EngineError::InvalidOrderParameters(
            "quantity must be positive".into(),
        ));
    }
    if let OrderKind::Limit = request.kind {
        match request.limit_price {
            Some(price) if price > Decimal::ZERO => {}
            _ => {
                return Err(EngineError::InvalidOrderParameters(
                    "limit order requires a positive limit price".into(),
                ))
            }
        }
    }
    Ok(())
}
