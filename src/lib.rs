//! # exchange_core
//!
//! Exchange-style matching engine: per-instrument price-time priority order
//! books, partial-fill bookkeeping, an append-only trade ledger, and bounded
//! depth snapshots for market-data publication.
//!
//! ## Entry point
//!
//! Use [`Exchange`] as the single entry point: create it with an instrument
//! registry, then [`Exchange::submit`], [`Exchange::cancel`],
//! [`Exchange::snapshot`], and [`Exchange::last_price`]. Submissions and
//! cancels for one instrument are serialized; different instruments are
//! handled in parallel.
//!
//! ## Example
//!
//! ```rust
//! use exchange_core::{Exchange, Instrument, InstrumentId, OrderKind, OrderRequest, OrderStatus, OwnerId, Side};
//! use rust_decimal::Decimal;
//!
//! let exchange = Exchange::new(vec![Instrument {
//!     id: InstrumentId(1),
//!     ticker: "ALFA".into(),
//!     name: "Alfa common stock".into(),
//! }]);
//! let outcome = exchange
//!     .submit(OrderRequest {
//!         instrument_id: InstrumentId(1),
//!         owner_id: OwnerId(1),
//!         side: Side::Buy,
//!         kind: OrderKind::Limit,
//!         quantity: 10,
//!         limit_price: Some(Decimal::from(100)),
//!     })
//!     .unwrap();
//! assert_eq!(outcome.order.status, OrderStatus::Pending);
//! assert!(outcome.trades.is_empty());
//! ```
//!
//! ## Lower-level API
//!
//! [`OrderBook`] and [`match_order`] can be used directly if you manage the
//! order arena and trade ids yourself.

pub mod aggregator;
pub mod api;
pub mod engine;
pub mod error;
pub mod feed;
pub mod ledger;
pub mod market_data_gen;
pub mod matching;
pub mod order_book;
pub mod types;

pub use aggregator::BookSnapshot;
pub use engine::{Exchange, SubmitOutcome};
pub use error::EngineError;
pub use feed::{run_publisher, FeedMessage, SubscriberRegistry};
pub use ledger::{Trade, TradeLedger};
pub use market_data_gen::{replay_into_exchange, Generator, GeneratorConfig};
pub use matching::match_order;
pub use order_book::{Candidate, OrderBook, PriceLevel};
pub use types::{
    Instrument, InstrumentId, Order, OrderId, OrderKind, OrderRequest, OrderStatus, OwnerId, Side,
    TradeId,
};
