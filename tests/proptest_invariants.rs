//! Property-based and deterministic invariant tests.
//!
//! Replays synthetic request streams into the exchange and asserts: quantity
//! conservation per order, per-order trade sums, the maker-price rule,
//! limit-price bounds, and that the book is never crossed. Same seed ⇒ same
//! outcome.

use exchange_core::market_data_gen::{Generator, GeneratorConfig};
use exchange_core::{
    Exchange, Instrument, InstrumentId, OrderKind, OrderStatus, Side, SubmitOutcome,
};
use proptest::prelude::*;
use std::collections::HashMap;

fn exchange() -> Exchange {
    Exchange::new(vec![Instrument {
        id: InstrumentId(1),
        ticker: "ALFA".into(),
        name: "Alfa common stock".into(),
    }])
}

fn replay_collect(exchange: &Exchange, config: GeneratorConfig) -> Vec<SubmitOutcome> {
    Generator::new(config)
        .all_requests()
        .into_iter()
        .map(|request| exchange.submit(request).unwrap())
        .collect()
}

/// Quantity conservation and state-machine checks for every accepted order.
fn assert_order_invariants(exchange: &Exchange, outcomes: &[SubmitOutcome]) {
    for outcome in outcomes {
        let order = exchange.order(outcome.order.id).unwrap();
        assert!(
            order.executed_quantity <= order.quantity,
            "executed must never exceed quantity"
        );
        assert_eq!(
            order.executed_quantity + order.remaining(),
            order.quantity,
            "executed + remaining == quantity"
        );
        if order.kind == OrderKind::Market {
            assert!(
                order.status == OrderStatus::Filled || order.status == OrderStatus::Cancelled,
                "market orders never rest"
            );
        }
    }
}

/// The sum of trade quantities against each order equals its executed
/// quantity.
fn assert_trade_sums(exchange: &Exchange, outcomes: &[SubmitOutcome]) {
    let mut filled: HashMap<exchange_core::OrderId, u64> = HashMap::new();
    for trade in exchange.trades(InstrumentId(1)).unwrap() {
        *filled.entry(trade.buy_order_id).or_default() += trade.quantity;
        *filled.entry(trade.sell_order_id).or_default() += trade.quantity;
    }
    for outcome in outcomes {
        let order = exchange.order(outcome.order.id).unwrap();
        assert_eq!(
            filled.get(&order.id).copied().unwrap_or(0),
            order.executed_quantity,
            "trade sum equals executed quantity for order {:?}",
            order.id
        );
    }
}

/// Every trade prints at the maker's limit price, within the taker's bound.
fn assert_price_rules(exchange: &Exchange, outcomes: &[SubmitOutcome]) {
    let takers: HashMap<_, _> = outcomes
        .iter()
        .map(|o| (o.order.id, o.order.clone()))
        .collect();
    for trade in exchange.trades(InstrumentId(1)).unwrap() {
        assert!(trade.quantity > 0, "trade quantity must be positive");
        let maker = exchange.order(trade.maker_order_id).unwrap();
        assert_eq!(
            Some(trade.price),
            maker.limit_price,
            "trade price is the maker's limit price"
        );
        let taker = &takers[&trade.taker_order_id];
        if let Some(bound) = taker.limit_price {
            match taker.side {
                Side::Buy => assert!(trade.price <= bound, "buy taker never pays above bound"),
                Side::Sell => assert!(trade.price >= bound, "sell taker never sells below bound"),
            }
        }
    }
}

/// Matching leaves no crossed book: any crossing pair would have traded.
fn assert_book_not_crossed(exchange: &Exchange) {
    let snapshot = exchange.snapshot(InstrumentId(1), 1).unwrap();
    if let (Some(bid), Some(ask)) = (snapshot.bids.first(), snapshot.asks.first()) {
        assert!(
            bid.price < ask.price,
            "book crossed: bid {} >= ask {}",
            bid.price,
            ask.price
        );
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn prop_invariants_hold_after_replay(seed in 0u64..100_000u64, num_orders in 10usize..150usize) {
        let config = GeneratorConfig {
            seed,
            instrument_id: InstrumentId(1),
            num_orders,
            ..Default::default()
        };
        let exchange = exchange();
        let outcomes = replay_collect(&exchange, config);

        assert_order_invariants(&exchange, &outcomes);
        assert_trade_sums(&exchange, &outcomes);
        assert_price_rules(&exchange, &outcomes);
        assert_book_not_crossed(&exchange);
    }
}

/// Deterministic replay: same config ⇒ same (trade count, total traded
/// quantity, final statuses).
#[test]
fn deterministic_replay_same_seed_same_outcome() {
    let config = GeneratorConfig {
        seed: 999,
        instrument_id: InstrumentId(1),
        num_orders: 80,
        ..Default::default()
    };

    let first = exchange();
    let outcomes1 = replay_collect(&first, config.clone());
    let second = exchange();
    let outcomes2 = replay_collect(&second, config);

    let trades1 = first.trades(InstrumentId(1)).unwrap();
    let trades2 = second.trades(InstrumentId(1)).unwrap();
    assert_eq!(trades1.len(), trades2.len(), "same number of trades");
    let total1: u64 = trades1.iter().map(|t| t.quantity).sum();
    let total2: u64 = trades2.iter().map(|t| t.quantity).sum();
    assert_eq!(total1, total2, "same total traded quantity");
    for (a, b) in outcomes1.iter().zip(outcomes2.iter()) {
        assert_eq!(a.order.status, b.order.status, "same final statuses");
        assert_eq!(a.order.executed_quantity, b.order.executed_quantity);
    }
}

/// FIFO fairness: the earlier of two same-price resting orders is filled
/// fully before the later one receives anything.
#[test]
fn fifo_fairness_across_replayed_fills() {
    let exchange = exchange();
    let mut generator = Generator::new(GeneratorConfig {
        seed: 4,
        num_orders: 0,
        limit_ratio: 1.0,
        ..Default::default()
    });
    // Two resting sells at one price, then a buy that only covers part.
    let mut first = generator.next_request();
    first.side = Side::Sell;
    first.limit_price = Some(100.into());
    first.quantity = 6;
    let mut second = first.clone();
    second.quantity = 6;
    let earlier = exchange.submit(first).unwrap().order;
    let later = exchange.submit(second).unwrap().order;

    let mut taker = generator.next_request();
    taker.side = Side::Buy;
    taker.kind = OrderKind::Limit;
    taker.limit_price = Some(100.into());
    taker.quantity = 8;
    let outcome = exchange.submit(taker).unwrap();

    assert_eq!(outcome.trades.len(), 2);
    assert_eq!(outcome.trades[0].maker_order_id, earlier.id);
    assert_eq!(outcome.trades[0].quantity, 6, "earlier order fills fully first");
    assert_eq!(outcome.trades[1].maker_order_id, later.id);
    assert_eq!(outcome.trades[1].quantity, 2);
    assert!(earlier.sequence < later.sequence);
}
