//! Synthetic order-flow generator.
//!
//! Deterministic, configurable request stream for replay tests, demos, and
//! benchmarks. Same seed ⇒ same sequence of requests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;

use crate::engine::Exchange;
use crate::error::EngineError;
use crate::types::{InstrumentId, OrderKind, OrderRequest, OwnerId, Side};

/// Configuration for the synthetic request generator.
/// All ranges are inclusive. Same config + seed produces the same stream.
#[derive(Clone, Debug)]
pub struct GeneratorConfig {
    /// RNG seed. Same seed ⇒ same request stream.
    pub seed: u64,
    /// Instrument for all generated requests.
    pub instrument_id: InstrumentId,
    /// Number of requests produced by [`Generator::all_requests`].
    pub num_orders: usize,
    /// Probability of Buy (0.0..=1.0). Sell otherwise.
    pub buy_ratio: f64,
    /// Probability of a limit order (0.0..=1.0). Market otherwise.
    pub limit_ratio: f64,
    /// Price range (inclusive) for limit orders.
    pub price_min: i64,
    pub price_max: i64,
    /// Quantity range (inclusive), whole units.
    pub quantity_min: u64,
    pub quantity_max: u64,
    /// Number of distinct owner ids (1..=num_owners).
    pub num_owners: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            instrument_id: InstrumentId(1),
            num_orders: 1000,
            buy_ratio: 0.5,
            limit_ratio: 0.9,
            price_min: 95,
            price_max: 105,
            quantity_min: 1,
            quantity_max: 100,
            num_owners: 5,
        }
    }
}

/// Deterministic request stream. Create with [`Generator::new`]; pull
/// requests with [`Generator::next_request`].
pub struct Generator {
    rng: StdRng,
    config: GeneratorConfig,
}

impl Generator {
    /// Builds a generator with the given config. Same config (including
    /// seed) ⇒ same stream.
    pub fn new(config: GeneratorConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self { rng, config }
    }

    /// Generates the next request. Advances the RNG state.
    pub fn next_request(&mut self) -> OrderRequest {
        let side = if self.rng.gen::<f64>() < self.config.buy_ratio {
            Side::Buy
        } else {
            Side::Sell
        };
        let is_limit = self.rng.gen::<f64>() < self.config.limit_ratio;
        let quantity = self
            .rng
            .gen_range(self.config.quantity_min..=self.config.quantity_max);
        let limit_price = if is_limit {
            let price = self
                .rng
                .gen_range(self.config.price_min..=self.config.price_max);
            Some(Decimal::from(price))
        } else {
            None
        };
        let owner_id = OwnerId(self.rng.gen_range(1..=self.config.num_owners.max(1)));
        OrderRequest {
            instrument_id: self.config.instrument_id,
            owner_id,
            side,
            kind: if is_limit {
                OrderKind::Limit
            } else {
                OrderKind::Market
            },
            quantity,
            limit_price,
        }
    }

    /// Returns exactly `n` requests, advancing the generator state.
    pub fn take_requests(&mut self, n: usize) -> Vec<OrderRequest> {
        (0..n).map(|_| self.next_request()).collect()
    }

    /// Returns the full stream as defined by `config.num_orders`.
    pub fn all_requests(&mut self) -> Vec<OrderRequest> {
        self.take_requests(self.config.num_orders)
    }
}

/// Replays a sequence of requests into the exchange. Returns the number of
/// accepted orders and total trades (or the first error).
pub fn replay_into_exchange(
    exchange: &Exchange,
    requests: impl IntoIterator<Item = OrderRequest>,
) -> Result<(usize, usize), EngineError> {
    let mut accepted = 0usize;
    let mut total_trades = 0usize;
    for request in requests {
        let outcome = exchange.submit(request)?;
        accepted += 1;
        total_trades += outcome.trades.len();
    }
    Ok((accepted, total_trades))
}
