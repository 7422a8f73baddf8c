//! HTTP server for the exchange: REST order entry plus the WebSocket book
//! feed.
//!
//! Configuration via env: `PORT` (default 8080), `SNAPSHOT_DEPTH` (default
//! 5 levels per side), `PUBLISH_INTERVAL_MS` (default 2000).

use exchange_core::api;
use exchange_core::engine::Exchange;
use exchange_core::feed::{run_publisher, SubscriberRegistry};
use exchange_core::types::{Instrument, InstrumentId};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;

fn default_instruments() -> Vec<Instrument> {
    [
        ("ALFA", "Alfa Industrials"),
        ("BRVO", "Bravo Logistics"),
        ("CHLI", "Charlie Energy"),
    ]
    .iter()
    .enumerate()
    .map(|(i, (ticker, name))| Instrument {
        id: InstrumentId(i as u64 + 1),
        ticker: (*ticker).into(),
        name: (*name).into(),
    })
    .collect()
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() {
    let _ = env_logger::try_init();
    let port: u16 = env_or("PORT", 8080);
    let depth: usize = env_or("SNAPSHOT_DEPTH", 5);
    let interval_ms: u64 = env_or("PUBLISH_INTERVAL_MS", 2000);

    let exchange = Arc::new(Exchange::new(default_instruments()));
    let registry = SubscriberRegistry::new();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(run_publisher(
        exchange.clone(),
        registry.clone(),
        Duration::from_millis(interval_ms),
        depth,
        shutdown_rx,
    ));

    let app = api::create_router(exchange, registry, depth);
    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr).await.expect("bind");
    eprintln!("listening on http://{}", addr);
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .expect("serve");
    let _ = shutdown_tx.send(true);
}
