//! REST and WebSocket router for the exchange.
//!
//! Used by the binary and by integration tests. Create with
//! [`create_router`]. Uses Extension for state so the router is `Router<()>`
//! and works with `into_make_service()`. Identity and authorization live in
//! front of this layer; the only caller-side check done here is that a cancel
//! names an order the requester owns.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Extension, Path, Query,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

use crate::engine::Exchange;
use crate::error::EngineError;
use crate::feed::{snapshot_message, SubscriberRegistry};
use crate::types::{InstrumentId, OrderId, OrderRequest, OwnerId};

/// Shared app state: the exchange plus the market-data subscriber registry.
#[derive(Clone)]
pub struct AppState {
    pub exchange: Arc<Exchange>,
    pub registry: SubscriberRegistry,
    pub snapshot_depth: usize,
}

/// Builds the router with state. Returns `Router<()>` so you can call
/// `.into_make_service()` for `axum::serve`.
pub fn create_router(
    exchange: Arc<Exchange>,
    registry: SubscriberRegistry,
    snapshot_depth: usize,
) -> Router<()> {
    let state = AppState {
        exchange,
        registry,
        snapshot_depth,
    };
    Router::new()
        .route("/health", get(health))
        .route("/instruments", get(list_instruments))
        .route("/orders", post(submit_order).get(list_orders))
        .route("/orders/cancel", post(cancel_order))
        .route("/orders/:order_id", get(get_order))
        .route("/trades", get(list_trades))
        .route("/book/:instrument_id", get(book_snapshot))
        .route("/ws/book/:instrument_id", get(ws_book))
        .layer(Extension(state))
}

fn error_response(err: EngineError) -> Response {
    let status = match err {
        EngineError::InstrumentNotFound | EngineError::OrderNotFound => StatusCode::NOT_FOUND,
        EngineError::InvalidOrderParameters(_) => StatusCode::BAD_REQUEST,
        EngineError::OrderNotCancellable => StatusCode::CONFLICT,
    };
    (status, Json(serde_json::json!({ "error": err.to_string() }))).into_response()
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn list_instruments(Extension(state): Extension<AppState>) -> Response {
    (StatusCode::OK, Json(state.exchange.instruments().to_vec())).into_response()
}

async fn submit_order(
    Extension(state): Extension<AppState>,
    Json(request): Json<OrderRequest>,
) -> Response {
    match state.exchange.submit(request) {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(err) => error_response(err),
    }
}

#[derive(serde::Deserialize)]
struct CancelRequest {
    order_id: u64,
    owner_id: u64,
}

async fn cancel_order(
    Extension(state): Extension<AppState>,
    Json(body): Json<CancelRequest>,
) -> Response {
    let order_id = OrderId(body.order_id);
    // Ownership is the caller's responsibility, enforced here at the
    // transport boundary: an order you do not own is not found for you.
    match state.exchange.order(order_id) {
        Ok(order) if order.owner_id != OwnerId(body.owner_id) => {
            return error_response(EngineError::OrderNotFound);
        }
        Ok(_) => {}
        Err(err) => return error_response(err),
    }
    match state.exchange.cancel(order_id) {
        Ok(order) => (StatusCode::OK, Json(order)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn get_order(
    Extension(state): Extension<AppState>,
    Path(order_id): Path<u64>,
) -> Response {
    match state.exchange.order(OrderId(order_id)) {
        Ok(order) => (StatusCode::OK, Json(order)).into_response(),
        Err(err) => error_response(err),
    }
}

#[derive(serde::Deserialize)]
struct OrdersQuery {
    instrument_id: Option<u64>,
    owner_id: Option<u64>,
}

async fn list_orders(
    Extension(state): Extension<AppState>,
    Query(query): Query<OrdersQuery>,
) -> Response {
    let orders = match (query.instrument_id, query.owner_id) {
        (Some(instrument_id), owner) => {
            match state.exchange.orders(InstrumentId(instrument_id)) {
                Ok(orders) => match owner {
                    Some(owner_id) => orders
                        .into_iter()
                        .filter(|o| o.owner_id == OwnerId(owner_id))
                        .collect(),
                    None => orders,
                },
                Err(err) => return error_response(err),
            }
        }
        (None, Some(owner_id)) => state.exchange.orders_for_owner(OwnerId(owner_id)),
        (None, None) => {
            let mut all = Vec::new();
            for instrument in state.exchange.instruments() {
                if let Ok(orders) = state.exchange.orders(instrument.id) {
                    all.extend(orders);
                }
            }
            all
        }
    };
    (StatusCode::OK, Json(orders)).into_response()
}

#[derive(serde::Deserialize)]
struct TradesQuery {
    instrument_id: Option<u64>,
    owner_id: Option<u64>,
}

async fn list_trades(
    Extension(state): Extension<AppState>,
    Query(query): Query<TradesQuery>,
) -> Response {
    let trades = match (query.instrument_id, query.owner_id) {
        (Some(instrument_id), owner) => {
            match state.exchange.trades(InstrumentId(instrument_id)) {
                Ok(trades) => match owner {
                    Some(owner_id) => trades
                        .into_iter()
                        .filter(|t| {
                            t.buy_owner_id == OwnerId(owner_id)
                                || t.sell_owner_id == OwnerId(owner_id)
                        })
                        .collect(),
                    None => trades,
                },
                Err(err) => return error_response(err),
            }
        }
        (None, Some(owner_id)) => state.exchange.trades_for_owner(OwnerId(owner_id)),
        (None, None) => {
            let mut all = Vec::new();
            for instrument in state.exchange.instruments() {
                if let Ok(trades) = state.exchange.trades(instrument.id) {
                    all.extend(trades);
                }
            }
            all
        }
    };
    (StatusCode::OK, Json(trades)).into_response()
}

#[derive(serde::Deserialize)]
struct DepthQuery {
    depth: Option<usize>,
}

async fn book_snapshot(
    Extension(state): Extension<AppState>,
    Path(instrument_id): Path<u64>,
    Query(query): Query<DepthQuery>,
) -> Response {
    let depth = query.depth.unwrap_or(state.snapshot_depth);
    match state.exchange.snapshot(InstrumentId(instrument_id), depth) {
        Ok(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn ws_book(
    ws: WebSocketUpgrade,
    Path(instrument_id): Path<u64>,
    Extension(state): Extension<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| serve_book_socket(socket, state, InstrumentId(instrument_id)))
}

/// Sends the current snapshot on connect, then forwards the periodic feed
/// until the client disconnects. Inbound frames are treated as keep-alives.
async fn serve_book_socket(mut socket: WebSocket, state: AppState, instrument_id: InstrumentId) {
    let Some(initial) = snapshot_message(&state.exchange, instrument_id, state.snapshot_depth)
    else {
        let _ = socket.send(Message::Close(None)).await;
        return;
    };
    if socket.send(Message::Text(initial)).await.is_err() {
        return;
    }
    let mut feed = state.registry.subscribe(instrument_id);
    loop {
        tokio::select! {
            update = feed.recv() => {
                match update {
                    Some(message) => {
                        if socket.send(Message::Text(message)).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(_)) => {}
                    _ => break,
                }
            }
        }
    }
}
