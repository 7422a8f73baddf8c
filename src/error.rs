//! Typed failures for the engine boundary.
//!
//! Every variant is a precondition-style rejection: detected before any book
//! mutation, so a failed call leaves all state unchanged. "No liquidity" is
//! not an error; it is encoded in the resulting order status.

use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The submission names an instrument the exchange does not list.
    #[error("instrument not found")]
    InstrumentNotFound,

    /// Non-positive quantity, or a limit order without a positive limit price.
    #[error("invalid order parameters: {0}")]
    InvalidOrderParameters(String),

    /// Cancel target does not exist.
    #[error("order not found")]
    OrderNotFound,

    /// Cancel target is already filled or cancelled.
    #[error("order is not cancellable")]
    OrderNotCancellable,
}
