//! ConnectionManager / FeedSession traits - transport abstraction
//!
//! A `ConnectionManager` opens a session and performs the subscribe
//! handshake; the `FeedSession` then yields raw frames until the remote end
//! goes away. Retry policy is not part of either trait.

use bytes::Bytes;

use crate::{ContractError, SubscriptionRequest};

/// Feed connection manager
///
/// Implementations must not retry internally.
#[trait_variant::make(ConnectionManager: Send)]
pub trait LocalConnectionManager {
    /// Session type produced by a successful acquisition
    type Session: FeedSession + 'static;

    /// Endpoint description (used for logging)
    fn endpoint(&self) -> &str;

    /// Open the transport and send exactly one subscription request
    ///
    /// # Errors
    /// - `DialFailed` when the transport cannot be established
    /// - `HandshakeFailed` when the subscription cannot be delivered
    async fn acquire(&self, request: &SubscriptionRequest)
        -> Result<Self::Session, ContractError>;
}

/// An established, subscribed feed session
#[trait_variant::make(FeedSession: Send)]
pub trait LocalFeedSession {
    /// Read the next raw frame
    ///
    /// # Errors
    /// Returns `StreamClosed` when the remote end terminates or the read
    /// fails. This is the only signal used to trigger reconnection.
    async fn read_frame(&mut self) -> Result<Bytes, ContractError>;

    /// Close the session
    ///
    /// Idempotent: calls after the first are no-ops.
    async fn close(&mut self);
}
