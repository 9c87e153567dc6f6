//! JSON-RPC substrate
//!
//! The extension layer is written against [`RpcTransport`], the minimal
//! surface it needs from a connection: correlated requests, fire-and-forget
//! notifications, and notification subscriptions. [`ServerConnection`] is
//! the production implementation over a spawned backend process.

pub mod connection;
pub mod protocol;
pub mod transport;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::RpcError;

pub use connection::ServerConnection;

/// Callback invoked with the raw params of an incoming notification.
pub type RawNotificationHandler = Box<dyn Fn(Value) + Send + Sync>;

/// The transport surface the extension layer depends on.
///
/// Requests preserve program order on the wire; responses correlate by id
/// and may complete out of order. Notifications are fire-and-forget. There
/// is no implicit timeout: cancellation is explicit and domain-specific
/// (e.g. `query/cancel`).
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Send a request and await the correlated response payload.
    async fn send_request(&self, method: &str, params: Option<Value>) -> Result<Value, RpcError>;

    /// Send a one-way notification.
    async fn send_notification(&self, method: &str, params: Option<Value>)
    -> Result<(), RpcError>;

    /// Subscribe to an incoming notification method. Multiple handlers per
    /// method are allowed; all are invoked in subscription order.
    async fn on_notification(&self, method: &str, handler: RawNotificationHandler);
}
