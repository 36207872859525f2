//! Bidirectional message transport seam
//!
//! The connection engine never touches sockets directly. It starts a
//! [`Transport`], writes encoded frames with [`Transport::send`] and reacts to
//! the two callbacks installed before `start`:
//!
//! ```text
//! Transport reader ──> on_receive(payload) ──> message pump (awaited, in order)
//!                 └──> on_close(reason)    ──> engine teardown
//! ```

use crate::error::Result;
use crate::headers::Headers;
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::sync::Arc;

/// Callback invoked for every received text payload
///
/// The transport must await the returned future before delivering the next
/// payload, which keeps the message pump strictly ordered and non-reentrant.
pub type ReceiveCallback = Arc<dyn Fn(String) -> BoxFuture<'static, ()> + Send + Sync>;

/// Callback invoked once when the transport closes
///
/// `None` means an orderly close, `Some(reason)` an abnormal one.
pub type CloseCallback = Arc<dyn Fn(Option<String>) -> BoxFuture<'static, ()> + Send + Sync>;

/// Text message transport used by the connection engine
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open the transport to `url`, sending `headers` with the upgrade request
    async fn start(&self, url: &str, headers: &Headers) -> Result<()>;

    /// Send one text payload
    async fn send(&self, message: String) -> Result<()>;

    /// Install the receive callback (replaces any earlier one)
    fn set_on_receive(&self, callback: ReceiveCallback);

    /// Install the close callback (replaces any earlier one)
    fn set_on_close(&self, callback: CloseCallback);

    /// Close the transport
    async fn stop(&self) -> Result<()>;
}

/// Builds a fresh transport for every start when none was supplied up-front
pub type TransportFactory = Arc<dyn Fn() -> Arc<dyn Transport> + Send + Sync>;
