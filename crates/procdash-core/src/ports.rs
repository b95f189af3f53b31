//! Port definitions shared between the runtime and its adapters.

use async_trait::async_trait;

use crate::protocol::{Delivery, ServerEvent};

/// Outbound event delivery port.
///
/// The supervisor emits lifecycle and log events through this trait without
/// knowing how sessions are tracked or what transport carries the events.
/// The network adapter implements it over its session table; tests implement
/// it with a capture channel.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Deliver one event according to its routing.
    async fn deliver(&self, delivery: Delivery, event: ServerEvent);
}
