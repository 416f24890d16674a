//! The `MessageChannel` seam.
//!
//! A channel publishes text payloads to named topics and invokes subscriber
//! callbacks on its own delivery thread.  The core never assumes ordering or
//! exactly-once delivery from it.

use std::sync::Arc;

use crate::BusResult;

/// Topic used for both requests and completion notices unless configured
/// otherwise.
pub const DEFAULT_TOPIC: &str = "CoNM/workflow_system";

/// One delivered message.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Envelope {
    pub topic:   String,
    pub payload: String,
}

/// Subscriber callback.  Runs on the channel's delivery thread, so it must
/// not block on anything that waits for that thread.
pub type Handler = Arc<dyn Fn(&Envelope) + Send + Sync>;

pub trait MessageChannel: Send + Sync {
    /// Queue `payload` for delivery to every subscriber of `topic`.
    fn publish(&self, topic: &str, payload: String) -> BusResult<()>;

    /// Register `handler` for every later message on `topic`.
    fn subscribe(&self, topic: &str, handler: Handler) -> BusResult<()>;
}

impl<C: MessageChannel + ?Sized> MessageChannel for Arc<C> {
    fn publish(&self, topic: &str, payload: String) -> BusResult<()> {
        (**self).publish(topic, payload)
    }

    fn subscribe(&self, topic: &str, handler: Handler) -> BusResult<()> {
        (**self).subscribe(topic, handler)
    }
}
