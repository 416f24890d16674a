//! Connecting a coordinator's tracker to a message channel.

use std::sync::Arc;

use cps_bus::{BusResult, Envelope, MessageChannel};
use cps_reply::CompletionRouter;

/// Subscribe `router` to `topic`, so every completion notice delivered
/// there clears the matching pending step.
pub fn route_completions<C>(channel: &C, topic: &str, router: Arc<CompletionRouter>) -> BusResult<()>
where
    C: MessageChannel + ?Sized,
{
    channel.subscribe(
        topic,
        Arc::new(move |envelope: &Envelope| {
            router.handle(&envelope.payload);
        }),
    )
}
