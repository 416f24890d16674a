//! What an agent sees while it is resumed.

use std::time::Duration;

use cps_bus::ComputeRequester;
use cps_core::Tick;
use cps_reply::ReplyTracker;

use crate::CycleObserver;

/// Borrowed view of the coordinator passed to [`Agent::resume`].
///
/// Built fresh for every resumption; nothing in it outlives the call.
///
/// [`Agent::resume`]: crate::Agent::resume
pub struct CycleContext<'a> {
    /// Virtual time of the firing that resumed the agent.
    pub now:                    Tick,
    pub tracker:                &'a ReplyTracker,
    pub requester:              &'a dyn ComputeRequester,
    pub observer:               &'a mut dyn CycleObserver,
    /// Real-time deadline for each step request.
    pub reply_timeout:          Option<Duration>,
    pub max_consecutive_stalls: Option<u32>,
}
