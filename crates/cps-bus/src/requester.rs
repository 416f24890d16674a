//! The `ComputeRequester` seam and its bus-backed implementation.

use std::sync::Arc;

use cps_core::{AgentId, CorrelationId, ScenarioLabel, StepKind};
use tracing::debug;

use crate::{BusResult, DEFAULT_TOPIC, MessageChannel, RequestMessage};

/// Prefix of the per-cycle announcement; the agent name follows.
pub const RESULTS_PRODUCED: &str = "The results of this timestep have been produced at";

/// Everything a requester needs to start one external step.
#[derive(Copy, Clone, Debug)]
pub struct ComputeRequest<'a> {
    pub agent_id:    AgentId,
    pub agent:       &'a str,
    pub step:        StepKind,
    pub scenario:    &'a ScenarioLabel,
    pub correlation: CorrelationId,
}

/// Starts out-of-process computation.  Must return without waiting for it.
pub trait ComputeRequester {
    fn issue(&self, request: &ComputeRequest<'_>) -> BusResult<()>;

    /// Tell the outside world that `agent` finished both steps of a cycle.
    fn announce_cycle_results(&self, _agent: &str) -> BusResult<()> {
        Ok(())
    }
}

impl<R: ComputeRequester + ?Sized> ComputeRequester for Arc<R> {
    fn issue(&self, request: &ComputeRequest<'_>) -> BusResult<()> {
        (**self).issue(request)
    }

    fn announce_cycle_results(&self, agent: &str) -> BusResult<()> {
        (**self).announce_cycle_results(agent)
    }
}

impl<R: ComputeRequester + ?Sized> ComputeRequester for Box<R> {
    fn issue(&self, request: &ComputeRequest<'_>) -> BusResult<()> {
        (**self).issue(request)
    }

    fn announce_cycle_results(&self, agent: &str) -> BusResult<()> {
        (**self).announce_cycle_results(agent)
    }
}

// ── BusRequester ──────────────────────────────────────────────────────────────

/// Publishes every request as a [`RequestMessage`] on one topic.
pub struct BusRequester<C> {
    channel:  C,
    topic:    String,
    receiver: String,
}

impl<C: MessageChannel> BusRequester<C> {
    /// Requests go to [`DEFAULT_TOPIC`], addressed to `receiver`.
    pub fn new(channel: C, receiver: impl Into<String>) -> Self {
        Self { channel, topic: DEFAULT_TOPIC.to_owned(), receiver: receiver.into() }
    }
}

impl<C: MessageChannel> ComputeRequester for BusRequester<C> {
    fn issue(&self, request: &ComputeRequest<'_>) -> BusResult<()> {
        let message = RequestMessage::new(request.scenario.as_str(), request.agent, self.receiver.as_str())
            .with_correlation(request.step, request.correlation);
        debug!(agent = request.agent, step = %request.step, correlation = request.correlation.0, "request issued");
        self.channel.publish(&self.topic, message.to_string())
    }

    fn announce_cycle_results(&self, agent: &str) -> BusResult<()> {
        self.channel.publish(&self.topic, format!("{RESULTS_PRODUCED} {agent}."))
    }
}
