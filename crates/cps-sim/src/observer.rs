//! Coordinator observer trait and a recording implementation.

use cps_agent::{CycleObserver, CycleState, Transition};
use cps_core::{AgentId, StepKind, Tick};
use cps_reply::PendingKey;

/// Callbacks invoked by [`Coordinator::run_until`][crate::Coordinator::run_until].
///
/// Extends [`CycleObserver`], whose hooks the agents call directly.  All
/// methods have default no-op implementations.
///
/// # Example: counting firings
///
/// ```rust,ignore
/// struct Firings(u64);
///
/// impl CycleObserver for Firings {}
/// impl SimObserver for Firings {
///     fn on_event_fired(&mut self, _at: Tick, _agent: AgentId) {
///         self.0 += 1;
///     }
/// }
/// ```
pub trait SimObserver: CycleObserver {
    /// An agent is about to be resumed at `at`.
    fn on_event_fired(&mut self, _at: Tick, _agent: AgentId) {}

    /// Step completions were still pending when virtual time was about to
    /// advance past `at`.
    fn on_gate_violation(&mut self, _at: Tick, _pending: &[PendingKey]) {}

    /// A `run_until` call returned; `until` is its horizon.
    fn on_segment_end(&mut self, _until: Tick) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl CycleObserver for NoopObserver {}
impl SimObserver for NoopObserver {}

// ── TransitionLog ─────────────────────────────────────────────────────────────

/// Records every callback, in order.
#[derive(Clone, Debug, Default)]
pub struct TransitionLog {
    pub transitions:     Vec<Transition>,
    pub fired:           Vec<(Tick, AgentId)>,
    pub timeouts:        Vec<(AgentId, StepKind, Tick)>,
    pub retired:         Vec<(AgentId, Tick)>,
    pub gate_violations: Vec<(Tick, Vec<PendingKey>)>,
    pub segments:        Vec<Tick>,
}

impl TransitionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transitions_of(&self, agent: AgentId) -> impl Iterator<Item = &Transition> + '_ {
        self.transitions.iter().filter(move |t| t.agent == agent)
    }

    /// Instants at which `agent` was fired.
    pub fn fired_of(&self, agent: AgentId) -> Vec<Tick> {
        self.fired.iter().filter(|(_, a)| *a == agent).map(|(t, _)| *t).collect()
    }

    /// First instant `agent` entered `state`.
    pub fn first_entry(&self, agent: AgentId, state: CycleState) -> Option<Tick> {
        self.transitions_of(agent).find(|t| t.to == state).map(|t| t.at)
    }
}

impl CycleObserver for TransitionLog {
    fn on_transition(&mut self, transition: &Transition) {
        self.transitions.push(*transition);
    }

    fn on_step_timed_out(&mut self, agent: AgentId, step: StepKind, at: Tick) {
        self.timeouts.push((agent, step, at));
    }

    fn on_agent_retired(&mut self, agent: AgentId, at: Tick) {
        self.retired.push((agent, at));
    }
}

impl SimObserver for TransitionLog {
    fn on_event_fired(&mut self, at: Tick, agent: AgentId) {
        self.fired.push((at, agent));
    }

    fn on_gate_violation(&mut self, at: Tick, pending: &[PendingKey]) {
        self.gate_violations.push((at, pending.to_vec()));
    }

    fn on_segment_end(&mut self, until: Tick) {
        self.segments.push(until);
    }
}
