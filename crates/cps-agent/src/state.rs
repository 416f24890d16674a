//! Cycle states, transitions, and the hook that observes them.

use std::fmt;

use cps_core::{AgentId, StepKind, Tick};

/// Where an agent is within its cycle.  Exactly one at a time.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum CycleState {
    /// Waiting out the phase delay.  Only ever the first state.
    InitialDelay,
    RequestStep1,
    AwaitStep1,
    RequestStep2,
    AwaitStep2,
    /// Local working pause of one cycle length.
    Working,
    /// Transient; the agent moves straight on to the next cycle.
    CycleDone,
}

impl CycleState {
    pub fn as_str(self) -> &'static str {
        match self {
            CycleState::InitialDelay => "INITIAL_DELAY",
            CycleState::RequestStep1 => "REQUEST_STEP_1",
            CycleState::AwaitStep1 => "AWAIT_STEP_1",
            CycleState::RequestStep2 => "REQUEST_STEP_2",
            CycleState::AwaitStep2 => "AWAIT_STEP_2",
            CycleState::Working => "WORKING",
            CycleState::CycleDone => "CYCLE_DONE",
        }
    }

    /// The step an agent in this state is requesting or awaiting.
    pub fn step(self) -> Option<StepKind> {
        match self {
            CycleState::RequestStep1 | CycleState::AwaitStep1 => Some(StepKind::Step1),
            CycleState::RequestStep2 | CycleState::AwaitStep2 => Some(StepKind::Step2),
            _ => None,
        }
    }
}

impl fmt::Display for CycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One state change of one agent.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Transition {
    pub agent: AgentId,
    /// 1-based index of the cycle the agent is in after the change.
    pub cycle: u64,
    pub from:  CycleState,
    pub to:    CycleState,
    pub at:    Tick,
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} #{}: {} -> {}", self.at, self.agent, self.cycle, self.from, self.to)
    }
}

/// Receives what agents do while they run.  All methods default to no-ops.
pub trait CycleObserver {
    fn on_transition(&mut self, _transition: &Transition) {}

    /// A pending step passed its deadline; the cycle is stalled.
    fn on_step_timed_out(&mut self, _agent: AgentId, _step: StepKind, _at: Tick) {}

    /// The agent stalled too often in a row and stops cycling.
    fn on_agent_retired(&mut self, _agent: AgentId, _at: Tick) {}
}

/// Records transitions only.
impl CycleObserver for Vec<Transition> {
    fn on_transition(&mut self, transition: &Transition) {
        self.push(*transition);
    }
}
