//! The discrete-event scheduler: a virtual clock plus a [`WakeQueue`].

use cps_core::{AgentId, SimClock, Tick};
use tracing::trace;

use crate::{ScheduleError, ScheduleResult, WakeQueue};

/// All agents woken by one call to [`Scheduler::fire_next`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Firing {
    /// The instant the clock advanced to.
    pub at: Tick,
    /// Agents due at `at`, in the order they were scheduled.
    pub agents: Vec<AgentId>,
}

/// Discrete-event engine holding every parked agent's next wake instant.
///
/// The scheduler owns the simulation clock and is the only thing that
/// advances it.  Agents never see future events; they hand the scheduler a
/// relative duration via [`wait_for`][Self::wait_for].
#[derive(Debug)]
pub struct Scheduler {
    clock: SimClock,
    queue: WakeQueue,
}

impl Scheduler {
    pub fn new(clock: SimClock) -> Self {
        Self { clock, queue: WakeQueue::new() }
    }

    /// The current virtual time.
    #[inline]
    pub fn now(&self) -> Tick {
        self.clock.current_tick
    }

    #[inline]
    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    /// The earliest pending wake instant, without mutating anything.
    #[inline]
    pub fn peek_next_time(&self) -> Option<Tick> {
        self.queue.next_tick()
    }

    /// Advance the clock to the earliest pending instant and hand back every
    /// agent due then.
    ///
    /// All agents sharing an instant are returned together, so none of them
    /// can observe a clock that has already moved past a sibling.
    pub fn fire_next(&mut self) -> Option<Firing> {
        let (at, agents) = self.queue.pop_earliest()?;
        self.clock.advance_to(at);
        trace!(%at, woken = agents.len(), "fired");
        Some(Firing { at, agents })
    }

    /// Park `agent` until `now + ticks`.
    ///
    /// A zero duration would re-fire the agent at the same instant forever,
    /// so it is rejected immediately.  A wake past the last representable
    /// tick is rejected with [`ScheduleError::Overflow`] and nothing is
    /// queued.
    pub fn wait_for(&mut self, agent: AgentId, ticks: u64) -> ScheduleResult<Tick> {
        if ticks == 0 {
            return Err(ScheduleError::NonPositiveDuration { agent, at: self.now() });
        }
        let wake = self
            .now()
            .checked_add(ticks)
            .ok_or(ScheduleError::Overflow { agent, at: self.now(), ticks })?;
        self.queue.push(wake, agent);
        Ok(wake)
    }

    /// Park `agent` until the absolute instant `tick`.
    ///
    /// Used for the initial phase delay, where a delay of zero is legal.
    pub fn schedule_at(&mut self, agent: AgentId, tick: Tick) -> ScheduleResult<()> {
        if tick < self.now() {
            return Err(ScheduleError::InPast { agent, requested: tick, now: self.now() });
        }
        self.queue.push(tick, agent);
        Ok(())
    }

    /// Drop every pending wake of `agent`.
    pub fn cancel(&mut self, agent: AgentId) -> bool {
        self.queue.remove_agent(agent) > 0
    }

    /// The instant `agent` is next due, if any.
    pub fn wake_of(&self, agent: AgentId) -> Option<Tick> {
        self.queue.wake_of(agent)
    }

    /// Number of parked agents.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}
