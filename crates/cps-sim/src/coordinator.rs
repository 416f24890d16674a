//! The `Coordinator` struct and its run loop.

use std::sync::Arc;
use std::time::Duration;

use cps_agent::{Agent, CycleContext, Resume};
use cps_bus::ComputeRequester;
use cps_core::{AgentId, Ratio, SimConfig, Tick};
use cps_reply::{AgentDirectory, CompletionRouter, PendingKey, ReplyTracker};
use cps_schedule::{ScheduleError, Scheduler};
use tracing::{debug, info, warn};

use crate::{AgentSummary, RunSummary, SimError, SimObserver, SimResult};

/// The top-level run driver.
///
/// Create via [`CoordinatorBuilder`][crate::CoordinatorBuilder].
///
/// # Run loop
///
/// ```text
/// while peek_next_time() < until:
///     if next == processed:          fire_next(); resume every fired agent
///     else:                          gate(); processed ← next
/// ```
///
/// `processed` is the last instant whose firings are known to be complete.
/// Firings at that instant run back to back; before moving on to a later
/// instant the gate checks that no step completion is still pending.
pub struct Coordinator<R: ComputeRequester> {
    pub(crate) config:          SimConfig,
    pub(crate) scheduler:       Scheduler,
    pub(crate) agents:          Vec<Agent>,
    pub(crate) directory:       AgentDirectory,
    pub(crate) tracker:         Arc<ReplyTracker>,
    pub(crate) requester:       R,
    pub(crate) gate_timeout:    Duration,
    pub(crate) processed:       Tick,
    pub(crate) events_fired:    u64,
    pub(crate) gate_violations: u64,
}

impl<R: ComputeRequester> Coordinator<R> {
    /// Run to the configured horizon.
    pub fn run<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<()> {
        self.run_until(self.config.until, observer)
    }

    /// Run every event before `until` (time units).
    ///
    /// May be called repeatedly with growing horizons; agents keep their
    /// state and pending wakes between calls.  Returns an error only for
    /// scheduler misuse, which aborts the run.
    pub fn run_until<O: SimObserver>(&mut self, until: Ratio, observer: &mut O) -> SimResult<()> {
        let until_tick = self.config.tick_at(until);
        info!(until = %until, at = %self.scheduler.now(), agents = self.agents.len(), "run segment start");

        while let Some(next) = self.scheduler.peek_next_time() {
            if next >= until_tick {
                break;
            }
            if next == self.processed {
                self.fire(observer)?;
            } else {
                self.gate(observer);
                self.processed = next;
            }
        }

        observer.on_segment_end(until_tick);
        info!(until = %until, events = self.events_fired, "run segment end");
        Ok(())
    }

    /// Fire the earliest instant and resume every agent due then, in the
    /// order they were scheduled.
    fn fire<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<()> {
        let Some(firing) = self.scheduler.fire_next() else { return Ok(()) };

        for agent_id in firing.agents {
            self.events_fired += 1;
            observer.on_event_fired(firing.at, agent_id);

            let Some(agent) = self.agents.get_mut(agent_id.index()) else {
                return Err(SimError::Config(format!("scheduled {agent_id} is not registered")));
            };
            let mut ctx = CycleContext {
                now:                    firing.at,
                tracker:                &self.tracker,
                requester:              &self.requester,
                observer:               &mut *observer,
                reply_timeout:          self.config.reply_timeout(),
                max_consecutive_stalls: self.config.max_consecutive_stalls,
            };

            match agent.resume(&mut ctx) {
                Resume::WaitFor(ticks) => match self.scheduler.wait_for(agent_id, ticks) {
                    Ok(_) => {}
                    // A wake past the last tick lies beyond every horizon.
                    Err(ScheduleError::Overflow { .. }) => {
                        warn!(agent = %agent_id, ticks, "next wake is past the end of time; agent parked");
                    }
                    Err(e) => return Err(e.into()),
                },
                Resume::Retire => {
                    self.scheduler.cancel(agent_id);
                    debug!(agent = %agent_id, "agent unscheduled");
                }
            }
        }
        Ok(())
    }

    /// Backstop before virtual time advances.  Agents await their own
    /// steps, so anything still pending here was never going to be awaited:
    /// it is reported, given `gate_timeout` to clear, then abandoned.
    fn gate<O: SimObserver>(&mut self, observer: &mut O) {
        let external = |k: &PendingKey| k.step.is_external();
        if !self.tracker.has_any_pending(external) {
            return;
        }

        let pending = self.tracker.pending_keys(external);
        warn!(at = %self.processed, count = pending.len(), "step completions pending at time boundary");
        self.gate_violations += 1;
        observer.on_gate_violation(self.processed, &pending);

        if !self.tracker.wait_idle(external, self.gate_timeout) {
            let dropped = self.tracker.abandon_where(external);
            warn!(count = dropped.len(), "abandoned step completions nobody awaits");
        }
    }

    // ── Segment control ───────────────────────────────────────────────────

    /// Re-tune the cycle period of `name`.  Applies from the agent's next
    /// working pause.
    pub fn set_cycle_period(&mut self, name: &str, period: Ratio) -> SimResult<()> {
        let id = self.directory.lookup(name).ok_or_else(|| SimError::UnknownAgent(name.to_owned()))?;
        let ticks = self.config.cycle_ticks(period)?;
        if ticks == 0 {
            return Err(SimError::Config(format!("cycle period {period} of {name:?} is not positive")));
        }
        if let Some(agent) = self.agents.get_mut(id.index()) {
            agent.set_cycle_ticks(ticks)?;
        }
        info!(agent = name, %period, ticks, "cycle period changed");
        Ok(())
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Current virtual time.
    pub fn now(&self) -> Tick {
        self.scheduler.now()
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agent(&self, name: &str) -> Option<&Agent> {
        self.directory.lookup(name).and_then(|id| self.agents.get(id.index()))
    }

    pub fn agent_id(&self, name: &str) -> Option<AgentId> {
        self.directory.lookup(name)
    }

    pub fn tracker(&self) -> &Arc<ReplyTracker> {
        &self.tracker
    }

    pub fn requester(&self) -> &R {
        &self.requester
    }

    /// A router that clears this coordinator's tracker.  Subscribe it to
    /// the completion topic with [`route_completions`][crate::route_completions].
    pub fn completion_router(&self) -> Arc<CompletionRouter> {
        Arc::new(CompletionRouter::new(Arc::clone(&self.tracker), self.directory.clone()))
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            now:             self.scheduler.now(),
            now_units:       self.scheduler.clock().now_units(),
            events_fired:    self.events_fired,
            gate_violations: self.gate_violations,
            tracker:         self.tracker.stats(),
            agents:          self.agents.iter().map(AgentSummary::of).collect(),
        }
    }
}
