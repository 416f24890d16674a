//! The per-agent cycle state machine.
//!
//! # Cycle
//!
//! ```text
//! INITIAL_DELAY ─► REQUEST_STEP_1 ─► AWAIT_STEP_1 ─► REQUEST_STEP_2 ─► AWAIT_STEP_2 ─► WORKING
//!                        ▲                                                              │ wake
//!                        └──────────────────────── CYCLE_DONE ◄─────────────────────────┘
//! ```
//!
//! Clock agents skip both steps: `CYCLE_DONE ─► WORKING`.
//!
//! An agent is resumed by the coordinator whenever the scheduler fires it.
//! It runs transitions until it needs virtual time to pass, and then returns
//! [`Resume::WaitFor`].  The two await states block the calling thread on
//! the [`ReplyTracker`] until the bus delivery thread clears the step, or
//! until the step's deadline passes.
//!
//! # Stalls
//!
//! A step that cannot be issued, or whose reply does not arrive in time,
//! stalls the cycle: the step is abandoned in the tracker and the agent goes
//! straight to its working pause so its beat is kept.  A clean cycle resets
//! the stall streak; `max_consecutive_stalls` stalls in a row retire the
//! agent.
//!
//! [`ReplyTracker`]: cps_reply::ReplyTracker

use std::fmt;

use cps_bus::ComputeRequest;
use cps_core::{AgentId, ScenarioLabel, SimConfig, StepKind};
use cps_reply::ReplyError;
use cps_schedule::{AgentKind, AgentSpec};
use tracing::{debug, trace, warn};

use crate::{AgentError, AgentResult, CycleContext, CycleState, Transition};

// ── Types ─────────────────────────────────────────────────────────────────────

/// What the agent wants from the scheduler after a resumption.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Resume {
    /// Wake again this many ticks from now.
    WaitFor(u64),
    /// Never wake again.
    Retire,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum AgentHealth {
    #[default]
    Healthy,
    /// The last cycle stalled.
    Degraded,
    /// Stopped after too many stalls in a row.
    Retired,
}

impl fmt::Display for AgentHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AgentHealth::Healthy => "healthy",
            AgentHealth::Degraded => "degraded",
            AgentHealth::Retired => "retired",
        })
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct AgentStats {
    pub cycles_started:   u64,
    /// Cycles that reached their working pause with both steps observed.
    pub cycles_completed: u64,
    pub cycles_stalled:   u64,
    pub requests_issued:  u64,
}

// ── Agent ─────────────────────────────────────────────────────────────────────

pub struct Agent {
    id:                 AgentId,
    name:               String,
    kind:               AgentKind,
    cycle_ticks:        u64,
    phase_delay_ticks:  u64,
    step_1_scenario:    ScenarioLabel,
    step_2_scenario:    ScenarioLabel,
    state:              CycleState,
    cycle:              u64,
    cycle_stalled:      bool,
    consecutive_stalls: u32,
    health:             AgentHealth,
    stats:              AgentStats,
}

impl Agent {
    /// Build the agent described by `spec`, converting its period and delay
    /// to ticks under `config`.
    pub fn from_spec(id: AgentId, spec: &AgentSpec, config: &SimConfig) -> AgentResult<Agent> {
        if spec.name.is_empty() {
            return Err(AgentError::InvalidSpec { name: spec.name.clone(), reason: "empty name".into() });
        }
        let cycle_ticks = config.cycle_ticks(spec.cycle_period)?;
        if cycle_ticks == 0 {
            return Err(AgentError::InvalidSpec {
                name:   spec.name.clone(),
                reason: format!("cycle period {} is not positive", spec.cycle_period),
            });
        }

        Ok(Agent {
            id,
            name: spec.name.clone(),
            kind: spec.kind,
            cycle_ticks,
            phase_delay_ticks: config.delay_ticks(spec.phase_delay),
            step_1_scenario: spec.step_1_scenario.clone(),
            step_2_scenario: spec.step_2_scenario.clone(),
            state: CycleState::InitialDelay,
            cycle: 0,
            cycle_stalled: false,
            consecutive_stalls: 0,
            health: AgentHealth::Healthy,
            stats: AgentStats::default(),
        })
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> AgentKind {
        self.kind
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    /// Index of the current cycle; 0 before the first one starts.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn cycle_ticks(&self) -> u64 {
        self.cycle_ticks
    }

    /// Ticks before the first cycle.  The coordinator schedules the first
    /// wake at this offset.
    pub fn phase_delay_ticks(&self) -> u64 {
        self.phase_delay_ticks
    }

    pub fn health(&self) -> AgentHealth {
        self.health
    }

    pub fn stats(&self) -> AgentStats {
        self.stats
    }

    pub fn scenario(&self, step: StepKind) -> &ScenarioLabel {
        match step {
            StepKind::Step2 => &self.step_2_scenario,
            _ => &self.step_1_scenario,
        }
    }

    /// Change the cycle length.  Takes effect at the next working pause.
    pub fn set_cycle_ticks(&mut self, ticks: u64) -> AgentResult<()> {
        if ticks == 0 {
            return Err(AgentError::InvalidSpec {
                name:   self.name.clone(),
                reason: "cycle length must be positive".into(),
            });
        }
        self.cycle_ticks = ticks;
        Ok(())
    }

    // ── State machine ─────────────────────────────────────────────────────

    /// Run transitions until the agent needs virtual time to pass.
    pub fn resume(&mut self, ctx: &mut CycleContext<'_>) -> Resume {
        if self.health == AgentHealth::Retired {
            return Resume::Retire;
        }
        loop {
            match self.state {
                CycleState::InitialDelay | CycleState::CycleDone => {
                    if let Some(resume) = self.begin_cycle(ctx) {
                        return resume;
                    }
                }
                CycleState::RequestStep1 => {
                    if let Some(resume) = self.request(ctx, StepKind::Step1, CycleState::AwaitStep1) {
                        return resume;
                    }
                }
                CycleState::AwaitStep1 => {
                    if let Some(resume) = self.await_step(ctx, StepKind::Step1) {
                        return resume;
                    }
                    self.transition(ctx, CycleState::RequestStep2);
                }
                CycleState::RequestStep2 => {
                    if let Some(resume) = self.request(ctx, StepKind::Step2, CycleState::AwaitStep2) {
                        return resume;
                    }
                }
                CycleState::AwaitStep2 => {
                    if let Some(resume) = self.await_step(ctx, StepKind::Step2) {
                        return resume;
                    }
                    if let Err(e) = ctx.requester.announce_cycle_results(&self.name) {
                        warn!(agent = %self.name, error = %e, "cycle result announcement failed");
                    }
                    return self.start_work(ctx);
                }
                CycleState::Working => {
                    // Woken from the working pause.
                    ctx.tracker.clear(self.id, StepKind::Cycle);
                    self.transition(ctx, CycleState::CycleDone);
                }
            }
        }
    }

    /// Enter the first state of a new cycle.  Clock agents go straight to
    /// work and return their pause.
    fn begin_cycle(&mut self, ctx: &mut CycleContext<'_>) -> Option<Resume> {
        self.cycle += 1;
        self.cycle_stalled = false;
        self.stats.cycles_started += 1;
        ctx.tracker.mark_pending(self.id, StepKind::Cycle, None);

        match self.kind {
            AgentKind::Cps => {
                self.transition(ctx, CycleState::RequestStep1);
                None
            }
            AgentKind::Clock => Some(self.start_work(ctx)),
        }
    }

    /// Mark `step` pending, then hand it to the requester.  The mark comes
    /// first so a reply racing back before `issue` returns is not lost.
    fn request(&mut self, ctx: &mut CycleContext<'_>, step: StepKind, next: CycleState) -> Option<Resume> {
        let correlation = ctx.tracker.mark_pending(self.id, step, ctx.reply_timeout);
        let issued = ctx.requester.issue(&ComputeRequest {
            agent_id: self.id,
            agent: &self.name,
            step,
            scenario: self.scenario(step),
            correlation,
        });

        match issued {
            Ok(()) => {
                self.stats.requests_issued += 1;
                self.transition(ctx, next);
                None
            }
            Err(e) => {
                warn!(agent = %self.name, %step, error = %e, "request could not be issued");
                ctx.tracker.abandon_key(self.id, step);
                Some(self.stall(ctx))
            }
        }
    }

    /// Block until `step` clears.  `None` means it did; `Some` carries the
    /// resumption of a stalled cycle.
    fn await_step(&mut self, ctx: &mut CycleContext<'_>, step: StepKind) -> Option<Resume> {
        match ctx.tracker.wait_cleared(self.id, step) {
            Ok(()) => None,
            Err(e) => {
                if let ReplyError::StepTimedOut { waited, .. } = &e {
                    warn!(agent = %self.name, %step, ?waited, "step timed out");
                    ctx.observer.on_step_timed_out(self.id, step, ctx.now);
                } else {
                    warn!(agent = %self.name, %step, error = %e, "wait for step failed");
                }
                ctx.tracker.abandon_key(self.id, step);
                Some(self.stall(ctx))
            }
        }
    }

    /// Count a stalled cycle and either keep the beat or retire.
    fn stall(&mut self, ctx: &mut CycleContext<'_>) -> Resume {
        self.cycle_stalled = true;
        self.stats.cycles_stalled += 1;
        self.consecutive_stalls += 1;
        self.health = AgentHealth::Degraded;

        if ctx.max_consecutive_stalls.is_some_and(|max| self.consecutive_stalls >= max) {
            warn!(agent = %self.name, stalls = self.consecutive_stalls, "agent retired");
            self.health = AgentHealth::Retired;
            ctx.tracker.abandon(self.id);
            ctx.observer.on_agent_retired(self.id, ctx.now);
            return Resume::Retire;
        }
        self.start_work(ctx)
    }

    /// Enter the working pause.
    fn start_work(&mut self, ctx: &mut CycleContext<'_>) -> Resume {
        if !self.cycle_stalled {
            self.stats.cycles_completed += 1;
            self.consecutive_stalls = 0;
            self.health = AgentHealth::Healthy;
        }
        self.transition(ctx, CycleState::Working);
        Resume::WaitFor(self.cycle_ticks)
    }

    fn transition(&mut self, ctx: &mut CycleContext<'_>, to: CycleState) {
        let transition = Transition { agent: self.id, cycle: self.cycle, from: self.state, to, at: ctx.now };
        trace!(%transition, "transition");
        if to == CycleState::Working {
            debug!(agent = %self.name, cycle = self.cycle, at = %ctx.now, "working");
        }
        self.state = to;
        ctx.observer.on_transition(&transition);
    }
}
