//! Fluent builder for constructing a [`Coordinator`].

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use cps_agent::Agent;
use cps_bus::ComputeRequester;
use cps_core::{AgentId, SimConfig, Tick};
use cps_reply::{AgentDirectory, ReplyTracker};
use cps_schedule::{AgentSpec, Scheduler};
use tracing::debug;

use crate::{Coordinator, SimError, SimResult};

/// How long the time-boundary gate waits for stray completions before
/// abandoning them.
pub const DEFAULT_GATE_TIMEOUT: Duration = Duration::from_secs(1);

/// Fluent builder for [`Coordinator<R>`].
///
/// # Optional inputs (have defaults)
///
/// | Method               | Default                       |
/// |----------------------|-------------------------------|
/// | `.tracker(t)`        | a fresh `ReplyTracker`        |
/// | `.gate_timeout(d)`   | [`DEFAULT_GATE_TIMEOUT`]      |
///
/// # Example
///
/// ```rust,ignore
/// let mut coordinator = CoordinatorBuilder::new(config, requester)
///     .agent(AgentSpec::clock("system_clock", Ratio::ONE, Ratio::ZERO))
///     .agent(AgentSpec::cps("cps1", Ratio::ONE, Ratio::ZERO))
///     .build()?;
/// coordinator.run(&mut NoopObserver)?;
/// ```
pub struct CoordinatorBuilder<R: ComputeRequester> {
    config:       SimConfig,
    requester:    R,
    specs:        Vec<AgentSpec>,
    tracker:      Option<Arc<ReplyTracker>>,
    gate_timeout: Duration,
}

impl<R: ComputeRequester> CoordinatorBuilder<R> {
    pub fn new(config: SimConfig, requester: R) -> Self {
        Self {
            config,
            requester,
            specs: Vec::new(),
            tracker: None,
            gate_timeout: DEFAULT_GATE_TIMEOUT,
        }
    }

    pub fn agent(mut self, spec: AgentSpec) -> Self {
        self.specs.push(spec);
        self
    }

    pub fn agents(mut self, specs: impl IntoIterator<Item = AgentSpec>) -> Self {
        self.specs.extend(specs);
        self
    }

    /// Share an existing tracker, e.g. one a requester already clears.
    pub fn tracker(mut self, tracker: Arc<ReplyTracker>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    pub fn gate_timeout(mut self, timeout: Duration) -> Self {
        self.gate_timeout = timeout;
        self
    }

    /// Validate the roster, build the agents, and schedule each first wake
    /// at its phase delay.
    pub fn build(self) -> SimResult<Coordinator<R>> {
        self.config.validate()?;
        if self.specs.is_empty() {
            return Err(SimError::Config("no agents configured".into()));
        }

        let mut seen = HashSet::new();
        let mut directory = AgentDirectory::new();
        let mut agents = Vec::with_capacity(self.specs.len());
        let mut scheduler = Scheduler::new(self.config.make_clock());

        for (i, spec) in self.specs.iter().enumerate() {
            if !seen.insert(spec.name.as_str()) {
                return Err(SimError::DuplicateAgent(spec.name.clone()));
            }
            let id = AgentId::try_from(i)
                .map_err(|_| SimError::Config(format!("too many agents ({})", self.specs.len())))?;
            let agent = Agent::from_spec(id, spec, &self.config)?;

            scheduler.schedule_at(id, Tick(agent.phase_delay_ticks()))?;
            debug!(
                agent = %spec.name,
                kind = %spec.kind,
                cycle_ticks = agent.cycle_ticks(),
                first_wake = agent.phase_delay_ticks(),
                "agent registered"
            );
            directory.insert(spec.name.as_str(), id);
            agents.push(agent);
        }

        Ok(Coordinator {
            config: self.config,
            scheduler,
            agents,
            directory,
            tracker: self.tracker.unwrap_or_default(),
            requester: self.requester,
            gate_timeout: self.gate_timeout,
            processed: Tick::ZERO,
            events_fired: 0,
            gate_violations: 0,
        })
    }
}
