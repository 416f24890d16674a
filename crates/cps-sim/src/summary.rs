//! End-of-run summary.

use std::fmt;

use cps_agent::{Agent, AgentHealth, AgentStats};
use cps_core::Tick;
use cps_reply::TrackerStats;
use cps_schedule::AgentKind;

#[derive(Clone, Debug, PartialEq)]
pub struct AgentSummary {
    pub name:   String,
    pub kind:   AgentKind,
    pub stats:  AgentStats,
    pub health: AgentHealth,
}

impl AgentSummary {
    pub fn of(agent: &Agent) -> Self {
        Self {
            name:   agent.name().to_owned(),
            kind:   agent.kind(),
            stats:  agent.stats(),
            health: agent.health(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RunSummary {
    /// Virtual time when the summary was taken.
    pub now:             Tick,
    pub now_units:       f64,
    pub events_fired:    u64,
    pub gate_violations: u64,
    pub tracker:         TrackerStats,
    pub agents:          Vec<AgentSummary>,
}

impl RunSummary {
    pub fn agent(&self, name: &str) -> Option<&AgentSummary> {
        self.agents.iter().find(|a| a.name == name)
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "virtual time {:.3} ({}), {} events fired, {} gate violations",
            self.now_units, self.now, self.events_fired, self.gate_violations
        )?;
        writeln!(
            f,
            "requests {} / cleared {} / ignored {} / abandoned {} / pending {}",
            self.tracker.issued,
            self.tracker.cleared,
            self.tracker.ignored,
            self.tracker.abandoned,
            self.tracker.pending
        )?;
        writeln!(
            f,
            "{:<16} {:<6} {:>8} {:>10} {:>8} {:>9}  {}",
            "agent", "kind", "started", "completed", "stalled", "requests", "health"
        )?;
        for a in &self.agents {
            writeln!(
                f,
                "{:<16} {:<6} {:>8} {:>10} {:>8} {:>9}  {}",
                a.name,
                a.kind.to_string(),
                a.stats.cycles_started,
                a.stats.cycles_completed,
                a.stats.cycles_stalled,
                a.stats.requests_issued,
                a.health
            )?;
        }
        Ok(())
    }
}
