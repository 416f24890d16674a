//! Agent roster entries: who cycles, how fast, and from when.

use std::fmt;
use std::str::FromStr;

use cps_core::{Ratio, ScenarioLabel, StepKind};

use crate::ScheduleError;

/// What an agent does each cycle.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AgentKind {
    /// Requests both analysis steps, then works.
    #[default]
    Cps,
    /// Only works; never requests analysis.  Keeps a steady beat alongside
    /// the CPS agents.
    Clock,
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AgentKind::Cps => "cps",
            AgentKind::Clock => "clock",
        })
    }
}

impl FromStr for AgentKind {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<AgentKind, ScheduleError> {
        match s.trim() {
            "" | "cps" => Ok(AgentKind::Cps),
            "clock" => Ok(AgentKind::Clock),
            other => Err(ScheduleError::Parse(format!(
                "invalid agent kind {other:?}: expected \"cps\" or \"clock\""
            ))),
        }
    }
}

/// Setup-time description of one agent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentSpec {
    /// Unique name, also used to correlate bus messages.
    pub name: String,
    pub kind: AgentKind,
    /// Multiplier of the configured base cycle length.  Must be positive.
    pub cycle_period: Ratio,
    /// Time units to wait before the very first cycle.
    pub phase_delay: Ratio,
    pub step_1_scenario: ScenarioLabel,
    pub step_2_scenario: ScenarioLabel,
}

impl AgentSpec {
    /// A CPS agent with the default scenario labels.
    pub fn cps(name: impl Into<String>, cycle_period: Ratio, phase_delay: Ratio) -> Self {
        Self {
            name: name.into(),
            kind: AgentKind::Cps,
            cycle_period,
            phase_delay,
            step_1_scenario: ScenarioLabel::default_for(StepKind::Step1),
            step_2_scenario: ScenarioLabel::default_for(StepKind::Step2),
        }
    }

    /// A clock agent.
    pub fn clock(name: impl Into<String>, cycle_period: Ratio, phase_delay: Ratio) -> Self {
        Self { kind: AgentKind::Clock, ..Self::cps(name, cycle_period, phase_delay) }
    }

    /// Override both scenario labels.
    pub fn with_scenarios(mut self, step_1: impl Into<String>, step_2: impl Into<String>) -> Self {
        self.step_1_scenario = ScenarioLabel::new(step_1);
        self.step_2_scenario = ScenarioLabel::new(step_2);
        self
    }

    /// The label forwarded with a request for `step`.
    pub fn scenario(&self, step: StepKind) -> &ScenarioLabel {
        match step {
            StepKind::Step2 => &self.step_2_scenario,
            _ => &self.step_1_scenario,
        }
    }
}
