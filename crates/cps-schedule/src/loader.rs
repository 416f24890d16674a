//! CSV roster loader.
//!
//! # CSV format
//!
//! One row per agent.  Empty scenario cells fall back to the default
//! labels; an empty `kind` means `cps`.
//!
//! ```csv
//! name,kind,cycle_period,phase_delay,step_1_scenario,step_2_scenario
//! system_clock,clock,1,0,,
//! cps1,cps,1,0,image-analysis-step,transport-analysis-step
//! cps2,cps,1/3,15,,
//! ```
//!
//! `cycle_period` and `phase_delay` accept anything [`Ratio`] parses
//! (`"1/3"`, `"15"`, `"0.25"`).  A zero `cycle_period` is rejected here,
//! before it can reach the scheduler.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use cps_core::{Ratio, ScenarioLabel, StepKind};

use crate::roster::{AgentKind, AgentSpec};
use crate::ScheduleError;

// ── CSV record ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct RosterRecord {
    name:            String,
    #[serde(default)]
    kind:            String,
    cycle_period:    String,
    #[serde(default)]
    phase_delay:     String,
    #[serde(default)]
    step_1_scenario: String,
    #[serde(default)]
    step_2_scenario: String,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load an agent roster from a CSV file.
pub fn load_roster_csv(path: &Path) -> Result<Vec<AgentSpec>, ScheduleError> {
    let file = std::fs::File::open(path).map_err(ScheduleError::Io)?;
    load_roster_reader(file)
}

/// Like [`load_roster_csv`] but accepts any `Read` source.
pub fn load_roster_reader<R: Read>(reader: R) -> Result<Vec<AgentSpec>, ScheduleError> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut roster = Vec::new();

    for (line, result) in csv_reader.deserialize::<RosterRecord>().enumerate() {
        let row = result.map_err(|e| ScheduleError::Parse(e.to_string()))?;
        roster.push(to_spec(row).map_err(|e| match e {
            ScheduleError::Parse(msg) => ScheduleError::Parse(format!("row {}: {msg}", line + 1)),
            other => other,
        })?);
    }

    Ok(roster)
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn to_spec(row: RosterRecord) -> Result<AgentSpec, ScheduleError> {
    if row.name.is_empty() {
        return Err(ScheduleError::Parse("agent name is empty".into()));
    }

    let cycle_period = parse_ratio(&row.cycle_period, "cycle_period")?;
    if cycle_period.is_zero() {
        return Err(ScheduleError::Parse(format!(
            "agent {:?} has a non-positive cycle_period",
            row.name
        )));
    }
    let phase_delay = if row.phase_delay.is_empty() {
        Ratio::ZERO
    } else {
        parse_ratio(&row.phase_delay, "phase_delay")?
    };

    Ok(AgentSpec {
        kind: row.kind.parse::<AgentKind>()?,
        cycle_period,
        phase_delay,
        step_1_scenario: label_or_default(row.step_1_scenario, StepKind::Step1),
        step_2_scenario: label_or_default(row.step_2_scenario, StepKind::Step2),
        name: row.name,
    })
}

fn parse_ratio(s: &str, field: &str) -> Result<Ratio, ScheduleError> {
    s.parse::<Ratio>()
        .map_err(|e| ScheduleError::Parse(format!("{field}: {e}")))
}

fn label_or_default(s: String, step: StepKind) -> ScenarioLabel {
    if s.is_empty() {
        ScenarioLabel::default_for(step)
    } else {
        ScenarioLabel::new(s)
    }
}
