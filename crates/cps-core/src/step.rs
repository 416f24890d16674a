//! Step kinds and scenario labels.

use std::fmt;
use std::str::FromStr;

use crate::CpsError;

/// What a pending completion is waiting for.
///
/// `Step1` and `Step2` are the two external analysis steps of a cycle.
/// `Cycle` marks a cycle in progress; it is set when the cycle starts and
/// cleared when the agent wakes from its working pause.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StepKind {
    Step1,
    Step2,
    Cycle,
}

impl StepKind {
    /// `true` for the two steps performed by an external worker.
    #[inline]
    pub fn is_external(self) -> bool {
        matches!(self, StepKind::Step1 | StepKind::Step2)
    }

    /// Wire name used in request and completion messages.
    pub fn as_str(self) -> &'static str {
        match self {
            StepKind::Step1 => "step_1",
            StepKind::Step2 => "step_2",
            StepKind::Cycle => "cycle",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepKind {
    type Err = CpsError;

    fn from_str(s: &str) -> Result<StepKind, CpsError> {
        match s.trim() {
            "step_1" | "1" => Ok(StepKind::Step1),
            "step_2" | "2" => Ok(StepKind::Step2),
            "cycle" => Ok(StepKind::Cycle),
            other => Err(CpsError::Parse(format!(
                "invalid step {other:?}: expected \"step_1\", \"step_2\" or \"cycle\""
            ))),
        }
    }
}

/// Opaque label naming the protocol variant a request runs.
///
/// The core never interprets it; it is forwarded to the compute requester
/// and echoed back in completion notices.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScenarioLabel(String);

impl ScenarioLabel {
    /// Default label for the first analysis step.
    pub const IMAGE_ANALYSIS: &'static str = "image-analysis-step";
    /// Default label for the second analysis step.
    pub const TRANSPORT_ANALYSIS: &'static str = "transport-analysis-step";

    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The label used for `step` when none is configured.
    pub fn default_for(step: StepKind) -> Self {
        match step {
            StepKind::Step2 => Self::new(Self::TRANSPORT_ANALYSIS),
            _ => Self::new(Self::IMAGE_ANALYSIS),
        }
    }
}

impl fmt::Display for ScenarioLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ScenarioLabel {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
