//! Completion notices: the text a worker publishes when a step finishes.
//!
//! # Format
//!
//! ```text
//! result indication: agent=cps1, step=step_1, correlation=17, scenario=image-analysis-step.
//! ```
//!
//! Every field is optional.  Older workers only publish free text that
//! contains the marker and the agent's name somewhere, e.g.
//! `"result indication for cps1"`; those parse to a notice with every field
//! `None` and are resolved by [`AgentDirectory::find_in_text`].
//!
//! [`AgentDirectory::find_in_text`]: crate::AgentDirectory::find_in_text

use std::fmt;

use cps_core::{CorrelationId, StepKind};

use crate::NoticeError;

/// Marker that identifies a completion notice.
pub const RESULT_MARKER: &str = "result indication";

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct CompletionNotice {
    pub agent:       Option<String>,
    pub step:        Option<StepKind>,
    pub correlation: Option<CorrelationId>,
    pub scenario:    Option<String>,
}

impl CompletionNotice {
    /// A fully populated notice.
    pub fn structured(
        agent:       impl Into<String>,
        step:        StepKind,
        correlation: CorrelationId,
        scenario:    impl Into<String>,
    ) -> Self {
        Self {
            agent:       Some(agent.into()),
            step:        Some(step),
            correlation: Some(correlation),
            scenario:    Some(scenario.into()),
        }
    }

    /// `true` if the notice names its agent explicitly.
    pub fn is_structured(&self) -> bool {
        self.agent.is_some()
    }

    /// Parse a bus payload.
    ///
    /// Text before the marker is ignored.  `key=value` pairs after it are
    /// read; anything else is free text.  Unknown keys are skipped so newer
    /// workers can add fields.
    pub fn parse(text: &str) -> Result<CompletionNotice, NoticeError> {
        let start = text.find(RESULT_MARKER).ok_or(NoticeError::MissingMarker)?;
        let body = text[start + RESULT_MARKER.len()..]
            .trim_start_matches(|c: char| c == ':' || c.is_whitespace())
            .trim_end();
        let body = body.strip_suffix('.').unwrap_or(body);

        let mut notice = CompletionNotice::default();
        for field in body.split(',') {
            let Some((key, value)) = field.split_once('=') else { continue };
            let value = value.trim();
            match key.trim() {
                "agent" => notice.agent = non_empty("agent", value)?,
                "scenario" => notice.scenario = non_empty("scenario", value)?,
                "step" => {
                    let step = value.parse::<StepKind>().map_err(|_| malformed("step", value))?;
                    notice.step = Some(step);
                }
                "correlation" => {
                    let n = value.parse::<u64>().map_err(|_| malformed("correlation", value))?;
                    notice.correlation = Some(CorrelationId(n));
                }
                _ => {}
            }
        }
        Ok(notice)
    }
}

impl fmt::Display for CompletionNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(RESULT_MARKER)?;
        let mut sep = ": ";
        if let Some(agent) = &self.agent {
            write!(f, "{sep}agent={agent}")?;
            sep = ", ";
        }
        if let Some(step) = self.step {
            write!(f, "{sep}step={step}")?;
            sep = ", ";
        }
        if let Some(correlation) = self.correlation {
            write!(f, "{sep}correlation={}", correlation.0)?;
            sep = ", ";
        }
        if let Some(scenario) = &self.scenario {
            write!(f, "{sep}scenario={scenario}")?;
        }
        f.write_str(".")
    }
}

fn non_empty(field: &'static str, value: &str) -> Result<Option<String>, NoticeError> {
    if value.is_empty() {
        Err(malformed(field, value))
    } else {
        Ok(Some(value.to_owned()))
    }
}

fn malformed(field: &'static str, value: &str) -> NoticeError {
    NoticeError::Malformed { field, value: value.to_owned() }
}
