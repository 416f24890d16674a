//! Request messages: what an agent asks the external worker to run.
//!
//! # Format
//!
//! ```text
//! Please realize the following AI case: scenario=image-analysis-step, knowledge_base=-,
//! activation_base=-, code_base=-, learning_base=-, sender=cps1, receiver=worker,
//! step=step_1, correlation=7.
//! ```
//!
//! (One line on the wire.)  `-` marks an unused source.  `step` and
//! `correlation` are optional so that requests from older senders, which
//! only carry the seven base fields, still parse.

use std::fmt;

use cps_core::{CorrelationId, StepKind};

use crate::{BusError, BusResult};

/// Marker that identifies a request payload.
pub const REQUEST_MARKER: &str = "Please realize the following AI case:";

/// Placeholder for an unused source field.
pub const UNUSED: &str = "-";

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct RequestMessage {
    pub scenario:        String,
    pub knowledge_base:  String,
    pub activation_base: String,
    pub code_base:       String,
    pub learning_base:   String,
    pub sender:          String,
    pub receiver:        String,
    pub step:            Option<StepKind>,
    pub correlation:     Option<CorrelationId>,
}

impl RequestMessage {
    /// A request from `sender` with every source field unused.
    pub fn new(scenario: impl Into<String>, sender: impl Into<String>, receiver: impl Into<String>) -> Self {
        Self {
            scenario:        scenario.into(),
            knowledge_base:  UNUSED.to_owned(),
            activation_base: UNUSED.to_owned(),
            code_base:       UNUSED.to_owned(),
            learning_base:   UNUSED.to_owned(),
            sender:          sender.into(),
            receiver:        receiver.into(),
            step:            None,
            correlation:     None,
        }
    }

    pub fn with_correlation(mut self, step: StepKind, correlation: CorrelationId) -> Self {
        self.step = Some(step);
        self.correlation = Some(correlation);
        self
    }

    /// `true` if `payload` looks like a request at all.
    pub fn is_request(payload: &str) -> bool {
        payload.contains(REQUEST_MARKER)
    }

    /// Read the fields back out of a payload.
    ///
    /// `scenario`, `sender` and `receiver` are required; the source fields
    /// default to [`UNUSED`].
    pub fn parse(payload: &str) -> BusResult<RequestMessage> {
        let start = payload
            .find(REQUEST_MARKER)
            .ok_or_else(|| BusError::MalformedRequest("missing request marker".into()))?;
        let body = payload[start + REQUEST_MARKER.len()..].trim();
        let body = body.strip_suffix('.').unwrap_or(body);

        let mut scenario = None;
        let mut sender = None;
        let mut receiver = None;
        let mut message = RequestMessage::new("", "", "");

        for field in body.split(',') {
            let Some((key, value)) = field.split_once('=') else { continue };
            let value = value.trim().to_owned();
            match key.trim() {
                "scenario" => scenario = Some(value),
                "knowledge_base" => message.knowledge_base = value,
                "activation_base" => message.activation_base = value,
                "code_base" => message.code_base = value,
                "learning_base" => message.learning_base = value,
                "sender" => sender = Some(value),
                "receiver" => receiver = Some(value),
                "step" => {
                    let step = value
                        .parse::<StepKind>()
                        .map_err(|e| BusError::MalformedRequest(e.to_string()))?;
                    message.step = Some(step);
                }
                "correlation" => {
                    let n = value.parse::<u64>().map_err(|_| {
                        BusError::MalformedRequest(format!("correlation {value:?} is not a number"))
                    })?;
                    message.correlation = Some(CorrelationId(n));
                }
                _ => {}
            }
        }

        message.scenario = required("scenario", scenario)?;
        message.sender = required("sender", sender)?;
        message.receiver = required("receiver", receiver)?;
        Ok(message)
    }
}

impl fmt::Display for RequestMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{REQUEST_MARKER} scenario={}, knowledge_base={}, activation_base={}, code_base={}, \
             learning_base={}, sender={}, receiver={}",
            self.scenario,
            self.knowledge_base,
            self.activation_base,
            self.code_base,
            self.learning_base,
            self.sender,
            self.receiver,
        )?;
        if let Some(step) = self.step {
            write!(f, ", step={step}")?;
        }
        if let Some(correlation) = self.correlation {
            write!(f, ", correlation={}", correlation.0)?;
        }
        f.write_str(".")
    }
}

fn required(field: &str, value: Option<String>) -> BusResult<String> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(BusError::MalformedRequest(format!("missing field {field:?}"))),
    }
}
