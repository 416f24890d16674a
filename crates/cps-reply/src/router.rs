//! `CompletionRouter`: turns bus payloads into tracker clears.
//!
//! Routing never fails: every payload ends up as exactly one
//! [`RouteOutcome`], and only `Cleared` changes tracker state.  This is what
//! makes redelivery harmless.
//!
//! | Payload                                         | Action                              |
//! |-------------------------------------------------|-------------------------------------|
//! | no result marker                                | `Ignored`                           |
//! | `agent=` + `step=` + `correlation=`             | `clear_correlated`                  |
//! | `agent=` + `step=`                              | `clear`                             |
//! | `agent=` only                                   | `clear_active_step`                 |
//! | free text naming an agent                       | `clear_active_step`                 |
//! | unknown agent, bad field, `step=cycle`          | `Dropped`                           |

use std::sync::Arc;

use cps_core::{AgentId, StepKind};
use tracing::{debug, trace, warn};

use crate::{AgentDirectory, ClearOutcome, CompletionNotice, NoticeError, ReplyTracker};

/// What happened to one inbound payload.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum RouteOutcome {
    /// A pending completion was cleared.
    Cleared { agent: AgentId, step: StepKind },
    /// Nothing was pending for the notice: a redelivery or a late reply.
    Duplicate { agent: AgentId, step: Option<StepKind> },
    /// The pending entry belongs to a newer request.
    Stale { agent: AgentId, step: StepKind },
    /// Not a completion notice at all.
    Ignored,
    /// A completion notice that could not be attributed.
    Dropped(String),
}

pub struct CompletionRouter {
    tracker:   Arc<ReplyTracker>,
    directory: AgentDirectory,
}

impl CompletionRouter {
    pub fn new(tracker: Arc<ReplyTracker>, directory: AgentDirectory) -> Self {
        Self { tracker, directory }
    }

    pub fn tracker(&self) -> &Arc<ReplyTracker> {
        &self.tracker
    }

    pub fn directory(&self) -> &AgentDirectory {
        &self.directory
    }

    /// Route one payload.
    pub fn handle(&self, payload: &str) -> RouteOutcome {
        let outcome = self.route(payload);
        match &outcome {
            RouteOutcome::Cleared { agent, step } => debug!(%agent, %step, "completion cleared"),
            RouteOutcome::Duplicate { agent, step } => {
                debug!(%agent, ?step, "completion ignored: nothing pending");
            }
            RouteOutcome::Stale { agent, step } => {
                warn!(%agent, %step, "completion ignored: correlation does not match");
            }
            RouteOutcome::Ignored => trace!("payload is not a completion notice"),
            RouteOutcome::Dropped(reason) => warn!(reason = %reason, "completion notice dropped"),
        }
        outcome
    }

    fn route(&self, payload: &str) -> RouteOutcome {
        let notice = match CompletionNotice::parse(payload) {
            Ok(notice) => notice,
            Err(NoticeError::MissingMarker) => return RouteOutcome::Ignored,
            Err(e) => return RouteOutcome::Dropped(e.to_string()),
        };

        let agent = match &notice.agent {
            Some(name) => match self.directory.lookup(name) {
                Some(id) => id,
                None => return RouteOutcome::Dropped(format!("unknown agent {name:?}")),
            },
            None => match self.directory.find_in_text(payload) {
                Some(id) => id,
                None => return RouteOutcome::Dropped("no known agent named".into()),
            },
        };

        let Some(step) = notice.step else {
            return match self.tracker.clear_active_step(agent) {
                Some(step) => RouteOutcome::Cleared { agent, step },
                None => RouteOutcome::Duplicate { agent, step: None },
            };
        };
        if !step.is_external() {
            return RouteOutcome::Dropped(format!("{step} is not a worker step"));
        }

        let cleared = match notice.correlation {
            Some(correlation) => self.tracker.clear_correlated(agent, step, correlation),
            None => self.tracker.clear(agent, step),
        };
        match cleared {
            ClearOutcome::Cleared => RouteOutcome::Cleared { agent, step },
            ClearOutcome::Absent => RouteOutcome::Duplicate { agent, step: Some(step) },
            ClearOutcome::Stale => RouteOutcome::Stale { agent, step },
        }
    }
}
