//! `ReplyTracker`: the shared table of outstanding completions.
//!
//! This is the only state touched by both the cooperative simulation thread
//! (which marks requests pending and waits on them) and the bus delivery
//! thread (which clears them as completion notices arrive).  Everything sits
//! behind one mutex; a condition variable wakes waiters whenever an entry is
//! removed, so nobody polls.
//!
//! # Invariants
//!
//! - At most one entry per `(agent, step)` key.
//! - Clearing an absent key is a no-op.  Buses deliver at least once, so a
//!   duplicate or late notice must never be an error.
//! - Every entry carries the `CorrelationId` it was issued under.  A
//!   correlated clear only removes the entry it names, so a reply to an
//!   abandoned request cannot release a newer one.

use std::time::{Duration, Instant};

use cps_core::{AgentId, CorrelationId, StepKind};
use parking_lot::{Condvar, Mutex};
use tracing::{debug, warn};

use crate::{ReplyError, ReplyResult};

#[cfg(feature = "fx-hash")]
type PendingMap = rustc_hash::FxHashMap<PendingKey, PendingCompletion>;
#[cfg(not(feature = "fx-hash"))]
type PendingMap = std::collections::HashMap<PendingKey, PendingCompletion>;

// ── Types ─────────────────────────────────────────────────────────────────────

/// Composite key of a pending completion.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct PendingKey {
    pub agent: AgentId,
    pub step:  StepKind,
}

impl PendingKey {
    #[inline]
    pub fn new(agent: AgentId, step: StepKind) -> Self {
        Self { agent, step }
    }
}

/// One outstanding completion.
#[derive(Copy, Clone, Debug)]
pub(crate) struct PendingCompletion {
    correlation: CorrelationId,
    issued_at:   Instant,
    /// Real-time instant after which waiters give up.  `None` = never.
    deadline:    Option<Instant>,
}

/// Result of a clear attempt.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ClearOutcome {
    /// The entry existed and was removed.
    Cleared,
    /// Nothing was pending under that key.
    Absent,
    /// An entry exists but was issued under a different correlation id.
    Stale,
}

/// Counters for run summaries and tests.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct TrackerStats {
    pub pending:   usize,
    pub issued:    u64,
    pub cleared:   u64,
    /// Clears that found nothing to clear (duplicates, late or stale replies).
    pub ignored:   u64,
    /// Entries removed because their agent gave up on them.
    pub abandoned: u64,
}

struct TrackerState {
    pending:          PendingMap,
    next_correlation: CorrelationId,
    issued:           u64,
    cleared:          u64,
    ignored:          u64,
    abandoned:        u64,
}

// ── ReplyTracker ──────────────────────────────────────────────────────────────

/// Thread-safe table of pending completions keyed by `(agent, step)`.
///
/// Share it as `Arc<ReplyTracker>` between the coordinator and the bus
/// delivery path.
pub struct ReplyTracker {
    state:   Mutex<TrackerState>,
    changed: Condvar,
}

impl Default for ReplyTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplyTracker {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(TrackerState {
                pending:          PendingMap::default(),
                next_correlation: CorrelationId(1),
                issued:           0,
                cleared:          0,
                ignored:          0,
                abandoned:        0,
            }),
            changed: Condvar::new(),
        }
    }

    // ── Mutation ──────────────────────────────────────────────────────────

    /// Record that `agent` now waits for `step`, with an optional deadline
    /// `timeout` from now.  Returns the correlation id to send with the
    /// request.
    ///
    /// Re-marking a key that is still pending replaces the old entry; the
    /// old correlation id becomes stale.
    pub fn mark_pending(
        &self,
        agent:   AgentId,
        step:    StepKind,
        timeout: Option<Duration>,
    ) -> CorrelationId {
        let now = Instant::now();
        let mut state = self.state.lock();
        let correlation = state.next_correlation;
        state.next_correlation = correlation.next();
        state.issued += 1;

        let entry = PendingCompletion {
            correlation,
            issued_at: now,
            deadline: timeout.map(|t| now + t),
        };
        if let Some(old) = state.pending.insert(PendingKey::new(agent, step), entry) {
            warn!(%agent, %step, superseded = old.correlation.0, "pending completion re-marked");
        }
        correlation
    }

    /// Remove the entry for `(agent, step)` whatever its correlation id.
    pub fn clear(&self, agent: AgentId, step: StepKind) -> ClearOutcome {
        let mut state = self.state.lock();
        let outcome = match state.pending.remove(&PendingKey::new(agent, step)) {
            Some(_) => ClearOutcome::Cleared,
            None => ClearOutcome::Absent,
        };
        self.record(&mut state, outcome);
        outcome
    }

    /// Remove the entry for `(agent, step)` only if it was issued under
    /// `correlation`.
    pub fn clear_correlated(
        &self,
        agent:       AgentId,
        step:        StepKind,
        correlation: CorrelationId,
    ) -> ClearOutcome {
        let key = PendingKey::new(agent, step);
        let mut state = self.state.lock();
        let outcome = match state.pending.get(&key) {
            None => ClearOutcome::Absent,
            Some(entry) if entry.correlation != correlation => ClearOutcome::Stale,
            Some(_) => {
                state.pending.remove(&key);
                ClearOutcome::Cleared
            }
        };
        self.record(&mut state, outcome);
        outcome
    }

    /// Clear whichever analysis step `agent` is currently waiting on.
    ///
    /// Used for notices that name the agent but not the step.  Step 2 is
    /// never pending while step 1 is, so at most one candidate exists.
    pub fn clear_active_step(&self, agent: AgentId) -> Option<StepKind> {
        let mut state = self.state.lock();
        let step = [StepKind::Step1, StepKind::Step2]
            .into_iter()
            .find(|&s| state.pending.contains_key(&PendingKey::new(agent, s)));
        let outcome = match step {
            Some(s) => {
                state.pending.remove(&PendingKey::new(agent, s));
                ClearOutcome::Cleared
            }
            None => ClearOutcome::Absent,
        };
        self.record(&mut state, outcome);
        step
    }

    /// Drop every entry of `agent`.  Returns the dropped keys.
    pub fn abandon(&self, agent: AgentId) -> Vec<PendingKey> {
        self.abandon_where(|k| k.agent == agent)
    }

    /// Drop one entry because its requester gave up on it.
    pub fn abandon_key(&self, agent: AgentId, step: StepKind) -> bool {
        !self.abandon_where(|k| *k == PendingKey::new(agent, step)).is_empty()
    }

    /// Drop every entry matching `pred`.  Returns the dropped keys, sorted.
    pub fn abandon_where(&self, pred: impl Fn(&PendingKey) -> bool) -> Vec<PendingKey> {
        let mut state = self.state.lock();
        let mut dropped: Vec<PendingKey> =
            state.pending.keys().filter(|k| pred(k)).copied().collect();
        dropped.sort();
        for key in &dropped {
            state.pending.remove(key);
        }
        state.abandoned += dropped.len() as u64;
        drop(state);

        if !dropped.is_empty() {
            debug!(count = dropped.len(), "abandoned pending completions");
            self.changed.notify_all();
        }
        dropped
    }

    // ── Queries ───────────────────────────────────────────────────────────

    pub fn is_pending(&self, agent: AgentId, step: StepKind) -> bool {
        self.state.lock().pending.contains_key(&PendingKey::new(agent, step))
    }

    /// `true` if any pending key satisfies `pred`.
    pub fn has_any_pending(&self, pred: impl Fn(&PendingKey) -> bool) -> bool {
        self.state.lock().pending.keys().any(|k| pred(k))
    }

    /// All pending keys satisfying `pred`, sorted.
    pub fn pending_keys(&self, pred: impl Fn(&PendingKey) -> bool) -> Vec<PendingKey> {
        let mut keys: Vec<PendingKey> =
            self.state.lock().pending.keys().filter(|k| pred(k)).copied().collect();
        keys.sort();
        keys
    }

    pub fn stats(&self) -> TrackerStats {
        let state = self.state.lock();
        TrackerStats {
            pending:   state.pending.len(),
            issued:    state.issued,
            cleared:   state.cleared,
            ignored:   state.ignored,
            abandoned: state.abandoned,
        }
    }

    // ── Blocking waits ────────────────────────────────────────────────────

    /// Block until `(agent, step)` is no longer pending.
    ///
    /// Returns [`ReplyError::StepTimedOut`] once the entry's deadline
    /// passes.  The entry is left in place; the caller decides whether to
    /// abandon it.
    pub fn wait_cleared(&self, agent: AgentId, step: StepKind) -> ReplyResult<()> {
        let key = PendingKey::new(agent, step);
        let mut state = self.state.lock();
        loop {
            let (issued_at, deadline) = match state.pending.get(&key) {
                None => return Ok(()),
                Some(entry) => (entry.issued_at, entry.deadline),
            };
            match deadline {
                None => self.changed.wait(&mut state),
                Some(deadline) => {
                    if Instant::now() >= deadline {
                        return Err(ReplyError::StepTimedOut {
                            agent,
                            step,
                            waited: issued_at.elapsed(),
                        });
                    }
                    self.changed.wait_until(&mut state, deadline);
                }
            }
        }
    }

    /// Block until no pending key satisfies `pred`, or `timeout` elapses.
    ///
    /// Returns `true` if the table went quiet.
    pub fn wait_idle(&self, pred: impl Fn(&PendingKey) -> bool, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        while state.pending.keys().any(|k| pred(k)) {
            if self.changed.wait_until(&mut state, deadline).timed_out() {
                return !state.pending.keys().any(|k| pred(k));
            }
        }
        true
    }

    // ── Helpers ───────────────────────────────────────────────────────────

    fn record(&self, state: &mut TrackerState, outcome: ClearOutcome) {
        match outcome {
            ClearOutcome::Cleared => {
                state.cleared += 1;
                self.changed.notify_all();
            }
            ClearOutcome::Absent | ClearOutcome::Stale => state.ignored += 1,
        }
    }
}
