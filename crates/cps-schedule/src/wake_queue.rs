//! `WakeQueue`: sparse time-ordered agent activation queue.
//!
//! Every agent is either running (being resumed by the coordinator) or
//! parked in this queue at the instant it asked to be woken.  The queue maps
//! instants to the agents due then, so the earliest instant and all agents
//! sharing it are available together.
//!
//! `BTreeMap` gives O(log W) insert and pop where W is the number of distinct
//! wake instants currently enqueued, which is at most the number of agents.

use std::collections::BTreeMap;

use cps_core::{AgentId, Tick};

/// A priority queue mapping wake instants to the agents due at them.
///
/// Agents sharing an instant keep the order in which they were pushed.
#[derive(Default, Debug)]
pub struct WakeQueue {
    inner: BTreeMap<Tick, Vec<AgentId>>,
    /// Cached total agent count for O(1) `len()`.
    total: usize,
}

impl WakeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `agent` to wake at `tick`.
    pub fn push(&mut self, tick: Tick, agent: AgentId) {
        self.inner.entry(tick).or_default().push(agent);
        self.total += 1;
    }

    /// Remove and return the earliest instant with all agents queued for it.
    pub fn pop_earliest(&mut self) -> Option<(Tick, Vec<AgentId>)> {
        let (tick, agents) = self.inner.pop_first()?;
        self.total -= agents.len();
        Some((tick, agents))
    }

    /// The earliest instant with at least one queued agent, or `None` if empty.
    pub fn next_tick(&self) -> Option<Tick> {
        self.inner.keys().next().copied()
    }

    /// Remove every queued wake of `agent`.  Returns how many were removed.
    pub fn remove_agent(&mut self, agent: AgentId) -> usize {
        let mut removed = 0;
        self.inner.retain(|_, agents| {
            let before = agents.len();
            agents.retain(|&a| a != agent);
            removed += before - agents.len();
            !agents.is_empty()
        });
        self.total -= removed;
        removed
    }

    /// The instant `agent` is next due, if it is queued.
    pub fn wake_of(&self, agent: AgentId) -> Option<Tick> {
        self.inner
            .iter()
            .find(|(_, agents)| agents.contains(&agent))
            .map(|(&tick, _)| tick)
    }

    /// Total number of (instant, agent) entries.
    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Number of distinct future instants that have at least one queued agent.
    pub fn tick_count(&self) -> usize {
        self.inner.len()
    }
}
