//! Name → `AgentId` lookup for inbound notices.

use std::collections::HashMap;

use cps_core::AgentId;

/// Maps bus-visible agent names to their ids.
///
/// Built once before the bus starts delivering and then only read, so it is
/// shared without a lock.
#[derive(Clone, Debug, Default)]
pub struct AgentDirectory {
    by_name: HashMap<String, AgentId>,
}

impl AgentDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name`.  Returns the id it previously mapped to, if any.
    pub fn insert(&mut self, name: impl Into<String>, id: AgentId) -> Option<AgentId> {
        self.by_name.insert(name.into(), id)
    }

    pub fn lookup(&self, name: &str) -> Option<AgentId> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// First whole-word agent name occurring in `text`.
    ///
    /// Words are maximal runs of alphanumerics, `_` and `-`, so `cps1` does
    /// not match inside `cps10`.
    pub fn find_in_text(&self, text: &str) -> Option<AgentId> {
        text.split(|c: char| !(c.is_alphanumeric() || c == '_' || c == '-'))
            .filter(|word| !word.is_empty())
            .find_map(|word| self.lookup(word))
    }
}

impl<S: Into<String>> FromIterator<(S, AgentId)> for AgentDirectory {
    fn from_iter<I: IntoIterator<Item = (S, AgentId)>>(iter: I) -> Self {
        Self { by_name: iter.into_iter().map(|(name, id)| (name.into(), id)).collect() }
    }
}
