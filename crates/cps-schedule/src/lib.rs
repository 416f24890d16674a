//! `cps-schedule`: discrete-event scheduler and agent roster.
//!
//! # Crate layout
//!
//! | Module         | Contents                                              |
//! |----------------|-------------------------------------------------------|
//! | [`wake_queue`] | `WakeQueue` (`BTreeMap<Tick, Vec<AgentId>>`)          |
//! | [`scheduler`]  | `Scheduler` (clock + queue), `Firing`                 |
//! | [`roster`]     | `AgentSpec`, `AgentKind`                              |
//! | [`loader`]     | `load_roster_csv`, `load_roster_reader`               |
//! | [`error`]      | `ScheduleError`, `ScheduleResult<T>`                  |
//!
//! # Event model (summary)
//!
//! ```text
//! peek_next_time()  = earliest queued instant (no mutation)
//! fire_next()       = clock ← earliest instant; return every agent due then
//! wait_for(a, d)    = queue a at now + d   (d == 0 is rejected)
//! ```

pub mod error;
pub mod loader;
pub mod roster;
pub mod scheduler;
pub mod wake_queue;

#[cfg(test)]
mod tests;

pub use error::{ScheduleError, ScheduleResult};
pub use loader::{load_roster_csv, load_roster_reader};
pub use roster::{AgentKind, AgentSpec};
pub use scheduler::{Firing, Scheduler};
pub use wake_queue::WakeQueue;
