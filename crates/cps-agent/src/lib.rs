//! `cps-agent`: the two-phase request/await cycle of one agent.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                   |
//! |-------------|------------------------------------------------------------|
//! | [`state`]   | `CycleState`, `Transition`, `CycleObserver`                |
//! | [`context`] | `CycleContext` (borrowed coordinator view)                 |
//! | [`agent`]   | `Agent`, `Resume`, `AgentStats`, `AgentHealth`             |
//! | [`error`]   | `AgentError`, `AgentResult<T>`                             |
//!
//! Agents never touch the scheduler.  They return [`Resume::WaitFor`] with a
//! relative duration and the coordinator turns that into a wake.

pub mod agent;
pub mod context;
pub mod error;
pub mod state;


pub use agent::{Agent, AgentHealth, AgentStats, Resume};
pub use context::CycleContext;
pub use error::{AgentError, AgentResult};
pub use state::{CycleObserver, CycleState, Transition};
