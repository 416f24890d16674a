//! `cps-core`: foundational types for the CPS cycle coordinator.
//!
//! This crate is a dependency of every other `cps-*` crate.  It has no
//! `cps-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module    | Contents                                          |
//! |-----------|---------------------------------------------------|
//! | [`ids`]   | `AgentId`, `CorrelationId`                        |
//! | [`time`]  | `Tick`, `Ratio`, `SimClock`, `SimConfig`          |
//! | [`step`]  | `StepKind`, `ScenarioLabel`                       |
//! | [`rng`]   | `SimRng`                                          |
//! | [`error`] | `CpsError`, `CpsResult`                           |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                             |
//! |---------|----------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to public types.    |

pub mod error;
pub mod ids;
pub mod rng;
pub mod step;
pub mod time;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{CpsError, CpsResult};
pub use ids::{AgentId, CorrelationId};
pub use rng::SimRng;
pub use step::{ScenarioLabel, StepKind};
pub use time::{Ratio, SimClock, SimConfig, Tick};
