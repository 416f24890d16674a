//! `cps-sim`: the coordinator that drives agents through virtual time.
//!
//! # Crate layout
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`coordinator`] | `Coordinator` and its run loop                        |
//! | [`builder`]     | `CoordinatorBuilder`                                  |
//! | [`observer`]    | `SimObserver`, `NoopObserver`, `TransitionLog`        |
//! | [`summary`]     | `RunSummary`, `AgentSummary`                          |
//! | [`wiring`]      | `route_completions`                                   |
//! | [`error`]       | `SimError`, `SimResult<T>`                            |
//!
//! # Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use cps_bus::{BusRequester, LocalBus, SimulatedWorker, WorkerConfig, DEFAULT_TOPIC};
//! use cps_sim::{route_completions, CoordinatorBuilder, NoopObserver};
//!
//! let bus = Arc::new(LocalBus::new()?);
//! let _worker = SimulatedWorker::attach(Arc::clone(&bus), WorkerConfig::default())?;
//! let mut coordinator = CoordinatorBuilder::new(config, BusRequester::new(Arc::clone(&bus), "worker"))
//!     .agents(roster)
//!     .build()?;
//! route_completions(&*bus, DEFAULT_TOPIC, coordinator.completion_router())?;
//! coordinator.run(&mut NoopObserver)?;
//! println!("{}", coordinator.summary());
//! ```

pub mod builder;
pub mod coordinator;
pub mod error;
pub mod observer;
pub mod summary;
pub mod wiring;


pub use builder::{CoordinatorBuilder, DEFAULT_GATE_TIMEOUT};
pub use coordinator::Coordinator;
pub use error::{SimError, SimResult};
pub use observer::{NoopObserver, SimObserver, TransitionLog};
pub use summary::{AgentSummary, RunSummary};
pub use wiring::route_completions;
