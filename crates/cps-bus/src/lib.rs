//! `cps-bus`: the publish/subscribe side of the coordinator.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                  |
//! |---------------|-----------------------------------------------------------|
//! | [`channel`]   | `MessageChannel` trait, `Envelope`, `Handler`             |
//! | [`local`]     | `LocalBus` (crossbeam queue + delivery thread)            |
//! | [`message`]   | `RequestMessage` render/parse                             |
//! | [`requester`] | `ComputeRequester` trait, `BusRequester`                  |
//! | [`worker`]    | `SimulatedWorker`, `WorkerConfig`                         |
//! | [`error`]     | `BusError`, `BusResult<T>`                                |
//!
//! # Message flow
//!
//! ```text
//! Agent ─► BusRequester ─► publish(request) ─► LocalBus ─► SimulatedWorker
//!                                                             │ latency
//! ReplyTracker ◄─ CompletionRouter ◄─ LocalBus ◄─ publish(notice)
//! ```

pub mod channel;
pub mod error;
pub mod local;
pub mod message;
pub mod requester;
pub mod worker;


pub use channel::{DEFAULT_TOPIC, Envelope, Handler, MessageChannel};
pub use error::{BusError, BusResult};
pub use local::LocalBus;
pub use message::{REQUEST_MARKER, RequestMessage, UNUSED};
pub use requester::{BusRequester, ComputeRequest, ComputeRequester, RESULTS_PRODUCED};
pub use worker::{SimulatedWorker, WorkerConfig, WorkerStats};
