//! `cps-reply`: pending-completion tracking shared across threads.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                 |
//! |---------------|----------------------------------------------------------|
//! | [`tracker`]   | `ReplyTracker`, `PendingKey`, `ClearOutcome`             |
//! | [`notice`]    | `CompletionNotice`, `RESULT_MARKER`                      |
//! | [`directory`] | `AgentDirectory` (name → `AgentId`)                      |
//! | [`router`]    | `CompletionRouter`, `RouteOutcome`                       |
//! | [`error`]     | `ReplyError`, `NoticeError`, `ReplyResult<T>`            |
//!
//! # Threading
//!
//! ```text
//! simulation thread                      bus delivery thread
//! ─────────────────                      ───────────────────
//! mark_pending(a, step) ──┐
//! issue request           │  Arc<ReplyTracker>
//! wait_cleared(a, step) ◄─┴───────────── router.handle(payload) → clear(..)
//! ```
//!
//! # Feature flags
//!
//! | Flag      | Effect                                              |
//! |-----------|-----------------------------------------------------|
//! | `fx-hash` | Use `rustc-hash` for the pending table.             |

pub mod directory;
pub mod error;
pub mod notice;
pub mod router;
pub mod tracker;

#[cfg(test)]
mod tests;

pub use directory::AgentDirectory;
pub use error::{NoticeError, ReplyError, ReplyResult};
pub use notice::{CompletionNotice, RESULT_MARKER};
pub use router::{CompletionRouter, RouteOutcome};
pub use tracker::{ClearOutcome, PendingKey, ReplyTracker, TrackerStats};
