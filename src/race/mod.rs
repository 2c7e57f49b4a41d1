//! Request racing subsystem.
//!
//! # Data Flow
//! ```text
//! GET /ipfs/<cid>/<path>
//!     → dispatcher.rs (validate, snapshot pool)
//!     → attempt.rs (one cancellable fetch per mirror)
//!     → first 200 OK in completion order wins
//!     → losers cancelled, drained on a tracked task
//! ```
//!
//! # Design Decisions
//! - Winner is whoever finishes first; no latency weighting
//! - Fan-out is uncapped per race (pools are tens of mirrors)
//! - Cancellation sits on top of the per-fetch timeout, it does not replace it

pub mod attempt;
pub mod dispatcher;
pub mod error;

pub use attempt::{FetchError, FetchOutcome, RaceAttempt, RaceSummary, Winner};
pub use dispatcher::{Dispatcher, IPFS_PREFIX};
pub use error::RelayError;
