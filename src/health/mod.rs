//! Mirror liveness checking.
//!
//! # Data Flow
//! ```text
//! Startup, then every interval (after the previous sweep finishes):
//!     configured candidates
//!     → probe.rs (fixed identifier, exact body, 5s timeout)
//!     → checker.rs (bounded worker pool, wait for all results)
//!     → PoolManager::replace(survivors)
//! ```
//!
//! # Design Decisions
//! - Sweeps never overlap; the timer restarts only after a sweep completes
//! - A probe failure only excludes that mirror, it never aborts the sweep
//! - An empty result still replaces the pool; the dispatcher answers 503

pub mod checker;
pub mod probe;

pub use checker::LivenessChecker;
pub use probe::{Probe, ProbeError, ProbeResult};
