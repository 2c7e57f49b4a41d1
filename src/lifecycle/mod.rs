//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Build pool/checker/dispatcher → Initial sweep → Start listener
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Stop sweeping → Drain races → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: the first request always sees a vetted pool
//! - Any startup error is fatal

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{Relay, StartupError};
