//! Mirror pool subsystem.
//!
//! # Data Flow
//! ```text
//! configured gateway templates
//!     → endpoint.rs (parse, validate, one {cid} slot)
//!     → liveness sweep keeps the ones that pass
//!     → manager.rs (atomic swap of the whole pool)
//!     → race dispatcher snapshots it per request
//! ```

pub mod endpoint;
pub mod manager;

pub use endpoint::{Endpoint, EndpointError};
pub use manager::PoolManager;
