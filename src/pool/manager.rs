//! Live mirror pool.
//!
//! # Responsibilities
//! - Hold the set of mirrors that passed the last liveness sweep
//! - Hand out cheap snapshots to request handlers
//! - Swap in a whole new set when a sweep completes
//!
//! # Design Decisions
//! - `ArcSwap` so readers never take a lock and never see a half-built pool
//! - Only whole-pool replacement, no per-endpoint mutation

use arc_swap::ArcSwap;
use std::sync::Arc;

use crate::observability::metrics;
use crate::pool::Endpoint;

/// Owner of the believed-live mirror set.
#[derive(Debug)]
pub struct PoolManager {
    endpoints: ArcSwap<Vec<Endpoint>>,
}

impl PoolManager {
    /// Create a pool seeded with the given endpoints.
    pub fn new(initial: Vec<Endpoint>) -> Self {
        metrics::set_pool_size(initial.len());
        Self {
            endpoints: ArcSwap::from_pointee(initial),
        }
    }

    /// Create an empty pool (nothing vetted yet).
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// The pool as of the last completed replacement.
    pub fn snapshot(&self) -> Arc<Vec<Endpoint>> {
        self.endpoints.load_full()
    }

    /// Atomically install a new pool.
    pub fn replace(&self, endpoints: Vec<Endpoint>) {
        metrics::set_pool_size(endpoints.len());
        self.endpoints.store(Arc::new(endpoints));
    }

    /// Number of endpoints currently in the pool.
    pub fn len(&self) -> usize {
        self.endpoints.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for PoolManager {
    fn default() -> Self {
        Self::empty()
    }
}
