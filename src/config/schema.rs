//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::pool::{Endpoint, EndpointError};

/// Public gateways raced when no list is configured.
pub const DEFAULT_GATEWAYS: &[&str] = &[
    "https://ipfs.io/ipfs/",
    "https://gateway.ipfs.io/ipfs/",
    "https://ipfs.infura.io/ipfs/",
    "https://rx14.co.uk/ipfs/",
    "https://ninetailed.ninja/ipfs/",
    "https://upload.global/ipfs/",
    "https://ipfs.globalupload.io/ipfs/",
    "https://ipfs.jes.xxx/ipfs/",
    "https://catalunya.network/ipfs/",
    "https://siderus.io/ipfs/",
    "https://eu.siderus.io/ipfs/",
    "https://na.siderus.io/ipfs/",
    "https://ap.siderus.io/ipfs/",
    "https://ipfs.eternum.io/ipfs/",
    "https://hardbin.com/ipfs/",
    "https://ipfs.macholibre.org/ipfs/",
    "https://ipfs.works/ipfs/",
    "https://ipfs.wa.hle.rs/ipfs/",
    "https://api.wisdom.sh/ipfs/",
    "https://gateway.blocksec.com/ipfs/",
    "https://ipfs.renehsz.com/ipfs/",
    "https://cloudflare-ipfs.com/ipfs/",
    "https://ipns.co/",
    "https://ipfs.netw0rk.io/ipfs/",
    "https://gateway.swedneck.xyz/ipfs/",
    "https://ipfs.mrh.io/ipfs/",
    "https://gateway.originprotocol.com/ipfs/",
    "https://ipfs.dapps.earth/ipfs/",
    "https://gateway.pinata.cloud/ipfs/",
    "https://ipfs.doolta.com/ipfs/",
    "https://ipfs.sloppyta.co/ipfs/",
    "https://ipfs.busy.org/ipfs/",
    "https://ipfs.greyh.at/ipfs/",
    "https://gateway.serph.network/ipfs/",
    "https://jorropo.ovh/ipfs/",
    "https://gateway.temporal.cloud/ipfs/",
    "https://ipfs.fooock.com/ipfs/",
    "https://ipfstube.erindachtler.me/ipfs/",
    "https://cdn.cwinfo.net/ipfs/",
];

/// Root configuration for the relay.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Listener configuration.
    pub listener: ListenerConfig,

    /// Candidate mirror URL templates (`{cid}` slot, or a prefix).
    pub gateways: Vec<String>,

    /// Liveness sweep settings.
    pub liveness: LivenessConfig,

    /// Request racing settings.
    pub race: RaceConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            gateways: DEFAULT_GATEWAYS.iter().map(|g| g.to_string()).collect(),
            liveness: LivenessConfig::default(),
            race: RaceConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl RelayConfig {
    /// Parse the configured gateway templates.
    pub fn endpoints(&self) -> Result<Vec<Endpoint>, EndpointError> {
        Endpoint::parse_all(&self.gateways)
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8085").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8085".to_string(),
        }
    }
}

/// Liveness sweep configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LivenessConfig {
    /// Pause between the end of one sweep and the start of the next.
    pub interval_secs: u64,

    /// Per-probe timeout in seconds.
    pub timeout_secs: u64,

    /// Maximum probes in flight at once.
    pub concurrency: usize,

    /// Identifier every healthy mirror must serve.
    pub probe_cid: String,

    /// Exact body expected for `probe_cid`.
    pub probe_body: String,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60 * 60,
            timeout_secs: 5,
            concurrency: 8,
            probe_cid: "Qmaisz6NMhDB51cCvNWa1GMS7LU1pAxdF4Ld6Ft9kZEP2a".to_string(),
            probe_body: "Hello from IPFS Gateway Checker\n".to_string(),
        }
    }
}

/// Request racing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RaceConfig {
    /// Per-mirror fetch timeout in seconds.
    pub timeout_secs: u64,

    /// Identifiers shorter than this are rejected without racing.
    pub min_identifier_len: usize,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            min_identifier_len: 10,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
