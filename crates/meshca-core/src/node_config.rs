//! Nebula runtime configuration documents.
//!
//! Documents are built fresh per request from topology-derived inputs and a
//! relay policy. Nothing here fails: missing inputs become empty collections.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::topology::{Host, Network};

/// Where nodes expect the CA certificate.
pub const PKI_CA_PATH: &str = "/etc/nebula/ca.crt";
/// Where nodes expect their own certificate.
pub const PKI_CERT_PATH: &str = "/etc/nebula/host.crt";
/// Where nodes expect their own private key.
pub const PKI_KEY_PATH: &str = "/etc/nebula/host.key";

pub const DEFAULT_LISTEN_HOST: &str = "0.0.0.0";
pub const DEFAULT_LISTEN_PORT: u16 = 4242;

/// A full node configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    pub pki: PkiSection,
    pub lighthouse: LighthouseSection,
    pub listen: ListenSection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub static_host_map: Option<BTreeMap<String, Vec<String>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relay: Option<RelaySection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PkiSection {
    pub ca: String,
    pub cert: String,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LighthouseSection {
    pub am_lighthouse: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hosts: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenSection {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelaySection {
    pub am_relay: bool,
    pub use_relays: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relays: Option<Vec<String>>,
}

/// Inputs of a regular host's configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HostConfigParams {
    pub static_host_map: BTreeMap<String, Vec<String>>,
    pub lighthouse_hosts: Vec<String>,
    pub am_relay: bool,
    pub relays: Option<Vec<String>>,
}

impl HostConfigParams {
    /// Derive the parameters for `host` from its network: the network's
    /// static map and lighthouses, the host's own relay flag, and every other
    /// relay of the network.
    pub fn for_host(network: &Network, host: &Host) -> Self {
        let own_ip = host.ip.trim();
        let relays = network
            .relay_hosts()
            .into_iter()
            .filter(|ip| ip != own_ip)
            .collect();
        Self {
            static_host_map: network.static_host_map(),
            lighthouse_hosts: network.lighthouse_hosts(),
            am_relay: host.is_relay(),
            relays: Some(relays),
        }
    }
}

/// Skeleton shared by every node: PKI paths, listener, lighthouse on.
pub fn base_config() -> NodeConfig {
    NodeConfig {
        pki: PkiSection {
            ca: PKI_CA_PATH.to_string(),
            cert: PKI_CERT_PATH.to_string(),
            key: PKI_KEY_PATH.to_string(),
        },
        lighthouse: LighthouseSection {
            am_lighthouse: true,
            hosts: None,
        },
        listen: ListenSection {
            host: DEFAULT_LISTEN_HOST.to_string(),
            port: DEFAULT_LISTEN_PORT,
        },
        static_host_map: None,
        relay: None,
    }
}

/// Relay policy fragment. A relay never consumes other relays, so the list
/// is ignored when `am_relay` is set.
pub fn relay_config(am_relay: bool, relays: Option<&[String]>) -> RelaySection {
    if am_relay {
        return RelaySection {
            am_relay: true,
            use_relays: false,
            relays: None,
        };
    }
    RelaySection {
        am_relay: false,
        use_relays: true,
        relays: Some(relays.map(<[String]>::to_vec).unwrap_or_default()),
    }
}

/// Configuration for a lighthouse. Lighthouses always act as relays too.
pub fn lighthouse_config() -> NodeConfig {
    NodeConfig {
        relay: Some(relay_config(true, None)),
        ..base_config()
    }
}

/// Configuration for a regular host.
pub fn host_config(params: &HostConfigParams) -> NodeConfig {
    NodeConfig {
        lighthouse: LighthouseSection {
            am_lighthouse: false,
            hosts: Some(params.lighthouse_hosts.clone()),
        },
        static_host_map: Some(params.static_host_map.clone()),
        relay: Some(relay_config(params.am_relay, params.relays.as_deref())),
        ..base_config()
    }
}
