//! Mesh topology: networks, hosts, and the sets derived from them.
//!
//! Everything here is pure data. The derived sets feed
//! [`crate::node_config`] when building per-host configuration.

use std::collections::{BTreeMap, HashSet};
use std::net::IpAddr;

use ipnet::IpNet;
use serde::{Deserialize, Serialize};

use crate::error::{MeshError, Result};

/// Role a host plays in the mesh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostRole {
    /// Well-known endpoint used for discovery
    Lighthouse,
    /// Forwards traffic for peers that cannot reach each other
    Relay,
    /// Ordinary member
    #[default]
    #[serde(alias = "host")]
    Regular,
}

/// One mesh participant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Host {
    #[serde(rename = "type", default)]
    pub role: HostRole,
    pub name: String,
    /// Overlay address assigned to the host
    #[serde(default)]
    pub ip: String,
    /// Whether the host acts as a relay
    #[serde(default)]
    pub relay: bool,
    /// Externally reachable `address:port`
    #[serde(default, alias = "publicIp", skip_serializing_if = "Option::is_none")]
    pub public_ip_port: Option<String>,
}

impl Host {
    pub fn new(role: HostRole, name: impl Into<String>, ip: impl Into<String>) -> Self {
        Self {
            role,
            name: name.into(),
            ip: ip.into(),
            relay: false,
            public_ip_port: None,
        }
    }

    #[must_use]
    pub const fn with_relay(mut self, relay: bool) -> Self {
        self.relay = relay;
        self
    }

    #[must_use]
    pub fn with_public_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.public_ip_port = Some(endpoint.into());
        self
    }

    /// Public endpoint, treating a blank value as absent.
    pub fn public_endpoint(&self) -> Option<&str> {
        self.public_ip_port
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
    }

    pub fn is_lighthouse(&self) -> bool {
        self.role == HostRole::Lighthouse
    }

    /// A host relays if its flag is set or its role is `relay`.
    pub fn is_relay(&self) -> bool {
        self.relay || self.role == HostRole::Relay
    }

    fn overlay_ip(&self) -> Option<&str> {
        Some(self.ip.trim()).filter(|ip| !ip.is_empty())
    }
}

/// A mesh segment and its hosts, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    pub name: String,
    /// Address block of the segment, e.g. `10.0.0.0/24`
    #[serde(default, alias = "ip")]
    pub ip_range: String,
    #[serde(default)]
    pub hosts: Vec<Host>,
}

impl Network {
    pub fn new(name: impl Into<String>, ip_range: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ip_range: ip_range.into(),
            hosts: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_host(mut self, host: Host) -> Self {
        self.hosts.push(host);
        self
    }

    pub fn host(&self, name: &str) -> Option<&Host> {
        self.hosts.iter().find(|h| h.name == name)
    }

    /// Overlay addresses of all lighthouses, in stored order.
    pub fn lighthouse_hosts(&self) -> Vec<String> {
        self.hosts
            .iter()
            .filter(|h| h.is_lighthouse())
            .filter_map(Host::overlay_ip)
            .map(ToString::to_string)
            .collect()
    }

    /// Overlay addresses of all relays, in stored order.
    pub fn relay_hosts(&self) -> Vec<String> {
        self.hosts
            .iter()
            .filter(|h| h.is_relay())
            .filter_map(Host::overlay_ip)
            .map(ToString::to_string)
            .collect()
    }

    /// Overlay address to public endpoint for every host that has one.
    /// Hosts without a public endpoint are only reachable via punching or
    /// relays and get no entry.
    pub fn static_host_map(&self) -> BTreeMap<String, Vec<String>> {
        self.hosts
            .iter()
            .filter_map(|h| Some((h.overlay_ip()?, h.public_endpoint()?)))
            .map(|(ip, endpoint)| (ip.to_string(), vec![endpoint.to_string()]))
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(MeshError::validation("network name must not be empty"));
        }

        let range = if self.ip_range.trim().is_empty() {
            None
        } else {
            Some(parse_cidr(&self.ip_range).ok_or_else(|| {
                MeshError::validation(format!(
                    "network '{name}': ip range '{}' is not of the form address/prefix",
                    self.ip_range
                ))
            })?)
        };

        let mut seen = HashSet::new();
        for host in &self.hosts {
            validate_host(name, range, host)?;
            if let Some(ip) = host.overlay_ip() {
                if !seen.insert(ip) {
                    return Err(MeshError::validation(format!(
                        "network '{name}': address {ip} is assigned to more than one host"
                    )));
                }
            }
        }
        Ok(())
    }
}

fn validate_host(network: &str, range: Option<IpNet>, host: &Host) -> Result<()> {
    let fail = |reason: String| -> Result<()> {
        Err(MeshError::validation(format!(
            "network '{network}', host '{}': {reason}",
            host.name
        )))
    };

    if host.name.trim().is_empty() {
        return fail("host name must not be empty".into());
    }
    if host.is_lighthouse() && host.public_endpoint().is_none() {
        return fail("a lighthouse needs a public ip:port".into());
    }
    if (host.is_lighthouse() || host.is_relay()) && host.overlay_ip().is_none() {
        return fail("lighthouses and relays need an overlay ip".into());
    }
    if let Some(ip) = host.overlay_ip() {
        let Ok(addr) = ip.parse::<IpAddr>() else {
            return fail(format!("'{ip}' is not an ip address"));
        };
        if let Some(range) = range {
            if !range.contains(&addr) {
                return fail(format!("{ip} is outside the network range"));
            }
        }
    }
    if let Some(endpoint) = host.public_endpoint() {
        if !is_endpoint(endpoint) {
            return fail(format!(
                "public endpoint '{endpoint}' is not of the form host:port"
            ));
        }
    }
    Ok(())
}

/// Every network of the mesh. Replacement is a full overwrite.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Topology {
    networks: Vec<Network>,
}

impl Topology {
    /// Build a topology after validating every network.
    pub fn new(networks: Vec<Network>) -> Result<Self> {
        let mut names = HashSet::new();
        for network in &networks {
            network.validate()?;
            if !names.insert(network.name.trim()) {
                return Err(MeshError::validation(format!(
                    "network '{}' is defined more than once",
                    network.name
                )));
            }
        }
        Ok(Self { networks })
    }

    /// Swap in a complete new set of networks. Nothing changes on error.
    pub fn replace(&mut self, networks: Vec<Network>) -> Result<()> {
        *self = Self::new(networks)?;
        Ok(())
    }

    pub fn networks(&self) -> &[Network] {
        &self.networks
    }

    pub fn network(&self, name: &str) -> Option<&Network> {
        self.networks.iter().find(|n| n.name == name)
    }

    pub fn host_count(&self) -> usize {
        self.networks.iter().map(|n| n.hosts.len()).sum()
    }
}

/// Parse `address/prefix`. Host bits may be set (`10.0.0.5/24`).
pub fn parse_cidr(value: &str) -> Option<IpNet> {
    value.trim().parse().ok()
}

fn is_endpoint(value: &str) -> bool {
    value
        .rsplit_once(':')
        .is_some_and(|(host, port)| {
            !host.is_empty() && port.parse::<u16>().is_ok_and(|p| p != 0)
        })
}
