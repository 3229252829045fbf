//! Connectivity collaborator
//!
//! Live Ethernet state: whether the link is up, its current addresses, and
//! the ability to bounce the interface after a new configuration is written.

use std::net::IpAddr;
use std::path::PathBuf;
use async_trait::async_trait;
use serde::Serialize;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::EthernetError;
use crate::model::{LinkAddress, LinkProperties};

/// MAC reported when the hardware address can't be read
pub const UNKNOWN_MAC_ADDRESS: &str = "00:00:00:00:00:00";

/// Source of live Ethernet state
#[async_trait]
pub trait Connectivity: Send + Sync {
    /// Whether the Ethernet network is connected
    async fn is_ethernet_connected(&self) -> bool;

    /// Live link properties of the Ethernet network, if it has any
    async fn ethernet_link_properties(&self) -> Option<LinkProperties>;

    /// Take the interface down and bring it back up
    async fn cycle_interface(&self, interface: &str) -> Result<(), EthernetError>;

    /// Hardware address of the interface
    async fn hardware_address(&self, _interface: &str) -> Option<String> {
        None
    }
}

/// Snapshot of the wired interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EthernetStatus {
    pub interface: String,
    pub connected: bool,
    pub mac_address: String,
}

/// Connectivity backed by sysfs and the `ip` tool
#[derive(Debug, Clone)]
pub struct SystemConnectivity {
    interface: String,
    sysfs_root: PathBuf,
    resolv_conf: PathBuf,
}

impl SystemConnectivity {
    /// Connectivity for the given interface
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            sysfs_root: PathBuf::from("/sys/class/net"),
            resolv_conf: PathBuf::from("/etc/resolv.conf"),
        }
    }

    /// Use a different sysfs network class directory
    pub fn with_sysfs_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.sysfs_root = root.into();
        self
    }

    /// Use a different resolver configuration file
    pub fn with_resolv_conf(mut self, path: impl Into<PathBuf>) -> Self {
        self.resolv_conf = path.into();
        self
    }

    async fn read_sysfs(&self, interface: &str, attribute: &str) -> Option<String> {
        let path = self.sysfs_root.join(interface).join(attribute);
        tokio::fs::read_to_string(&path)
            .await
            .map(|s| s.trim().to_string())
            .map_err(|e| debug!("Could not read {:?}: {}", path, e))
            .ok()
    }

    async fn run_ip(args: &[&str]) -> Result<String, String> {
        debug!("ip {:?}", args);

        let output = Command::new("ip")
            .args(args)
            .output()
            .await
            .map_err(|e| e.to_string())?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            Err(String::from_utf8_lossy(&output.stderr).trim().to_string())
        }
    }
}

#[async_trait]
impl Connectivity for SystemConnectivity {
    async fn is_ethernet_connected(&self) -> bool {
        let operstate = self.read_sysfs(&self.interface, "operstate").await;
        let carrier = self.read_sysfs(&self.interface, "carrier").await;
        is_link_up(operstate.as_deref(), carrier.as_deref())
    }

    async fn ethernet_link_properties(&self) -> Option<LinkProperties> {
        let listing = Self::run_ip(&["-o", "addr", "show", "dev", &self.interface]).await;
        let addresses = match listing {
            Ok(out) => out,
            Err(e) => {
                warn!("Could not list addresses of {}: {}", self.interface, e);
                return None;
            }
        };

        let mut props = LinkProperties::new();
        for address in parse_ip_addr_output(&addresses) {
            props.add_link_address(address);
        }

        match Self::run_ip(&["route", "show", "default", "dev", &self.interface]).await {
            Ok(routes) => {
                for gateway in parse_default_routes(&routes) {
                    props.add_gateway(gateway);
                }
            }
            Err(e) => warn!("Could not list routes of {}: {}", self.interface, e),
        }

        match tokio::fs::read_to_string(&self.resolv_conf).await {
            Ok(contents) => {
                for dns in parse_resolv_conf(&contents) {
                    props.add_dns(dns);
                }
            }
            Err(e) => debug!("Could not read {:?}: {}", self.resolv_conf, e),
        }

        Some(props)
    }

    async fn cycle_interface(&self, interface: &str) -> Result<(), EthernetError> {
        for state in ["down", "up"] {
            Self::run_ip(&["link", "set", "dev", interface, state])
                .await
                .map_err(|reason| EthernetError::InterfaceCycle {
                    interface: interface.to_string(),
                    reason,
                })?;
        }
        debug!("Cycled interface {}", interface);
        Ok(())
    }

    async fn hardware_address(&self, interface: &str) -> Option<String> {
        self.read_sysfs(interface, "address")
            .await
            .filter(|mac| !mac.is_empty())
    }
}

/// Build the status snapshot for an interface
pub async fn ethernet_status(connectivity: &dyn Connectivity, interface: &str) -> EthernetStatus {
    EthernetStatus {
        interface: interface.to_string(),
        connected: connectivity.is_ethernet_connected().await,
        mac_address: connectivity
            .hardware_address(interface)
            .await
            .unwrap_or_else(|| UNKNOWN_MAC_ADDRESS.to_string()),
    }
}

/// Link state from sysfs `operstate`, consulting `carrier` when the driver
/// reports an unknown operstate
pub fn is_link_up(operstate: Option<&str>, carrier: Option<&str>) -> bool {
    match operstate {
        Some("up") => true,
        Some("unknown") => carrier == Some("1"),
        _ => false,
    }
}

/// Global-scope addresses from `ip -o addr show`
pub fn parse_ip_addr_output(output: &str) -> Vec<LinkAddress> {
    let mut addresses = Vec::new();

    for line in output.lines() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some(pos) = tokens.iter().position(|t| *t == "inet" || *t == "inet6") else {
            continue;
        };
        let scope = tokens
            .iter()
            .position(|t| *t == "scope")
            .and_then(|i| tokens.get(i + 1));
        if scope.is_some_and(|s| *s != "global") {
            continue;
        }
        let Some((addr, prefix)) = tokens.get(pos + 1).and_then(|cidr| cidr.split_once('/')) else {
            continue;
        };
        let parsed = addr
            .parse::<IpAddr>()
            .ok()
            .zip(prefix.parse::<i32>().ok())
            .and_then(|(addr, prefix)| LinkAddress::new(addr, prefix).ok());
        match parsed {
            Some(address) => addresses.push(address),
            None => debug!("Skipping unparseable address line: {}", line),
        }
    }

    addresses
}

/// Gateways from `ip route show default`
pub fn parse_default_routes(output: &str) -> Vec<IpAddr> {
    output
        .lines()
        .filter_map(|line| {
            let mut tokens = line.split_whitespace();
            tokens.find(|t| *t == "via")?;
            tokens.next()?.parse().ok()
        })
        .collect()
}

/// Name servers from a resolver configuration file
pub fn parse_resolv_conf(contents: &str) -> Vec<IpAddr> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#') && !line.starts_with(';'))
        .filter_map(|line| {
            let mut tokens = line.split_whitespace();
            if tokens.next()? != "nameserver" {
                return None;
            }
            // Drop a zone index such as fe80::1%eth0.
            let server = tokens.next()?.split('%').next()?;
            server.parse().ok()
        })
        .collect()
}
