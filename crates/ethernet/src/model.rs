//! Ethernet configuration model
//!
//! Value types describing the desired proxy and IP configuration of the
//! wired interface.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::EthernetError;

/// Proxy mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProxySettings {
    #[default]
    None,
    Static,
    Unassigned,
}

impl ProxySettings {
    /// Name used in the persisted file
    pub fn as_str(&self) -> &'static str {
        match self {
            ProxySettings::None => "NONE",
            ProxySettings::Static => "STATIC",
            ProxySettings::Unassigned => "UNASSIGNED",
        }
    }
}

impl fmt::Display for ProxySettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProxySettings {
    type Err = EthernetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NONE" => Ok(ProxySettings::None),
            "STATIC" => Ok(ProxySettings::Static),
            "UNASSIGNED" => Ok(ProxySettings::Unassigned),
            other => Err(EthernetError::InvalidEnumName(other.to_string())),
        }
    }
}

/// Address assignment mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IpAssignment {
    #[default]
    Dhcp,
    Static,
    Unassigned,
}

impl IpAssignment {
    /// Name used in the persisted file
    pub fn as_str(&self) -> &'static str {
        match self {
            IpAssignment::Dhcp => "DHCP",
            IpAssignment::Static => "STATIC",
            IpAssignment::Unassigned => "UNASSIGNED",
        }
    }
}

impl fmt::Display for IpAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IpAssignment {
    type Err = EthernetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DHCP" => Ok(IpAssignment::Dhcp),
            "STATIC" => Ok(IpAssignment::Static),
            "UNASSIGNED" => Ok(IpAssignment::Unassigned),
            other => Err(EthernetError::InvalidEnumName(other.to_string())),
        }
    }
}

/// An interface address with its network prefix length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkAddress {
    address: IpAddr,
    prefix_length: u8,
}

impl LinkAddress {
    /// Create a link address; the prefix must fit the address family
    pub fn new(address: IpAddr, prefix_length: i32) -> Result<Self, EthernetError> {
        let max = match address {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        };
        if !(0..=max).contains(&prefix_length) {
            return Err(EthernetError::InvalidPrefixLength(prefix_length));
        }
        Ok(Self {
            address,
            prefix_length: prefix_length as u8,
        })
    }

    pub fn address(&self) -> IpAddr {
        self.address
    }

    pub fn prefix_length(&self) -> u8 {
        self.prefix_length
    }
}

impl fmt::Display for LinkAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.prefix_length)
    }
}

/// HTTP proxy definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyProperties {
    /// Proxy hostname or address
    pub host: String,
    /// Proxy port
    pub port: u16,
    /// Comma separated hosts that bypass the proxy
    pub exclusion_list: String,
}

impl ProxyProperties {
    pub fn new(host: impl Into<String>, port: u16, exclusion_list: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            exclusion_list: exclusion_list.into(),
        }
    }
}

/// Address, gateway, DNS and proxy bundle of an interface
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkProperties {
    pub link_addresses: Vec<LinkAddress>,
    pub gateways: Vec<IpAddr>,
    pub dnses: Vec<IpAddr>,
    pub http_proxy: Option<ProxyProperties>,
}

impl LinkProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_link_address(&mut self, address: LinkAddress) {
        if !self.link_addresses.contains(&address) {
            self.link_addresses.push(address);
        }
    }

    pub fn add_gateway(&mut self, gateway: IpAddr) {
        if !self.gateways.contains(&gateway) {
            self.gateways.push(gateway);
        }
    }

    pub fn add_dns(&mut self, dns: IpAddr) {
        if !self.dnses.contains(&dns) {
            self.dnses.push(dns);
        }
    }

    pub fn set_http_proxy(&mut self, proxy: Option<ProxyProperties>) {
        self.http_proxy = proxy;
    }

    pub fn is_empty(&self) -> bool {
        self.link_addresses.is_empty()
            && self.gateways.is_empty()
            && self.dnses.is_empty()
            && self.http_proxy.is_none()
    }
}

impl fmt::Display for LinkProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |items: Vec<String>| items.join(",");
        write!(
            f,
            "{{LinkAddresses: [{}] Routes: [{}] DnsAddresses: [{}]",
            join(self.link_addresses.iter().map(|a| a.to_string()).collect()),
            join(self.gateways.iter().map(|g| g.to_string()).collect()),
            join(self.dnses.iter().map(|d| d.to_string()).collect()),
        )?;
        if let Some(proxy) = &self.http_proxy {
            write!(f, " HttpProxy: [{}:{} xl={}]", proxy.host, proxy.port, proxy.exclusion_list)?;
        }
        f.write_str("}")
    }
}

/// Desired configuration of the wired interface.
///
/// A `Static` proxy always carries an HTTP proxy in `link_properties`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EthernetConfiguration {
    pub proxy_settings: ProxySettings,
    pub ip_assignment: IpAssignment,
    pub link_properties: LinkProperties,
}

impl EthernetConfiguration {
    pub fn new(
        proxy_settings: ProxySettings,
        ip_assignment: IpAssignment,
        link_properties: LinkProperties,
    ) -> Self {
        Self {
            proxy_settings,
            ip_assignment,
            link_properties,
        }
    }

    /// DHCP without a proxy
    pub fn default_configuration() -> Self {
        Self::default()
    }
}

impl fmt::Display for EthernetConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.proxy_settings, self.ip_assignment, self.link_properties)
    }
}
