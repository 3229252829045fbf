//! Field validation for user-edited Ethernet settings
//!
//! Every check reports which field failed and which rule it broke so the
//! caller can decide whether to block submission.

use std::fmt;
use std::net::IpAddr;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{
    EthernetConfiguration, IpAssignment, LinkAddress, LinkProperties, ProxyProperties,
    ProxySettings,
};

/// Blank input, or dot separated labels of letters and digits with inner hyphens
static HOSTNAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^$|^[a-zA-Z0-9]+(-[a-zA-Z0-9]+)*(\.[a-zA-Z0-9]+(-[a-zA-Z0-9]+)*)*$")
        .expect("hostname pattern is valid")
});

/// Comma separated domains, each optionally starting with a dot
static EXCLUSION_LIST_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^$|^\.?[a-zA-Z0-9]+(-[a-zA-Z0-9]+)*(\.[a-zA-Z0-9]+(-[a-zA-Z0-9]+)*)*",
        r"(,\.?[a-zA-Z0-9]+(-[a-zA-Z0-9]+)*(\.[a-zA-Z0-9]+(-[a-zA-Z0-9]+)*)*)*$",
    ))
    .expect("exclusion list pattern is valid")
});

/// Largest accepted network prefix length
pub const MAX_PREFIX_LENGTH: i32 = 32;

/// Form field that failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    ProxyHost,
    ProxyPort,
    ProxyExclusionList,
    IpAddress,
    PrefixLength,
    Gateway,
    Dns1,
    Dns2,
}

/// Rule a field broke
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    InvalidIpAddress,
    InvalidHostname,
    InvalidPort,
    InvalidPrefixLength,
    InvalidGateway,
    InvalidDns,
    InvalidExclusionList,
}

/// Structured validation failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValidationError {
    pub field: Field,
    pub rule: Rule,
}

impl ValidationError {
    pub fn new(field: Field, rule: Rule) -> Self {
        Self { field, rule }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self.rule {
            Rule::InvalidIpAddress => "Type a valid IP address.",
            Rule::InvalidHostname => "The hostname you typed isn't valid.",
            Rule::InvalidPort => "The port you typed isn't valid.",
            Rule::InvalidPrefixLength => "Type a network prefix length between 0 and 32.",
            Rule::InvalidGateway => "Type a valid gateway address.",
            Rule::InvalidDns => "Type a valid DNS address.",
            Rule::InvalidExclusionList => {
                "The exclusion list you typed isn't properly formatted. \
                 Type a comma-separated list of excluded domains."
            }
        };
        write!(f, "{:?}: {}", self.field, message)
    }
}

impl std::error::Error for ValidationError {}

/// Empty is valid only when `allow_empty`; otherwise the text must be an
/// IPv4 or IPv6 literal.
pub fn is_valid_ip_address(address: &str, allow_empty: bool) -> bool {
    if address.is_empty() {
        return allow_empty;
    }
    address.parse::<IpAddr>().is_ok()
}

/// Whether `host` matches the hostname grammar (empty allowed)
pub fn is_valid_hostname(host: &str) -> bool {
    HOSTNAME_PATTERN.is_match(host)
}

/// Whether `list` is a valid proxy exclusion list (empty allowed)
pub fn is_valid_exclusion_list(list: &str) -> bool {
    EXCLUSION_LIST_PATTERN.is_match(list)
}

/// Parse a prefix length typed by the user
pub fn parse_prefix_length(text: &str) -> Option<i32> {
    text.trim()
        .parse::<i32>()
        .ok()
        .filter(|len| (0..=MAX_PREFIX_LENGTH).contains(len))
}

/// Parse a proxy port typed by the user
pub fn parse_port(text: &str) -> Option<u16> {
    text.trim().parse::<u16>().ok()
}

/// Raw text of the Ethernet settings form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EthernetForm {
    pub proxy_settings: ProxySettings,
    pub proxy_host: String,
    pub proxy_port: String,
    pub proxy_exclusion_list: String,
    pub ip_assignment: IpAssignment,
    pub ip_address: String,
    pub prefix_length: String,
    pub gateway: String,
    pub dns1: String,
    pub dns2: String,
}

impl EthernetForm {
    /// Pre-fill the form from a stored or live configuration
    pub fn from_configuration(config: &EthernetConfiguration) -> Self {
        let props = &config.link_properties;
        let mut form = EthernetForm {
            proxy_settings: if config.proxy_settings == ProxySettings::Static {
                ProxySettings::Static
            } else {
                ProxySettings::None
            },
            ip_assignment: if config.ip_assignment == IpAssignment::Static {
                IpAssignment::Static
            } else {
                IpAssignment::Dhcp
            },
            ..Default::default()
        };

        if let Some(proxy) = &props.http_proxy {
            form.proxy_host = proxy.host.clone();
            form.proxy_port = proxy.port.to_string();
            form.proxy_exclusion_list = proxy.exclusion_list.clone();
        }
        if let Some(link) = props.link_addresses.first() {
            form.ip_address = link.address().to_string();
            form.prefix_length = link.prefix_length().to_string();
        }
        if let Some(gateway) = props.gateways.first() {
            form.gateway = gateway.to_string();
        }
        let mut dnses = props.dnses.iter();
        if let Some(dns) = dnses.next() {
            form.dns1 = dns.to_string();
        }
        if let Some(dns) = dnses.next() {
            form.dns2 = dns.to_string();
        }
        form
    }

    fn proxy_enabled(&self) -> bool {
        self.proxy_settings == ProxySettings::Static
    }

    fn static_ip_enabled(&self) -> bool {
        self.ip_assignment == IpAssignment::Static
    }

    /// All validation failures; sections that aren't static are not checked
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.proxy_enabled() {
            let host = self.proxy_host.trim();
            if host.is_empty() || !(is_valid_hostname(host) || is_valid_ip_address(host, false)) {
                errors.push(ValidationError::new(Field::ProxyHost, Rule::InvalidHostname));
            }
            if parse_port(&self.proxy_port).is_none() {
                errors.push(ValidationError::new(Field::ProxyPort, Rule::InvalidPort));
            }
            if !is_valid_exclusion_list(&self.proxy_exclusion_list) {
                errors.push(ValidationError::new(
                    Field::ProxyExclusionList,
                    Rule::InvalidExclusionList,
                ));
            }
        }

        if self.static_ip_enabled() {
            if !is_valid_ip_address(&self.ip_address, false) {
                errors.push(ValidationError::new(Field::IpAddress, Rule::InvalidIpAddress));
            }
            if parse_prefix_length(&self.prefix_length).is_none() {
                errors.push(ValidationError::new(Field::PrefixLength, Rule::InvalidPrefixLength));
            }
            if !is_valid_ip_address(&self.gateway, false) {
                errors.push(ValidationError::new(Field::Gateway, Rule::InvalidGateway));
            }
            if !is_valid_ip_address(&self.dns1, false) {
                errors.push(ValidationError::new(Field::Dns1, Rule::InvalidDns));
            }
            if !is_valid_ip_address(&self.dns2, true) {
                errors.push(ValidationError::new(Field::Dns2, Rule::InvalidDns));
            }
        }

        errors
    }

    /// Whether the form can be submitted
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    /// Validate and build the configuration the form describes
    pub fn to_configuration(&self) -> Result<EthernetConfiguration, Vec<ValidationError>> {
        let errors = self.validate();
        if !errors.is_empty() {
            return Err(errors);
        }

        let mut props = LinkProperties::new();

        let proxy_settings = if self.proxy_enabled() {
            let port = parse_port(&self.proxy_port)
                .ok_or_else(|| vec![ValidationError::new(Field::ProxyPort, Rule::InvalidPort)])?;
            props.set_http_proxy(Some(ProxyProperties::new(
                self.proxy_host.trim(),
                port,
                self.proxy_exclusion_list.as_str(),
            )));
            ProxySettings::Static
        } else {
            ProxySettings::None
        };

        let ip_assignment = if self.static_ip_enabled() {
            let invalid = |field, rule| vec![ValidationError::new(field, rule)];
            let address: IpAddr = self
                .ip_address
                .parse()
                .map_err(|_| invalid(Field::IpAddress, Rule::InvalidIpAddress))?;
            let prefix_length = parse_prefix_length(&self.prefix_length)
                .ok_or_else(|| invalid(Field::PrefixLength, Rule::InvalidPrefixLength))?;
            let link = LinkAddress::new(address, prefix_length)
                .map_err(|_| invalid(Field::PrefixLength, Rule::InvalidPrefixLength))?;
            props.add_link_address(link);

            let gateway: IpAddr = self
                .gateway
                .parse()
                .map_err(|_| invalid(Field::Gateway, Rule::InvalidGateway))?;
            props.add_gateway(gateway);

            let dns1: IpAddr = self
                .dns1
                .parse()
                .map_err(|_| invalid(Field::Dns1, Rule::InvalidDns))?;
            props.add_dns(dns1);
            if !self.dns2.is_empty() {
                let dns2: IpAddr = self
                    .dns2
                    .parse()
                    .map_err(|_| invalid(Field::Dns2, Rule::InvalidDns))?;
                props.add_dns(dns2);
            }
            IpAssignment::Static
        } else {
            IpAssignment::Dhcp
        };

        Ok(EthernetConfiguration::new(proxy_settings, ip_assignment, props))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn static_form() -> EthernetForm {
        EthernetForm {
            ip_assignment: IpAssignment::Static,
            ip_address: "192.168.1.20".into(),
            prefix_length: "24".into(),
            gateway: "192.168.1.1".into(),
            dns1: "8.8.8.8".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_ip_address_rules() {
        assert!(is_valid_ip_address("", true));
        assert!(!is_valid_ip_address("", false));
        assert!(!is_valid_ip_address("300.1.1.1", true));
        assert!(!is_valid_ip_address("300.1.1.1", false));
        assert!(is_valid_ip_address("192.168.1.1", true));
        assert!(is_valid_ip_address("192.168.1.1", false));
        assert!(is_valid_ip_address("fe80::1", false));
        assert!(!is_valid_ip_address("example.com", false));
    }

    #[test]
    fn test_exclusion_list_grammar() {
        assert!(is_valid_exclusion_list(""));
        assert!(is_valid_exclusion_list("example.com"));
        assert!(is_valid_exclusion_list("a.com,b.co.uk"));
        assert!(is_valid_exclusion_list(".internal,my-host"));
        assert!(!is_valid_exclusion_list(",,bad,,"));
        assert!(!is_valid_exclusion_list("a.com, b.com"));
        assert!(!is_valid_exclusion_list("has space.com"));
        assert!(!is_valid_exclusion_list("trailing-.com"));
    }

    #[test]
    fn test_hostname_grammar() {
        assert!(is_valid_hostname(""));
        assert!(is_valid_hostname("proxy-1.corp.example"));
        assert!(!is_valid_hostname("-proxy"));
        assert!(!is_valid_hostname("proxy..lan"));
    }

    #[test]
    fn test_prefix_length_bounds() {
        assert_eq!(parse_prefix_length("0"), Some(0));
        assert_eq!(parse_prefix_length("32"), Some(32));
        assert_eq!(parse_prefix_length("33"), None);
        assert_eq!(parse_prefix_length("-1"), None);
        assert_eq!(parse_prefix_length("abc"), None);
    }

    #[test]
    fn test_dhcp_form_skips_ip_checks() {
        let form = EthernetForm {
            ip_address: "garbage".into(),
            ..Default::default()
        };
        assert!(form.is_valid());
        let config = form.to_configuration().unwrap();
        assert_eq!(config, EthernetConfiguration::default_configuration());
    }

    #[test]
    fn test_static_form_builds_configuration() {
        let mut form = static_form();
        form.dns2 = "1.1.1.1".into();
        let config = form.to_configuration().unwrap();

        assert_eq!(config.ip_assignment, IpAssignment::Static);
        assert_eq!(config.proxy_settings, ProxySettings::None);
        let props = &config.link_properties;
        assert_eq!(props.link_addresses[0].to_string(), "192.168.1.20/24");
        assert_eq!(props.gateways.len(), 1);
        assert_eq!(props.dnses.len(), 2);
    }

    #[test]
    fn test_static_form_reports_every_field() {
        let form = EthernetForm {
            ip_assignment: IpAssignment::Static,
            prefix_length: "40".into(),
            dns2: "nope".into(),
            ..Default::default()
        };
        let errors = form.validate();
        let fields: Vec<Field> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![Field::IpAddress, Field::PrefixLength, Field::Gateway, Field::Dns1, Field::Dns2]
        );
        assert!(form.to_configuration().is_err());
    }

    #[test]
    fn test_proxy_form() {
        let mut form = EthernetForm {
            proxy_settings: ProxySettings::Static,
            proxy_host: "proxy.lan".into(),
            proxy_port: "3128".into(),
            proxy_exclusion_list: "a.com,b.co.uk".into(),
            ..Default::default()
        };
        let config = form.to_configuration().unwrap();
        assert_eq!(config.proxy_settings, ProxySettings::Static);
        assert_eq!(
            config.link_properties.http_proxy,
            Some(ProxyProperties::new("proxy.lan", 3128, "a.com,b.co.uk"))
        );

        form.proxy_port = "70000".into();
        form.proxy_exclusion_list = "a.com b.com".into();
        let errors = form.validate();
        assert!(errors.contains(&ValidationError::new(Field::ProxyPort, Rule::InvalidPort)));
        assert!(errors.contains(&ValidationError::new(
            Field::ProxyExclusionList,
            Rule::InvalidExclusionList
        )));
    }

    #[test]
    fn test_form_prefill_roundtrip() {
        let mut form = static_form();
        form.dns2 = "1.1.1.1".into();
        let config = form.to_configuration().unwrap();
        assert_eq!(EthernetForm::from_configuration(&config), form);
    }
}
