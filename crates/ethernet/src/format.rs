//! Ethernet configuration file format
//!
//! Layout: a big-endian `i32` version followed by `(key, value)` pairs until
//! the `eos` key. Keys and string values use the length-prefixed modified
//! UTF-8 encoding of Java's `DataOutput.writeUTF`, integers are big-endian
//! `i32`. Each key fixes the shape of its value, so a key missing from the
//! decode table leaves the reader unable to continue.

use std::net::IpAddr;
use tracing::{debug, warn};

use crate::error::EthernetError;
use crate::model::{
    EthernetConfiguration, IpAssignment, LinkAddress, LinkProperties, ProxyProperties,
    ProxySettings,
};

/// Current file format version
pub const FILE_VERSION: i32 = 2;

/// Longest encoded string `writeUTF` can frame
const MAX_UTF_LEN: usize = u16::MAX as usize;

/// Keys recognized in the configuration stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    ProxySettings,
    ProxyHost,
    ProxyPort,
    ProxyExclusionList,
    IpAssignment,
    LinkAddress,
    Gateway,
    Dns,
    EndOfStream,
}

const TAG_TABLE: [(Tag, &str); 9] = [
    (Tag::ProxySettings, "proxySettings"),
    (Tag::ProxyHost, "proxyHost"),
    (Tag::ProxyPort, "proxyPort"),
    (Tag::ProxyExclusionList, "proxyExclusionList"),
    (Tag::IpAssignment, "ipAssignment"),
    (Tag::LinkAddress, "linkAddress"),
    (Tag::Gateway, "gateway"),
    (Tag::Dns, "dns"),
    (Tag::EndOfStream, "eos"),
];

type DecodeFn = fn(&mut DataReader<'_>, &mut RawRecord) -> Result<(), EthernetError>;

impl Tag {
    /// Key written to the stream
    pub fn key(self) -> &'static str {
        TAG_TABLE
            .iter()
            .find(|(tag, _)| *tag == self)
            .map(|(_, key)| *key)
            .unwrap_or("eos")
    }

    /// Look up a key read from the stream
    pub fn from_key(key: &str) -> Option<Tag> {
        TAG_TABLE
            .iter()
            .find(|(_, name)| *name == key)
            .map(|(tag, _)| *tag)
    }

    /// Value decoder, `None` for the end-of-stream sentinel
    fn decoder(self) -> Option<DecodeFn> {
        match self {
            Tag::ProxySettings => Some(decode_proxy_settings),
            Tag::ProxyHost => Some(decode_proxy_host),
            Tag::ProxyPort => Some(decode_proxy_port),
            Tag::ProxyExclusionList => Some(decode_exclusion_list),
            Tag::IpAssignment => Some(decode_ip_assignment),
            Tag::LinkAddress => Some(decode_link_address),
            Tag::Gateway => Some(decode_gateway),
            Tag::Dns => Some(decode_dns),
            Tag::EndOfStream => None,
        }
    }
}

/// Big-endian writer compatible with `java.io.DataOutputStream`
struct DataWriter {
    buf: Vec<u8>,
}

impl DataWriter {
    fn new() -> Self {
        Self { buf: Vec::new() }
    }

    fn write_i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    fn write_utf(&mut self, value: &str) -> Result<(), EthernetError> {
        let encoded = encode_modified_utf8(value);
        if encoded.len() > MAX_UTF_LEN {
            return Err(EthernetError::StringTooLong(encoded.len()));
        }
        self.buf.extend_from_slice(&(encoded.len() as u16).to_be_bytes());
        self.buf.extend_from_slice(&encoded);
        Ok(())
    }

    fn write_tag(&mut self, tag: Tag) -> Result<(), EthernetError> {
        self.write_utf(tag.key())
    }

    fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Big-endian reader compatible with `java.io.DataInputStream`
struct DataReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> DataReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], EthernetError> {
        let end = self.pos.checked_add(len).ok_or(EthernetError::Truncated)?;
        let bytes = self.data.get(self.pos..end).ok_or(EthernetError::Truncated)?;
        self.pos = end;
        Ok(bytes)
    }

    fn read_i32(&mut self) -> Result<i32, EthernetError> {
        let bytes = self.take(4)?;
        Ok(i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_utf(&mut self) -> Result<String, EthernetError> {
        let len = self.take(2)?;
        let len = u16::from_be_bytes([len[0], len[1]]) as usize;
        decode_modified_utf8(self.take(len)?)
    }
}

/// Encode as modified UTF-8: NUL takes two bytes and characters outside the
/// BMP are written as two three-byte surrogates.
fn encode_modified_utf8(value: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(value.len());
    for unit in value.encode_utf16() {
        match unit {
            0x0001..=0x007F => out.push(unit as u8),
            0x0000 | 0x0080..=0x07FF => {
                out.push(0xC0 | (unit >> 6) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
            _ => {
                out.push(0xE0 | (unit >> 12) as u8);
                out.push(0x80 | ((unit >> 6) & 0x3F) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
        }
    }
    out
}

fn decode_modified_utf8(bytes: &[u8]) -> Result<String, EthernetError> {
    let mut units = Vec::with_capacity(bytes.len());
    let mut i = 0;
    let continuation = |b: Option<&u8>| match b {
        Some(b) if b & 0xC0 == 0x80 => Ok((b & 0x3F) as u16),
        _ => Err(EthernetError::MalformedString),
    };

    while i < bytes.len() {
        let b = bytes[i];
        match b >> 4 {
            0..=7 => {
                units.push(b as u16);
                i += 1;
            }
            12 | 13 => {
                let low = continuation(bytes.get(i + 1))?;
                units.push(((b & 0x1F) as u16) << 6 | low);
                i += 2;
            }
            14 => {
                let mid = continuation(bytes.get(i + 1))?;
                let low = continuation(bytes.get(i + 2))?;
                units.push(((b & 0x0F) as u16) << 12 | mid << 6 | low);
                i += 3;
            }
            _ => return Err(EthernetError::MalformedString),
        }
    }

    String::from_utf16(&units).map_err(|_| EthernetError::MalformedString)
}

/// Serialize a configuration.
///
/// The record is checked and encoded completely before anything is returned,
/// so a contract error never produces a partial stream.
pub fn encode(config: &EthernetConfiguration) -> Result<Vec<u8>, EthernetError> {
    let props = &config.link_properties;
    let mut out = DataWriter::new();
    let mut wrote_section = false;

    out.write_i32(FILE_VERSION);

    match config.proxy_settings {
        ProxySettings::None => {
            out.write_tag(Tag::ProxySettings)?;
            out.write_utf(config.proxy_settings.as_str())?;
            wrote_section = true;
        }
        ProxySettings::Static => {
            let proxy = props.http_proxy.as_ref().ok_or(EthernetError::MissingProxy)?;
            out.write_tag(Tag::ProxySettings)?;
            out.write_utf(config.proxy_settings.as_str())?;
            out.write_tag(Tag::ProxyHost)?;
            out.write_utf(&proxy.host)?;
            out.write_tag(Tag::ProxyPort)?;
            out.write_i32(proxy.port as i32);
            out.write_tag(Tag::ProxyExclusionList)?;
            out.write_utf(&proxy.exclusion_list)?;
            wrote_section = true;
        }
        ProxySettings::Unassigned => {}
    }

    match config.ip_assignment {
        IpAssignment::Static => {
            out.write_tag(Tag::IpAssignment)?;
            out.write_utf(config.ip_assignment.as_str())?;
            for link in &props.link_addresses {
                out.write_tag(Tag::LinkAddress)?;
                out.write_utf(&link.address().to_string())?;
                out.write_i32(link.prefix_length() as i32);
            }
            for gateway in &props.gateways {
                out.write_tag(Tag::Gateway)?;
                out.write_utf(&gateway.to_string())?;
            }
            for dns in &props.dnses {
                out.write_tag(Tag::Dns)?;
                out.write_utf(&dns.to_string())?;
            }
            wrote_section = true;
        }
        IpAssignment::Dhcp => {
            out.write_tag(Tag::IpAssignment)?;
            out.write_utf(config.ip_assignment.as_str())?;
            wrote_section = true;
        }
        IpAssignment::Unassigned => {}
    }

    if !wrote_section {
        return Err(EthernetError::Unassigned);
    }

    out.write_tag(Tag::EndOfStream)?;
    Ok(out.into_bytes())
}

/// Fields accumulated while scanning the stream
#[derive(Debug)]
struct RawRecord {
    proxy_settings: ProxySettings,
    proxy_host: Option<String>,
    proxy_port: u16,
    proxy_exclusion_list: Option<String>,
    ip_assignment: IpAssignment,
    link_properties: LinkProperties,
}

impl Default for RawRecord {
    fn default() -> Self {
        Self {
            proxy_settings: ProxySettings::Unassigned,
            proxy_host: None,
            proxy_port: 0,
            proxy_exclusion_list: None,
            ip_assignment: IpAssignment::Unassigned,
            link_properties: LinkProperties::new(),
        }
    }
}

impl RawRecord {
    /// Keep only static content that is complete, else fall back to defaults
    fn finish(self) -> EthernetConfiguration {
        let mut proxy_settings = self.proxy_settings;
        let mut ip_assignment = self.ip_assignment;
        let mut link_properties = self.link_properties;

        if proxy_settings == ProxySettings::Static {
            match self.proxy_host {
                Some(host) => link_properties.set_http_proxy(Some(ProxyProperties::new(
                    host,
                    self.proxy_port,
                    self.proxy_exclusion_list.unwrap_or_default(),
                ))),
                None => {
                    warn!("Static proxy without a host, ignoring proxy settings");
                    proxy_settings = ProxySettings::None;
                }
            }
        }

        if ip_assignment == IpAssignment::Static && link_properties.link_addresses.is_empty() {
            warn!("Static IP assignment without an address, falling back to DHCP");
            ip_assignment = IpAssignment::Dhcp;
        }

        if proxy_settings != ProxySettings::Static && ip_assignment != IpAssignment::Static {
            debug!("No static configuration stored, using defaults");
            return EthernetConfiguration::default_configuration();
        }

        EthernetConfiguration::new(proxy_settings, ip_assignment, link_properties)
    }
}

fn parse_address(literal: String) -> Result<IpAddr, EthernetError> {
    literal
        .parse()
        .map_err(|_| EthernetError::InvalidAddress(literal))
}

fn decode_proxy_settings(r: &mut DataReader<'_>, rec: &mut RawRecord) -> Result<(), EthernetError> {
    rec.proxy_settings = r.read_utf()?.parse()?;
    Ok(())
}

fn decode_proxy_host(r: &mut DataReader<'_>, rec: &mut RawRecord) -> Result<(), EthernetError> {
    rec.proxy_host = Some(r.read_utf()?);
    Ok(())
}

fn decode_proxy_port(r: &mut DataReader<'_>, rec: &mut RawRecord) -> Result<(), EthernetError> {
    let port = r.read_i32()?;
    rec.proxy_port = u16::try_from(port).map_err(|_| EthernetError::InvalidPort(port))?;
    Ok(())
}

fn decode_exclusion_list(r: &mut DataReader<'_>, rec: &mut RawRecord) -> Result<(), EthernetError> {
    rec.proxy_exclusion_list = Some(r.read_utf()?);
    Ok(())
}

fn decode_ip_assignment(r: &mut DataReader<'_>, rec: &mut RawRecord) -> Result<(), EthernetError> {
    rec.ip_assignment = r.read_utf()?.parse()?;
    Ok(())
}

fn decode_link_address(r: &mut DataReader<'_>, rec: &mut RawRecord) -> Result<(), EthernetError> {
    // Both halves are consumed before validation so the stream stays aligned.
    let literal = r.read_utf()?;
    let prefix_length = r.read_i32()?;
    let address = LinkAddress::new(parse_address(literal)?, prefix_length)?;
    rec.link_properties.add_link_address(address);
    Ok(())
}

fn decode_gateway(r: &mut DataReader<'_>, rec: &mut RawRecord) -> Result<(), EthernetError> {
    let gateway = parse_address(r.read_utf()?)?;
    rec.link_properties.add_gateway(gateway);
    Ok(())
}

fn decode_dns(r: &mut DataReader<'_>, rec: &mut RawRecord) -> Result<(), EthernetError> {
    let dns = parse_address(r.read_utf()?)?;
    rec.link_properties.add_dns(dns);
    Ok(())
}

/// Parse a configuration stream.
///
/// Bad values inside known keys are logged and skipped. A version mismatch,
/// an unknown key, a malformed string or a missing `eos` fails the read.
pub fn decode(bytes: &[u8]) -> Result<EthernetConfiguration, EthernetError> {
    let mut reader = DataReader::new(bytes);

    let version = reader.read_i32()?;
    if version != FILE_VERSION {
        return Err(EthernetError::BadVersion {
            found: version,
            expected: FILE_VERSION,
        });
    }

    let mut record = RawRecord::default();
    loop {
        let key = reader.read_utf()?;
        let tag = Tag::from_key(&key).ok_or(EthernetError::UnknownTag(key))?;
        let Some(decode_value) = tag.decoder() else {
            break;
        };

        match decode_value(&mut reader, &mut record) {
            Ok(()) => {}
            Err(e) if e.is_format_error() => return Err(e),
            Err(e) => warn!("Ignoring invalid {} value while reading: {}", tag.key(), e),
        }
    }

    Ok(record.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf(key: &str) -> Vec<u8> {
        let mut out = (key.len() as u16).to_be_bytes().to_vec();
        out.extend_from_slice(key.as_bytes());
        out
    }

    fn stream(version: i32, parts: &[Vec<u8>]) -> Vec<u8> {
        let mut out = version.to_be_bytes().to_vec();
        for part in parts {
            out.extend_from_slice(part);
        }
        out
    }

    fn static_config() -> EthernetConfiguration {
        let mut props = LinkProperties::new();
        props.add_link_address(LinkAddress::new("192.168.1.20".parse().unwrap(), 24).unwrap());
        props.add_gateway("192.168.1.1".parse().unwrap());
        props.add_dns("8.8.8.8".parse().unwrap());
        props.add_dns("2001:4860:4860::8888".parse().unwrap());
        props.set_http_proxy(Some(ProxyProperties::new("proxy.lan", 3128, "a.com,b.co.uk")));
        EthernetConfiguration::new(ProxySettings::Static, IpAssignment::Static, props)
    }

    #[test]
    fn test_default_layout() {
        let bytes = encode(&EthernetConfiguration::default_configuration()).unwrap();
        let expected = stream(
            2,
            &[utf("proxySettings"), utf("NONE"), utf("ipAssignment"), utf("DHCP"), utf("eos")],
        );
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_roundtrip_static() {
        let config = static_config();
        let decoded = decode(&encode(&config).unwrap()).unwrap();
        assert_eq!(decoded, config);
    }

    #[test]
    fn test_version_guard() {
        let mut bytes = encode(&static_config()).unwrap();
        bytes[3] = 3;
        assert!(matches!(
            decode(&bytes),
            Err(EthernetError::BadVersion { found: 3, expected: 2 })
        ));
    }

    #[test]
    fn test_missing_eos_is_truncated() {
        let bytes = stream(2, &[utf("ipAssignment"), utf("STATIC")]);
        assert!(matches!(decode(&bytes), Err(EthernetError::Truncated)));
    }

    #[test]
    fn test_unknown_tag_fails_read() {
        let bytes = stream(2, &[utf("mtu"), 1500i32.to_be_bytes().to_vec(), utf("eos")]);
        assert!(matches!(decode(&bytes), Err(EthernetError::UnknownTag(k)) if k == "mtu"));
    }

    #[test]
    fn test_bad_values_are_skipped() {
        let bytes = stream(
            2,
            &[
                utf("ipAssignment"),
                utf("STATIC"),
                utf("linkAddress"),
                utf("300.1.1.1"),
                24i32.to_be_bytes().to_vec(),
                utf("linkAddress"),
                utf("10.0.0.5"),
                40i32.to_be_bytes().to_vec(),
                utf("linkAddress"),
                utf("10.0.0.6"),
                8i32.to_be_bytes().to_vec(),
                utf("dns"),
                utf("not-an-ip"),
                utf("proxySettings"),
                utf("BOGUS"),
                utf("eos"),
            ],
        );
        let config = decode(&bytes).unwrap();
        assert_eq!(config.ip_assignment, IpAssignment::Static);
        assert_eq!(config.proxy_settings, ProxySettings::Unassigned);
        assert_eq!(config.link_properties.link_addresses.len(), 1);
        assert_eq!(config.link_properties.link_addresses[0].to_string(), "10.0.0.6/8");
        assert!(config.link_properties.dnses.is_empty());
    }

    #[test]
    fn test_static_ip_without_address_is_default() {
        let bytes = stream(2, &[utf("ipAssignment"), utf("STATIC"), utf("eos")]);
        assert_eq!(decode(&bytes).unwrap(), EthernetConfiguration::default_configuration());
    }

    #[test]
    fn test_static_proxy_without_host_is_dropped() {
        let bytes = stream(
            2,
            &[
                utf("proxySettings"),
                utf("STATIC"),
                utf("proxyPort"),
                8080i32.to_be_bytes().to_vec(),
                utf("ipAssignment"),
                utf("STATIC"),
                utf("linkAddress"),
                utf("10.0.0.6"),
                8i32.to_be_bytes().to_vec(),
                utf("eos"),
            ],
        );
        let config = decode(&bytes).unwrap();
        assert_eq!(config.proxy_settings, ProxySettings::None);
        assert!(config.link_properties.http_proxy.is_none());
        assert_eq!(config.ip_assignment, IpAssignment::Static);
    }

    #[test]
    fn test_missing_proxy_is_contract_error() {
        let config = EthernetConfiguration::new(
            ProxySettings::Static,
            IpAssignment::Dhcp,
            LinkProperties::new(),
        );
        assert!(matches!(encode(&config), Err(EthernetError::MissingProxy)));
    }

    #[test]
    fn test_fully_unassigned_is_rejected() {
        let config = EthernetConfiguration::new(
            ProxySettings::Unassigned,
            IpAssignment::Unassigned,
            LinkProperties::new(),
        );
        assert!(matches!(encode(&config), Err(EthernetError::Unassigned)));
    }

    #[test]
    fn test_modified_utf8() {
        assert_eq!(encode_modified_utf8("a\0b"), vec![b'a', 0xC0, 0x80, b'b']);
        // U+1F600 is written as two 3-byte surrogates.
        assert_eq!(encode_modified_utf8("\u{1F600}").len(), 6);
        assert_eq!(encode_modified_utf8("é"), "é".as_bytes());

        for s in ["a\0b", "\u{1F600}", "proxy.lan", "é"] {
            assert_eq!(decode_modified_utf8(&encode_modified_utf8(s)).unwrap(), s);
        }
        assert!(decode_modified_utf8(&[0xC3]).is_err());
        assert!(decode_modified_utf8(&[0xF0, 0x9F, 0x98, 0x80]).is_err());
    }

    #[test]
    fn test_string_too_long() {
        let mut props = LinkProperties::new();
        props.set_http_proxy(Some(ProxyProperties::new("h".repeat(70_000), 80, "")));
        let config = EthernetConfiguration::new(ProxySettings::Static, IpAssignment::Dhcp, props);
        assert!(matches!(encode(&config), Err(EthernetError::StringTooLong(70_000))));
    }

    #[test]
    fn test_tag_table() {
        assert_eq!(Tag::from_key("linkAddress"), Some(Tag::LinkAddress));
        assert_eq!(Tag::EndOfStream.key(), "eos");
        assert_eq!(Tag::from_key("EOS"), None);
    }
}
