//! Error types for Ethernet configuration handling

use thiserror::Error;

/// Errors raised while persisting or applying an Ethernet configuration
#[derive(Error, Debug)]
pub enum EthernetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported configuration file version {found} (expected {expected})")]
    BadVersion { found: i32, expected: i32 },

    #[error("Configuration stream ended before the end-of-stream tag")]
    Truncated,

    #[error("Unknown key {0:?} in configuration stream")]
    UnknownTag(String),

    #[error("Malformed modified UTF-8 string")]
    MalformedString,

    #[error("String of {0} bytes exceeds the 65535 byte limit")]
    StringTooLong(usize),

    #[error("Invalid enum name {0:?}")]
    InvalidEnumName(String),

    #[error("Invalid IP address literal {0:?}")]
    InvalidAddress(String),

    #[error("Invalid network prefix length {0}")]
    InvalidPrefixLength(i32),

    #[error("Invalid proxy port {0}")]
    InvalidPort(i32),

    #[error("Static proxy selected without proxy properties")]
    MissingProxy,

    #[error("Neither proxy nor IP settings are assigned")]
    Unassigned,

    #[error("Could not cycle interface {interface}: {reason}")]
    InterfaceCycle { interface: String, reason: String },
}

impl EthernetError {
    /// Errors that mean the stored file can't be trusted at all
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            EthernetError::BadVersion { .. }
                | EthernetError::Truncated
                | EthernetError::UnknownTag(_)
                | EthernetError::MalformedString
        )
    }
}
