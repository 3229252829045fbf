//! Ethernet Configuration Store
//!
//! Persists the proxy and IP configuration of the wired interface in a
//! versioned key-tagged file, validates user edits, and applies stored
//! configurations through a connectivity collaborator.

pub mod connectivity;
pub mod error;
pub mod format;
pub mod model;
pub mod store;
pub mod validation;

pub use connectivity::{Connectivity, EthernetStatus, SystemConnectivity};
pub use error::EthernetError;
pub use format::FILE_VERSION;
pub use model::{
    EthernetConfiguration, IpAssignment, LinkAddress, LinkProperties, ProxyProperties,
    ProxySettings,
};
pub use store::EthernetStore;
pub use validation::{
    is_valid_exclusion_list, is_valid_hostname, is_valid_ip_address, EthernetForm, Field, Rule,
    ValidationError,
};
