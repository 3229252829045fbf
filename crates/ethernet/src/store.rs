//! Ethernet configuration store
//!
//! Durable read/write of the single Ethernet configuration record, and
//! applying it to the live interface. Every operation does blocking-style
//! file I/O and is meant to run on a worker task, never on the thread that
//! handles input.

use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::connectivity::{ethernet_status, Connectivity, EthernetStatus};
use crate::error::EthernetError;
use crate::format;
use crate::model::{EthernetConfiguration, IpAssignment, ProxySettings};

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "/data/misc/ethernet/etherconfig.txt";

/// Default wired interface
pub const DEFAULT_INTERFACE: &str = "eth0";

/// Store for the persisted Ethernet configuration
#[derive(Debug, Clone)]
pub struct EthernetStore {
    path: PathBuf,
    interface: String,
}

impl Default for EthernetStore {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIG_PATH, DEFAULT_INTERFACE)
    }
}

impl EthernetStore {
    /// Create a store for a configuration file and interface
    pub fn new(path: impl Into<PathBuf>, interface: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            interface: interface.into(),
        }
    }

    /// Path of the configuration file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Interface cycled by [`EthernetStore::apply`]
    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Write the configuration, `None` meaning the default configuration.
    ///
    /// The record is encoded before the file is opened, so a rejected record
    /// leaves any existing file untouched. The write itself is not atomic.
    pub async fn try_write(
        &self,
        config: Option<&EthernetConfiguration>,
    ) -> Result<(), EthernetError> {
        let default_config;
        let config = match config {
            Some(config) => config,
            None => {
                default_config = EthernetConfiguration::default_configuration();
                &default_config
            }
        };

        let bytes = format::encode(config)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(&self.path, &bytes).await?;

        debug!("Wrote {} byte Ethernet configuration to {:?}", bytes.len(), self.path);
        Ok(())
    }

    /// Write the configuration, logging and returning `false` on failure
    pub async fn write(&self, config: Option<&EthernetConfiguration>) -> bool {
        match self.try_write(config).await {
            Ok(()) => true,
            Err(EthernetError::MissingProxy) => {
                error!("Static proxy selected without proxy properties, nothing written");
                false
            }
            Err(e) => {
                error!("Error writing Ethernet configuration to {:?}: {}", self.path, e);
                false
            }
        }
    }

    /// Read the stored configuration
    pub async fn try_read(&self) -> Result<EthernetConfiguration, EthernetError> {
        let bytes = tokio::fs::read(&self.path).await?;
        format::decode(&bytes)
    }

    /// Read the stored configuration, falling back to DHCP without a proxy
    pub async fn read(&self) -> EthernetConfiguration {
        match self.try_read().await {
            Ok(config) => config,
            Err(EthernetError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No Ethernet configuration at {:?}, using defaults", self.path);
                EthernetConfiguration::default_configuration()
            }
            Err(e) => {
                warn!("Ignoring Ethernet configuration at {:?}: {}", self.path, e);
                EthernetConfiguration::default_configuration()
            }
        }
    }

    /// Stored configuration, with live link properties when it uses DHCP
    pub async fn effective_configuration(
        &self,
        connectivity: &dyn Connectivity,
    ) -> EthernetConfiguration {
        let config = self.read().await;

        if config.ip_assignment != IpAssignment::Dhcp {
            return config;
        }

        let link_properties = connectivity
            .ethernet_link_properties()
            .await
            .unwrap_or_default();
        EthernetConfiguration::new(ProxySettings::None, IpAssignment::Dhcp, link_properties)
    }

    /// Write the configuration and bounce the interface so it takes effect.
    ///
    /// A failed interface cycle is logged but the written file is kept, so the
    /// stored and live configuration can differ until the next cycle.
    pub async fn apply(
        &self,
        config: Option<&EthernetConfiguration>,
        connectivity: &dyn Connectivity,
    ) -> bool {
        if !self.write(config).await {
            return false;
        }

        match connectivity.cycle_interface(&self.interface).await {
            Ok(()) => info!("Applied Ethernet configuration to {}", self.interface),
            Err(e) => warn!("Ethernet configuration saved but not applied: {}", e),
        }
        true
    }

    /// Live status of the configured interface
    pub async fn status(&self, connectivity: &dyn Connectivity) -> EthernetStatus {
        ethernet_status(connectivity, &self.interface).await
    }
}
