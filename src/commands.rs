//! CLI commands for TV Settings
//!
//! Each command works on an injected store, connectivity and controller so
//! it can be driven from tests as well as from the binary.

use anyhow::{bail, Result};
use serde::Serialize;
use tracing::info;
use tv_settings_ethernet::{
    Connectivity, EthernetConfiguration, EthernetForm, EthernetStatus, EthernetStore,
    IpAssignment, ProxySettings,
};
use tv_settings_tutorial::TutorialController;

/// Effective configuration together with the live link state
#[derive(Debug, Serialize)]
pub struct EthernetReport {
    pub status: EthernetStatus,
    pub configuration: EthernetConfiguration,
}

/// Show command options
pub struct ShowCommand {
    pub json: bool,
}

impl ShowCommand {
    /// Execute the show command
    pub async fn execute(
        &self,
        store: &EthernetStore,
        connectivity: &dyn Connectivity,
    ) -> Result<String> {
        let report = EthernetReport {
            status: store.status(connectivity).await,
            configuration: store.effective_configuration(connectivity).await,
        };

        if self.json {
            return Ok(serde_json::to_string_pretty(&report)?);
        }

        let status = &report.status;
        let config = &report.configuration;
        let mut out = format!(
            "Interface: {} ({})\nMAC address: {}\nIP settings: {}\nProxy: {}\n",
            status.interface,
            if status.connected { "connected" } else { "disconnected" },
            status.mac_address,
            config.ip_assignment,
            config.proxy_settings,
        );
        if !config.link_properties.is_empty() {
            out.push_str(&config.link_properties.to_string());
            out.push('\n');
        }
        Ok(out)
    }
}

/// Change made by an edit command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EthernetEdit {
    Dhcp,
    Static {
        address: String,
        prefix_length: String,
        gateway: String,
        dns1: String,
        dns2: Option<String>,
    },
    Proxy {
        host: String,
        port: String,
        exclusion_list: String,
    },
    ClearProxy,
}

/// Edit command options
pub struct EditCommand {
    pub edit: EthernetEdit,
}

impl EditCommand {
    /// Fold the edit into a form pre-filled from the stored configuration
    pub fn apply_to(&self, form: &mut EthernetForm) {
        match &self.edit {
            EthernetEdit::Dhcp => form.ip_assignment = IpAssignment::Dhcp,
            EthernetEdit::Static { address, prefix_length, gateway, dns1, dns2 } => {
                form.ip_assignment = IpAssignment::Static;
                form.ip_address = address.trim().to_string();
                form.prefix_length = prefix_length.trim().to_string();
                form.gateway = gateway.trim().to_string();
                form.dns1 = dns1.trim().to_string();
                form.dns2 = dns2.as_deref().unwrap_or_default().trim().to_string();
            }
            EthernetEdit::Proxy { host, port, exclusion_list } => {
                form.proxy_settings = ProxySettings::Static;
                form.proxy_host = host.clone();
                form.proxy_port = port.clone();
                form.proxy_exclusion_list = exclusion_list.clone();
            }
            EthernetEdit::ClearProxy => form.proxy_settings = ProxySettings::None,
        }
    }

    /// Validate the edited configuration, write it and bounce the interface
    pub async fn execute(
        &self,
        store: &EthernetStore,
        connectivity: &dyn Connectivity,
    ) -> Result<EthernetConfiguration> {
        let mut form = EthernetForm::from_configuration(&store.read().await);
        self.apply_to(&mut form);

        let config = match form.to_configuration() {
            Ok(config) => config,
            Err(errors) => {
                let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
                bail!("Invalid Ethernet settings:\n  {}", messages.join("\n  "));
            }
        };

        if !store.apply(Some(&config), connectivity).await {
            bail!("Could not save Ethernet configuration to {:?}", store.path());
        }

        info!(
            "Saved Ethernet configuration: {} / proxy {}",
            config.ip_assignment, config.proxy_settings
        );
        Ok(config)
    }
}

/// Tutorial navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TutorialAction {
    Status,
    Next,
    Back,
    Skip,
    Repeat,
}

/// Tutorial command options
pub struct TutorialCommand {
    pub action: TutorialAction,
    pub device_model: String,
}

impl TutorialCommand {
    /// Execute the tutorial command and describe where the tutorial stands
    pub fn execute(&self, controller: &TutorialController) -> Result<String> {
        match self.action {
            TutorialAction::Status => {}
            TutorialAction::Next => {
                let has_more = controller.advance();
                info!("Advanced tutorial, more steps: {}", has_more);
            }
            TutorialAction::Back => {
                if controller.previous_step().is_none() {
                    return Ok(format!("Already at the start\n{}", self.describe(controller)));
                }
            }
            TutorialAction::Skip => controller.skip_tutorial(),
            TutorialAction::Repeat => controller.repeat_tutorial(),
        }
        Ok(self.describe(controller))
    }

    fn describe(&self, controller: &TutorialController) -> String {
        let Some(step) = controller.current_step() else {
            return "Tutorial complete".to_string();
        };

        let mut out = format!("Current step: {}", step.key());
        if step.is_tip() {
            out.push_str(&format!(
                " (tip {} of {})",
                controller.tip_number(),
                controller.total_tips()
            ));
        }
        if controller.is_last_step(step) {
            out.push_str(" [last]");
        }
        if step.model_dependent_text {
            out.push_str(&format!("\nDevice model: {}", self.device_model));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use async_trait::async_trait;
    use tv_settings_core::MemoryPreferences;
    use tv_settings_ethernet::{EthernetError, LinkProperties};

    struct Offline;

    #[async_trait]
    impl Connectivity for Offline {
        async fn is_ethernet_connected(&self) -> bool {
            false
        }

        async fn ethernet_link_properties(&self) -> Option<LinkProperties> {
            None
        }

        async fn cycle_interface(&self, _interface: &str) -> Result<(), EthernetError> {
            Ok(())
        }
    }

    fn static_edit() -> EditCommand {
        EditCommand {
            edit: EthernetEdit::Static {
                address: "192.168.1.50".into(),
                prefix_length: "24".into(),
                gateway: "192.168.1.1".into(),
                dns1: "8.8.8.8".into(),
                dns2: None,
            },
        }
    }

    #[tokio::test]
    async fn test_static_then_proxy_keeps_ip() {
        let dir = tempfile::tempdir().unwrap();
        let store = EthernetStore::new(dir.path().join("etherconfig.txt"), "eth0");

        static_edit().execute(&store, &Offline).await.unwrap();
        let proxy = EditCommand {
            edit: EthernetEdit::Proxy {
                host: "proxy.lan".into(),
                port: "3128".into(),
                exclusion_list: "example.com".into(),
            },
        };
        let config = proxy.execute(&store, &Offline).await.unwrap();

        assert_eq!(config.ip_assignment, IpAssignment::Static);
        assert_eq!(config.proxy_settings, ProxySettings::Static);
        assert_eq!(store.read().await, config);
    }

    #[tokio::test]
    async fn test_invalid_edit_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = EthernetStore::new(dir.path().join("etherconfig.txt"), "eth0");

        let bad = EditCommand {
            edit: EthernetEdit::Proxy {
                host: "proxy.lan".into(),
                port: "99999".into(),
                exclusion_list: "bad list".into(),
            },
        };
        let err = bad.execute(&store, &Offline).await.unwrap_err();
        assert!(err.to_string().contains("Invalid Ethernet settings"));
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_show_json() {
        let dir = tempfile::tempdir().unwrap();
        let store = EthernetStore::new(dir.path().join("etherconfig.txt"), "eth0");

        let out = ShowCommand { json: true }.execute(&store, &Offline).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["status"]["interface"], "eth0");
        assert_eq!(value["status"]["connected"], false);

        let text = ShowCommand { json: false }.execute(&store, &Offline).await.unwrap();
        assert!(text.contains("disconnected"));
    }

    #[test]
    fn test_tutorial_navigation() {
        let xml = concat!(
            r#"<steps><step key="intro"/><step key="remote" tip="true"/>"#,
            r#"<step key="done"/></steps>"#,
        );
        let controller = TutorialController::from_str(Arc::new(MemoryPreferences::new()), xml, 0);
        let run = |action| {
            TutorialCommand { action, device_model: "Google TV".into() }
                .execute(&controller)
                .unwrap()
        };

        assert_eq!(run(TutorialAction::Status), "Current step: intro");
        assert_eq!(run(TutorialAction::Next), "Current step: remote (tip 1 of 1)");
        assert_eq!(run(TutorialAction::Skip), "Tutorial complete");
        assert_eq!(run(TutorialAction::Repeat), "Current step: intro");
        assert!(run(TutorialAction::Back).starts_with("Already at the start"));
    }
}
