//! TV Settings command line
//!
//! Inspects and edits the stored Ethernet configuration and steps through
//! the onboarding tutorial.

use std::path::PathBuf;
use std::sync::Arc;
use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use tv_settings::commands::{
    EditCommand, EthernetEdit, ShowCommand, TutorialAction, TutorialCommand,
};
use tv_settings::core::{AppConfig, FilePreferences, APP_NAME, VERSION};
use tv_settings::ethernet::{EthernetStore, SystemConnectivity};
use tv_settings::tutorial::{
    setup_version_from_settings, PrivacyConsentHook, TutorialController, PRIVACY_STEP_KEY,
};

/// Environment variable overriding the configured log filter
const LOG_ENV: &str = "TV_SETTINGS_LOG";

/// TV Settings - Ethernet configuration and onboarding tutorial.
#[derive(Parser)]
#[command(name = "tv-settings")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file to use instead of the default location.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ethernet configuration commands.
    #[command(subcommand)]
    Ethernet(EthernetCommands),

    /// Onboarding tutorial commands.
    #[command(subcommand)]
    Tutorial(TutorialCommands),
}

#[derive(Subcommand)]
enum EthernetCommands {
    /// Show the effective configuration and link status.
    Show {
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Obtain the address by DHCP.
    SetDhcp,

    /// Use a static address.
    SetStatic {
        /// IP address.
        #[arg(long)]
        address: String,

        /// Network prefix length (0-32).
        #[arg(long)]
        prefix: String,

        /// Gateway address.
        #[arg(long)]
        gateway: String,

        /// Primary DNS server.
        #[arg(long)]
        dns1: String,

        /// Secondary DNS server.
        #[arg(long)]
        dns2: Option<String>,
    },

    /// Use a manual HTTP proxy.
    SetProxy {
        /// Proxy hostname.
        #[arg(long)]
        host: String,

        /// Proxy port.
        #[arg(long)]
        port: String,

        /// Comma-separated domains that bypass the proxy.
        #[arg(long, default_value = "")]
        exclusion_list: String,
    },

    /// Stop using a proxy.
    ClearProxy,
}

#[derive(Subcommand)]
enum TutorialCommands {
    /// Show the current step.
    Status,

    /// Complete the current step.
    Next {
        /// Usage logging choice recorded when completing the privacy step.
        #[arg(long)]
        usage_logging: Option<bool>,
    },

    /// Go back to the previous step.
    Back,

    /// Mark every step complete.
    Skip,

    /// Start the tutorial over.
    Repeat,
}

/// Main entry point
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path).await,
        None => AppConfig::load().await,
    }
    .map_err(|e| anyhow!(e.user_message()))?;

    init_logging(&config)?;
    info!("{} v{} starting...", APP_NAME, VERSION);

    let output = match cli.command {
        Commands::Ethernet(command) => run_ethernet(command, &config).await?,
        Commands::Tutorial(command) => run_tutorial(command, config).await?,
    };

    println!("{}", output.trim_end());
    Ok(())
}

/// Install the global subscriber, preferring the environment filter
fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

async fn run_ethernet(command: EthernetCommands, config: &AppConfig) -> Result<String> {
    let store = EthernetStore::new(&config.ethernet.config_path, &config.ethernet.interface);
    let connectivity = SystemConnectivity::new(&config.ethernet.interface);
    debug!("Using Ethernet configuration {:?}", store.path());

    let edit = match command {
        EthernetCommands::Show { json } => {
            return ShowCommand { json }.execute(&store, &connectivity).await;
        }
        EthernetCommands::SetDhcp => EthernetEdit::Dhcp,
        EthernetCommands::SetStatic { address, prefix, gateway, dns1, dns2 } => {
            EthernetEdit::Static {
                address,
                prefix_length: prefix,
                gateway,
                dns1,
                dns2,
            }
        }
        EthernetCommands::SetProxy { host, port, exclusion_list } => EthernetEdit::Proxy {
            host,
            port,
            exclusion_list,
        },
        EthernetCommands::ClearProxy => EthernetEdit::ClearProxy,
    };

    EditCommand { edit }.execute(&store, &connectivity).await?;
    ShowCommand { json: false }.execute(&store, &connectivity).await
}

async fn run_tutorial(command: TutorialCommands, config: AppConfig) -> Result<String> {
    // Preference commits are blocking file writes.
    tokio::task::spawn_blocking(move || {
        let prefs = Arc::new(FilePreferences::open(&config.storage.preferences_path));
        let settings = Arc::new(FilePreferences::open(&config.storage.settings_path));
        let setup_version = config
            .tutorial
            .setup_version
            .unwrap_or_else(|| setup_version_from_settings(&*settings));

        let mut controller =
            TutorialController::from_file(prefs, &config.tutorial.steps_path, setup_version);
        let privacy = Arc::new(PrivacyConsentHook::new(settings));
        controller.register_hook(PRIVACY_STEP_KEY, privacy.clone());

        let action = match command {
            TutorialCommands::Status => TutorialAction::Status,
            TutorialCommands::Next { usage_logging } => {
                if let Some(enabled) = usage_logging {
                    privacy.set_consent(enabled);
                }
                TutorialAction::Next
            }
            TutorialCommands::Back => TutorialAction::Back,
            TutorialCommands::Skip => TutorialAction::Skip,
            TutorialCommands::Repeat => TutorialAction::Repeat,
        };

        TutorialCommand {
            action,
            device_model: config.tutorial.device_model.clone(),
        }
        .execute(&controller)
    })
    .await?
}
