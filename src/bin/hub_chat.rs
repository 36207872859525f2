//! Minimal chat client for a hub server
//!
//! Prints every broadcast received from the hub and sends each stdin line
//! as a chat message.
//!
//! Usage:
//!   cargo run --bin hub_chat [config.yaml]
//!
//! Environment variables:
//!   HUB_CONFIG_PATH - settings file (default config/hub_client.yaml)
//!   HUB_ACCESS_TOKEN - bearer token, overrides the settings file
//!   RUST_LOG - overrides the configured log level

use anyhow::Result;
use hub_chat::bin_common::{load_config_from_env, parse_args, BinaryRunner, ConfigType, RunConfig, ShutdownSignal};
use hub_chat::config::ClientSettings;
use hub_chat::logging::init_tracing;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

struct HubChat {
    config: RunConfig,
    settings: ClientSettings,
    shutdown: ShutdownSignal,
}

impl BinaryRunner for HubChat {
    async fn run(&mut self) -> Result<()> {
        let connection = self.settings.connection_builder().build()?;

        connection.on(
            &self.settings.broadcast_method,
            |(user, message): (String, String)| {
                info!("{}: {}", user, message);
            },
        );

        let shutdown = self.shutdown.clone();
        connection.on_closed(move |error| {
            match error {
                Some(e) => error!("Connection lost: {}", e),
                None => info!("Connection closed"),
            }
            shutdown.trigger();
        });

        connection.start().await?;
        info!("Connected, type a message and press Enter");

        let shutdown = self.shutdown.clone();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            tokio::select! {
                _ = shutdown.wait() => break,
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        info!("End of input");
                        break;
                    };
                    let text = line.trim();
                    if text.is_empty() {
                        continue;
                    }
                    if let Err(e) = connection.send(&self.settings.send_method, (&self.settings.user_name, text)) {
                        warn!("Message not sent: {}", e);
                    }
                }
            }
        }

        connection.stop().await?;
        Ok(())
    }

    fn config(&self) -> &RunConfig {
        &self.config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load config first (before logging is initialized)
    let config_type = match parse_args().into_iter().next() {
        Some(path) => ConfigType::Custom(path),
        None => ConfigType::Client,
    };
    let config_path = load_config_from_env(config_type);
    let settings = ClientSettings::load(&config_path)?;

    init_tracing(&settings.log_level);
    settings.log();

    let shutdown = ShutdownSignal::new();
    shutdown.spawn_signal_handler();

    let mut app = HubChat {
        config: RunConfig::new("Hub Chat")
            .with_banner_line(format!("Hub: {}", settings.url))
            .with_banner_line(format!("User: {}", settings.user_name)),
        settings,
        shutdown,
    };

    app.execute().await
}
