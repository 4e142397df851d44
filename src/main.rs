//! touchportal-echo - minimal Touch Portal plugin.
//!
//! Pairs with Touch Portal, mirrors every action press into a
//! `<pluginId>.lastAction` state and exits on SIGINT/SIGTERM or when Touch
//! Portal closes the plugin.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::Duration;
use touchportal_sdk::messages::{ActionEvent, ConnectorChangeEvent, InfoEvent, SettingsEvent};
use touchportal_sdk::{Client, ClientConfig, EventHandler};

/// Global flag for signal-triggered shutdown (as Arc for signal-hook compatibility)
static SHUTDOWN_FLAG: std::sync::LazyLock<Arc<AtomicBool>> =
    std::sync::LazyLock::new(|| Arc::new(AtomicBool::new(false)));

const POLL_INTERVAL: Duration = Duration::from_millis(100);

// CLI
#[derive(Parser, Debug)]
#[command(name = "touchportal-echo")]
#[command(version)]
#[command(about = "Echo plugin for the Touch Portal socket API")]
struct Cli {
    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Touch Portal host (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Touch Portal port (overrides config)
    #[arg(long)]
    port: Option<u16>,

    /// Plugin id declared in entry.tp
    #[arg(long, default_value = "touchportal.echo")]
    plugin_id: String,
}

/// Work handed from the consumer thread to the main loop.
#[derive(Debug)]
enum Echo {
    Action(String),
    Closed(String),
}

struct EchoHandler {
    plugin_id: String,
    tx: Sender<Echo>,
}

impl EchoHandler {
    fn forward(&self, echo: Echo) {
        // The main loop may already be gone during shutdown.
        let _ = self.tx.send(echo);
    }
}

impl EventHandler for EchoHandler {
    fn plugin_id(&self) -> &str {
        &self.plugin_id
    }

    fn on_closed(&self, reason: &str) {
        self.forward(Echo::Closed(reason.to_owned()));
    }

    fn on_info(&self, event: &InfoEvent) {
        log::info!(
            "Touch Portal {} ({}), {} settings",
            event.tp_version_string,
            event.tp_version_code,
            event.settings.len()
        );
    }

    fn on_settings(&self, event: &SettingsEvent) {
        for setting in &event.values {
            log::info!("Setting {} = {}", setting.name, setting.value);
        }
    }

    fn on_action(&self, event: &ActionEvent) {
        log::info!("{} {}", event.press, event.action_id);
        self.forward(Echo::Action(format!("{} {}", event.press, event.action_id)));
    }

    fn on_connector_change(&self, event: &ConnectorChangeEvent) {
        log::info!("Connector {} -> {}", event.connector_id, event.value);
    }
}

fn run(cli: Cli) -> Result<()> {
    use signal_hook::consts::signal::{SIGINT, SIGTERM};
    use signal_hook::flag;
    flag::register(SIGINT, Arc::clone(&SHUTDOWN_FLAG))?;
    flag::register(SIGTERM, Arc::clone(&SHUTDOWN_FLAG))?;

    let mut config = ClientConfig::load(cli.config.as_deref())?;
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }

    let (tx, rx) = mpsc::channel();
    let handler = Arc::new(EchoHandler {
        plugin_id: cli.plugin_id,
        tx,
    });
    let state_id = format!("{}.lastAction", handler.plugin_id);
    let client = Client::new(handler, config)?;

    client.connect().context("pairing with Touch Portal")?;
    client.create_state(&state_id, "Last action", "")?;
    log::info!("touchportal-echo ready");

    while !SHUTDOWN_FLAG.load(Ordering::Relaxed) {
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(Echo::Action(text)) => {
                if let Err(e) = client.state_update(&state_id, &text) {
                    log::warn!("Could not update {state_id}: {e}");
                }
            }
            Ok(Echo::Closed(reason)) => {
                log::info!("Connection closed: {reason}");
                return Ok(());
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    println!("Shutting down...");
    client.close();
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    run(Cli::parse())
}
