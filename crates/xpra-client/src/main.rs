//! xpra-client: headless session client entry point.
//!
//! Connects to an Xpra server over WebSocket, completes the handshake, keeps
//! the window registry in sync and answers pings, logging every client event.
//! No pixels are shown; each window gets a `HeadlessRenderer`.  This is
//! useful for checking that a server is reachable and for watching the window
//! protocol of a session.
//!
//! # Usage
//!
//! ```text
//! xpra-client [OPTIONS]
//!
//! Options:
//!   --uri <URI>          WebSocket URI of the server
//!   --config <PATH>      TOML config file [default: platform config dir]
//!   --width <PX>         Desktop width
//!   --height <PX>        Desktop height
//!   --dpi <DPI>          Screen DPI
//!   --no-reconnect       Do not retry when the connection drops
//! ```
//!
//! # Configuration precedence
//!
//! CLI flags (or their `XPRA_*` environment variables) override the config
//! file, which overrides the built-in defaults.
//!
//! | Variable        | Flag         |
//! |-----------------|--------------|
//! | `XPRA_URI`      | `--uri`      |
//! | `XPRA_CONFIG`   | `--config`   |
//! | `XPRA_WIDTH`    | `--width`    |
//! | `XPRA_HEIGHT`   | `--height`   |
//! | `XPRA_DPI`      | `--dpi`      |

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use xpra_client::application::{Client, ClientEvent, Collaborators, ConfigOverrides};
use xpra_client::infrastructure::input_translation::{XpraKeyboard, XpraMouse};
use xpra_client::infrastructure::renderer::HeadlessRendererFactory;
use xpra_client::infrastructure::runner::SessionRunner;
use xpra_client::infrastructure::storage::config::{config_file_path, load_or_init_identity};
use xpra_client::infrastructure::transport::WsTransport;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Headless Xpra session client.
#[derive(Debug, Parser)]
#[command(
    name = "xpra-client",
    about = "Headless client for remote X11 desktops served by Xpra",
    version
)]
struct Cli {
    /// WebSocket URI of the Xpra server (ws:// or wss://).
    #[arg(long, env = "XPRA_URI")]
    uri: Option<String>,

    /// Path to the TOML config file.
    #[arg(long, env = "XPRA_CONFIG")]
    config: Option<PathBuf>,

    /// Desktop width in pixels.
    #[arg(long, env = "XPRA_WIDTH", requires = "height")]
    width: Option<u32>,

    /// Desktop height in pixels.
    #[arg(long, env = "XPRA_HEIGHT", requires = "width")]
    height: Option<u32>,

    /// Screen DPI used for the physical screen size.
    #[arg(long, env = "XPRA_DPI")]
    dpi: Option<u32>,

    /// Do not reconnect when the connection drops.
    #[arg(long)]
    no_reconnect: bool,
}

impl Cli {
    /// The per-call configuration layer given on the command line.
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            uri: self.uri.clone(),
            screen: self.width.zip(self.height),
            dpi: self.dpi,
            reconnect: self.no_reconnect.then_some(false),
            ..Default::default()
        }
    }

    fn config_path(&self) -> anyhow::Result<PathBuf> {
        match &self.config {
            Some(path) => Ok(path.clone()),
            None => config_file_path().context("no --config given and no platform config dir"),
        }
    }
}

fn log_event(event: &ClientEvent) {
    match event {
        ClientEvent::State(state) => info!(%state, "session state"),
        ClientEvent::WindowCreate(s) => info!(wid = s.wid, w = s.w, h = s.h, "window created"),
        ClientEvent::WindowDestroy(s) => info!(wid = s.wid, "window destroyed"),
        ClientEvent::OverlayCreate(s) => info!(wid = s.wid, parent = ?s.parent, "overlay created"),
        ClientEvent::OverlayDestroy(s) => info!(wid = s.wid, "overlay destroyed"),
        ClientEvent::SystemUrl { url, .. } => info!(%url, "server asked to open URL"),
        ClientEvent::NotificationCreate(n) => info!(summary = %n.summary, "notification"),
        ClientEvent::SystemPrint { file, .. } | ClientEvent::SystemUpload { file, .. } => {
            info!(filename = %file.filename, size = file.size, "file received")
        }
        other => tracing::debug!(kind = ?other.kind(), "client event"),
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let path = cli.config_path()?;
    let defaults = load_or_init_identity(&path)
        .with_context(|| format!("failed to load config from {}", path.display()))?;

    let (transport, events) = WsTransport::new();
    let mut client = Client::new(
        defaults,
        Collaborators {
            transport: Box::new(transport),
            keyboard: Box::new(XpraKeyboard::new()),
            mouse: Box::new(XpraMouse::new()),
            renderers: Box::new(HeadlessRendererFactory::new()),
        },
    );
    client.on_any(log_event);
    client.connect(&cli.overrides());

    info!(uri = %client.config().uri, "xpra-client starting");

    let mut runner = SessionRunner::new(client, events);
    runner
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("failed to listen for Ctrl+C: {e}");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    info!("xpra-client stopped");
    Ok(())
}
