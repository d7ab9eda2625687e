//! Mimic mock API server binary.
//!
//! Serves the routes, mock templates, CRUD collections and `WebSocket`
//! events described by one configuration file.
//!
//! # Startup Sequence
//!
//! 1. Parse the command line
//! 2. Initialize structured logging (tracing)
//! 3. Load and validate the configuration (`data.json` by default)
//! 4. Materialize routes, collections and events into the app state
//! 5. Log the startup banner
//! 6. Serve until `Ctrl-C`

mod logging;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use mimic_core::routes::RouteAction;
use mimic_core::store::ConfigStore;
use mimic_server::{AppState, ListenConfig, start_server};
use tracing::{error, info};

use crate::logging::LogFormat;

#[derive(Parser, Debug)]
#[command(name = "mimic", version, about = "Declarative mock API server")]
struct Cli {
    /// Path to the configuration file (.json, .yaml or .yml)
    #[arg(long, short, env = "MIMIC_CONFIG", default_value = "data.json")]
    config: PathBuf,

    /// Address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on for this run (overrides `server.port`, never persisted)
    #[arg(long, short)]
    port: Option<u16>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.log_format);

    info!("mimic starting");

    match run(cli).await {
        Ok(()) => {
            info!("mimic stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %format!("{e:#}"), "mimic failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let store = ConfigStore::new(&cli.config)
        .with_context(|| format!("cannot use config file {}", cli.config.display()))?;
    let config = store
        .load()
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    info!(
        path = %cli.config.display(),
        routes = config.routes.len(),
        websocket = config.websocket.as_ref().is_some_and(|ws| ws.enabled),
        "Configuration loaded"
    );

    let listen = ListenConfig {
        host: cli.host,
        port: cli.port.unwrap_or(config.server.port),
    };
    let base_path = config.server.base_path.clone();

    let state = AppState::new(config, Some(store)).context("invalid crud collection")?;
    log_banner(&state, &listen, &base_path);

    start_server(&listen, Arc::new(state)).await?;
    Ok(())
}

fn log_banner(state: &AppState, listen: &ListenConfig, base_path: &str) {
    let origin = format!("{}:{}", listen.host, listen.port);
    let mut endpoints = Vec::new();
    let mut websocket = None;
    for binding in state.routes.bindings() {
        if matches!(binding.action, RouteAction::WebSocket) {
            websocket = Some(format!("ws://{origin}{}", binding.path));
        } else {
            endpoints.push(format!("{} {}", binding.verb, binding.path));
        }
    }

    info!(
        url = %format!("http://{origin}{base_path}"),
        base_path,
        websocket = websocket.as_deref().unwrap_or("disabled"),
        "Mock server ready"
    );
    info!(count = endpoints.len(), endpoints = %endpoints.join(", "), "Endpoints");
}
