mod app;

use std::fs::{self, OpenOptions};
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing_subscriber::{prelude::*, EnvFilter};

use ejaice_core::{
    config::{self, AppConfig},
    ApiClient, SessionStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    config::ensure_default_config()?;
    let config = AppConfig::load()?;

    let session = Arc::new(SessionStore::new(AppConfig::session_path()));
    let (session_tx, session_rx) = mpsc::channel(8);
    let client = ApiClient::new(&config, session, session_tx)?;

    let mut app = app::ConsoleApp::new(client, config);
    app.attach_session_events(session_rx);
    app.run().await
}

fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("ejaice.log");

    let env_filter = EnvFilter::from_default_env();

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .compact()
        .with_writer(move || {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_path)
                .expect("failed to open log file")
        });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}
