pub mod config;
pub mod error;
pub mod session;
pub mod shell;
pub mod worker;

#[cfg(test)]
mod testing;

use std::path::PathBuf;

use tokio::io::BufReader;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use pap_net::ProtocolClient;

use crate::config::ClientConfig;
use crate::session::Session;
use crate::shell::Shell;
use crate::worker::{spawn_session, SessionNotification};

pub use crate::error::ClientError;

/// Install the global `fmt` subscriber. Logs go to stderr so they never
/// mix with console output.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("pap_client_lib=debug,pap_net=debug,pap_store=info,warn")
    });

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

/// Load configuration, connect, and run the console until `quit` or end
/// of input.
pub async fn run(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    init_tracing();
    info!("Starting PeopleAndPlaces client v{}", env!("CARGO_PKG_VERSION"));

    let config = ClientConfig::load(config_path.as_deref()).map_err(ClientError::from)?;
    info!(?config, "Loaded configuration");

    let addr = config.addr();
    let options = config.connection_options();
    let client = match ProtocolClient::connect(&addr, options).await {
        Ok(client) => client,
        Err(e) => {
            error!(addr = %addr, error = %e, "Could not connect, every request will fail");
            ProtocolClient::offline(&addr, options)
        }
    };

    let (handle, mut notifications) = spawn_session(Session::new(client));
    tokio::spawn(async move {
        while let Some(notification) = notifications.recv().await {
            match notification {
                SessionNotification::AccountChanged(account) => {
                    info!(account = ?account.as_ref().map(|a| a.as_str()), "Account changed");
                }
                other => tracing::debug!(?other, "Session state changed"),
            }
        }
    });

    let shell = Shell::new(handle.clone());
    shell
        .run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await?;

    handle.shutdown().await;
    info!("Client stopped");
    Ok(())
}
