//! protoline - Entry Point
//!
//! Serves one of the bundled line protocols until Ctrl-C.

use log::{error, info};
use std::process::ExitCode;
use std::sync::Arc;

use protoline::config::{AppConfig, ProtocolKind};
use protoline::protocols::{echo, smtp};
use protoline::utils::logging::setup_logging;
use protoline::{Server, TelnetServer};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            setup_logging("info");
            error!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    setup_logging(&config.log_level);

    let options = config.telnet_options();
    let handler = match config.protocol {
        ProtocolKind::Echo => TelnetServer::with_options(echo::welcome, options),
        ProtocolKind::Smtp => TelnetServer::with_options(smtp::welcome(None), options),
    };

    info!("Launching {:?} server...", config.protocol);

    let server =
        match Server::listen_with(config.port, Some(Arc::new(handler)), config.server_options())
            .await
        {
            Ok(server) => server,
            Err(e) => {
                error!("Unable to start the server: {}", e);
                return ExitCode::FAILURE;
            }
        };

    info!("Server connected on {}", server.address());
    info!("Ctrl-C to quit.");

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Unable to listen for Ctrl-C: {}", e);
    }

    server.stop().await;
    ExitCode::SUCCESS
}
