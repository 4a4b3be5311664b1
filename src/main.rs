//! Configurable HTTP stub server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request      ┌─────────┐    ┌─────────┐    ┌──────────────┐
//!     ───────────────────▶│   net   │───▶│  http   │───▶│   routing    │
//!                         │listener │    │ server  │    │ (first match)│
//!                         └─────────┘    └─────────┘    └──────┬───────┘
//!                                                              │
//!     Client Response     ┌─────────────────────────┐          ▼
//!     ◀───────────────────│ dispatch                │◀── matched route
//!                         │ delay/hang/partial/loop │
//!                         │ firehose/flaky/normal   │
//!                         └─────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use stub_server::config::{self, ServerConfig};
use stub_server::lifecycle::{self, startup::log_routes};
use stub_server::observability::logging;

#[derive(Parser, Debug)]
#[command(name = "stub-server")]
#[command(about = "HTTP stub server driven by a commented JSON route file", long_about = None)]
struct Cli {
    /// Route file.
    #[arg(long, default_value = "stubs.conf")]
    conf: PathBuf,

    /// Port to listen on, overriding the settings file.
    #[arg(long)]
    port: Option<u16>,

    /// Server settings (TOML).
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Validate the route file, print the routes, and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut settings = match &cli.settings {
        Some(path) => match config::load_settings(path) {
            Ok(settings) => settings,
            Err(e) => {
                eprintln!("{e}");
                return ExitCode::FAILURE;
            }
        },
        None => ServerConfig::default(),
    };
    if let Some(port) = cli.port {
        settings.listener.bind_address = with_port(&settings.listener.bind_address, port);
    }

    logging::init(&settings.observability.log_level);

    let routes = match config::load_routes(&cli.conf) {
        Ok(routes) => routes,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    if cli.check {
        for compiled in routes.iter() {
            println!("{} {}", compiled.route.method, compiled.route.url);
        }
        log_routes(&routes);
        return ExitCode::SUCCESS;
    }

    tracing::info!(
        conf = %cli.conf.display(),
        bind_address = %settings.listener.bind_address,
        "stub-server starting"
    );

    match lifecycle::serve(settings, routes).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Server failed");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Replace the port of a `host:port` bind address.
fn with_port(bind_address: &str, port: u16) -> String {
    match bind_address.rsplit_once(':') {
        Some((host, _)) => format!("{host}:{port}"),
        None => format!("{bind_address}:{port}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_override_keeps_the_host() {
        assert_eq!(with_port("0.0.0.0:8989", 9000), "0.0.0.0:9000");
        assert_eq!(with_port("[::1]:8989", 1), "[::1]:1");
        assert_eq!(with_port("localhost", 80), "localhost:80");
    }

    #[test]
    fn cli_defaults() {
        let cli = Cli::parse_from(["stub-server"]);
        assert_eq!(cli.conf, PathBuf::from("stubs.conf"));
        assert_eq!(cli.port, None);
        assert!(!cli.check);
    }
}
