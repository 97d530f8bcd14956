use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use docgate::{
    config::{DEFAULT_CONFIG_PATH, DbConfig, ServerConfig},
    logging, server,
    store::MongoStore,
};
use tokio::net::TcpListener;
use tracing::{error, info};

/// REST gateway over the collections of one MongoDB database.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Properties file holding the db.* connection keys
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    #[arg(long, default_value_t = 3000)]
    port: u16,

    /// Directory served under /Images
    #[arg(long, default_value = "images")]
    static_dir: String,
}

impl From<Cli> for ServerConfig {
    fn from(cli: Cli) -> Self {
        Self {
            host: cli.host,
            port: cli.port,
            static_dir: cli.static_dir,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();
    let cli = Cli::parse();

    let db_config = match DbConfig::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load database configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let store = match MongoStore::connect(&db_config).await {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to connect to MongoDB: {e}");
            return ExitCode::FAILURE;
        }
    };
    info!(database = %db_config.db_name, "Connected to MongoDB");

    let server_config = ServerConfig::from(cli);
    let listener = match TcpListener::bind(server_config.socket_addr()).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {e}", server_config.socket_addr());
            return ExitCode::FAILURE;
        }
    };
    info!("App started on port {}", server_config.port);

    let app = server::app(store, &server_config.static_dir);
    if let Err(e) = server::serve(listener, app).await {
        error!("server error: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_defaults_match_server_defaults() {
        let cli = Cli::try_parse_from(["docgate"]).unwrap();
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_PATH));
        assert_eq!(ServerConfig::from(cli), ServerConfig::default());
    }
}
