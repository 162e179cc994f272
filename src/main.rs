use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::error;

use simple_app::config::{load_config, print_schema};
use simple_app::startup::run;
use simple_app::utils::logger::init_logging;

/// Demo HTTP server exposing synthetic metrics for scraping.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// The address to listen on for HTTP requests.
    #[arg(long = "listen-address")]
    listen_address: Option<String>,

    /// YAML configuration file; missing files are ignored.
    #[arg(long, env = "SIMPLE_APP_CONFIG", default_value = "./config.yaml")]
    config: PathBuf,

    /// Print the configuration JSON schema and exit.
    #[arg(long)]
    schema: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.schema {
        print_schema();
        return;
    }

    let config = match load_config(&cli.config, cli.listen_address.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config.logging);

    if let Err(e) = run(Arc::new(config)).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}
