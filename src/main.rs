use std::sync::Arc;

use telemetron::config::{load_config, print_schema};
use telemetron::startup;
use telemetron::utils::logger::init_logging;

// -- Entrypoint

#[tokio::main]
async fn main() {
    if std::env::args().skip(1).any(|arg| arg == "--schema") {
        if let Err(e) = print_schema() {
            eprintln!("Error rendering configuration schema: {}", e);
            std::process::exit(1);
        }
        return;
    }

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = init_logging(&config.logging) {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    if let Err(e) = startup::run(Arc::new(config)).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
