//! # Spade - Entry Point
//! src/main.rs
//!
//! Parsea el CLI, inicializa el logging, carga la configuración, registra
//! los handlers y entra al accept loop.

use clap::Parser;
use log::{error, info};
use spade::config::Config;
use spade::error::ServerError;
use spade::handlers::ModuleCatalog;
use spade::http::SERVER_SOFTWARE;
use spade::logging;
use spade::router::Registry;
use spade::server::{Server, ServerContext};

fn run(config: Config) -> Result<(), ServerError> {
    let settings = config.load()?;
    settings.validate()?;

    info!("{} starting", SERVER_SOFTWARE);
    info!("Static files from {}", settings.static_root.display());

    let registry = Registry::from_settings(&settings, &ModuleCatalog::builtin());
    let context = ServerContext::from_settings(&settings, registry);

    let server = Server::bind(context, &settings.address())?;
    server.run()?;
    Ok(())
}

fn main() {
    let config = Config::parse();

    if let Err(e) = logging::init(&config.log_level) {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(config) {
        error!("{}", e);
        std::process::exit(1);
    }
}
