//! # Worker Sumador
//! src/bin/clay_adder.rs
//!
//! Worker asíncrono de referencia: se conecta al endpoint y responde
//! `a+b` para cada request `value=a&value=b`.
//!
//! ```bash
//! ./spade-clay-adder /tmp/adder.sock
//! ```

use clap::Parser;
use log::{error, info};
use spade::clay::WorkerConnection;
use spade::error::ClayError;
use spade::handlers::module::adder_response;
use spade::logging;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "spade-clay-adder")]
#[command(about = "Worker asíncrono que suma dos valores del query string")]
#[command(version)]
struct Args {
    /// Endpoint del servidor
    #[arg(default_value = "/tmp/adder.sock", env = "SPADE_CLAY_ENDPOINT")]
    endpoint: PathBuf,

    /// Nivel de log
    #[arg(long, default_value = "info", env = "SPADE_LOG")]
    log_level: String,
}

fn serve(args: &Args) -> Result<(), ClayError> {
    let mut worker = WorkerConnection::connect(&args.endpoint)?;
    info!("Connected to {}", args.endpoint.display());

    while let Some(request) = worker.recv()? {
        let response = adder_response(&request.variables.query_string);
        worker.respond(request.connection_id, &response)?;
    }

    info!("Server closed the channel");
    Ok(())
}

fn main() {
    let args = Args::parse();

    if let Err(e) = logging::init(&args.log_level) {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    if let Err(e) = serve(&args) {
        error!("{}", e);
        std::process::exit(1);
    }
}
