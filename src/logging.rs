//! # Logging
//! src/logging.rs
//!
//! Todo el diagnóstico pasa por la fachada `log`. Este módulo instala el
//! backend: líneas a stderr con timestamp local.
//!
//! ```text
//! [2024-05-01 12:00:00] [INFO] spade::server::tcp: 127.0.0.1 GET /index.html 200 OK
//! ```

use crate::error::ServerError;
use log::LevelFilter;
use std::str::FromStr;

/// Formato del timestamp de cada línea
const TIMESTAMP_FORMAT: &str = "[%Y-%m-%d %H:%M:%S]";

/// Traduce el nombre de un nivel (`info`, `debug`, ...)
pub fn parse_level(level: &str) -> Result<LevelFilter, ServerError> {
    LevelFilter::from_str(level.trim())
        .map_err(|_| ServerError::Logging(format!("unknown log level '{}'", level)))
}

/// Instala el logger global
///
/// Sólo se puede llamar una vez por proceso; la segunda llamada retorna
/// error.
pub fn init(level: &str) -> Result<(), ServerError> {
    let level = parse_level(level)?;

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} [{}] {}: {}",
                chrono::Local::now().format(TIMESTAMP_FORMAT),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()
        .map_err(|e| ServerError::Logging(e.to_string()))
}
