//! # Configuración del Servidor
//! src/config.rs
//!
//! Dos fuentes de configuración:
//!
//! - Argumentos CLI y variables de entorno (`Config`, con clap)
//! - Archivo TOML con la identidad del servidor y las tablas de handlers
//!   (`FileConfig`, con serde)
//!
//! `Config::load` las combina en un `Settings`. El CLI gana sobre el
//! archivo, y el archivo sobre los valores por defecto.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./spade --port 8080 --config config/spade.toml --static-root ./static
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! SPADE_PORT=8080 SPADE_LOG=debug ./spade
//! ```
//!
//! ### Archivo
//! ```toml
//! hostname = "spade"
//! static_file_path = "static"
//!
//! [[cgi_handlers]]
//! path = "/cgi/add"
//! handler = "adder.sh"
//!
//! [[module_handlers]]
//! path = "/dirt/add"
//! module = "adder"
//!
//! [[clay_handlers]]
//! path = "/async/add"
//! endpoint = "/tmp/adder.sock"
//! ```

use crate::error::ServerError;
use clap::Parser;
use log::warn;
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Puerto cuando ni el CLI ni el archivo dicen otra cosa
pub const DEFAULT_PORT: u16 = 8080;

/// Argumentos de línea de comandos
#[derive(Debug, Clone, Parser)]
#[command(name = "spade")]
#[command(about = "Servidor HTTP/1.0 concurrente con CGI, módulos y workers asíncronos")]
#[command(version)]
pub struct Config {
    /// Puerto en el que escucha el servidor (por defecto 8080)
    #[arg(short, long, env = "SPADE_PORT")]
    pub port: Option<u16>,

    /// Host/IP en el que escucha
    #[arg(long, default_value = "0.0.0.0", env = "SPADE_HOST")]
    pub host: String,

    /// Archivo de configuración TOML
    #[arg(short, long, default_value = "config/spade.toml", env = "SPADE_CONFIG")]
    pub config: PathBuf,

    /// Raíz de los archivos estáticos
    #[arg(short, long, env = "SPADE_STATIC_ROOT")]
    pub static_root: Option<PathBuf>,

    /// Nivel de log (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", env = "SPADE_LOG")]
    pub log_level: String,
}

impl Config {
    /// Lee el archivo de configuración y lo combina con los argumentos
    ///
    /// Un archivo que no existe no es fatal; uno que no se puede parsear sí.
    pub fn load(&self) -> Result<Settings, ServerError> {
        let file = match fs::read_to_string(&self.config) {
            Ok(text) => FileConfig::parse(&text)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(
                    "Config file {} not found, using defaults",
                    self.config.display()
                );
                FileConfig::default()
            }
            Err(e) => {
                return Err(ServerError::Config(format!(
                    "{}: {}",
                    self.config.display(),
                    e
                )))
            }
        };

        Ok(self.merge(file))
    }

    /// Combina el archivo con los argumentos
    pub fn merge(&self, file: FileConfig) -> Settings {
        Settings {
            host: self.host.clone(),
            port: self.port.or(file.port).unwrap_or(DEFAULT_PORT),
            hostname: file.hostname,
            static_root: self
                .static_root
                .clone()
                .unwrap_or(file.static_file_path),
            cgi_root: file.cgi_file_path,
            reverse_lookups: file.reverse_lookups,
            clay_timeout: Duration::from_secs(file.clay_timeout_secs),
            cgi_handlers: file.cgi_handlers,
            module_handlers: file.module_handlers,
            clay_handlers: file.clay_handlers,
        }
    }
}

/// Entrada `[[cgi_handlers]]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CgiEntry {
    pub path: String,
    pub handler: PathBuf,
}

/// Entrada `[[module_handlers]]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ModuleEntry {
    pub path: String,
    pub module: String,
}

/// Entrada `[[clay_handlers]]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClayEntry {
    pub path: String,
    pub endpoint: PathBuf,
}

/// Contenido del archivo TOML
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub port: Option<u16>,
    /// Valor de `SERVER_NAME`
    pub hostname: String,
    pub static_file_path: PathBuf,
    /// Raíz para resolver handlers CGI con path relativo
    pub cgi_file_path: PathBuf,
    pub reverse_lookups: bool,
    /// Segundos que una conexión espera la respuesta de un worker
    pub clay_timeout_secs: u64,
    pub cgi_handlers: Vec<CgiEntry>,
    pub module_handlers: Vec<ModuleEntry>,
    pub clay_handlers: Vec<ClayEntry>,
}

impl FileConfig {
    pub fn parse(text: &str) -> Result<Self, ServerError> {
        toml::from_str(text).map_err(|e| ServerError::Config(e.to_string()))
    }
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            port: None,
            hostname: "localhost".to_string(),
            static_file_path: PathBuf::from("static"),
            cgi_file_path: PathBuf::from("static"),
            reverse_lookups: false,
            clay_timeout_secs: 30,
            cgi_handlers: Vec::new(),
            module_handlers: Vec::new(),
            clay_handlers: Vec::new(),
        }
    }
}

/// Configuración final del proceso
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub hostname: String,
    pub static_root: PathBuf,
    pub cgi_root: PathBuf,
    pub reverse_lookups: bool,
    pub clay_timeout: Duration,
    pub cgi_handlers: Vec<CgiEntry>,
    pub module_handlers: Vec<ModuleEntry>,
    pub clay_handlers: Vec<ClayEntry>,
}

impl Settings {
    /// Dirección completa para bind (host:port)
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Resuelve el ejecutable de un handler CGI
    ///
    /// Los paths relativos cuelgan de `cgi_root`.
    pub fn cgi_executable(&self, handler: &Path) -> PathBuf {
        if handler.is_absolute() {
            handler.to_path_buf()
        } else {
            self.cgi_root.join(handler)
        }
    }

    pub fn validate(&self) -> Result<(), ServerError> {
        if self.port == 0 {
            return Err(ServerError::Config("port must be between 1 and 65535".to_string()));
        }
        if self.hostname.trim().is_empty() {
            return Err(ServerError::Config("hostname must not be empty".to_string()));
        }
        Ok(())
    }
}
