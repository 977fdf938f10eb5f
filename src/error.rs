//! # Errores del Servidor
//! src/error.rs
//!
//! Tres familias de errores:
//!
//! - [`ServerError`]: fallas de arranque (config, bind, logging). Son fatales.
//! - [`RegistrationError`]: un handler no se pudo registrar. Se loguea y el
//!   servidor sigue sin esa ruta.
//! - [`ClayError`]: fallas del canal con los workers asíncronos.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Errores fatales de arranque
#[derive(Debug)]
pub enum ServerError {
    Io(io::Error),

    /// Archivo de configuración inválido
    Config(String),

    /// No se pudo abrir el socket de escucha
    Bind { address: String, source: io::Error },

    /// No se pudo inicializar el logger
    Logging(String),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::Io(e) => write!(f, "I/O error: {}", e),
            ServerError::Config(msg) => write!(f, "Invalid configuration: {}", msg),
            ServerError::Bind { address, source } => {
                write!(f, "Unable to listen on {}: {}", address, source)
            }
            ServerError::Logging(msg) => write!(f, "Unable to initialize logging: {}", msg),
        }
    }
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServerError::Io(e) => Some(e),
            ServerError::Bind { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<io::Error> for ServerError {
    fn from(e: io::Error) -> Self {
        ServerError::Io(e)
    }
}

/// Un handler que no entra en la tabla
#[derive(Debug)]
pub enum RegistrationError {
    /// El ejecutable CGI no existe
    NotFound(PathBuf),

    /// El ejecutable CGI existe pero no es un archivo regular ejecutable
    NotExecutable(PathBuf),

    /// No hay módulo en proceso con ese nombre
    UnknownModule(String),

    /// No se pudo abrir el endpoint del worker asíncrono
    ChannelBind { endpoint: PathBuf, source: io::Error },

    /// Ya hay un handler de la misma clase en ese path
    DuplicatePath(String),
}

impl fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrationError::NotFound(path) => {
                write!(f, "Handler {} does not exist", path.display())
            }
            RegistrationError::NotExecutable(path) => {
                write!(f, "Handler {} is not an executable file", path.display())
            }
            RegistrationError::UnknownModule(name) => write!(f, "Unknown module: {}", name),
            RegistrationError::ChannelBind { endpoint, source } => {
                write!(f, "Unable to bind endpoint {}: {}", endpoint.display(), source)
            }
            RegistrationError::DuplicatePath(path) => {
                write!(f, "A handler is already registered at {}", path)
            }
        }
    }
}

impl std::error::Error for RegistrationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RegistrationError::ChannelBind { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Errores del canal con los workers asíncronos
#[derive(Debug)]
pub enum ClayError {
    Io(io::Error),

    /// No se pudo serializar el registro de variables
    Encode(serde_json::Error),

    /// El worker envió un registro que no se pudo leer
    Decode(serde_json::Error),

    /// Un frame declara un payload mayor al permitido
    FrameTooLarge(u32),

    /// No hay worker conectado al endpoint
    NotConnected(PathBuf),
}

impl fmt::Display for ClayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClayError::Io(e) => write!(f, "I/O error: {}", e),
            ClayError::Encode(e) => write!(f, "Unable to encode request: {}", e),
            ClayError::Decode(e) => write!(f, "Unable to decode request: {}", e),
            ClayError::FrameTooLarge(len) => write!(f, "Frame payload of {} bytes is too large", len),
            ClayError::NotConnected(endpoint) => {
                write!(f, "No worker connected to {}", endpoint.display())
            }
        }
    }
}

impl std::error::Error for ClayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClayError::Io(e) => Some(e),
            ClayError::Encode(e) | ClayError::Decode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ClayError {
    fn from(e: io::Error) -> Self {
        ClayError::Io(e)
    }
}
