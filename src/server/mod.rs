//! # Módulo del Servidor HTTP
//! src/server/mod.rs
//!
//! Este módulo implementa el servidor TCP que:
//! 1. Escucha en un puerto
//! 2. Acepta conexiones y lanza un hilo por cada una
//! 3. Lee y parsea el request, resuelve el peer
//! 4. Despacha al router y cierra la conexión

pub mod context;
pub mod resolver;
pub mod tcp;

// Re-exportar para facilitar el uso
pub use context::ServerContext;
pub use resolver::{HostnameResolver, SystemResolver};
pub use tcp::Server;
