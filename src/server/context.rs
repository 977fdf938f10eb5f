//! # Contexto del Servidor
//! src/server/context.rs
//!
//! Todo lo que un hilo de conexión necesita. Se construye una vez al
//! arrancar y se comparte detrás de un `Arc` en modo sólo lectura.

use super::resolver::{HostnameResolver, SystemResolver};
use crate::config::Settings;
use crate::handlers::{ServerIdentity, Variables};
use crate::http::Request;
use crate::router::Registry;
use std::path::PathBuf;

/// Tamaño de stack de cada hilo de conexión
pub const WORKER_STACK_SIZE: usize = 1024 * 1024;

pub struct ServerContext {
    pub hostname: String,
    pub port: u16,
    pub static_root: PathBuf,
    pub reverse_lookups: bool,
    pub registry: Registry,
    pub identity: ServerIdentity,
    pub resolver: Box<dyn HostnameResolver>,
}

impl ServerContext {
    /// Contexto sin resolución inversa
    pub fn new(hostname: &str, port: u16, static_root: PathBuf, registry: Registry) -> Self {
        Self {
            hostname: hostname.to_string(),
            port,
            static_root,
            reverse_lookups: false,
            registry,
            identity: ServerIdentity::new(hostname, port),
            resolver: Box::new(SystemResolver),
        }
    }

    pub fn from_settings(settings: &Settings, registry: Registry) -> Self {
        let mut context = Self::new(
            &settings.hostname,
            settings.port,
            settings.static_root.clone(),
            registry,
        );
        context.reverse_lookups = settings.reverse_lookups;
        context
    }

    /// Activa la resolución inversa con un resolver propio
    pub fn with_resolver(mut self, resolver: Box<dyn HostnameResolver>) -> Self {
        self.reverse_lookups = true;
        self.resolver = resolver;
        self
    }

    /// Variables de un request despachado al handler en `script_name`
    pub fn variables(&self, request: &Request, script_name: &str) -> Variables {
        Variables::build(&self.identity, request, script_name, &self.static_root)
    }
}
