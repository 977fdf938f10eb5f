//! # Variables de Entorno CGI
//! src/handlers/variables.rs
//!
//! El mismo registro de variables sirve a las tres estrategias dinámicas:
//! como entorno del proceso (CGI), como valor estructurado (módulos en
//! proceso) y serializado en JSON (workers asíncronos).

use crate::http::{Request, SERVER_SOFTWARE};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Versión de la interfaz CGI implementada
pub const GATEWAY_INTERFACE: &str = "CGI/1.1";

/// Protocolo que anuncia el servidor
pub const SERVER_PROTOCOL: &str = "HTTP/1.0";

/// Identidad del servidor, calculada una sola vez al arrancar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerIdentity {
    pub software: String,
    pub name: String,
    pub gateway_interface: String,
    pub protocol: String,
    pub port: String,
}

impl ServerIdentity {
    pub fn new(hostname: &str, port: u16) -> Self {
        Self {
            software: SERVER_SOFTWARE.to_string(),
            name: hostname.to_string(),
            gateway_interface: GATEWAY_INTERFACE.to_string(),
            protocol: SERVER_PROTOCOL.to_string(),
            port: port.to_string(),
        }
    }
}

/// Registro de variables de un request dinámico
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variables {
    pub server_software: String,
    pub server_name: String,
    pub gateway_interface: String,
    pub server_protocol: String,
    pub server_port: String,
    pub request_method: String,
    /// Path del request sin el prefijo del handler
    pub path_info: String,
    /// Raíz estática + `path_info`
    pub path_translated: String,
    /// Path con el que se registró el handler
    pub script_name: String,
    pub query_string: String,
    pub remote_host: String,
    pub remote_addr: String,
}

impl Variables {
    /// Construye las variables para un request despachado a `script_name`
    ///
    /// # Ejemplo
    /// ```
    /// use spade::handlers::variables::{ServerIdentity, Variables};
    /// use spade::http::Request;
    /// use std::path::Path;
    ///
    /// let identity = ServerIdentity::new("spade", 8080);
    /// let request = Request::parse(b"GET /dirt/add/extra?value=1 HTTP/1.0\r\n\r\n");
    /// let vars = Variables::build(&identity, &request, "/dirt/add", Path::new("static"));
    ///
    /// assert_eq!(vars.path_info, "/extra");
    /// assert_eq!(vars.path_translated, "static/extra");
    /// assert_eq!(vars.query_string, "value=1");
    /// ```
    pub fn build(
        identity: &ServerIdentity,
        request: &Request,
        script_name: &str,
        static_root: &Path,
    ) -> Self {
        let path_info = request
            .path()
            .strip_prefix(script_name)
            .unwrap_or("")
            .to_string();
        let path_translated = format!("{}{}", static_root.display(), path_info);

        Self {
            server_software: identity.software.clone(),
            server_name: identity.name.clone(),
            gateway_interface: identity.gateway_interface.clone(),
            server_protocol: identity.protocol.clone(),
            server_port: identity.port.clone(),
            request_method: request.method().as_str().to_string(),
            path_info,
            path_translated,
            script_name: script_name.to_string(),
            query_string: request.query_string().to_string(),
            remote_host: request.remote_host().to_string(),
            remote_addr: request.remote_address().to_string(),
        }
    }

    /// Las variables con sus nombres CGI, listas para `Command::envs`
    pub fn to_env(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("SERVER_SOFTWARE", self.server_software.as_str()),
            ("SERVER_NAME", self.server_name.as_str()),
            ("GATEWAY_INTERFACE", self.gateway_interface.as_str()),
            ("SERVER_PROTOCOL", self.server_protocol.as_str()),
            ("SERVER_PORT", self.server_port.as_str()),
            ("REQUEST_METHOD", self.request_method.as_str()),
            ("PATH_INFO", self.path_info.as_str()),
            ("PATH_TRANSLATED", self.path_translated.as_str()),
            ("SCRIPT_NAME", self.script_name.as_str()),
            ("QUERY_STRING", self.query_string.as_str()),
            ("REMOTE_HOST", self.remote_host.as_str()),
            ("REMOTE_ADDR", self.remote_addr.as_str()),
        ]
    }
}
