//! # Módulo HTTP
//! src/http/mod.rs
//!
//! Codec del protocolo HTTP/1.0, escrito a mano:
//!
//! - Parsing tolerante de requests (request line, URI, headers)
//! - Construcción y serialización de responses
//! - Parsing de status lines para los clientes
//!
//! ### Formato de Request
//!
//! ```text
//! GET /path?query=value HTTP/1.0\r\n
//! Header-Name: Header-Value\r\n
//! \r\n
//! ```
//!
//! ### Formato de Response
//!
//! ```text
//! HTTP/1.0 200 OK\r\n
//! Content-Type: text/html\r\n
//! Content-Length: 13\r\n
//! \r\n
//! <html></html>
//! ```

pub mod header;    // Líneas `Key: Value`
pub mod request;   // Parsing de requests
pub mod response;  // Construcción de responses
pub mod status;    // Códigos de estado
pub mod uri;       // Parsing de URIs

// Re-exportamos los tipos principales
pub use header::Header;
pub use request::{Method, Request, Version};
pub use response::{Response, ResponseHead, SERVER_SOFTWARE};
pub use status::StatusCode;
pub use uri::Uri;
