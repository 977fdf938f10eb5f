//! # Spade
//! src/lib.rs
//!
//! Servidor HTTP/1.0 concurrente: archivos estáticos y tres estrategias de
//! contenido dinámico.
//!
//! ## Arquitectura
//!
//! El servidor está dividido en módulos especializados:
//! - `http`: Codec del protocolo HTTP/1.0
//! - `server`: Accept loop, un thread por conexión
//! - `router`: Registro de handlers y dispatcher
//! - `handlers`: Archivos estáticos, CGI y módulos en proceso
//! - `clay`: Workers asíncronos en otro proceso
//! - `config`: CLI, variables de entorno y archivo TOML
//! - `logging`: Backend del logger
//! - `error`: Tipos de error
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use spade::router::Registry;
//! use spade::server::{Server, ServerContext};
//! use std::path::PathBuf;
//!
//! let context = ServerContext::new("localhost", 8080, PathBuf::from("static"), Registry::new());
//! let server = Server::bind(context, "0.0.0.0:8080").expect("bind");
//! server.run().expect("accept loop");
//! ```

pub mod clay;
pub mod config;
pub mod error;
pub mod handlers;
pub mod http;
pub mod logging;
pub mod router;
pub mod server;
