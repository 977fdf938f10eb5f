//! # Sistema de Routing
//! src/router/mod.rs
//!
//! El dispatcher toma un request válido y GET, lo busca en el registro y
//! le entrega el socket a exactamente una estrategia.
//!
//! ## Arquitectura
//!
//! ```text
//! Request → Registry::lookup → CGI | Clay | Módulo | Estático
//! ```
//!
//! Las tres estrategias dinámicas reciben el socket con la status line ya
//! escrita (sin línea en blanco): ellas terminan los headers.

pub mod registry;

pub use registry::{Registry, Route};

use crate::clay::ConnectionId;
use crate::handlers::{cgi, static_files};
use crate::http::{Request, Response, StatusCode};
use crate::server::ServerContext;
use log::error;
use std::io::{self, Write};
use std::net::{Shutdown, TcpStream};

/// Qué pasó con el socket después de despachar
pub enum Disposition {
    /// Respuesta completa; el hilo de conexión cierra el socket
    Done(TcpStream, StatusCode),

    /// El socket quedó en manos del listener de un worker asíncrono
    HandedOff(ConnectionId),

    /// No se pudo entregar al worker; el socket ya se cerró
    Abandoned,
}

/// Despacha un request a su estrategia
pub fn dispatch(context: &ServerContext, request: &Request, mut stream: TcpStream) -> io::Result<Disposition> {
    match context.registry.lookup(request.path()) {
        Route::Cgi(handler) => {
            let variables = context.variables(request, &handler.path);
            let status = cgi::serve(&mut stream, &handler.executable, &variables)?;
            Ok(Disposition::Done(stream, status))
        }
        Route::Clay(handler) => {
            // Sin worker no se escribe nada: el cliente ve un cierre abrupto
            if !handler.endpoint.is_connected() {
                error!(
                    "No worker connected to {} for {}",
                    handler.endpoint.endpoint().display(),
                    request.path()
                );
                let _ = stream.shutdown(Shutdown::Both);
                return Ok(Disposition::Abandoned);
            }

            let variables = context.variables(request, &handler.path);
            write_open_head(&mut stream)?;
            match handler.endpoint.submit(stream, &variables) {
                Ok(id) => Ok(Disposition::HandedOff(id)),
                Err(e) => {
                    error!("Unable to hand {} to worker: {}", request.path(), e);
                    Ok(Disposition::Abandoned)
                }
            }
        }
        Route::Module(binding) => {
            let variables = context.variables(request, &binding.path);
            write_open_head(&mut stream)?;
            binding.handler.handle(&mut stream, &variables)?;
            stream.flush()?;
            Ok(Disposition::Done(stream, StatusCode::Ok))
        }
        Route::Static => {
            let status = static_files::serve(&mut stream, &context.static_root, request.path())?;
            Ok(Disposition::Done(stream, status))
        }
    }
}

/// Status line 200 y header `Server`, sin terminar los headers
fn write_open_head(stream: &mut TcpStream) -> io::Result<()> {
    stream.write_all(&Response::new(StatusCode::Ok).open_head_bytes())?;
    stream.flush()
}
