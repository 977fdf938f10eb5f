//! # Servidor TCP Concurrente
//! src/server/tcp.rs
//!
//! Implementación del servidor TCP que maneja múltiples conexiones
//! simultáneas usando threads. Cada conexión se procesa en su propio
//! thread: lee un request, escribe una respuesta y cierra.

use super::context::{ServerContext, WORKER_STACK_SIZE};
use crate::error::ServerError;
use crate::handlers::static_files::send_error;
use crate::http::{Method, Request, StatusCode};
use crate::router::{dispatch, Disposition};
use log::{debug, error, info, warn};
use std::io::{self, BufReader};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;

/// Servidor HTTP/1.0 concurrente
pub struct Server {
    context: Arc<ServerContext>,
    listener: TcpListener,
}

impl Server {
    /// Abre el socket de escucha
    pub fn bind(context: ServerContext, address: &str) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(address).map_err(|source| ServerError::Bind {
            address: address.to_string(),
            source,
        })?;

        Ok(Self {
            context: Arc::new(context),
            listener,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn context(&self) -> &Arc<ServerContext> {
        &self.context
    }

    /// Loop de accept; no retorna mientras el socket siga abierto
    pub fn run(&self) -> io::Result<()> {
        info!("Listening on {}", self.local_addr()?);

        for stream in self.listener.incoming() {
            let stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    error!("Accept failed: {}", e);
                    continue;
                }
            };

            let context = Arc::clone(&self.context);
            let spawned = thread::Builder::new()
                .stack_size(WORKER_STACK_SIZE)
                .spawn(move || {
                    if let Err(e) = handle_connection(stream, &context) {
                        error!("Connection failed: {}", e);
                    }
                });

            if let Err(e) = spawned {
                error!("Unable to spawn connection thread: {}", e);
            }
        }

        Ok(())
    }
}

/// Atiende una conexión de principio a fin
///
/// Un request inválido se cierra sin respuesta. Un método distinto de GET
/// recibe 501.
pub fn handle_connection(stream: TcpStream, context: &ServerContext) -> io::Result<()> {
    let request = {
        let mut reader = BufReader::new(&stream);
        Request::read_from(&mut reader)?
    };

    let mut request = match request {
        Some(request) => request,
        None => {
            debug!("Peer closed before sending a request");
            return Ok(());
        }
    };

    let peer = stream.peer_addr()?;
    request.set_remote_address(&peer.ip().to_string());
    if context.reverse_lookups {
        match context.resolver.resolve(peer.ip()) {
            Ok(host) => request.set_remote_host(&host),
            Err(e) => warn!("{}", e),
        }
    }

    if !request.is_valid() {
        debug!("Dropping invalid request from {}", peer);
        close(stream);
        return Ok(());
    }

    if request.method() != Method::GET {
        let mut stream = stream;
        let status = send_error(&mut stream, StatusCode::NotImplemented, request.method().as_str())?;
        log_request(&request, status);
        close(stream);
        return Ok(());
    }

    match dispatch(context, &request, stream)? {
        Disposition::Done(stream, status) => {
            log_request(&request, status);
            close(stream);
        }
        Disposition::HandedOff(id) => {
            info!(
                "{} GET {} -> worker (connection {})",
                request.remote_address(),
                request.uri().path_and_query(),
                id
            );
        }
        Disposition::Abandoned => {}
    }

    Ok(())
}

fn log_request(request: &Request, status: StatusCode) {
    info!(
        "{} {} {} {}",
        request.remote_address(),
        request.method().as_str(),
        request.uri().path_and_query(),
        status
    );
}

fn close(stream: TcpStream) {
    let _ = stream.shutdown(Shutdown::Write);
}
