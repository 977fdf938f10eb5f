//! # Puente con Workers Asíncronos
//! src/clay/bridge.rs
//!
//! Un `ClayEndpoint` por handler registrado. El endpoint escucha en un
//! socket Unix donde se conecta el proceso worker, y mantiene:
//!
//! - el lado de escritura hacia el worker, compartido por todos los hilos
//!   de conexión bajo un lock
//! - la tabla de conexiones pendientes `ConnectionId -> TcpStream`
//! - un hilo listener que recibe las respuestas, las escribe en el socket
//!   del cliente correspondiente y lo cierra
//!
//! El hilo de conexión no espera la respuesta: entrega el socket a la tabla
//! y termina.

use super::wire::{write_frame, Frame, FrameBuffer};
use super::ConnectionId;
use crate::error::{ClayError, RegistrationError};
use crate::handlers::Variables;
use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::fs;
use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::os::unix::fs::FileTypeExt;
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

/// Intentos de bind antes de descartar el handler
pub const BIND_ATTEMPTS: u32 = 3;

/// Espera fija entre intentos de bind
pub const BIND_BACKOFF: Duration = Duration::from_secs(1);

/// Cada cuánto el listener revisa pendientes vencidos
const SWEEP_INTERVAL: Duration = Duration::from_millis(250);

struct Pending {
    stream: TcpStream,
    since: Instant,
}

/// Canal persistente con un worker asíncrono
pub struct ClayEndpoint {
    endpoint: PathBuf,
    outbound: Mutex<Option<UnixStream>>,
    pending: Mutex<HashMap<ConnectionId, Pending>>,
    next_id: AtomicU64,
    reply_timeout: Duration,
}

impl ClayEndpoint {
    /// Abre el endpoint y arranca su hilo listener
    ///
    /// Un socket viejo en `endpoint` se elimina antes del bind; si ahí hay
    /// otro tipo de archivo, el bind falla sin tocarlo.
    pub fn bind(endpoint: &Path, reply_timeout: Duration) -> Result<Arc<Self>, RegistrationError> {
        let listener = bind_with_retry(endpoint)?;

        let bridge = Arc::new(Self {
            endpoint: endpoint.to_path_buf(),
            outbound: Mutex::new(None),
            pending: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            reply_timeout,
        });

        let worker_side = Arc::clone(&bridge);
        thread::Builder::new()
            .name(format!("clay-{}", endpoint.display()))
            .spawn(move || worker_side.listen(listener))
            .map_err(|source| RegistrationError::ChannelBind {
                endpoint: endpoint.to_path_buf(),
                source,
            })?;

        info!("Clay endpoint listening on {}", endpoint.display());
        Ok(bridge)
    }

    pub fn endpoint(&self) -> &Path {
        &self.endpoint
    }

    /// Hay un worker conectado
    pub fn is_connected(&self) -> bool {
        lock(&self.outbound).is_some()
    }

    /// Conexiones esperando respuesta
    pub fn pending_count(&self) -> usize {
        lock(&self.pending).len()
    }

    /// Entrega una conexión al worker
    ///
    /// La conexión queda en la tabla antes de enviar el request, así una
    /// respuesta rápida siempre la encuentra. Si el envío falla, se saca de
    /// la tabla y se cierra al retornar el error.
    pub fn submit(&self, stream: TcpStream, variables: &Variables) -> Result<ConnectionId, ClayError> {
        let payload = serde_json::to_vec(variables).map_err(ClayError::Encode)?;

        let mut outbound = lock(&self.outbound);
        let worker = match outbound.as_mut() {
            Some(worker) => worker,
            None => return Err(ClayError::NotConnected(self.endpoint.clone())),
        };

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        lock(&self.pending).insert(
            id,
            Pending {
                stream,
                since: Instant::now(),
            },
        );

        if let Err(e) = write_frame(worker, id, &payload) {
            if let Some(pending) = lock(&self.pending).remove(&id) {
                let _ = pending.stream.shutdown(Shutdown::Both);
            }
            return Err(e);
        }

        debug!("Connection {} handed to {}", id, self.endpoint.display());
        Ok(id)
    }

    /// Loop del hilo listener: un worker a la vez, durante toda la vida del
    /// proceso
    fn listen(&self, listener: UnixListener) {
        for incoming in listener.incoming() {
            let worker = match incoming {
                Ok(worker) => worker,
                Err(e) => {
                    error!("Accept failed on {}: {}", self.endpoint.display(), e);
                    continue;
                }
            };

            let reader = match worker.try_clone() {
                Ok(reader) => reader,
                Err(e) => {
                    error!("Unable to clone worker channel: {}", e);
                    continue;
                }
            };

            info!("Worker connected to {}", self.endpoint.display());
            *lock(&self.outbound) = Some(worker);

            self.read_replies(reader);

            *lock(&self.outbound) = None;
            let abandoned = self.close_all_pending();
            info!(
                "Worker disconnected from {} ({} pending connections closed)",
                self.endpoint.display(),
                abandoned
            );
        }
    }

    fn read_replies(&self, mut reader: UnixStream) {
        if let Err(e) = reader.set_read_timeout(Some(SWEEP_INTERVAL)) {
            error!("Unable to set read timeout on {}: {}", self.endpoint.display(), e);
            return;
        }

        let mut buffer = FrameBuffer::new();
        let mut chunk = [0u8; 8192];

        loop {
            match reader.read(&mut chunk) {
                Ok(0) => return,
                Ok(n) => match buffer.push(&chunk[..n]) {
                    Ok(frames) => frames.into_iter().for_each(|frame| self.deliver(frame)),
                    Err(e) => {
                        error!("Protocol error on {}: {}", self.endpoint.display(), e);
                        return;
                    }
                },
                Err(e)
                    if e.kind() == io::ErrorKind::WouldBlock
                        || e.kind() == io::ErrorKind::TimedOut
                        || e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    error!("Read failed on {}: {}", self.endpoint.display(), e);
                    return;
                }
            }

            self.sweep_expired();
        }
    }

    /// Escribe una respuesta en su conexión y la cierra
    fn deliver(&self, frame: Frame) {
        let id = frame.connection_id();
        let pending = match lock(&self.pending).remove(&id) {
            Some(pending) => pending,
            None => {
                warn!("Dropping reply for unknown connection {}", id);
                return;
            }
        };

        let mut stream = pending.stream;
        if let Err(e) = stream.write_all(&frame.payload).and_then(|_| stream.flush()) {
            error!("Unable to deliver reply to connection {}: {}", id, e);
        }
        let _ = stream.shutdown(Shutdown::Both);
        debug!("Connection {} answered after {:?}", id, pending.since.elapsed());
    }

    /// Cierra las conexiones que llevan más que `reply_timeout` esperando
    fn sweep_expired(&self) {
        let mut pending = lock(&self.pending);
        let timeout = self.reply_timeout;
        let expired: Vec<ConnectionId> = pending
            .iter()
            .filter(|(_, p)| p.since.elapsed() >= timeout)
            .map(|(id, _)| *id)
            .collect();

        for id in expired {
            if let Some(p) = pending.remove(&id) {
                warn!("Connection {} timed out waiting for {}", id, self.endpoint.display());
                let _ = p.stream.shutdown(Shutdown::Both);
            }
        }
    }

    fn close_all_pending(&self) -> usize {
        let drained: Vec<Pending> = lock(&self.pending).drain().map(|(_, p)| p).collect();
        for p in &drained {
            let _ = p.stream.shutdown(Shutdown::Both);
        }
        drained.len()
    }
}

/// Un lock envenenado sólo significa que otro hilo hizo panic; la tabla
/// sigue siendo consistente entre operaciones.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Borra un socket viejo en `endpoint`; cualquier otro tipo de archivo se
/// deja intacto y el bind se rechaza.
fn remove_stale_socket(endpoint: &Path) -> Result<(), RegistrationError> {
    let metadata = match fs::symlink_metadata(endpoint) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(source) => {
            return Err(RegistrationError::ChannelBind {
                endpoint: endpoint.to_path_buf(),
                source,
            })
        }
    };

    if !metadata.file_type().is_socket() {
        return Err(RegistrationError::ChannelBind {
            endpoint: endpoint.to_path_buf(),
            source: io::Error::new(io::ErrorKind::AlreadyExists, "path exists and is not a socket"),
        });
    }

    if let Err(e) = fs::remove_file(endpoint) {
        warn!("Unable to remove stale socket {}: {}", endpoint.display(), e);
    }
    Ok(())
}

fn bind_with_retry(endpoint: &Path) -> Result<UnixListener, RegistrationError> {
    let mut attempt = 1;
    loop {
        remove_stale_socket(endpoint)?;

        match UnixListener::bind(endpoint) {
            Ok(listener) => return Ok(listener),
            Err(source) if attempt >= BIND_ATTEMPTS => {
                return Err(RegistrationError::ChannelBind {
                    endpoint: endpoint.to_path_buf(),
                    source,
                })
            }
            Err(e) => {
                warn!(
                    "Bind attempt {}/{} on {} failed: {}",
                    attempt,
                    BIND_ATTEMPTS,
                    endpoint.display(),
                    e
                );
                attempt += 1;
                thread::sleep(BIND_BACKOFF);
            }
        }
    }
}
