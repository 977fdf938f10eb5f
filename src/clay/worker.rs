//! # Cliente para Workers
//! src/clay/worker.rs
//!
//! Lado worker del canal: se conecta al endpoint del servidor, recibe
//! requests y responde con los bytes que van al cliente HTTP (headers
//! restantes, línea en blanco y cuerpo).

use super::wire::{write_frame, FrameBuffer, WorkerRequest};
use super::ConnectionId;
use crate::error::ClayError;
use std::collections::VecDeque;
use std::io::Read;
use std::os::unix::net::UnixStream;
use std::path::Path;

/// Conexión de un worker con el servidor
pub struct WorkerConnection {
    stream: UnixStream,
    buffer: FrameBuffer,
    ready: VecDeque<WorkerRequest>,
}

impl WorkerConnection {
    pub fn connect(endpoint: &Path) -> Result<Self, ClayError> {
        let stream = UnixStream::connect(endpoint)?;
        Ok(Self {
            stream,
            buffer: FrameBuffer::new(),
            ready: VecDeque::new(),
        })
    }

    /// Espera el siguiente request
    ///
    /// `Ok(None)` cuando el servidor cerró el canal.
    pub fn recv(&mut self) -> Result<Option<WorkerRequest>, ClayError> {
        let mut chunk = [0u8; 8192];
        loop {
            if let Some(request) = self.ready.pop_front() {
                return Ok(Some(request));
            }

            let n = self.stream.read(&mut chunk)?;
            if n == 0 {
                return Ok(None);
            }

            for frame in self.buffer.push(&chunk[..n])? {
                self.ready.push_back(WorkerRequest::from_frame(frame)?);
            }
        }
    }

    /// Envía la respuesta para una conexión
    pub fn respond(&mut self, connection_id: ConnectionId, response: &[u8]) -> Result<(), ClayError> {
        write_frame(&mut self.stream, connection_id, response)
    }
}
