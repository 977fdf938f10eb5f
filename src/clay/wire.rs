//! # Formato de Frames
//! src/clay/wire.rs
//!
//! Frames del canal servidor <-> worker, iguales en ambas direcciones:
//!
//! ```text
//! +--------------------+------------------+-------------------+
//! | connection id (8B) | payload len (4B) | payload (len B)   |
//! |     u64 BE         |     u32 BE       |                   |
//! +--------------------+------------------+-------------------+
//! ```
//!
//! Servidor -> worker: el payload es el registro de variables en JSON.
//! Worker -> servidor: el payload son los bytes crudos de la respuesta.

use super::ConnectionId;
use crate::error::ClayError;
use crate::handlers::Variables;
use bytes::{Bytes, BytesMut};
use std::io::Write;

/// Tamaño fijo del encabezado
pub const HEADER_SIZE: usize = 12;

/// Payload máximo aceptado (1 MiB)
pub const MAX_PAYLOAD_SIZE: u32 = 1 << 20;

/// Encabezado de un frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub connection_id: ConnectionId,
    pub payload_length: u32,
}

impl FrameHeader {
    pub fn new(connection_id: ConnectionId, payload_length: u32) -> Self {
        Self {
            connection_id,
            payload_length,
        }
    }

    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..8].copy_from_slice(&self.connection_id.to_be_bytes());
        buf[8..12].copy_from_slice(&self.payload_length.to_be_bytes());
        buf
    }

    /// Decodifica un encabezado; `None` si faltan bytes
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < HEADER_SIZE {
            return None;
        }

        let mut id = [0u8; 8];
        id.copy_from_slice(&buf[0..8]);
        let mut len = [0u8; 4];
        len.copy_from_slice(&buf[8..12]);

        Some(Self {
            connection_id: u64::from_be_bytes(id),
            payload_length: u32::from_be_bytes(len),
        })
    }
}

/// Frame completo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub header: FrameHeader,
    pub payload: Bytes,
}

impl Frame {
    pub fn connection_id(&self) -> ConnectionId {
        self.header.connection_id
    }
}

/// Escribe un frame completo en `out`
///
/// El encabezado y el payload salen en un solo `write_all` para que dos
/// hilos que comparten el socket bajo un lock no intercalen bytes.
pub fn write_frame<W: Write>(out: &mut W, connection_id: ConnectionId, payload: &[u8]) -> Result<(), ClayError> {
    let len = u32::try_from(payload.len()).unwrap_or(u32::MAX);
    if len > MAX_PAYLOAD_SIZE {
        return Err(ClayError::FrameTooLarge(len));
    }

    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    buf.extend_from_slice(&FrameHeader::new(connection_id, len).encode());
    buf.extend_from_slice(payload);
    out.write_all(&buf)?;
    out.flush()?;
    Ok(())
}

#[derive(Debug, Clone, Copy)]
enum State {
    WaitingForHeader,
    WaitingForPayload(FrameHeader),
}

/// Acumula lecturas parciales y extrae frames completos
///
/// Los payloads se separan del buffer con `split_to`, sin copiarlos.
pub struct FrameBuffer {
    buffer: BytesMut,
    state: State,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(16 * 1024),
            state: State::WaitingForHeader,
        }
    }

    /// Agrega bytes leídos y retorna todos los frames ya completos
    ///
    /// Un payload declarado mayor a [`MAX_PAYLOAD_SIZE`] es un error de
    /// protocolo: el canal no se puede resincronizar.
    pub fn push(&mut self, data: &[u8]) -> Result<Vec<Frame>, ClayError> {
        self.buffer.extend_from_slice(data);

        let mut frames = Vec::new();
        while let Some(frame) = self.extract_one()? {
            frames.push(frame);
        }
        Ok(frames)
    }

    fn extract_one(&mut self) -> Result<Option<Frame>, ClayError> {
        loop {
            match self.state {
                State::WaitingForHeader => {
                    let header = match FrameHeader::decode(&self.buffer) {
                        Some(header) => header,
                        None => return Ok(None),
                    };
                    if header.payload_length > MAX_PAYLOAD_SIZE {
                        return Err(ClayError::FrameTooLarge(header.payload_length));
                    }
                    let _ = self.buffer.split_to(HEADER_SIZE);
                    self.state = State::WaitingForPayload(header);
                }
                State::WaitingForPayload(header) => {
                    let len = header.payload_length as usize;
                    if self.buffer.len() < len {
                        return Ok(None);
                    }
                    let payload = self.buffer.split_to(len).freeze();
                    self.state = State::WaitingForHeader;
                    return Ok(Some(Frame { header, payload }));
                }
            }
        }
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Request que recibe un worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerRequest {
    pub connection_id: ConnectionId,
    pub variables: Variables,
}

impl WorkerRequest {
    pub fn from_frame(frame: Frame) -> Result<Self, ClayError> {
        let variables = serde_json::from_slice(&frame.payload).map_err(ClayError::Decode)?;
        Ok(Self {
            connection_id: frame.connection_id(),
            variables,
        })
    }

    pub fn encode(&self) -> Result<Vec<u8>, ClayError> {
        serde_json::to_vec(&self.variables).map_err(ClayError::Encode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_bytes(id: u64, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        write_frame(&mut out, id, payload).unwrap();
        out
    }

    #[test]
    fn test_header_layout() {
        let bytes = FrameHeader::new(0x0102030405060708, 0x0a0b0c0d).encode();
        assert_eq!(bytes, [1, 2, 3, 4, 5, 6, 7, 8, 0x0a, 0x0b, 0x0c, 0x0d]);
        assert_eq!(
            FrameHeader::decode(&bytes),
            Some(FrameHeader::new(0x0102030405060708, 0x0a0b0c0d))
        );
        assert_eq!(FrameHeader::decode(&bytes[..11]), None);
    }

    #[test]
    fn test_push_split_across_reads() {
        let data = frame_bytes(7, b"hello");
        let mut buffer = FrameBuffer::new();

        assert!(buffer.push(&data[..5]).unwrap().is_empty());
        assert!(buffer.push(&data[5..14]).unwrap().is_empty());
        let frames = buffer.push(&data[14..]).unwrap();

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].connection_id(), 7);
        assert_eq!(&frames[0].payload[..], b"hello");

        // Nada quedó a medias: el siguiente frame sale entero
        let frames = buffer.push(&frame_bytes(8, b"next")).unwrap();
        assert_eq!(frames[0].connection_id(), 8);
        assert_eq!(&frames[0].payload[..], b"next");
    }

    #[test]
    fn test_push_many_frames_in_one_read() {
        let mut data = frame_bytes(1, b"a");
        data.extend(frame_bytes(2, b""));
        data.extend(frame_bytes(3, b"ccc"));
        let last = frame_bytes(4, b"dd");
        data.extend(&last[..6]);

        let mut buffer = FrameBuffer::new();
        let frames = buffer.push(&data).unwrap();

        let ids: Vec<_> = frames.iter().map(Frame::connection_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(frames[1].payload.is_empty());
        assert_eq!(&frames[2].payload[..], b"ccc");

        let frames = buffer.push(&last[6..]).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].connection_id(), 4);
        assert_eq!(&frames[0].payload[..], b"dd");
    }

    #[test]
    fn test_oversized_payload_rejected() {
        let header = FrameHeader::new(1, MAX_PAYLOAD_SIZE + 1).encode();
        let mut buffer = FrameBuffer::new();
        assert!(matches!(buffer.push(&header), Err(ClayError::FrameTooLarge(_))));
    }

    #[test]
    fn test_write_frame_rejects_oversized_payload() {
        let payload = vec![0u8; MAX_PAYLOAD_SIZE as usize + 1];
        let mut out = Vec::new();
        assert!(write_frame(&mut out, 1, &payload).is_err());
        assert!(out.is_empty());
    }

    #[test]
    fn test_worker_request_from_frame() {
        let vars = Variables {
            server_software: "Spade/0.1.0".into(),
            server_name: "spade".into(),
            gateway_interface: "CGI/1.1".into(),
            server_protocol: "HTTP/1.0".into(),
            server_port: "8080".into(),
            request_method: "GET".into(),
            path_info: String::new(),
            path_translated: "static".into(),
            script_name: "/async/add".into(),
            query_string: "value=1&value=2".into(),
            remote_host: String::new(),
            remote_addr: "127.0.0.1".into(),
        };
        let request = WorkerRequest {
            connection_id: 99,
            variables: vars,
        };

        let mut buffer = FrameBuffer::new();
        let frames = buffer
            .push(&frame_bytes(99, &request.encode().unwrap()))
            .unwrap();
        let decoded = WorkerRequest::from_frame(frames[0].clone()).unwrap();
        assert_eq!(decoded, request);
    }

    #[test]
    fn test_garbage_payload_fails_decode() {
        let mut buffer = FrameBuffer::new();
        let frames = buffer.push(&frame_bytes(5, b"not json")).unwrap();
        assert!(matches!(
            WorkerRequest::from_frame(frames[0].clone()),
            Err(ClayError::Decode(_))
        ));
    }
}
