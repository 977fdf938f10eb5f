//! # Workers Asíncronos
//! src/clay/mod.rs
//!
//! Estrategia que delega el cálculo de la respuesta a un proceso externo.
//! El servidor no espera: el socket del cliente queda en una tabla indexada
//! por [`ConnectionId`] hasta que el worker responde o vence el timeout.
//!
//! Los ids son un contador monotónico por endpoint, nunca se reutilizan
//! mientras el proceso vive.

pub mod bridge;
pub mod wire;
pub mod worker;

/// Identificador opaco de una conexión entregada a un worker
pub type ConnectionId = u64;

pub use bridge::ClayEndpoint;
pub use wire::WorkerRequest;
pub use worker::WorkerConnection;
