//! # Estrategias de Contenido
//! src/handlers/mod.rs
//!
//! Cada request válido termina en una de estas estrategias:
//!
//! - `static_files`: archivos bajo la raíz estática
//! - `cgi`: programas externos
//! - `module`: handlers en proceso
//!
//! La cuarta estrategia, los workers asíncronos, vive en `crate::clay`.

pub mod cgi;
pub mod module;
pub mod static_files;
pub mod variables;

pub use module::{ModuleCatalog, ModuleHandler};
pub use variables::{ServerIdentity, Variables};
