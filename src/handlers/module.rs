//! # Módulos en Proceso
//! src/handlers/module.rs
//!
//! Handlers que corren dentro del mismo proceso del servidor. Reciben el
//! registro de variables y escriben en el socket el resto de la respuesta:
//! headers restantes, línea en blanco y cuerpo.

use super::variables::Variables;
use crate::error::RegistrationError;
use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::Arc;

/// Contrato de un módulo en proceso
///
/// Se invoca desde varios hilos a la vez, por eso `Send + Sync`.
pub trait ModuleHandler: Send + Sync {
    fn handle(&self, out: &mut dyn Write, variables: &Variables) -> io::Result<()>;
}

impl<F> ModuleHandler for F
where
    F: Fn(&mut dyn Write, &Variables) -> io::Result<()> + Send + Sync,
{
    fn handle(&self, out: &mut dyn Write, variables: &Variables) -> io::Result<()> {
        self(out, variables)
    }
}

/// Catálogo de módulos disponibles por nombre
pub struct ModuleCatalog {
    modules: HashMap<String, Arc<dyn ModuleHandler>>,
}

impl ModuleCatalog {
    /// Catálogo vacío
    pub fn new() -> Self {
        Self {
            modules: HashMap::new(),
        }
    }

    /// Catálogo con los módulos incluidos en el crate
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        catalog.insert("adder", Arc::new(Adder));
        catalog.insert("echo", Arc::new(Echo));
        catalog
    }

    pub fn insert(&mut self, name: &str, handler: Arc<dyn ModuleHandler>) {
        self.modules.insert(name.to_string(), handler);
    }

    /// Busca un módulo por nombre
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn ModuleHandler>, RegistrationError> {
        self.modules
            .get(name)
            .cloned()
            .ok_or_else(|| RegistrationError::UnknownModule(name.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.modules.keys().map(String::as_str).collect();
        names.sort();
        names
    }
}

impl Default for ModuleCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Suma los dos primeros `value=` del query string
///
/// Un valor que falta o no es número cuenta como 0.
///
/// # Ejemplo
/// ```
/// use spade::handlers::module::add_values;
///
/// assert_eq!(add_values("value=2&value=3"), 5);
/// assert_eq!(add_values("value=7"), 7);
/// assert_eq!(add_values(""), 0);
/// ```
pub fn add_values(query: &str) -> i64 {
    query
        .split('&')
        .filter_map(|pair| pair.strip_prefix("value="))
        .take(2)
        .map(|raw| raw.trim().parse::<i64>().unwrap_or(0))
        .sum()
}

/// Resto de la respuesta del sumador: headers, línea en blanco y cuerpo
pub fn adder_response(query: &str) -> Vec<u8> {
    let body = format!("{}\r\n", add_values(query));
    format!(
        "Content-Type: text/html\r\nContent-Length: {}\r\n\r\n{}",
        body.len(),
        body
    )
    .into_bytes()
}

/// Sumador `value=a&value=b`
pub struct Adder;

impl ModuleHandler for Adder {
    fn handle(&self, out: &mut dyn Write, variables: &Variables) -> io::Result<()> {
        out.write_all(&adder_response(&variables.query_string))
    }
}

/// Devuelve el registro de variables como texto plano
pub struct Echo;

impl ModuleHandler for Echo {
    fn handle(&self, out: &mut dyn Write, variables: &Variables) -> io::Result<()> {
        let mut body = String::new();
        for (name, value) in variables.to_env() {
            body.push_str(name);
            body.push('=');
            body.push_str(value);
            body.push_str("\r\n");
        }

        write!(
            out,
            "Content-Type: text/plain\r\nContent-Length: {}\r\n\r\n{}",
            body.len(),
            body
        )
    }
}
