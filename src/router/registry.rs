//! # Registro de Handlers
//! src/router/registry.rs
//!
//! Tres tablas, una por clase de handler. Se llenan una sola vez al
//! arrancar y después sólo se leen, por eso se comparten entre hilos sin
//! locks.
//!
//! CGI y workers asíncronos se buscan por path exacto; los módulos en
//! proceso por prefijo.

use crate::clay::ClayEndpoint;
use crate::config::Settings;
use crate::error::RegistrationError;
use crate::handlers::cgi::{check_executable, Executable};
use crate::handlers::{ModuleCatalog, ModuleHandler};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Programa CGI registrado
#[derive(Debug, Clone)]
pub struct CgiHandler {
    pub path: String,
    pub executable: PathBuf,
}

/// Endpoint de worker asíncrono registrado
#[derive(Clone)]
pub struct ClayHandler {
    pub path: String,
    pub endpoint: Arc<ClayEndpoint>,
}

/// Módulo en proceso registrado
#[derive(Clone)]
pub struct ModuleBinding {
    pub path: String,
    pub name: String,
    pub handler: Arc<dyn ModuleHandler>,
}

/// Estrategia elegida para un path
pub enum Route<'a> {
    Cgi(&'a CgiHandler),
    Clay(&'a ClayHandler),
    Module(&'a ModuleBinding),
    Static,
}

/// Tablas de handlers del servidor
#[derive(Default)]
pub struct Registry {
    cgi: Vec<CgiHandler>,
    clay: Vec<ClayHandler>,
    modules: Vec<ModuleBinding>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Llena las tablas desde la configuración
    ///
    /// Un handler que no se puede registrar se loguea y se omite; el
    /// servidor arranca igual con menos rutas.
    pub fn from_settings(settings: &Settings, catalog: &ModuleCatalog) -> Self {
        let mut registry = Self::new();

        for entry in &settings.cgi_handlers {
            let executable = settings.cgi_executable(&entry.handler);
            report(&entry.path, registry.register_cgi(&entry.path, &executable));
        }

        for entry in &settings.clay_handlers {
            report(
                &entry.path,
                registry.register_clay(&entry.path, &entry.endpoint, settings.clay_timeout),
            );
        }

        for entry in &settings.module_handlers {
            report(
                &entry.path,
                registry.register_module(&entry.path, &entry.module, catalog),
            );
        }

        info!(
            "Registered {} CGI, {} clay and {} module handlers",
            registry.cgi.len(),
            registry.clay.len(),
            registry.modules.len()
        );
        registry
    }

    /// Registra un programa CGI
    ///
    /// El archivo tiene que existir y ser un regular ejecutable.
    pub fn register_cgi(&mut self, path: &str, executable: &Path) -> Result<(), RegistrationError> {
        if self.cgi.iter().any(|h| h.path == path) {
            return Err(RegistrationError::DuplicatePath(path.to_string()));
        }

        match check_executable(executable) {
            Executable::Ready => {}
            Executable::Missing => return Err(RegistrationError::NotFound(executable.to_path_buf())),
            Executable::NotRunnable => {
                return Err(RegistrationError::NotExecutable(executable.to_path_buf()))
            }
        }

        self.cgi.push(CgiHandler {
            path: path.to_string(),
            executable: executable.to_path_buf(),
        });
        Ok(())
    }

    /// Registra un módulo del catálogo
    pub fn register_module(
        &mut self,
        path: &str,
        name: &str,
        catalog: &ModuleCatalog,
    ) -> Result<(), RegistrationError> {
        if self.modules.iter().any(|m| m.path == path) {
            return Err(RegistrationError::DuplicatePath(path.to_string()));
        }

        let handler = catalog.resolve(name)?;
        self.modules.push(ModuleBinding {
            path: path.to_string(),
            name: name.to_string(),
            handler,
        });
        Ok(())
    }

    /// Abre el endpoint de un worker asíncrono y lo registra
    pub fn register_clay(
        &mut self,
        path: &str,
        endpoint: &Path,
        reply_timeout: Duration,
    ) -> Result<(), RegistrationError> {
        if self.clay.iter().any(|c| c.path == path) {
            return Err(RegistrationError::DuplicatePath(path.to_string()));
        }

        let endpoint = ClayEndpoint::bind(endpoint, reply_timeout)?;
        self.clay.push(ClayHandler {
            path: path.to_string(),
            endpoint,
        });
        Ok(())
    }

    /// Elige la estrategia para un path
    ///
    /// Orden fijo: CGI, worker asíncrono, módulo, archivo estático.
    pub fn lookup(&self, path: &str) -> Route<'_> {
        if let Some(handler) = self.cgi.iter().find(|h| h.path == path) {
            return Route::Cgi(handler);
        }
        if let Some(handler) = self.clay.iter().find(|h| h.path == path) {
            return Route::Clay(handler);
        }
        if let Some(binding) = self.modules.iter().find(|m| path.starts_with(&m.path)) {
            return Route::Module(binding);
        }
        Route::Static
    }

    pub fn clay_handlers(&self) -> &[ClayHandler] {
        &self.clay
    }

    pub fn is_empty(&self) -> bool {
        self.cgi.is_empty() && self.clay.is_empty() && self.modules.is_empty()
    }
}

fn report(path: &str, result: Result<(), RegistrationError>) {
    if let Err(e) = result {
        warn!("Skipping handler for {}: {}", path, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, Permissions};
    use std::os::unix::fs::PermissionsExt;

    fn executable(dir: &Path, name: &str, mode: u32) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();
        fs::set_permissions(&path, Permissions::from_mode(mode)).unwrap();
        path
    }

    #[test]
    fn test_register_cgi_validates_file() {
        let dir = tempfile::tempdir().unwrap();
        let good = executable(dir.path(), "good.sh", 0o755);
        let plain = executable(dir.path(), "plain.sh", 0o644);

        let mut registry = Registry::new();
        assert!(registry.register_cgi("/cgi/good", &good).is_ok());
        assert!(matches!(
            registry.register_cgi("/cgi/plain", &plain),
            Err(RegistrationError::NotExecutable(_))
        ));
        assert!(matches!(
            registry.register_cgi("/cgi/none", &dir.path().join("none")),
            Err(RegistrationError::NotFound(_))
        ));
        assert!(matches!(
            registry.register_cgi("/cgi/good", &good),
            Err(RegistrationError::DuplicatePath(_))
        ));
    }

    #[test]
    fn test_register_unknown_module() {
        let mut registry = Registry::new();
        let catalog = ModuleCatalog::builtin();
        assert!(matches!(
            registry.register_module("/dirt/x", "missing", &catalog),
            Err(RegistrationError::UnknownModule(_))
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_lookup_exact_and_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let script = executable(dir.path(), "add.sh", 0o755);
        let catalog = ModuleCatalog::builtin();

        let mut registry = Registry::new();
        registry.register_cgi("/cgi/add", &script).unwrap();
        registry.register_module("/dirt", "echo", &catalog).unwrap();

        assert!(matches!(registry.lookup("/cgi/add"), Route::Cgi(_)));
        assert!(matches!(registry.lookup("/cgi/add/more"), Route::Static));
        assert!(matches!(registry.lookup("/dirt/add/more"), Route::Module(m) if m.name == "echo"));
        assert!(matches!(registry.lookup("/index.html"), Route::Static));
    }

    #[test]
    fn test_lookup_order() {
        let dir = tempfile::tempdir().unwrap();
        let script = executable(dir.path(), "add.sh", 0o755);
        let catalog = ModuleCatalog::builtin();

        let mut registry = Registry::new();
        registry.register_module("/x", "adder", &catalog).unwrap();
        registry.register_cgi("/x", &script).unwrap();
        registry
            .register_clay("/x/clay", &dir.path().join("x.sock"), Duration::from_secs(1))
            .unwrap();

        assert!(matches!(registry.lookup("/x"), Route::Cgi(_)));
        assert!(matches!(registry.lookup("/x/clay"), Route::Clay(_)));
        assert!(matches!(registry.lookup("/x/other"), Route::Module(_)));
    }
}
